//! Visa Core Types
//!
//! Data model shared by the client, the CLI and the validation engine.

pub mod case;
pub mod common;
pub mod diagnosis;
pub mod link;
pub mod notification;
pub mod statistics;
pub mod translation;

pub use case::*;
pub use common::*;
pub use diagnosis::*;
pub use link::*;
pub use notification::*;
pub use statistics::*;
pub use translation::*;
