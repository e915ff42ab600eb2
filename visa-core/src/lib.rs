//! Visa Core - case lifecycle and intake validation
//!
//! Pure domain layer for the visa consulting desk. No I/O happens here:
//! - Case status state machine with guarded transitions
//! - Status metadata registry (labels, colors, allowed actions)
//! - Client links and diagnosis report history
//! - Ten-step DS-160 wizard schemas and the validation engine
//! - Upload pre-validation
//!
//! # 架构说明
//!
//! `visa-client` 负责所有网络交互，`visa-cli` 提供命令行入口。
//! 本 crate 只定义类型、规则与错误码。

pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod types;
pub mod validation;

pub use error::*;
pub use lifecycle::{CaseStatus, CaseTrigger, GuardContext, TriggerSource};
pub use registry::{all_status_meta, status_meta, StatusMeta};
pub use types::*;
pub use validation::{SaveMode, ValidatedStep, ValidationErrors, WizardStep};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
