//! Visa Client - backend boundary for the visa consulting desk
//!
//! Typed REST access to the case backend, plus the client-side policies
//! around it:
//! - injected session context with single-shot token refresh
//! - GET retry with exponential backoff and jitter
//! - bounded status polling with teardown cancellation
//! - guarded case transitions with authoritative re-fetch
//! - pending/confirmed translation edits

pub mod api;
pub mod client;
pub mod config;
pub mod detail;
pub mod editor;
pub mod error;
pub mod polling;
pub mod retry;
pub mod session;
pub mod transport;
pub mod view;
pub mod workflow;

#[cfg(test)]
mod mock;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use editor::{EditState, TranslationEditor};
pub use error::{ClientError, ClientResult};
pub use polling::{poll_until_complete, PollConfig, PollHandle};
pub use retry::RetryPolicy;
pub use session::{CredentialStore, Credentials, FileCredentialStore, SessionContext, UserProfile, WizardSession};
pub use transport::{ApiRequest, HttpMethod, HttpTransport, RawResponse, ReqwestTransport};
pub use view::{CaseView, Notifier, Toast, ToastLevel};
pub use workflow::{CaseWorkflow, TransitionAttempt};
