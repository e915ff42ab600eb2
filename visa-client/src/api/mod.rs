//! Resource services
//!
//! Thin typed wrappers over the REST resources. Each service borrows the
//! client, so they are cheap to create per call:
//!
//! ```ignore
//! let case = client.cases().get(&case_id).await?;
//! ```

pub mod auth;
pub mod cases;
pub mod diagnosis;
pub mod ds160;
pub mod links;
pub mod notifications;
pub mod statistics;
pub mod translation;

pub use auth::{AuthApi, LoginRequest, LoginResponse};
pub use cases::CasesApi;
pub use diagnosis::DiagnosisApi;
pub use ds160::{Ds160Api, FormProgress, StepRecord, SubmitResult};
pub use links::LinksApi;
pub use notifications::{NotificationQuery, NotificationsApi};
pub use statistics::StatisticsApi;
pub use translation::TranslationApi;

use crate::client::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn cases(&self) -> CasesApi<'_> {
        CasesApi::new(self)
    }

    pub fn links(&self) -> LinksApi<'_> {
        LinksApi::new(self)
    }

    pub fn diagnosis(&self) -> DiagnosisApi<'_> {
        DiagnosisApi::new(self)
    }

    pub fn translation(&self) -> TranslationApi<'_> {
        TranslationApi::new(self)
    }

    pub fn ds160(&self) -> Ds160Api<'_> {
        Ds160Api::new(self)
    }

    pub fn statistics(&self) -> StatisticsApi<'_> {
        StatisticsApi::new(self)
    }

    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi::new(self)
    }
}
