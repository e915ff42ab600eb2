//! Translation comparison

use tracing::info;
use visa_core::{CaseId, JobState, JobStatus, TranslationComparison, TranslationField, TranslationFieldId, TranslationFieldUpdate};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::polling::{poll_until_complete, PollConfig};
use crate::transport::ApiRequest;

pub struct TranslationApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TranslationApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Source and translated values side by side
    pub async fn comparison(&self, case_id: &CaseId) -> ClientResult<TranslationComparison> {
        self.client
            .fetch(ApiRequest::get(format!("/cases/{}/translation-comparison", case_id)))
            .await
    }

    /// Overwrite one translated value; returns the stored field
    pub async fn update_field(&self, field_id: &TranslationFieldId, value: &str) -> ClientResult<TranslationField> {
        let field: TranslationField = self
            .client
            .fetch(
                ApiRequest::patch(format!("/translation/fields/{}", field_id)).json(&TranslationFieldUpdate {
                    translated_value: value.to_string(),
                })?,
            )
            .await?;
        info!(field_id = %field_id, "Translation field updated");
        Ok(field)
    }

    pub async fn start(&self, case_id: &CaseId) -> ClientResult<JobStatus> {
        let status = self
            .client
            .call(ApiRequest::post(format!("/cases/{}/translation", case_id)))
            .await?
            .unwrap_or(JobStatus {
                status: JobState::Pending,
                progress: None,
                message: None,
            });
        info!(case_id = %case_id, "Translation started");
        Ok(status)
    }

    pub async fn status(&self, case_id: &CaseId) -> ClientResult<JobStatus> {
        self.client
            .fetch(ApiRequest::get(format!("/cases/{}/translation/status", case_id)))
            .await
    }

    /// Poll until the translation job finishes, then load the comparison
    pub async fn wait_for_comparison(&self, case_id: &CaseId, config: &PollConfig) -> ClientResult<TranslationComparison> {
        let finished = poll_until_complete(config, || async {
            let status = self.status(case_id).await?;
            Ok(status.status.is_finished().then_some(status))
        })
        .await?;

        if finished.status == JobState::Failed {
            return Err(ClientError::JobFailed {
                message: finished.message.unwrap_or_else(|| "translation failed".to_string()),
            });
        }
        self.comparison(case_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::MockTransport;
    use crate::polling::PollConfig;
    use crate::session::SessionContext;
    use crate::transport::{HttpMethod, RequestBody};
    use crate::ApiClient;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use visa_core::{CaseId, TranslationFieldId};

    #[tokio::test]
    async fn test_update_field_sends_value() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            HttpMethod::Patch,
            "/translation/fields/f1",
            200,
            json!({
                "id": "f1", "field_name": "employer_name",
                "source_value": "北京科技有限公司", "translated_value": "Beijing Tech Co., Ltd.",
                "edited": true
            }),
        );
        let client = ApiClient::new(mock.clone(), SessionContext::new());

        let field = client
            .translation()
            .update_field(&TranslationFieldId::new("f1"), "Beijing Tech Co., Ltd.")
            .await
            .unwrap();
        assert!(field.edited);
        assert_eq!(
            mock.requests()[0].body,
            RequestBody::Json(json!({ "translated_value": "Beijing Tech Co., Ltd." }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_comparison() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1/translation/status", 200, json!({ "status": "pending" }));
        mock.respond(HttpMethod::Get, "/cases/c1/translation/status", 200, json!({ "status": "completed" }));
        mock.respond(
            HttpMethod::Get,
            "/cases/c1/translation-comparison",
            200,
            json!({ "case_id": "c1", "status": "completed", "fields": [] }),
        );
        let client = ApiClient::new(mock.clone(), SessionContext::new());

        let config = PollConfig {
            interval: Duration::from_secs(5),
            window: Duration::from_secs(30),
        };
        let comparison = client
            .translation()
            .wait_for_comparison(&CaseId::new("c1"), &config)
            .await
            .unwrap();
        assert!(comparison.fields.is_empty());
        assert_eq!(mock.count(HttpMethod::Get, "/cases/c1/translation/status"), 2);
    }
}
