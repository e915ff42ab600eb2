//! Translation field editing
//!
//! An edit shows the new value immediately but stays `Pending` until the
//! backend confirms it. A rejected write restores the previous value.

use std::collections::HashMap;
use tracing::{debug, warn, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::{CaseId, TranslationComparison, TranslationField, TranslationFieldId};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};

/// Sync state of one edited field
#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    /// Sent, not yet confirmed; holds the value to restore on failure
    Pending { previous: String },
    Confirmed,
    /// Last write was rejected and rolled back
    Failed { message: String },
}

pub struct TranslationEditor {
    client: ApiClient,
    comparison: TranslationComparison,
    states: HashMap<TranslationFieldId, EditState>,
}

impl TranslationEditor {
    pub fn new(client: ApiClient, comparison: TranslationComparison) -> Self {
        Self {
            client,
            comparison,
            states: HashMap::new(),
        }
    }

    /// Load the comparison of a case
    pub async fn load(client: ApiClient, case_id: &CaseId) -> ClientResult<Self> {
        let comparison = client.translation().comparison(case_id).await?;
        Ok(Self::new(client, comparison))
    }

    pub fn comparison(&self) -> &TranslationComparison {
        &self.comparison
    }

    pub fn field(&self, id: &TranslationFieldId) -> Option<&TranslationField> {
        self.comparison.field(id)
    }

    pub fn state(&self, id: &TranslationFieldId) -> Option<&EditState> {
        self.states.get(id)
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, EditState::Pending { .. }))
            .count()
    }

    /// Show `value` locally and mark the field pending
    pub fn begin(&mut self, id: &TranslationFieldId, value: &str) -> ClientResult<()> {
        if matches!(self.states.get(id), Some(EditState::Pending { .. })) {
            return Err(ClientError::ActionInFlight {
                action: format!("edit {}", id),
            });
        }
        let field = self.comparison.field_mut(id).ok_or_else(|| ClientError::NotFound {
            message: format!("translation field {}", id),
        })?;
        let previous = std::mem::replace(&mut field.translated_value, value.trim().to_string());
        self.states.insert(id.clone(), EditState::Pending { previous });
        Ok(())
    }

    /// Send the pending value of `id`, confirming or rolling back
    pub async fn commit(&mut self, id: &TranslationFieldId) -> ClientResult<()> {
        let Some(EditState::Pending { previous }) = self.states.get(id).cloned() else {
            return Ok(());
        };
        let value = self
            .comparison
            .field(id)
            .map(|f| f.translated_value.clone())
            .unwrap_or_default();

        let span = LogContext::new(operations::TRANSLATION_EDIT)
            .with_case_id(&self.comparison.case_id)
            .span();
        match self.client.translation().update_field(id, &value).instrument(span).await {
            Ok(stored) => {
                if let Some(field) = self.comparison.field_mut(id) {
                    *field = stored;
                }
                self.states.insert(id.clone(), EditState::Confirmed);
                debug!(field_id = %id, "Translation edit confirmed");
                Ok(())
            }
            Err(e) => {
                if let Some(field) = self.comparison.field_mut(id) {
                    field.translated_value = previous;
                }
                warn!(field_id = %id, error = %e, "Translation edit rolled back");
                self.states.insert(
                    id.clone(),
                    EditState::Failed {
                        message: e.user_message(),
                    },
                );
                Err(e)
            }
        }
    }

    /// `begin` then `commit`
    pub async fn edit(&mut self, id: &TranslationFieldId, value: &str) -> ClientResult<()> {
        self.begin(id, value)?;
        self.commit(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::session::SessionContext;
    use crate::transport::HttpMethod;
    use serde_json::json;
    use std::sync::Arc;

    fn comparison() -> serde_json::Value {
        json!({
            "case_id": "c1", "status": "completed",
            "fields": [{
                "id": "f1", "field_name": "employer_name", "label": "工作单位",
                "source_value": "北京科技有限公司", "translated_value": "Beijing Tech",
                "confidence": 0.6
            }]
        })
    }

    async fn editor(mock: &Arc<MockTransport>) -> TranslationEditor {
        mock.respond(HttpMethod::Get, "/cases/c1/translation-comparison", 200, comparison());
        let client = ApiClient::new(mock.clone(), SessionContext::new());
        TranslationEditor::load(client, &CaseId::new("c1")).await.unwrap()
    }

    #[tokio::test]
    async fn test_rollback_on_failure() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Patch, "/translation/fields/f1", 422, json!({ "detail": "value too long" }));
        let mut editor = editor(&mock).await;
        let id = TranslationFieldId::new("f1");

        editor.begin(&id, "Beijing Technology Co., Ltd.").unwrap();
        assert_eq!(editor.field(&id).unwrap().translated_value, "Beijing Technology Co., Ltd.");
        assert_eq!(editor.pending_count(), 1);

        assert!(editor.commit(&id).await.is_err());
        assert_eq!(editor.field(&id).unwrap().translated_value, "Beijing Tech");
        assert_eq!(
            editor.state(&id),
            Some(&EditState::Failed {
                message: "value too long".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_confirmed_takes_backend_value() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            HttpMethod::Patch,
            "/translation/fields/f1",
            200,
            json!({
                "id": "f1", "field_name": "employer_name", "label": "工作单位",
                "source_value": "北京科技有限公司", "translated_value": "Beijing Technology Co., Ltd.",
                "edited": true
            }),
        );
        let mut editor = editor(&mock).await;
        let id = TranslationFieldId::new("f1");

        editor.edit(&id, " Beijing Technology Co., Ltd. ").await.unwrap();
        let field = editor.field(&id).unwrap();
        assert!(field.edited);
        assert!(!field.needs_review());
        assert_eq!(editor.state(&id), Some(&EditState::Confirmed));
    }

    #[tokio::test]
    async fn test_pending_field_blocks_second_edit() {
        let mock = Arc::new(MockTransport::new());
        let mut editor = editor(&mock).await;
        let id = TranslationFieldId::new("f1");

        editor.begin(&id, "A").unwrap();
        assert!(matches!(editor.begin(&id, "B"), Err(ClientError::ActionInFlight { .. })));
        assert!(matches!(
            editor.begin(&TranslationFieldId::new("nope"), "B"),
            Err(ClientError::NotFound { .. })
        ));
    }
}
