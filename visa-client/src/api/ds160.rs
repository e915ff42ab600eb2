//! Client wizard (DS-160) endpoints
//!
//! Every call here is scoped by the link token in the path and sent without
//! consultant credentials.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::validation::{content_type_for, validate_step, validate_upload, Ds160Form, UploadKind};
use visa_core::{Attachment, AttachmentId, CaseStatus, LinkToken, SaveMode, ValidatedStep, WizardStep};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::{ApiRequest, FilePart};

/// Stored bucket of one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub is_draft: bool,
}

/// Wizard progress as tracked by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormProgress {
    #[serde(default)]
    pub completed_steps: Vec<WizardStep>,
    #[serde(default)]
    pub percentage: u8,
    #[serde(default)]
    pub case_status: Option<CaseStatus>,
}

impl FormProgress {
    /// First step not yet completed
    pub fn resume_at(&self) -> Option<WizardStep> {
        visa_core::validation::StepRegistry::resume_at(&self.completed_steps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub case_status: CaseStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveStepRequest<'a> {
    data: &'a Map<String, Value>,
    is_draft: bool,
}

pub struct Ds160Api<'a> {
    client: &'a ApiClient,
}

impl<'a> Ds160Api<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn step_path(token: &LinkToken, step: WizardStep) -> String {
        format!("/ds160/{}/steps/{}", token, step.slug())
    }

    /// Saved bucket of `step`; `None` if never saved
    pub async fn get_step(&self, token: &LinkToken, step: WizardStep) -> ClientResult<Option<StepRecord>> {
        match self
            .client
            .call(ApiRequest::get(Self::step_path(token, step)).anonymous())
            .await
        {
            Err(ClientError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    /// Persist an already validated step
    pub async fn save_step(&self, token: &LinkToken, step: &ValidatedStep) -> ClientResult<()> {
        let request = ApiRequest::post(Self::step_path(token, step.step))
            .json(&SaveStepRequest {
                data: &step.data,
                is_draft: step.mode.is_draft(),
            })?
            .anonymous();
        self.client.send(request).await?;
        debug!(step = step.step.slug(), draft = step.mode.is_draft(), "Step saved");
        Ok(())
    }

    /// Validate `input` locally, then save it.
    ///
    /// Invalid input never reaches the network.
    pub async fn save(
        &self,
        token: &LinkToken,
        step: WizardStep,
        input: &Value,
        mode: SaveMode,
    ) -> ClientResult<ValidatedStep> {
        let validated = validate_step(step, input, mode)?;
        self.save_step(token, &validated)
            .instrument(LogContext::new(operations::STEP_SAVE).span())
            .await?;
        Ok(validated)
    }

    pub async fn progress(&self, token: &LinkToken) -> ClientResult<FormProgress> {
        self.client
            .fetch(ApiRequest::get(format!("/ds160/{}/progress", token)).anonymous())
            .await
    }

    /// Load every saved bucket into one form
    pub async fn form(&self, token: &LinkToken) -> ClientResult<Ds160Form> {
        let mut form = Ds160Form::default();
        for step in WizardStep::ALL {
            if let Some(record) = self.get_step(token, step).await? {
                form.merge(step, record.data)?;
            }
        }
        Ok(form)
    }

    /// Hand the completed form over to the consultant
    pub async fn submit(&self, token: &LinkToken) -> ClientResult<SubmitResult> {
        let result: SubmitResult = self
            .client
            .fetch(ApiRequest::post(format!("/ds160/{}/submit", token)).anonymous())
            .instrument(LogContext::new(operations::FORM_SUBMIT).span())
            .await?;
        info!(status = %result.case_status, "Form submitted");
        Ok(result)
    }

    /// Upload a file after checking its size and type locally
    pub async fn upload(
        &self,
        token: &LinkToken,
        kind: UploadKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Attachment> {
        let content_type = content_type_for(file_name);
        validate_upload(kind, file_name, content_type, bytes.len() as u64)?;

        let size = bytes.len();
        let part = FilePart {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
            fields: vec![("document_type".to_string(), kind.as_str().to_string())],
        };
        let attachment: Attachment = self
            .client
            .fetch(
                ApiRequest::post(format!("/ds160/{}/files", token))
                    .multipart(part)
                    .anonymous(),
            )
            .instrument(LogContext::new(operations::FILE_UPLOAD).span())
            .await?;
        info!(file = file_name, size, kind = kind.as_str(), "File uploaded");
        Ok(attachment)
    }

    pub async fn delete_file(&self, token: &LinkToken, file_id: &AttachmentId) -> ClientResult<()> {
        self.client
            .send(ApiRequest::delete(format!("/ds160/{}/files/{}", token, file_id)).anonymous())
            .await
    }
}
