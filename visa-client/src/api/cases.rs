//! Cases

use serde_json::json;
use tracing::{info, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::{
    ActivityEntry, Attachment, Case, CaseId, CaseListQuery, CaseStatus, CreateCaseRequest, Paginated,
    UpdateCaseRequest,
};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::transport::ApiRequest;

pub struct CasesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CasesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &CaseListQuery) -> ClientResult<Paginated<Case>> {
        self.client
            .fetch(ApiRequest::get("/cases").query(query.to_pairs()))
            .await
    }

    pub async fn create(&self, request: &CreateCaseRequest) -> ClientResult<Case> {
        let case: Case = self
            .client
            .fetch(ApiRequest::post("/cases").json(request)?)
            .instrument(LogContext::new(operations::CASE_CREATE).span())
            .await?;
        info!(case_id = %case.id, visa_type = %case.visa_type, "Case created");
        Ok(case)
    }

    pub async fn get(&self, id: &CaseId) -> ClientResult<Case> {
        self.client.fetch(ApiRequest::get(format!("/cases/{}", id))).await
    }

    pub async fn update(&self, id: &CaseId, request: &UpdateCaseRequest) -> ClientResult<Case> {
        self.client
            .fetch(ApiRequest::patch(format!("/cases/{}", id)).json(request)?)
            .await
    }

    /// Request a status change; the backend decides whether it applies
    pub async fn update_status(&self, id: &CaseId, status: CaseStatus) -> ClientResult<()> {
        self.client
            .send(ApiRequest::patch(format!("/cases/{}", id)).json(&json!({ "status": status }))?)
            .await
    }

    pub async fn delete(&self, id: &CaseId) -> ClientResult<()> {
        self.client
            .send(ApiRequest::delete(format!("/cases/{}", id)))
            .instrument(LogContext::new(operations::CASE_DELETE).with_case_id(id).span())
            .await?;
        info!(case_id = %id, "Case deleted");
        Ok(())
    }

    /// Backend-owned activity timeline
    pub async fn timeline(&self, id: &CaseId) -> ClientResult<Vec<ActivityEntry>> {
        Ok(self
            .client
            .call(ApiRequest::get(format!("/cases/{}/timeline", id)))
            .await?
            .unwrap_or_default())
    }

    pub async fn attachments(&self, id: &CaseId) -> ClientResult<Vec<Attachment>> {
        Ok(self
            .client
            .call(ApiRequest::get(format!("/cases/{}/attachments", id)))
            .await?
            .unwrap_or_default())
    }
}
