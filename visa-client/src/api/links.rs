//! Client links
//!
//! Every link issued or read through the client is recorded in the
//! session's `LinkBook`, so at most one link per case reads as active.

use chrono::Utc;
use tracing::{debug, info, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::{CaseId, CaseLink, GenerateLinkRequest, LinkStatus, LinkToken};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::ApiRequest;

pub struct LinksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> LinksApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Issue a new link, superseding the previous active link of the case
    pub async fn generate(&self, case_id: &CaseId, request: &GenerateLinkRequest) -> ClientResult<CaseLink> {
        let link: CaseLink = self
            .client
            .fetch(ApiRequest::post(format!("/cases/{}/links", case_id)).json(request)?)
            .instrument(LogContext::new(operations::LINK_ISSUE).with_case_id(case_id).span())
            .await?;
        if let Some(previous) = self.client.link_book().issue(link.clone()) {
            debug!(case_id = %case_id, superseded = %previous.token, "Previous client link revoked");
        }
        info!(case_id = %case_id, expires_at = %link.expires_at, "Client link issued");
        Ok(link)
    }

    /// Active link of a case, if any
    pub async fn current(&self, case_id: &CaseId) -> ClientResult<Option<CaseLink>> {
        let link: Option<CaseLink> = match self
            .client
            .call(ApiRequest::get(format!("/cases/{}/links/current", case_id)))
            .await
        {
            Err(ClientError::NotFound { .. }) => None,
            other => other?,
        };
        if let Some(link) = &link {
            self.client.link_book().observe(link.clone());
        }
        Ok(link)
    }

    /// Usable link of a case already seen in this session
    pub fn known_active(&self, case_id: &CaseId) -> Option<CaseLink> {
        self.client.link_book().active(case_id, Utc::now()).cloned()
    }

    pub async fn revoke(&self, token: &LinkToken) -> ClientResult<()> {
        self.client
            .send(ApiRequest::post(format!("/links/{}/revoke", token)))
            .instrument(LogContext::new(operations::LINK_REVOKE).span())
            .await?;
        if let Err(e) = self.client.link_book().set_status(token, LinkStatus::Revoked) {
            debug!(error = %e, "Revoked link was not tracked locally");
        }
        info!("Client link revoked");
        Ok(())
    }
}
