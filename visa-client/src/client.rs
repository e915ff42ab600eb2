//! API Client
//!
//! Wraps a transport with the cross-cutting request policy:
//! bearer attachment, GET retry with backoff, a single token refresh on
//! 401, `detail` decoding and 204 handling.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, warn, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::LinkBook;

use crate::config::ClientConfig;
use crate::detail::ApiDetail;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;
use crate::session::SessionContext;
use crate::transport::{ApiRequest, HttpTransport, RawResponse, ReqwestTransport};

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Visa backend API client
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: SessionContext,
    retry: RetryPolicy,
    link_book: Arc<Mutex<LinkBook>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: SessionContext) -> Self {
        Self {
            transport,
            session,
            retry: RetryPolicy::default(),
            link_book: Arc::new(Mutex::new(LinkBook::new())),
        }
    }

    /// Client over reqwest, configured from `config`
    pub fn from_config(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config.base_url(), config.timeout)?;
        Ok(Self::new(Arc::new(transport), session).with_retry(config.retry.clone()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Links issued or read during this session
    pub(crate) fn link_book(&self) -> MutexGuard<'_, LinkBook> {
        self.link_book.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Send `request` and decode the body; `None` for 204 / empty bodies
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<Option<T>> {
        let response = self.execute(request).await?;
        if response.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&response.body)?))
    }

    /// Send `request` and require a body
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let path = request.path.clone();
        self.call(request)
            .await?
            .ok_or_else(|| ClientError::decode(format!("empty response from {}", path)))
    }

    /// Send `request`, ignoring any body
    pub async fn send(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Full request flow, returning the successful raw response
    pub async fn execute(&self, mut request: ApiRequest) -> ClientResult<RawResponse> {
        let mut refreshed = false;
        loop {
            request.bearer = if request.authenticated {
                self.session.access_token().await
            } else {
                None
            };

            let response = self.send_with_retry(&request).await?;
            if response.is_success() {
                return Ok(response);
            }

            if response.status == 401 && request.authenticated {
                if !refreshed && self.refresh().await.is_ok() {
                    refreshed = true;
                    continue;
                }
                warn!(path = %request.path, refreshed, "Authentication failed, signing out");
                self.session.sign_out().await;
                return Err(ClientError::SessionExpired);
            }

            let detail = ApiDetail::from_body(&response.body);
            let err = ClientError::from_status(response.status, detail, response.retry_after);
            debug!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                error = %err,
                "Request failed"
            );
            return Err(err);
        }
    }

    /// One refresh attempt; never itself refreshed or retried on 401
    async fn refresh(&self) -> ClientResult<()> {
        let token = self.session.refresh_token().await.ok_or(ClientError::NotSignedIn)?;
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest { refresh_token: &token })?
            .anonymous();

        let response = self
            .transport
            .send(&request)
            .instrument(LogContext::new(operations::TOKEN_REFRESH).span())
            .await?;
        if !response.is_success() {
            error!(status = response.status, "Token refresh rejected");
            return Err(ClientError::SessionExpired);
        }
        let tokens: RefreshResponse = serde_json::from_slice(&response.body)?;
        self.session.replace_tokens(tokens.access_token, tokens.refresh_token).await?;
        debug!("Access token refreshed");
        Ok(())
    }

    async fn send_with_retry(&self, request: &ApiRequest) -> ClientResult<RawResponse> {
        let mut attempt = 0;
        loop {
            debug!(method = %request.method, path = %request.path, attempt, "Sending request");
            let response = self.transport.send(request).await?;

            if !self.retry.should_retry(request.method, response.status) || attempt >= self.retry.max_retries {
                return Ok(response);
            }

            attempt += 1;
            let delay = self.retry.delay_for_attempt(attempt, response.retry_after);
            warn!(
                path = %request.path,
                status = response.status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::session::Credentials;
    use crate::transport::HttpMethod;
    use serde_json::json;
    use std::time::Duration;

    async fn signed_in(transport: Arc<MockTransport>) -> ApiClient {
        let session = SessionContext::new();
        session
            .sign_in(Credentials {
                access_token: "old".into(),
                refresh_token: Some("r1".into()),
                user: None,
                remember_me: false,
            })
            .await
            .unwrap();
        ApiClient::new(transport, session)
    }

    #[tokio::test]
    async fn test_bearer_and_no_content() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Delete, "/cases/c1", 204, json!(null));
        let client = signed_in(mock.clone()).await;

        let body: Option<serde_json::Value> = client.call(ApiRequest::delete("/cases/c1")).await.unwrap();
        assert!(body.is_none());
        assert_eq!(mock.requests()[0].bearer.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_refresh_once_then_succeed() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 401, json!({ "detail": "expired" }));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, json!({ "ok": true }));
        mock.respond(HttpMethod::Post, "/auth/refresh", 200, json!({ "access_token": "new" }));
        let client = signed_in(mock.clone()).await;

        let body: serde_json::Value = client.fetch(ApiRequest::get("/cases/c1")).await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(mock.count(HttpMethod::Post, "/auth/refresh"), 1);
        let requests = mock.requests();
        assert_eq!(requests.last().unwrap().bearer.as_deref(), Some("new"));
        assert!(client.session().is_signed_in().await);
    }

    #[tokio::test]
    async fn test_failed_refresh_signs_out() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases", 401, json!({ "detail": "expired" }));
        mock.respond(HttpMethod::Post, "/auth/refresh", 401, json!({ "detail": "bad refresh" }));
        let client = signed_in(mock.clone()).await;

        let err = client.send(ApiRequest::get("/cases")).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(mock.count(HttpMethod::Post, "/auth/refresh"), 1);
        assert_eq!(mock.count(HttpMethod::Get, "/cases"), 1);
        assert!(!client.session().is_signed_in().await);
    }

    #[tokio::test]
    async fn test_second_401_does_not_refresh_again() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases", 401, json!({ "detail": "expired" }));
        mock.respond(HttpMethod::Post, "/auth/refresh", 200, json!({ "access_token": "new" }));
        let client = signed_in(mock.clone()).await;

        let err = client.send(ApiRequest::get("/cases")).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(mock.count(HttpMethod::Post, "/auth/refresh"), 1);
        assert_eq!(mock.count(HttpMethod::Get, "/cases"), 2);
        assert!(!client.session().is_signed_in().await);
    }

    #[tokio::test]
    async fn test_anonymous_401_is_plain_error() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Post, "/auth/login", 401, json!({ "detail": "邮箱或密码错误" }));
        let client = ApiClient::new(mock.clone(), SessionContext::new());

        let err = client.send(ApiRequest::post("/auth/login").anonymous()).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized { ref message } if message == "邮箱或密码错误"));
        assert_eq!(mock.count(HttpMethod::Post, "/auth/refresh"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_retries_are_bounded() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/statistics/overview", 500, json!({ "detail": "boom" }));
        let client = signed_in(mock.clone()).await;

        let err = client.send(ApiRequest::get("/statistics/overview")).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 500, .. }));

        let times = mock.times(HttpMethod::Get, "/statistics/overview");
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert!(first_gap >= Duration::from_millis(250));
        assert!(second_gap >= first_gap);
        assert!(second_gap <= Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_never_retried() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Post, "/cases", 500, json!({ "detail": "boom" }));
        let client = signed_in(mock.clone()).await;

        let err = client.send(ApiRequest::post("/cases")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(mock.count(HttpMethod::Post, "/cases"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases", 429, json!({ "detail": "slow down" }));
        mock.respond(HttpMethod::Get, "/cases", 200, json!([]));
        let client = signed_in(mock.clone()).await;

        let body: Vec<serde_json::Value> = client.fetch(ApiRequest::get("/cases")).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(mock.count(HttpMethod::Get, "/cases"), 2);
    }

    #[tokio::test]
    async fn test_validation_detail_mapped() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            HttpMethod::Post,
            "/cases",
            422,
            json!({ "detail": [{ "loc": ["body", "applicant", "email"], "msg": "invalid email" }] }),
        );
        let client = signed_in(mock.clone()).await;

        match client.send(ApiRequest::post("/cases")).await.unwrap_err() {
            ClientError::Unprocessable { message, fields } => {
                assert_eq!(message, "invalid email");
                assert!(fields.contains("applicant.email"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
