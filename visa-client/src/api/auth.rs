//! Authentication

use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};
use visa_core::logging::{operations, LogContext};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::session::{Credentials, UserProfile};
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for tokens and start the session
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> ClientResult<UserProfile> {
        self.sign_in(email, password, remember_me)
            .instrument(LogContext::new(operations::LOGIN).span())
            .await
    }

    async fn sign_in(&self, email: &str, password: &str, remember_me: bool) -> ClientResult<UserProfile> {
        let request = ApiRequest::post("/auth/login")
            .json(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })?
            .anonymous();
        let response: LoginResponse = self.client.fetch(request).await?;

        self.client
            .session()
            .sign_in(Credentials {
                access_token: response.access_token,
                refresh_token: response.refresh_token,
                user: response.user,
                remember_me,
            })
            .await?;

        // Older backends omit the user from the login response
        let user = match self.client.session().user().await {
            Some(user) => user,
            None => self.me().await?,
        };
        info!(user = %user.email, "Login successful");
        Ok(user)
    }

    /// Current user as seen by the backend
    pub async fn me(&self) -> ClientResult<UserProfile> {
        self.client.fetch(ApiRequest::get("/auth/me")).await
    }

    /// End the session locally
    pub async fn logout(&self) {
        self.client
            .session()
            .sign_out()
            .instrument(LogContext::new(operations::LOGOUT).span())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::MockTransport;
    use crate::session::SessionContext;
    use crate::transport::HttpMethod;
    use crate::ApiClient;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_starts_session() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            HttpMethod::Post,
            "/auth/login",
            200,
            json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "token_type": "bearer",
                "user": { "id": "u1", "email": "li@agency.cn", "full_name": "Li", "role": "consultant" }
            }),
        );
        let client = ApiClient::new(mock.clone(), SessionContext::new());

        let user = client.auth().login("li@agency.cn ", "pw", false).await.unwrap();
        assert_eq!(user.email, "li@agency.cn");
        assert_eq!(client.session().access_token().await.as_deref(), Some("a1"));
        assert!(mock.requests()[0].bearer.is_none());

        client.auth().logout().await;
        assert!(!client.session().is_signed_in().await);
    }

    #[tokio::test]
    async fn test_login_falls_back_to_me() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Post, "/auth/login", 200, json!({ "access_token": "a1" }));
        mock.respond(HttpMethod::Get, "/auth/me", 200, json!({ "id": "u1", "email": "wang@agency.cn" }));
        let client = ApiClient::new(mock.clone(), SessionContext::new());

        let user = client.auth().login("wang@agency.cn", "pw", false).await.unwrap();
        assert_eq!(user.email, "wang@agency.cn");
        assert_eq!(mock.requests()[1].bearer.as_deref(), Some("a1"));
    }
}
