//! Session Context
//!
//! Credentials and the client wizard session live in one injected object
//! shared by every service. Lifecycle:
//!
//! ```text
//! sign_in ──→ (replace_tokens)* ──→ sign_out
//!                                    ↑
//!                        unrecoverable 401
//! ```
//!
//! Credentials are persisted through a [`CredentialStore`] only when the
//! user asked to be remembered.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use visa_core::{CaseId, ConsultantId, LinkToken, OrganizationId};

use crate::error::{ClientError, ClientResult};

/// Signed-in consultant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ConsultantId,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub remember_me: bool,
}

/// Client-side wizard access, scoped to the running process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub client_token: LinkToken,
    pub case_id: Option<CaseId>,
}

/// Persistence for remembered credentials
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<Credentials>>;
    fn save(&self, credentials: &Credentials) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// JSON file credential store
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> ClientResult<Option<Credentials>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::storage(e.to_string())),
        }
    }

    fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        let json = serde_json::to_vec_pretty(credentials)?;
        std::fs::write(&self.path, json).map_err(|e| ClientError::storage(e.to_string()))
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::storage(e.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    credentials: Option<Credentials>,
    wizard: Option<WizardSession>,
}

/// Shared session handle; clones refer to the same session
#[derive(Clone, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl SessionContext {
    /// In-memory session
    pub fn new() -> Self {
        Self::default()
    }

    /// Session backed by a credential store
    pub fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            state: Arc::default(),
            store: Some(store),
        }
    }

    /// Load remembered credentials, if any
    pub async fn restore(&self) -> ClientResult<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(credentials) = store.load()? else {
            return Ok(false);
        };
        debug!(remember_me = credentials.remember_me, "Restored credentials");
        self.state.write().await.credentials = Some(credentials);
        Ok(true)
    }

    pub async fn sign_in(&self, credentials: Credentials) -> ClientResult<()> {
        if credentials.remember_me {
            if let Some(store) = &self.store {
                store.save(&credentials)?;
            }
        }
        info!(
            user = credentials.user.as_ref().map(|u| u.email.as_str()).unwrap_or(""),
            remember_me = credentials.remember_me,
            "Signed in"
        );
        self.state.write().await.credentials = Some(credentials);
        Ok(())
    }

    /// Clear credentials and wizard session
    pub async fn sign_out(&self) {
        {
            let mut state = self.state.write().await;
            state.credentials = None;
            state.wizard = None;
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to clear stored credentials");
            }
        }
        info!("Signed out");
    }

    /// Swap in refreshed tokens, keeping user and remember flag
    pub async fn replace_tokens(&self, access_token: String, refresh_token: Option<String>) -> ClientResult<()> {
        let mut state = self.state.write().await;
        let credentials = state.credentials.as_mut().ok_or(ClientError::NotSignedIn)?;
        credentials.access_token = access_token;
        if refresh_token.is_some() {
            credentials.refresh_token = refresh_token;
        }
        if credentials.remember_me {
            if let Some(store) = &self.store {
                store.save(credentials)?;
            }
        }
        Ok(())
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.credentials.as_ref().map(|c| c.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .credentials
            .as_ref()
            .and_then(|c| c.refresh_token.clone())
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.credentials.as_ref().and_then(|c| c.user.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.state.read().await.credentials.is_some()
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.read().await.credentials.clone()
    }

    pub async fn set_wizard(&self, client_token: LinkToken, case_id: Option<CaseId>) {
        self.state.write().await.wizard = Some(WizardSession { client_token, case_id });
    }

    pub async fn wizard(&self) -> Option<WizardSession> {
        self.state.read().await.wizard.clone()
    }

    pub async fn clear_wizard(&self) {
        self.state.write().await.wizard = None;
    }
}
