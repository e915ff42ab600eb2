//! Notification inbox

use tracing::debug;
use visa_core::{CreateNotification, Notification, NotificationId, Paginated, UnreadCount};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::transport::ApiRequest;

/// Inbox filter
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub page: u32,
    pub per_page: u32,
    pub unread_only: bool,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            unread_only: false,
        }
    }
}

impl NotificationQuery {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        if self.unread_only {
            pairs.push(("is_read".to_string(), "false".to_string()));
        }
        pairs
    }
}

pub struct NotificationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NotificationsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &NotificationQuery) -> ClientResult<Paginated<Notification>> {
        self.client
            .fetch(ApiRequest::get("/notifications").query(query.to_pairs()))
            .await
    }

    pub async fn create(&self, request: &CreateNotification) -> ClientResult<Notification> {
        self.client
            .fetch(ApiRequest::post("/notifications").json(request)?)
            .await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> ClientResult<()> {
        self.client
            .send(ApiRequest::patch(format!("/notifications/{}/read", id)))
            .await?;
        debug!(notification_id = %id, "Notification marked read");
        Ok(())
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        self.client.send(ApiRequest::patch("/notifications/read-all")).await
    }

    pub async fn unread_count(&self) -> ClientResult<u64> {
        let count: Option<UnreadCount> = self
            .client
            .call(ApiRequest::get("/notifications/unread-count"))
            .await?;
        Ok(count.unwrap_or_default().unread)
    }
}
