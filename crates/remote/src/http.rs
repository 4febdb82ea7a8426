//! reqwest-backed implementations of the API traits.
//!
//! Requests carry no client-enforced timeout; they resolve or reject per the
//! transport's own behavior.

use async_trait::async_trait;
use models::{NotificationEvent, WorkItem, WorkItemStatus};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;
use utils::response::ApiResponse;

use crate::{
    ApiError, NotificationApi, WorkItemApi,
    error::map_reqwest_error,
};

#[derive(Debug, Serialize)]
struct UpdateStatusRequest {
    status: WorkItemStatus,
}

/// Work item endpoints for one board. `resource` is the path segment the
/// backend serves the board under ("tasks", "sprints").
#[derive(Debug, Clone)]
pub struct HttpWorkItemClient {
    http: Client,
    base: Url,
    resource: String,
}

impl HttpWorkItemClient {
    pub fn new(base: Url, resource: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base,
            resource: resource.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::Url(e.to_string()))
    }
}

#[async_trait]
impl WorkItemApi for HttpWorkItemClient {
    async fn update_status(&self, id: &str, status: WorkItemStatus) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/{}/{}/status", self.resource, id))?;
        let response = self
            .http
            .put(url)
            .json(&UpdateStatusRequest { status })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn fetch_work_items(&self) -> Result<Vec<WorkItem>, ApiError> {
        let url = self.endpoint(&format!("api/{}", self.resource))?;
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        Ok(decode::<Vec<WorkItem>>(response).await?.unwrap_or_default())
    }
}

/// Notification endpoints.
#[derive(Debug, Clone)]
pub struct HttpNotificationClient {
    http: Client,
    base: Url,
}

impl HttpNotificationClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str, user_id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.join(path).map_err(|e| ApiError::Url(e.to_string()))?;
        if let Some(user_id) = user_id {
            url.query_pairs_mut().append_pair("user_id", user_id);
        }
        Ok(url)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationClient {
    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<NotificationEvent>, ApiError> {
        let url = self.endpoint("api/notifications", Some(user_id))?;
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        Ok(decode::<Vec<NotificationEvent>>(response)
            .await?
            .unwrap_or_default())
    }

    async fn fetch_unread_count(&self, user_id: &str) -> Result<i64, ApiError> {
        let url = self.endpoint("api/notifications/unread-count", Some(user_id))?;
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        Ok(decode::<i64>(response).await?.unwrap_or_default())
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/notifications/{id}/read"), None)?;
        let response = self.http.post(url).send().await.map_err(map_reqwest_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/notifications/read-all", Some(user_id))?;
        let response = self.http.post(url).send().await.map_err(map_reqwest_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/notifications/{id}"), None)?;
        let response = self.http.delete(url).send().await.map_err(map_reqwest_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/notifications", Some(user_id))?;
        let response = self.http.delete(url).send().await.map_err(map_reqwest_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned + Default>(response: reqwest::Response) -> Result<Option<T>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Rejected(format!("http {status}")));
    }
    let body: ApiResponse<T> = response.json().await.map_err(map_reqwest_error)?;
    unwrap_envelope(body)
}

fn unwrap_envelope<T>(body: ApiResponse<T>) -> Result<Option<T>, ApiError> {
    if body.success {
        Ok(body.data)
    } else {
        Err(ApiError::Rejected(
            body.message.unwrap_or_else(|| "not successful".to_string()),
        ))
    }
}
