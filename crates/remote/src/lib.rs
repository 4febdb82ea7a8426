//! REST seam between the client components and the backend.
//!
//! The backend is an opaque collaborator: every operation either succeeds or
//! fails, and a failure carries nothing beyond a message. Components depend on
//! the traits here; `http` provides the reqwest-backed implementations.

pub mod error;
pub mod http;

use async_trait::async_trait;
use models::{NotificationEvent, WorkItem, WorkItemStatus};

pub use error::ApiError;
pub use http::{HttpNotificationClient, HttpWorkItemClient};

/// Remote store backing a board.
#[async_trait]
pub trait WorkItemApi: Send + Sync {
    /// Persist a status change for one item.
    async fn update_status(&self, id: &str, status: WorkItemStatus) -> Result<(), ApiError>;

    /// Canonical ordered read of the full list.
    async fn fetch_work_items(&self) -> Result<Vec<WorkItem>, ApiError>;
}

/// Remote notification store and its mutations.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<NotificationEvent>, ApiError>;

    async fn fetch_unread_count(&self, user_id: &str) -> Result<i64, ApiError>;

    async fn mark_read(&self, id: &str) -> Result<(), ApiError>;

    async fn mark_all_read(&self, user_id: &str) -> Result<(), ApiError>;

    async fn delete_notification(&self, id: &str) -> Result<(), ApiError>;

    async fn delete_all(&self, user_id: &str) -> Result<(), ApiError>;
}
