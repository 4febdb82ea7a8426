use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A notification delivered either by the push channel or by the canonical
/// query. Partial payloads are tolerated; absent fields fall back to empty
/// string / false / none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct NotificationEvent {
    pub id: String,
    #[serde(default)]
    pub message: String,
    /// Open set; selects icon and color in the view, never branched on here.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: String,
}

impl NotificationEvent {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            kind: String::new(),
            read: false,
            created_at: None,
            user_id: String::new(),
        }
    }
}
