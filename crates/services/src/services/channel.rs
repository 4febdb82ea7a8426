//! Push channel seam for live notification delivery.

use async_trait::async_trait;
use models::NotificationEvent;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("connection failed: {0}")]
    Connect(String),
}

/// Identity a push connection is scoped to. Changing either field is a new
/// logical session and requires a fresh connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    pub user_id: String,
    pub credential: String,
}

/// Discrete signals a live connection emits.
#[derive(Debug, Clone)]
pub enum ChannelSignal {
    Connected,
    Disconnected { reason: String },
    Event(NotificationEvent),
}

/// Transport-level push connection. Implementations wrap whatever wire the
/// deployment uses; consumers only see the signal stream.
#[async_trait]
pub trait EventChannel: Send + Sync + 'static {
    /// Open a connection scoped to `identity`. The receiver yields signals
    /// until the connection is closed.
    async fn connect(
        &self,
        identity: &ChannelIdentity,
    ) -> Result<mpsc::UnboundedReceiver<ChannelSignal>, ChannelError>;
}
