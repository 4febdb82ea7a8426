//! Live notification feed: a push-delivered overlay merged over the
//! pull-queried canonical list, deduplicated by identifier.

use std::sync::Arc;

use backon::{ConstantBuilder, Retryable};
use models::NotificationEvent;
use remote::{ApiError, NotificationApi};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info, warn};

use super::{
    channel::{ChannelIdentity, ChannelSignal, EventChannel},
    config::ChannelConfig,
    toast::{Toast, ToastController},
};

/// Deduplicated feed state for one user. Best-effort: remote mutation
/// failures surface as an error toast and are otherwise swallowed.
pub struct FeedMerger<A> {
    api: Arc<A>,
    user_id: String,
    overlay: Arc<RwLock<Vec<NotificationEvent>>>,
    canonical: Arc<RwLock<Vec<NotificationEvent>>>,
    unread: Arc<RwLock<i64>>,
    toasts: ToastController,
}

impl<A> Clone for FeedMerger<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            user_id: self.user_id.clone(),
            overlay: Arc::clone(&self.overlay),
            canonical: Arc::clone(&self.canonical),
            unread: Arc::clone(&self.unread),
            toasts: self.toasts.clone(),
        }
    }
}

impl<A: NotificationApi + 'static> FeedMerger<A> {
    pub fn new(api: Arc<A>, user_id: impl Into<String>, toasts: ToastController) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            overlay: Arc::new(RwLock::new(Vec::new())),
            canonical: Arc::new(RwLock::new(Vec::new())),
            unread: Arc::new(RwLock::new(0)),
            toasts,
        }
    }

    /// Handle one push-delivered event: drop it if it is already visible,
    /// otherwise overlay it, toast it, and kick off a background refresh of
    /// the canonical data.
    pub async fn on_push_event(&self, event: NotificationEvent) {
        {
            let canonical = self.canonical.read().await;
            if canonical.iter().any(|c| c.id == event.id) {
                debug!(id = %event.id, "push event already canonical, dropped");
                return;
            }
        }
        {
            let mut overlay = self.overlay.write().await;
            if overlay.iter().any(|e| e.id == event.id) {
                debug!(id = %event.id, "push event already overlaid, dropped");
                return;
            }
            overlay.insert(0, event.clone());
        }
        self.toasts.show(Toast::event(event)).await;
        self.spawn_refresh();
    }

    /// The rendered feed: overlay entries not yet present canonically, newest
    /// first, followed by the canonical list. No identifier appears twice.
    pub async fn feed(&self) -> Vec<NotificationEvent> {
        let overlay = self.overlay.read().await;
        let canonical = self.canonical.read().await;
        overlay
            .iter()
            .filter(|e| !canonical.iter().any(|c| c.id == e.id))
            .chain(canonical.iter())
            .cloned()
            .collect()
    }

    pub async fn unread_count(&self) -> i64 {
        *self.unread.read().await
    }

    /// Refetch the canonical list and unread count. Failures keep the
    /// previous data.
    pub async fn refresh(&self) {
        match self.api.fetch_notifications(&self.user_id).await {
            Ok(list) => *self.canonical.write().await = list,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "notification refetch failed");
            }
        }
        match self.api.fetch_unread_count(&self.user_id).await {
            Ok(count) => *self.unread.write().await = count,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "unread count refetch failed");
            }
        }
    }

    fn spawn_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move { this.refresh().await });
    }

    pub async fn mark_read(&self, id: &str) {
        match self.api.mark_read(id).await {
            Ok(()) => {
                self.toasts
                    .show(Toast::success("Notification marked read"))
                    .await;
                self.refresh().await;
            }
            Err(e) => self.report_failure("mark notification read", e).await,
        }
    }

    /// Marks everything read. The overlay is cleared whether or not the
    /// remote call lands; a failure is only toast-reported.
    pub async fn mark_all_read(&self) {
        self.overlay.write().await.clear();
        match self.api.mark_all_read(&self.user_id).await {
            Ok(()) => {
                self.toasts
                    .show(Toast::success("All notifications marked read"))
                    .await;
                self.refresh().await;
            }
            Err(e) => self.report_failure("mark all notifications read", e).await,
        }
    }

    pub async fn delete(&self, id: &str) {
        match self.api.delete_notification(id).await {
            Ok(()) => {
                self.toasts.show(Toast::success("Notification deleted")).await;
                self.refresh().await;
            }
            Err(e) => self.report_failure("delete notification", e).await,
        }
    }

    /// Deletes everything. Same overlay policy as [`Self::mark_all_read`].
    pub async fn delete_all(&self) {
        self.overlay.write().await.clear();
        match self.api.delete_all(&self.user_id).await {
            Ok(()) => {
                self.toasts
                    .show(Toast::success("All notifications deleted"))
                    .await;
                self.refresh().await;
            }
            Err(e) => self.report_failure("delete all notifications", e).await,
        }
    }

    async fn report_failure(&self, action: &str, e: ApiError) {
        warn!(user_id = %self.user_id, action, error = %e, "notification mutation failed");
        self.toasts
            .show(Toast::error(format!("Failed to {action}")))
            .await;
    }
}

/// Owns the feed state and the push connection serving it.
pub struct FeedService<A, C> {
    merger: FeedMerger<A>,
    channel: Arc<C>,
    config: ChannelConfig,
    conn: RwLock<Option<Connection>>,
}

struct Connection {
    identity: ChannelIdentity,
    task: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<A, C> FeedService<A, C>
where
    A: NotificationApi + 'static,
    C: EventChannel,
{
    pub fn new(merger: FeedMerger<A>, channel: Arc<C>, config: ChannelConfig) -> Self {
        Self {
            merger,
            channel,
            config,
            conn: RwLock::new(None),
        }
    }

    pub fn merger(&self) -> &FeedMerger<A> {
        &self.merger
    }

    /// Point the push connection at `identity`. Any existing connection is
    /// torn down before the replacement is established — never two live
    /// connections for one logical session. Setting the same identity again
    /// keeps the current connection; `None` disconnects.
    pub async fn set_identity(&self, identity: Option<ChannelIdentity>) {
        let mut conn = self.conn.write().await;
        if conn.as_ref().map(|c| &c.identity) == identity.as_ref() {
            return;
        }
        *conn = None;
        if let Some(identity) = identity {
            info!(user_id = %identity.user_id, "connecting push channel");
            let task = tokio::spawn(run_connection(
                Arc::clone(&self.channel),
                self.config.clone(),
                identity.clone(),
                self.merger.clone(),
            ));
            *conn = Some(Connection { identity, task });
        }
    }

    pub async fn disconnect(&self) {
        self.set_identity(None).await;
    }
}

/// Connection supervisor: connect with a bounded constant-delay retry,
/// forward events into the merger, reconnect after a drop. Once the retry
/// budget is exhausted the feed degrades to pull-only.
async fn run_connection<A, C>(
    channel: Arc<C>,
    config: ChannelConfig,
    identity: ChannelIdentity,
    merger: FeedMerger<A>,
) where
    A: NotificationApi + 'static,
    C: EventChannel,
{
    loop {
        let connect = || {
            let channel = Arc::clone(&channel);
            let identity = identity.clone();
            async move { channel.connect(&identity).await }
        };
        let mut signals = match connect
            .retry(
                ConstantBuilder::default()
                    .with_delay(config.retry_delay())
                    .with_max_times(config.max_attempts.saturating_sub(1)),
            )
            .await
        {
            Ok(signals) => signals,
            Err(e) => {
                warn!(
                    user_id = %identity.user_id,
                    error = %e,
                    "push channel unavailable, live updates stopped"
                );
                return;
            }
        };
        while let Some(signal) = signals.recv().await {
            match signal {
                ChannelSignal::Connected => {
                    info!(user_id = %identity.user_id, "push channel connected");
                }
                ChannelSignal::Disconnected { reason } => {
                    warn!(
                        user_id = %identity.user_id,
                        reason = %reason,
                        "push channel dropped, reconnecting"
                    );
                    break;
                }
                ChannelSignal::Event(event) => merger.on_push_event(event).await,
            }
        }
    }
}
