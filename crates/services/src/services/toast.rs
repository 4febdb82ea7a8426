//! Single-slot transient toast state with auto-dismiss.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use models::NotificationEvent;
use tokio::sync::RwLock;

/// How long a toast stays up when not dismissed explicitly.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    /// Set when the toast announces a live notification; the view uses the
    /// event's kind to pick an icon.
    pub event: Option<NotificationEvent>,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
            event: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
            event: None,
        }
    }

    pub fn event(event: NotificationEvent) -> Self {
        Self {
            level: ToastLevel::Info,
            message: event.message.clone(),
            event: Some(event),
        }
    }
}

/// At most one toast is displayed at a time. A new toast replaces the current
/// one and re-arms the dismiss timer; the replaced toast's timer is disarmed
/// by the generation check. Last event wins, there is no queue.
#[derive(Clone)]
pub struct ToastController {
    inner: Arc<Inner>,
}

struct Inner {
    current: RwLock<Option<Toast>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl ToastController {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(None),
                generation: AtomicU64::new(0),
                ttl,
            }),
        }
    }

    /// Display `toast`, replacing whatever is showing, and schedule its
    /// auto-dismiss.
    pub async fn show(&self, toast: Toast) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.current.write().await = Some(toast);
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.inner.ttl).await;
            this.expire(generation).await;
        });
    }

    /// User-initiated dismissal.
    pub async fn dismiss(&self) {
        *self.inner.current.write().await = None;
    }

    pub async fn current(&self) -> Option<Toast> {
        self.inner.current.read().await.clone()
    }

    async fn expire(&self, generation: u64) {
        if self.inner.generation.load(Ordering::SeqCst) == generation {
            *self.inner.current.write().await = None;
        }
    }
}

impl Default for ToastController {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}
