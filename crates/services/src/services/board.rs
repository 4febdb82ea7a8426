//! Optimistic, lane-partitioned board state over a remote work item store.

use std::sync::Arc;

use models::{Lane, WorkItem};
use remote::WorkItemApi;
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::toast::{Toast, ToastController};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("unknown work item: {0}")]
    UnknownItem(String),
}

/// Which board an instance backs. Affects toast copy and log fields only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BoardKind {
    Tasks,
    Sprints,
}

impl BoardKind {
    const fn title(self) -> &'static str {
        match self {
            Self::Tasks => "Task",
            Self::Sprints => "Sprint",
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Tasks => "task",
            Self::Sprints => "sprint",
        }
    }
}

/// A drop gesture as reported by the drag layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub dragged_id: String,
    pub source_lane: Lane,
    pub dest_lane: Lane,
    /// Position within the destination lane; clamped to the lane length.
    pub dest_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The drop landed where the item already was. Nothing changed and no
    /// remote call was made.
    NoOp,
    /// The remote store accepted the new status; the optimistic order stands.
    Confirmed,
    /// The remote store rejected the update and the board was restored to its
    /// pre-drag state.
    RolledBack,
}

/// Client-local, reorderable, lane-partitioned view of work items backed by a
/// remote store.
///
/// Drops mutate the list before the confirmation round-trip resolves.
/// Overlapping drops are not serialized: a drop issued while an earlier
/// confirmation is outstanding operates on the already-moved list, and a
/// rollback restores the pre-drag snapshot wholesale, discarding the later
/// drop's effect as well. Known limitation; drags are user-paced and
/// single-pointer.
pub struct BoardReconciler<A> {
    kind: BoardKind,
    api: Arc<A>,
    items: Arc<RwLock<Vec<WorkItem>>>,
    toasts: ToastController,
    refresh_tx: mpsc::UnboundedSender<BoardKind>,
}

impl<A> Clone for BoardReconciler<A> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            api: Arc::clone(&self.api),
            items: Arc::clone(&self.items),
            toasts: self.toasts.clone(),
            refresh_tx: self.refresh_tx.clone(),
        }
    }
}

impl<A: WorkItemApi> BoardReconciler<A> {
    pub fn new(
        kind: BoardKind,
        api: Arc<A>,
        toasts: ToastController,
        refresh_tx: mpsc::UnboundedSender<BoardKind>,
    ) -> Self {
        Self {
            kind,
            api,
            items: Arc::new(RwLock::new(Vec::new())),
            toasts,
            refresh_tx,
        }
    }

    /// Replace the whole board with a fresh query result.
    pub async fn replace_all(&self, items: Vec<WorkItem>) {
        *self.items.write().await = items;
    }

    pub async fn items(&self) -> Vec<WorkItem> {
        self.items.read().await.clone()
    }

    /// Items of one lane, in board order.
    pub async fn lane_items(&self, lane: Lane) -> Vec<WorkItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|i| i.lane() == lane)
            .cloned()
            .collect()
    }

    /// Handle a drop gesture: mutate the board immediately, then confirm the
    /// status change against the remote store, rolling back if it rejects.
    pub async fn drop_item(&self, req: DropRequest) -> Result<DropOutcome, BoardError> {
        let (snapshot, new_status) = {
            let mut items = self.items.write().await;
            let from = items
                .iter()
                .position(|i| i.id == req.dragged_id)
                .ok_or_else(|| BoardError::UnknownItem(req.dragged_id.clone()))?;
            let current_lane = items[from].lane();
            if current_lane != req.source_lane {
                debug!(
                    board = %self.kind,
                    id = %req.dragged_id,
                    reported = %req.source_lane,
                    actual = %current_lane,
                    "drag source lane out of date"
                );
            }

            let lane_len = items
                .iter()
                .filter(|i| i.lane() == req.dest_lane && i.id != req.dragged_id)
                .count();
            let dest_index = req.dest_index.min(lane_len);

            let pos_in_lane = items[..from]
                .iter()
                .filter(|i| i.lane() == current_lane)
                .count();
            if current_lane == req.dest_lane && pos_in_lane == dest_index {
                return Ok(DropOutcome::NoOp);
            }

            let snapshot = items.clone();
            let mut item = items.remove(from);
            if current_lane != req.dest_lane {
                item.status = req.dest_lane.entry_status();
            }
            let new_status = item.status;
            let at = absolute_index(&items, req.dest_lane, dest_index, from);
            items.insert(at, item);
            (snapshot, new_status)
        };

        debug!(
            board = %self.kind,
            id = %req.dragged_id,
            status = %new_status,
            "optimistic move applied, confirming"
        );

        match self.api.update_status(&req.dragged_id, new_status).await {
            Ok(()) => {
                self.toasts
                    .show(Toast::success(format!("{} updated", self.kind.title())))
                    .await;
                let _ = self.refresh_tx.send(self.kind);
                Ok(DropOutcome::Confirmed)
            }
            Err(e) => {
                warn!(
                    board = %self.kind,
                    id = %req.dragged_id,
                    error = %e,
                    "status update rejected, restoring board"
                );
                *self.items.write().await = snapshot;
                self.toasts
                    .show(Toast::error(format!("Failed to move {}", self.kind.noun())))
                    .await;
                Ok(DropOutcome::RolledBack)
            }
        }
    }
}

/// Absolute position in the flat sequence for the lane-relative `index`,
/// computed over the list with the dragged item already removed. An empty
/// destination lane renders identically wherever the item sits, so the item
/// keeps its original position `from`.
fn absolute_index(items: &[WorkItem], lane: Lane, index: usize, from: usize) -> usize {
    let mut seen = 0;
    for (i, item) in items.iter().enumerate() {
        if item.lane() == lane {
            if seen == index {
                return i;
            }
            seen += 1;
        }
    }
    match items.iter().rposition(|i| i.lane() == lane) {
        Some(last) => last + 1,
        None => from.min(items.len()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use models::WorkItemStatus;
    use remote::ApiError;
    use tokio::sync::Notify;

    use super::*;
    use crate::services::toast::ToastLevel;

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<(String, WorkItemStatus)>>,
        fail: AtomicBool,
        hold_first: AtomicBool,
        release: Notify,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl WorkItemApi for FakeApi {
        async fn update_status(&self, id: &str, status: WorkItemStatus) -> Result<(), ApiError> {
            let call = self.seen.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push((id.to_string(), status));
            if call == 0 && self.hold_first.load(Ordering::SeqCst) {
                self.release.notified().await;
                return Err(ApiError::Rejected("held call failed".to_string()));
            }
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiError::Rejected("nope".to_string()))
            } else {
                Ok(())
            }
        }

        async fn fetch_work_items(&self) -> Result<Vec<WorkItem>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn item(id: &str, status: WorkItemStatus) -> WorkItem {
        WorkItem::new(id, id.to_uppercase(), status)
    }

    fn drop_req(id: &str, source: Lane, dest: Lane, index: usize) -> DropRequest {
        DropRequest {
            dragged_id: id.to_string(),
            source_lane: source,
            dest_lane: dest,
            dest_index: index,
        }
    }

    async fn setup(
        items: Vec<WorkItem>,
    ) -> (
        BoardReconciler<FakeApi>,
        Arc<FakeApi>,
        mpsc::UnboundedReceiver<BoardKind>,
        ToastController,
    ) {
        let api = Arc::new(FakeApi::default());
        let toasts = ToastController::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let board = BoardReconciler::new(BoardKind::Tasks, Arc::clone(&api), toasts.clone(), tx);
        board.replace_all(items).await;
        (board, api, rx, toasts)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn drop_into_other_lane_applies_immediately() {
        let (board, api, mut rx, toasts) = setup(vec![
            item("t1", WorkItemStatus::Todo),
            item("t2", WorkItemStatus::InProgress),
        ])
        .await;

        let outcome = board
            .drop_item(drop_req("t1", Lane::Todo, Lane::Done, 0))
            .await
            .unwrap();

        assert_eq!(outcome, DropOutcome::Confirmed);
        let items = board.items().await;
        assert_eq!(items[0].id, "t1");
        assert_eq!(items[0].status, WorkItemStatus::Done);
        assert_eq!(items[1].id, "t2");
        assert_eq!(items[1].status, WorkItemStatus::InProgress);
        assert_eq!(
            api.calls.lock().unwrap().as_slice(),
            &[("t1".to_string(), WorkItemStatus::Done)]
        );
        assert_eq!(rx.try_recv().unwrap(), BoardKind::Tasks);
        assert_eq!(toasts.current().await.unwrap().level, ToastLevel::Success);
    }

    #[tokio::test]
    async fn unchanged_position_is_a_noop() {
        let (board, api, mut rx, toasts) = setup(vec![
            item("t1", WorkItemStatus::Todo),
            item("t2", WorkItemStatus::Todo),
        ])
        .await;
        let before = board.items().await;

        let outcome = board
            .drop_item(drop_req("t1", Lane::Todo, Lane::Todo, 0))
            .await
            .unwrap();

        assert_eq!(outcome, DropOutcome::NoOp);
        assert_eq!(board.items().await, before);
        assert!(api.calls.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(toasts.current().await.is_none());
    }

    #[tokio::test]
    async fn rejected_update_restores_previous_order() {
        let (board, api, mut rx, toasts) = setup(vec![
            item("t1", WorkItemStatus::Todo),
            item("t2", WorkItemStatus::InProgress),
        ])
        .await;
        api.fail.store(true, Ordering::SeqCst);
        let before = board.items().await;

        let outcome = board
            .drop_item(drop_req("t1", Lane::Todo, Lane::Done, 0))
            .await
            .unwrap();

        assert_eq!(outcome, DropOutcome::RolledBack);
        assert_eq!(board.items().await, before);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(toasts.current().await.unwrap().level, ToastLevel::Error);
    }

    #[tokio::test]
    async fn dest_index_is_clamped_to_lane_length() {
        let (board, _api, _rx, _toasts) = setup(vec![
            item("a", WorkItemStatus::Todo),
            item("b", WorkItemStatus::Todo),
            item("c", WorkItemStatus::Done),
        ])
        .await;

        board
            .drop_item(drop_req("a", Lane::Todo, Lane::Done, 99))
            .await
            .unwrap();

        let done = board.lane_items(Lane::Done).await;
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].id, "c");
        assert_eq!(done[1].id, "a");
    }

    #[tokio::test]
    async fn within_lane_reorder_echoes_status() {
        let (board, api, _rx, _toasts) = setup(vec![
            item("a", WorkItemStatus::InProgress),
            item("b", WorkItemStatus::InProgress),
            item("c", WorkItemStatus::InProgress),
        ])
        .await;

        board
            .drop_item(drop_req("a", Lane::InProgress, Lane::InProgress, 2))
            .await
            .unwrap();

        let order: Vec<_> = board.items().await.into_iter().map(|i| i.id).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(
            api.calls.lock().unwrap().as_slice(),
            &[("a".to_string(), WorkItemStatus::InProgress)]
        );
    }

    #[tokio::test]
    async fn drag_never_writes_done_incomplete() {
        let (board, api, _rx, _toasts) = setup(vec![
            item("a", WorkItemStatus::DoneIncomplete),
            item("b", WorkItemStatus::InProgress),
        ])
        .await;

        // reorder within the in-progress lane keeps the server-assigned status
        board
            .drop_item(drop_req("a", Lane::InProgress, Lane::InProgress, 1))
            .await
            .unwrap();
        assert_eq!(
            board.items().await.iter().find(|i| i.id == "a").unwrap().status,
            WorkItemStatus::DoneIncomplete
        );

        // moving it to another lane writes that lane's entry status
        board
            .drop_item(drop_req("a", Lane::InProgress, Lane::Done, 0))
            .await
            .unwrap();
        assert_eq!(
            board.items().await.iter().find(|i| i.id == "a").unwrap().status,
            WorkItemStatus::Done
        );
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0], ("a".to_string(), WorkItemStatus::DoneIncomplete));
        assert_eq!(calls[1], ("a".to_string(), WorkItemStatus::Done));
    }

    #[tokio::test]
    async fn unknown_item_is_an_error() {
        let (board, api, _rx, _toasts) = setup(vec![item("t1", WorkItemStatus::Todo)]).await;
        let result = board
            .drop_item(drop_req("zz", Lane::Todo, Lane::Done, 0))
            .await;
        assert!(matches!(result, Err(BoardError::UnknownItem(id)) if id == "zz"));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rollback_discards_overlapping_drop() {
        let (board, api, _rx, _toasts) = setup(vec![
            item("t1", WorkItemStatus::Todo),
            item("t2", WorkItemStatus::Todo),
        ])
        .await;
        api.hold_first.store(true, Ordering::SeqCst);
        let original = board.items().await;

        let first = {
            let board = board.clone();
            tokio::spawn(async move {
                board
                    .drop_item(drop_req("t1", Lane::Todo, Lane::Done, 0))
                    .await
            })
        };
        settle().await;

        let second = board
            .drop_item(drop_req("t2", Lane::Todo, Lane::InProgress, 0))
            .await
            .unwrap();
        assert_eq!(second, DropOutcome::Confirmed);

        api.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), DropOutcome::RolledBack);
        // the failed drop restored its pre-drag snapshot, which predates the
        // second drop as well
        assert_eq!(board.items().await, original);
    }

    #[tokio::test]
    async fn replace_all_swaps_the_list_wholesale() {
        let (board, _api, _rx, _toasts) = setup(vec![item("t1", WorkItemStatus::Todo)]).await;
        let fresh = vec![
            item("x", WorkItemStatus::Done),
            item("y", WorkItemStatus::Todo),
        ];
        board.replace_all(fresh.clone()).await;
        assert_eq!(board.items().await, fresh);
    }
}
