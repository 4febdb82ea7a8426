//! Domain types shared by the board and notification components.

pub mod notification;
pub mod work_item;

pub use notification::NotificationEvent;
pub use work_item::{Lane, UnknownStatusCode, WorkItem, WorkItemStatus};
