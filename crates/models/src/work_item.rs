use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, Error)]
#[error("unknown work item status code: {0}")]
pub struct UnknownStatusCode(pub u8);

/// Status of a work item. The backend encodes it as a bare integer:
/// 0 = todo, 1 = in progress, 2 = done, 3 = done with unresolved items.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum WorkItemStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    /// Server-assigned only; no client write path produces it. Boards render
    /// it inside the in-progress lane with a warning badge.
    DoneIncomplete,
}

impl From<WorkItemStatus> for u8 {
    fn from(status: WorkItemStatus) -> Self {
        match status {
            WorkItemStatus::Todo => 0,
            WorkItemStatus::InProgress => 1,
            WorkItemStatus::Done => 2,
            WorkItemStatus::DoneIncomplete => 3,
        }
    }
}

impl TryFrom<u8> for WorkItemStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Todo),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Done),
            3 => Ok(Self::DoneIncomplete),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

/// One of the fixed board columns. A derived view over status, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Lane {
    Todo,
    InProgress,
    Done,
}

impl Lane {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Lane an item with `status` is rendered in. `DoneIncomplete` folds into
    /// the in-progress lane.
    pub const fn of(status: WorkItemStatus) -> Self {
        match status {
            WorkItemStatus::Todo => Self::Todo,
            WorkItemStatus::InProgress | WorkItemStatus::DoneIncomplete => Self::InProgress,
            WorkItemStatus::Done => Self::Done,
        }
    }

    /// Status written when an item is dropped into this lane. Never yields
    /// `DoneIncomplete`.
    pub const fn entry_status(self) -> WorkItemStatus {
        match self {
            Self::Todo => WorkItemStatus::Todo,
            Self::InProgress => WorkItemStatus::InProgress,
            Self::Done => WorkItemStatus::Done,
        }
    }
}

/// A board entry: a task or a sprint. Ownership and grouping fields are
/// carried through untouched; status is the single source of truth for lane
/// membership, position is the index in the board's flat sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: WorkItemStatus,
    #[serde(default)]
    pub assignee: Option<String>,
    /// Owning project or sprint.
    #[serde(default)]
    pub group_id: Option<String>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: WorkItemStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status,
            assignee: None,
            group_id: None,
        }
    }

    pub fn lane(&self) -> Lane {
        Lane::of(self.status)
    }

    /// Done on the server's books but flagged with unresolved items.
    pub fn needs_attention(&self) -> bool {
        self.status == WorkItemStatus::DoneIncomplete
    }
}
