use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Moved,
    SprintChanged,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Moved => "moved",
            Self::SprintChanged => "sprint_changed",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a work item's activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub item_id: i64,
    pub action: ActivityAction,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn now(item_id: i64, action: ActivityAction, message: impl Into<String>) -> Self {
        Self {
            item_id,
            action,
            message: message.into(),
            at: Utc::now(),
        }
    }
}
