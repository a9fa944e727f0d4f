use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// A fixed workflow stage on the Kanban board.
///
/// Columns are statically enumerated; the board never creates or persists
/// them. The declaration order is the left-to-right board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    New,
    Ready,
    InProgress,
    ReadyForTest,
    Done,
    Archived,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::New,
        Column::Ready,
        Column::InProgress,
        Column::ReadyForTest,
        Column::Done,
        Column::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::ReadyForTest => "ready_for_test",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    /// Human-readable column header.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Ready => "Ready",
            Self::InProgress => "In progress",
            Self::ReadyForTest => "Ready for test",
            Self::Done => "Done",
            Self::Archived => "Archived",
        }
    }

    /// Display color as a hex RGB string.
    pub fn color(&self) -> &'static str {
        match self {
            Self::New => "#70728f",
            Self::Ready => "#e44057",
            Self::InProgress => "#e47c40",
            Self::ReadyForTest => "#e4ce40",
            Self::Done => "#a8e440",
            Self::Archived => "#a9aabc",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Done | Self::Archived)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "ready_for_test" => Ok(Self::ReadyForTest),
            "done" => Ok(Self::Done),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseEnumError::new("column", s)),
        }
    }
}
