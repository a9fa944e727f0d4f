//! Shared domain types for the taskboard client.
//!
//! | Module     | Types                                          |
//! |------------|------------------------------------------------|
//! | `column`   | `Column` (fixed workflow stages)               |
//! | `item`     | `WorkItem`, `ItemKind`, `Points`               |
//! | `lane`     | `Lane` (user-defined swimlanes)                |
//! | `sprint`   | `Sprint`                                       |
//! | `team`     | `Member`, `Role`                               |
//! | `activity` | `ActivityEntry`, `ActivityAction`              |

pub mod activity;
pub mod column;
pub mod item;
pub mod lane;
pub mod sprint;
pub mod team;

pub use activity::{ActivityAction, ActivityEntry};
pub use column::Column;
pub use item::{ItemKind, Points, WorkItem};
pub use lane::Lane;
pub use sprint::Sprint;
pub use team::{Member, Role};

/// Error returned when a wire string names no known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
