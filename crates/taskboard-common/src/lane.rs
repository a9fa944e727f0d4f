use serde::{Deserialize, Serialize};

/// A user-defined horizontal grouping of work items (swimlane).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub order: i32,
    /// UI-only expand/collapse flag; the backend never sees it change.
    #[serde(default)]
    pub collapsed: bool,
}

impl Lane {
    pub fn new(id: i64, name: impl Into<String>, order: i32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            collapsed: false,
        }
    }
}
