use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Column, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    UserStory,
    Task,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserStory => "user_story",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_story" | "story" => Ok(Self::UserStory),
            "task" => Ok(Self::Task),
            _ => Err(ParseEnumError::new("item kind", s)),
        }
    }
}

/// Point estimates keyed by discipline (e.g. `ux`, `design`, `front`, `back`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(pub BTreeMap<String, f64>);

impl Points {
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn get(&self, discipline: &str) -> Option<f64> {
        self.0.get(discipline).copied()
    }

    pub fn set(&mut self, discipline: impl Into<String>, value: f64) {
        self.0.insert(discipline.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A user story or task tracked on a board.
///
/// Ordering is not stored on the item: it is the item's index within its
/// (column, lane) group in the board's flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub kind: ItemKind,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub column: Column,
    #[serde(default)]
    pub lane_id: Option<i64>,
    #[serde(default)]
    pub points: Points,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default)]
    pub assignees: Vec<i64>,
    #[serde(default)]
    pub watchers: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub sprint_id: Option<i64>,
}

impl WorkItem {
    /// Minimal item in the given column with no lane.
    pub fn new(id: i64, subject: impl Into<String>, column: Column) -> Self {
        Self {
            id,
            kind: ItemKind::UserStory,
            subject: subject.into(),
            description: String::new(),
            column,
            lane_id: None,
            points: Points::default(),
            owner: None,
            assignees: Vec::new(),
            watchers: Vec::new(),
            tags: Vec::new(),
            due_date: None,
            blocked: false,
            sprint_id: None,
        }
    }

    pub fn with_lane(mut self, lane_id: Option<i64>) -> Self {
        self.lane_id = lane_id;
        self
    }

    pub fn in_slot(&self, column: Column, lane_id: Option<i64>) -> bool {
        self.column == column && self.lane_id == lane_id
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.column.is_closed(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_total_sums_disciplines() {
        let mut points = Points::default();
        points.set("ux", 1.0);
        points.set("back", 2.5);
        assert_eq!(points.total(), 3.5);
        assert_eq!(points.get("ux"), Some(1.0));
        assert_eq!(points.get("front"), None);
    }

    #[test]
    fn test_work_item_deserializes_with_defaults() {
        let json = r#"{"id": 7, "subject": "Login page", "column": "ready"}"#;
        let item: WorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.kind, ItemKind::UserStory);
        assert_eq!(item.column, Column::Ready);
        assert_eq!(item.lane_id, None);
        assert!(item.assignees.is_empty());
        assert!(!item.blocked);
    }

    #[test]
    fn test_points_serialize_as_plain_map() {
        let mut item = WorkItem::new(1, "Sized", Column::New);
        item.points.set("front", 3.0);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["points"]["front"], 3.0);
    }

    #[test]
    fn test_overdue_ignores_closed_items() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut item = WorkItem::new(1, "Late", Column::InProgress);
        item.due_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(item.is_overdue(today));
        item.column = Column::Done;
        assert!(!item.is_overdue(today));
    }

    #[test]
    fn test_item_kind_accepts_story_alias() {
        assert_eq!(ItemKind::from_str("story").unwrap(), ItemKind::UserStory);
        assert!(ItemKind::from_str("epic").is_err());
    }
}
