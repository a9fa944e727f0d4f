use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A Scrum sprint (milestone) that backlog items are planned into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: i64,
    pub name: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
    #[serde(default)]
    pub closed: bool,
}

impl Sprint {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.finish
    }

    pub fn days(&self) -> i64 {
        (self.finish - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprint() -> Sprint {
        Sprint {
            id: 1,
            name: "Sprint 1".into(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            finish: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            closed: false,
        }
    }

    #[test]
    fn test_sprint_length_is_inclusive() {
        assert_eq!(sprint().days(), 14);
    }

    #[test]
    fn test_sprint_contains_boundaries() {
        let s = sprint();
        assert!(s.contains(s.start));
        assert!(s.contains(s.finish));
        assert!(!s.contains(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
    }
}
