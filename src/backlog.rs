//! Scrum backlog view: unplanned stories plus per-sprint plans.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use taskboard_common::{ItemKind, Sprint, WorkItem};

#[derive(Debug, Clone, Serialize)]
pub struct SprintPlan {
    pub sprint: Sprint,
    pub items: Vec<WorkItem>,
    pub points: f64,
    /// Points of items already in a closed column.
    pub closed_points: f64,
}

impl SprintPlan {
    pub fn progress(&self) -> f64 {
        if self.points == 0.0 {
            0.0
        } else {
            self.closed_points / self.points
        }
    }
}

/// User stories split into the product backlog and sprint plans.
/// Tasks are ignored; they belong to their story, not to the backlog.
#[derive(Debug, Clone, Serialize)]
pub struct Backlog {
    backlog: Vec<WorkItem>,
    sprints: Vec<SprintPlan>,
}

impl Backlog {
    /// Board order is preserved inside every list. Stories planned into an
    /// unknown sprint stay in the backlog.
    pub fn build(items: &[WorkItem], sprints: &[Sprint]) -> Self {
        let mut planned: BTreeMap<i64, Vec<WorkItem>> = BTreeMap::new();
        let mut backlog = Vec::new();
        for item in items.iter().filter(|i| i.kind == ItemKind::UserStory) {
            match item.sprint_id {
                Some(id) if sprints.iter().any(|s| s.id == id) => {
                    planned.entry(id).or_default().push(item.clone())
                }
                _ => backlog.push(item.clone()),
            }
        }

        let mut sorted: Vec<&Sprint> = sprints.iter().collect();
        sorted.sort_by_key(|s| (s.start, s.id));
        let sprints = sorted
            .into_iter()
            .map(|sprint| {
                let items = planned.remove(&sprint.id).unwrap_or_default();
                let points: f64 = items.iter().map(|i| i.points.total()).sum();
                let closed_points: f64 = items
                    .iter()
                    .filter(|i| i.column.is_closed())
                    .map(|i| i.points.total())
                    .sum();
                SprintPlan {
                    sprint: sprint.clone(),
                    items,
                    points,
                    closed_points,
                }
            })
            .collect();

        Self { backlog, sprints }
    }

    pub fn backlog_items(&self) -> &[WorkItem] {
        &self.backlog
    }

    pub fn backlog_points(&self) -> f64 {
        self.backlog.iter().map(|i| i.points.total()).sum()
    }

    /// Plans ordered by sprint start.
    pub fn plans(&self) -> &[SprintPlan] {
        &self.sprints
    }

    pub fn plan(&self, sprint_id: i64) -> Option<&SprintPlan> {
        self.sprints.iter().find(|p| p.sprint.id == sprint_id)
    }

    pub fn open_plans(&self) -> impl Iterator<Item = &SprintPlan> {
        self.sprints.iter().filter(|p| !p.sprint.closed)
    }

    /// The open sprint running on `today`, if any.
    pub fn current(&self, today: NaiveDate) -> Option<&SprintPlan> {
        self.open_plans().find(|p| p.sprint.contains(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_common::Column;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn sprint(id: i64, start: u32, finish: u32, closed: bool) -> Sprint {
        Sprint {
            id,
            name: format!("Sprint {}", id),
            start: day(start),
            finish: day(finish),
            closed,
        }
    }

    fn story(id: i64, sprint_id: Option<i64>, points: f64, column: Column) -> WorkItem {
        let mut item = WorkItem::new(id, format!("story {}", id), column);
        item.sprint_id = sprint_id;
        item.points.set("Back", points);
        item
    }

    #[test]
    fn test_splits_backlog_and_sprints() {
        let items = vec![
            story(1, None, 3.0, Column::New),
            story(2, Some(20), 5.0, Column::Done),
            story(3, Some(20), 2.0, Column::InProgress),
            story(4, None, 1.0, Column::Ready),
        ];
        let sprints = vec![sprint(20, 10, 23, false), sprint(10, 1, 9, true)];
        let backlog = Backlog::build(&items, &sprints);

        let ids: Vec<i64> = backlog.backlog_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(backlog.backlog_points(), 4.0);

        assert_eq!(backlog.plans()[0].sprint.id, 10);
        let plan = backlog.plan(20).unwrap();
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.points, 7.0);
        assert_eq!(plan.closed_points, 5.0);
        assert!((plan.progress() - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_tasks_and_unknown_sprints() {
        let mut task = story(5, None, 1.0, Column::New);
        task.kind = ItemKind::Task;
        let stray = story(6, Some(99), 1.0, Column::New);
        let backlog = Backlog::build(&[task, stray], &[]);
        let ids: Vec<i64> = backlog.backlog_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![6]);
    }

    #[test]
    fn test_current_skips_closed_sprints() {
        let sprints = vec![sprint(1, 1, 14, true), sprint(2, 10, 24, false)];
        let backlog = Backlog::build(&[], &sprints);
        assert_eq!(backlog.current(day(12)).unwrap().sprint.id, 2);
        assert!(backlog.current(day(28)).is_none());
        assert_eq!(backlog.open_plans().count(), 1);
        assert_eq!(backlog.plan(2).unwrap().progress(), 0.0);
    }
}
