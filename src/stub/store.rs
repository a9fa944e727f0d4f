//! In-memory backend data shared by the stub HTTP server and `MemoryApi`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use taskboard_common::{
    ActivityAction, ActivityEntry, Column, ItemKind, Lane, Member, Role, Sprint, WorkItem,
};
use thiserror::Error;

use crate::api::{
    AssignSprintRequest, CreateItemRequest, CreateLaneRequest, MoveItemRequest,
    UpdateItemRequest,
};
use crate::board::moves::{self, Destination, MoveRequest};
use crate::errors::MoveError;

/// Generated ids start here so they never collide with seeded ones.
const FIRST_GENERATED_ID: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    /// Injected failure, or a write the backend refuses.
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    BadRequest(String),
    /// Injected transient failure.
    #[error("{0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::Rejected(_) => 409,
            StoreError::BadRequest(_) => 400,
            StoreError::Unavailable(_) => 503,
        }
    }
}

impl From<MoveError> for StoreError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::ItemNotFound { .. } => StoreError::NotFound(err.to_string()),
            _ => StoreError::BadRequest(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct ProjectData {
    lanes: Vec<Lane>,
    /// Flat board order, same convention as the client.
    items: Vec<WorkItem>,
    sprints: Vec<Sprint>,
    members: Vec<Member>,
    roles: Vec<Role>,
}

#[derive(Debug)]
pub struct StubStore {
    projects: BTreeMap<i64, ProjectData>,
    activity: Vec<ActivityEntry>,
    /// comment id -> (item id, text)
    comments: BTreeMap<i64, (i64, String)>,
    next_id: i64,
    failing_moves: u32,
    unavailable_moves: u32,
    fail_item_listing: bool,
    fail_sprints: bool,
    move_calls: u32,
}

impl Default for StubStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StubStore {
    pub fn new() -> Self {
        Self {
            projects: BTreeMap::new(),
            activity: Vec::new(),
            comments: BTreeMap::new(),
            next_id: FIRST_GENERATED_ID,
            failing_moves: 0,
            unavailable_moves: 0,
            fail_item_listing: false,
            fail_sprints: false,
            move_calls: 0,
        }
    }

    /// A small Scrum project (id 1) with two lanes, one open sprint and
    /// stories spread across the workflow.
    pub fn demo() -> Self {
        let mut store = Self::new();
        store.add_project(1);
        let project = store.projects.entry(1).or_default();

        project.lanes = vec![Lane::new(1, "Expedite", 0), Lane::new(2, "Standard", 1)];
        project.roles = vec![
            Role {
                id: 1,
                name: "Product Owner".into(),
                computable: false,
                permissions: vec!["view_us".into(), "modify_us".into(), "admin_roles".into()],
            },
            Role {
                id: 2,
                name: "Back".into(),
                computable: true,
                permissions: vec!["view_us".into(), "modify_us".into()],
            },
            Role {
                id: 3,
                name: "Front".into(),
                computable: true,
                permissions: vec!["view_us".into(), "modify_us".into()],
            },
        ];
        project.members = vec![
            Member {
                id: 1,
                user_id: 10,
                full_name: "Ana Ruiz".into(),
                role_id: 1,
                is_admin: true,
            },
            Member {
                id: 2,
                user_id: 11,
                full_name: "Kofi Mensah".into(),
                role_id: 2,
                is_admin: false,
            },
            Member {
                id: 3,
                user_id: 12,
                full_name: "Li Wei".into(),
                role_id: 3,
                is_admin: false,
            },
        ];

        let today = Utc::now().date_naive();
        project.sprints = vec![Sprint {
            id: 1,
            name: "Sprint 1".into(),
            start: today - Duration::days(3),
            finish: today + Duration::days(10),
            closed: false,
        }];

        let seed: [(i64, &str, Column, i64, &[&str], Option<i64>, f64); 8] = [
            (1, "Login with SSO", Column::New, 2, &["auth"], None, 3.0),
            (2, "Password reset email", Column::Ready, 2, &["auth", "email"], Some(1), 2.0),
            (3, "Board drag and drop", Column::InProgress, 2, &["ui"], Some(1), 5.0),
            (4, "Production outage banner", Column::InProgress, 1, &["ui", "ops"], Some(1), 1.0),
            (5, "Sprint burndown chart", Column::ReadyForTest, 2, &["reports"], Some(1), 8.0),
            (6, "Rate limit public API", Column::Done, 1, &["api", "ops"], Some(1), 3.0),
            (7, "Export board to CSV", Column::New, 2, &["reports"], None, 2.0),
            (8, "Dark mode", Column::Archived, 2, &["ui"], None, 1.0),
        ];
        for (id, subject, column, lane, tags, sprint, points) in seed {
            let mut item = WorkItem::new(id, subject, column).with_lane(Some(lane));
            item.tags = tags.iter().map(|t| t.to_string()).collect();
            item.sprint_id = sprint;
            item.owner = Some(10);
            item.assignees = vec![if id % 2 == 0 { 11 } else { 12 }];
            item.points.set("Back", points);
            item.blocked = id == 4;
            project.items.push(item);
        }
        if let Some(item) = project.items.iter_mut().find(|i| i.id == 3) {
            item.kind = ItemKind::Task;
        }
        store
    }

    fn generate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn project(&self, project_id: i64) -> StoreResult<&ProjectData> {
        self.projects
            .get(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("Project {} not found", project_id)))
    }

    fn project_mut(&mut self, project_id: i64) -> StoreResult<&mut ProjectData> {
        self.projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("Project {} not found", project_id)))
    }

    fn project_of_item(&mut self, item_id: i64) -> StoreResult<&mut ProjectData> {
        self.projects
            .values_mut()
            .find(|p| p.items.iter().any(|i| i.id == item_id))
            .ok_or_else(|| StoreError::NotFound(format!("Work item {} not found", item_id)))
    }

    // ── Seeding ─────────────────────────────────────────────────────

    pub fn add_project(&mut self, project_id: i64) {
        self.projects.entry(project_id).or_default();
    }

    pub fn add_lane(&mut self, project_id: i64, name: &str) -> StoreResult<Lane> {
        let id = self.generate_id();
        let project = self.project_mut(project_id)?;
        let lane = Lane::new(id, name, project.lanes.len() as i32);
        project.lanes.push(lane.clone());
        Ok(lane)
    }

    /// Insert `item` as given, keeping its id.
    pub fn add_item(&mut self, project_id: i64, item: WorkItem) -> StoreResult<WorkItem> {
        self.next_id = self.next_id.max(item.id + 1);
        self.project_mut(project_id)?.items.push(item.clone());
        Ok(item)
    }

    pub fn add_sprint(&mut self, project_id: i64, name: &str) -> StoreResult<Sprint> {
        let id = self.generate_id();
        let today = Utc::now().date_naive();
        let sprint = Sprint {
            id,
            name: name.to_string(),
            start: today,
            finish: today + Duration::days(13),
            closed: false,
        };
        self.project_mut(project_id)?.sprints.push(sprint.clone());
        Ok(sprint)
    }

    pub fn add_role(&mut self, project_id: i64, name: &str, computable: bool) -> StoreResult<Role> {
        let id = self.generate_id();
        let role = Role {
            id,
            name: name.to_string(),
            computable,
            permissions: vec!["view_us".into()],
        };
        self.project_mut(project_id)?.roles.push(role.clone());
        Ok(role)
    }

    pub fn add_member(&mut self, project_id: i64, full_name: &str, role_id: i64) -> StoreResult<Member> {
        let id = self.generate_id();
        let member = Member {
            id,
            user_id: id,
            full_name: full_name.to_string(),
            role_id,
            is_admin: false,
        };
        self.project_mut(project_id)?.members.push(member.clone());
        Ok(member)
    }

    pub fn add_comment(&mut self, item_id: i64, text: &str) -> StoreResult<i64> {
        self.project_of_item(item_id)?;
        let id = self.generate_id();
        self.comments.insert(id, (item_id, text.to_string()));
        Ok(id)
    }

    // ── Failure injection ───────────────────────────────────────────

    /// Reject the next `count` move calls. `u32::MAX` rejects all of them.
    pub fn fail_moves(&mut self, count: u32) {
        self.failing_moves = count;
    }

    /// Answer the next `count` move calls with 503 Service Unavailable.
    /// Checked before `fail_moves`.
    pub fn unavailable_moves(&mut self, count: u32) {
        self.unavailable_moves = count;
    }

    /// Answer item listings with 503, which makes board loads fail.
    pub fn fail_item_listing(&mut self, fail: bool) {
        self.fail_item_listing = fail;
    }

    pub fn fail_sprint_changes(&mut self, fail: bool) {
        self.fail_sprints = fail;
    }

    /// Move calls received, including rejected ones.
    pub fn move_calls(&self) -> u32 {
        self.move_calls
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn item(&self, item_id: i64) -> Option<WorkItem> {
        self.projects
            .values()
            .flat_map(|p| p.items.iter())
            .find(|i| i.id == item_id)
            .cloned()
    }

    pub fn lanes(&self, project_id: i64) -> StoreResult<Vec<Lane>> {
        Ok(self.project(project_id)?.lanes.clone())
    }

    pub fn items(&self, project_id: i64) -> StoreResult<Vec<WorkItem>> {
        if self.fail_item_listing {
            return Err(StoreError::Unavailable("Item listing unavailable".into()));
        }
        Ok(self.project(project_id)?.items.clone())
    }

    pub fn sprints(&self, project_id: i64) -> StoreResult<Vec<Sprint>> {
        Ok(self.project(project_id)?.sprints.clone())
    }

    pub fn members(&self, project_id: i64) -> StoreResult<Vec<Member>> {
        Ok(self.project(project_id)?.members.clone())
    }

    pub fn roles(&self, project_id: i64) -> StoreResult<Vec<Role>> {
        Ok(self.project(project_id)?.roles.clone())
    }

    pub fn activity(&self, item_id: i64) -> StoreResult<Vec<ActivityEntry>> {
        if self.item(item_id).is_none() {
            return Err(StoreError::NotFound(format!("Work item {} not found", item_id)));
        }
        Ok(self
            .activity
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect())
    }

    // ── Writes ──────────────────────────────────────────────────────

    pub fn create_lane(&mut self, project_id: i64, req: &CreateLaneRequest) -> StoreResult<Lane> {
        if req.name.trim().is_empty() {
            return Err(StoreError::BadRequest("Lane name must not be empty".into()));
        }
        self.add_lane(project_id, req.name.trim())
    }

    pub fn create_item(&mut self, project_id: i64, req: &CreateItemRequest) -> StoreResult<WorkItem> {
        if req.subject.trim().is_empty() {
            return Err(StoreError::BadRequest("Subject must not be empty".into()));
        }
        let id = self.generate_id();
        let project = self.project_mut(project_id)?;
        if let Some(lane_id) = req.lane_id {
            if !project.lanes.iter().any(|l| l.id == lane_id) {
                return Err(StoreError::BadRequest(format!("Lane {} does not exist", lane_id)));
            }
        }
        let mut item = WorkItem::new(id, req.subject.trim(), req.column.unwrap_or(Column::New))
            .with_lane(req.lane_id);
        item.kind = req.kind;
        item.description = req.description.clone().unwrap_or_default();
        item.tags = req.tags.clone();
        item.points = req.points.clone();
        project.items.push(item.clone());
        self.activity.push(ActivityEntry::now(
            id,
            ActivityAction::Created,
            format!("created \"{}\"", item.subject),
        ));
        Ok(item)
    }

    pub fn update_item(&mut self, item_id: i64, req: &UpdateItemRequest) -> StoreResult<WorkItem> {
        let project = self.project_of_item(item_id)?;
        let item = project
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::NotFound(format!("Work item {} not found", item_id)))?;
        req.apply_to(item);
        Ok(item.clone())
    }

    pub fn delete_item(&mut self, item_id: i64) -> StoreResult<()> {
        let project = self.project_of_item(item_id)?;
        project.items.retain(|i| i.id != item_id);
        self.comments.retain(|_, (owner, _)| *owner != item_id);
        Ok(())
    }

    /// Apply a move with the same ordering rules as the client.
    pub fn move_item(&mut self, item_id: i64, req: &MoveItemRequest) -> StoreResult<WorkItem> {
        self.move_calls += 1;
        if self.unavailable_moves > 0 {
            self.unavailable_moves -= 1;
            return Err(StoreError::Unavailable("Backend temporarily unavailable".into()));
        }
        if self.failing_moves > 0 {
            if self.failing_moves != u32::MAX {
                self.failing_moves -= 1;
            }
            return Err(StoreError::Rejected(format!("Move of work item {} rejected", item_id)));
        }

        let project = self.project_of_item(item_id)?;
        if let Some(lane_id) = req.lane_id {
            if !project.lanes.iter().any(|l| l.id == lane_id) {
                return Err(MoveError::UnknownLane { id: lane_id }.into());
            }
        }
        let destination = Destination::new(req.column, req.lane_id, req.index);
        let request = MoveRequest::resolve(&project.items, item_id, destination)?;
        moves::apply(&mut project.items, &request)?;
        project
            .items
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Work item {} not found", item_id)))
    }

    pub fn assign_sprint(&mut self, item_id: i64, req: &AssignSprintRequest) -> StoreResult<WorkItem> {
        if self.fail_sprints {
            return Err(StoreError::Rejected(format!(
                "Sprint change for work item {} rejected",
                item_id
            )));
        }
        let project = self.project_of_item(item_id)?;
        if let Some(sprint_id) = req.sprint_id {
            if !project.sprints.iter().any(|s| s.id == sprint_id) {
                return Err(MoveError::UnknownSprint { id: sprint_id }.into());
            }
        }
        let item = project
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::NotFound(format!("Work item {} not found", item_id)))?;
        item.sprint_id = req.sprint_id;
        Ok(item.clone())
    }

    pub fn record_activity(&mut self, entry: ActivityEntry) -> StoreResult<()> {
        if self.item(entry.item_id).is_none() {
            return Err(StoreError::NotFound(format!(
                "Work item {} not found",
                entry.item_id
            )));
        }
        self.activity.push(entry);
        Ok(())
    }

    pub fn delete_comment(&mut self, item_id: i64, comment_id: i64) -> StoreResult<()> {
        match self.comments.get(&comment_id) {
            Some((owner, _)) if *owner == item_id => {
                self.comments.remove(&comment_id);
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!(
                "Comment {} not found on work item {}",
                comment_id, item_id
            ))),
        }
    }

    pub fn update_member_role(&mut self, member_id: i64, role_id: i64) -> StoreResult<Member> {
        let project = self
            .projects
            .values_mut()
            .find(|p| p.members.iter().any(|m| m.id == member_id))
            .ok_or_else(|| StoreError::NotFound(format!("Member {} not found", member_id)))?;
        if !project.roles.iter().any(|r| r.id == role_id) {
            return Err(StoreError::BadRequest(format!("Role {} does not exist", role_id)));
        }
        let member = project
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or_else(|| StoreError::NotFound(format!("Member {} not found", member_id)))?;
        member.role_id = role_id;
        Ok(member.clone())
    }
}

/// Cloneable, thread-safe access to a `StubStore`.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    inner: Arc<Mutex<StubStore>>,
}

impl StoreHandle {
    pub fn new(store: StubStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut StubStore) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_ids(store: &StubStore, column: Column) -> Vec<i64> {
        store
            .items(1)
            .unwrap()
            .into_iter()
            .filter(|i| i.column == column)
            .map(|i| i.id)
            .collect()
    }

    #[test]
    fn test_demo_is_consistent() {
        let store = StubStore::demo();
        let lanes = store.lanes(1).unwrap();
        for item in store.items(1).unwrap() {
            let lane_id = item.lane_id.unwrap();
            assert!(lanes.iter().any(|l| l.id == lane_id), "item {} orphaned", item.id);
        }
        assert_eq!(store.sprints(1).unwrap().len(), 1);
        assert_eq!(store.members(1).unwrap().len(), 3);
    }

    #[test]
    fn test_move_uses_board_ordering() {
        let mut store = StubStore::new();
        store.add_project(1);
        for id in 1..=3 {
            store.add_item(1, WorkItem::new(id, "s", Column::Ready)).unwrap();
        }
        let req = MoveItemRequest {
            column: Column::InProgress,
            lane_id: None,
            index: 0,
        };
        let moved = store.move_item(2, &req).unwrap();
        assert_eq!(moved.column, Column::InProgress);
        assert_eq!(project_ids(&store, Column::Ready), vec![1, 3]);
        assert_eq!(project_ids(&store, Column::InProgress), vec![2]);
        assert_eq!(store.move_calls(), 1);
    }

    #[test]
    fn test_failing_moves_count_down() {
        let mut store = StubStore::demo();
        store.fail_moves(1);
        let req = MoveItemRequest {
            column: Column::Done,
            lane_id: Some(2),
            index: 0,
        };
        let err = store.move_item(1, &req).unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(store.item(1).unwrap().column, Column::New);
        assert!(store.move_item(1, &req).is_ok());
        assert_eq!(store.item(1).unwrap().column, Column::Done);
        assert_eq!(store.move_calls(), 2);
    }

    #[test]
    fn test_move_to_unknown_lane_is_bad_request() {
        let mut store = StubStore::demo();
        let req = MoveItemRequest {
            column: Column::Done,
            lane_id: Some(99),
            index: 0,
        };
        assert!(matches!(
            store.move_item(1, &req),
            Err(StoreError::BadRequest(_))
        ));
    }

    #[test]
    fn test_create_item_validates_and_records_activity() {
        let mut store = StubStore::demo();
        let empty = CreateItemRequest::default();
        assert!(matches!(
            store.create_item(1, &empty),
            Err(StoreError::BadRequest(_))
        ));

        let req = CreateItemRequest {
            subject: "Audit log".into(),
            lane_id: Some(1),
            ..Default::default()
        };
        let item = store.create_item(1, &req).unwrap();
        assert!(item.id >= FIRST_GENERATED_ID);
        assert_eq!(item.column, Column::New);
        assert_eq!(store.activity(item.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_comment_checks_owner() {
        let mut store = StubStore::demo();
        let comment = store.add_comment(1, "looks good").unwrap();
        assert!(store.delete_comment(2, comment).is_err());
        assert!(store.delete_comment(1, comment).is_ok());
        assert!(store.delete_comment(1, comment).is_err());
    }

    #[test]
    fn test_update_member_role_validates_role() {
        let mut store = StubStore::demo();
        assert!(matches!(
            store.update_member_role(2, 42),
            Err(StoreError::BadRequest(_))
        ));
        assert_eq!(store.update_member_role(2, 3).unwrap().role_id, 3);
        assert!(matches!(
            store.update_member_role(77, 3),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let store = StubStore::new();
        assert_eq!(store.lanes(5).unwrap_err().status_code(), 404);
    }
}
