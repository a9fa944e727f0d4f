//! Backend access.
//!
//! `BoardApi` is the seam between board logic and the REST backend.
//! `RestClient` talks HTTP; `MemoryApi` serves the same calls from an
//! in-process `StubStore` for offline use and tests.

pub mod client;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskboard_common::{
    ActivityEntry, Column, ItemKind, Lane, Member, Points, Role, Sprint, WorkItem,
};

use crate::board::moves::MoveCommand;
use crate::errors::BoardResult;

pub use client::RestClient;
pub use memory::MemoryApi;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveItemRequest {
    pub column: Column,
    pub lane_id: Option<i64>,
    pub index: usize,
}

impl From<&MoveCommand> for MoveItemRequest {
    fn from(cmd: &MoveCommand) -> Self {
        Self {
            column: cmd.to.column,
            lane_id: cmd.to.lane_id,
            index: cmd.to_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignSprintRequest {
    pub sprint_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub kind: ItemKind,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub column: Option<Column>,
    #[serde(default)]
    pub lane_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: Points,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl UpdateItemRequest {
    pub fn apply_to(&self, item: &mut WorkItem) {
        if let Some(subject) = &self.subject {
            item.subject = subject.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
        if let Some(assignees) = &self.assignees {
            item.assignees = assignees.clone();
        }
        if let Some(blocked) = self.blocked {
            item.blocked = blocked;
        }
        if let Some(due) = self.due_date {
            item.due_date = Some(due);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLaneRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role_id: i64,
}

// ── Trait ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn list_lanes(&self, project_id: i64) -> BoardResult<Vec<Lane>>;

    async fn create_lane(&self, project_id: i64, req: &CreateLaneRequest) -> BoardResult<Lane>;

    async fn list_items(&self, project_id: i64) -> BoardResult<Vec<WorkItem>>;

    async fn create_item(&self, project_id: i64, req: &CreateItemRequest) -> BoardResult<WorkItem>;

    async fn update_item(&self, item_id: i64, req: &UpdateItemRequest) -> BoardResult<WorkItem>;

    async fn delete_item(&self, item_id: i64) -> BoardResult<()>;

    /// Persist a column/lane/index change.
    async fn move_item(&self, item_id: i64, req: &MoveItemRequest) -> BoardResult<WorkItem>;

    async fn assign_sprint(&self, item_id: i64, req: &AssignSprintRequest)
    -> BoardResult<WorkItem>;

    async fn list_sprints(&self, project_id: i64) -> BoardResult<Vec<Sprint>>;

    async fn list_activity(&self, item_id: i64) -> BoardResult<Vec<ActivityEntry>>;

    async fn record_activity(&self, entry: &ActivityEntry) -> BoardResult<()>;

    async fn delete_comment(&self, item_id: i64, comment_id: i64) -> BoardResult<()>;

    async fn list_members(&self, project_id: i64) -> BoardResult<Vec<Member>>;

    async fn list_roles(&self, project_id: i64) -> BoardResult<Vec<Role>>;

    async fn update_member_role(
        &self,
        member_id: i64,
        req: &UpdateMemberRequest,
    ) -> BoardResult<Member>;
}
