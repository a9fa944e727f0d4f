use std::time::Duration;

use async_trait::async_trait;
use taskboard_common::{ActivityEntry, Lane, Member, Role, Sprint, WorkItem};

use super::{
    AssignSprintRequest, BoardApi, CreateItemRequest, CreateLaneRequest, MoveItemRequest,
    UpdateItemRequest, UpdateMemberRequest,
};
use crate::errors::{BoardError, BoardResult};
use crate::stub::store::{StoreError, StoreHandle, StubStore};

/// `BoardApi` served from an in-process `StubStore`.
///
/// Errors carry the HTTP status the stub server would have returned, so
/// callers see the same `BoardError::Status` shape as with `RestClient`.
#[derive(Debug, Clone)]
pub struct MemoryApi {
    store: StoreHandle,
    latency: Duration,
}

impl MemoryApi {
    pub fn new(store: StubStore) -> Self {
        Self::with_handle(StoreHandle::new(store))
    }

    pub fn with_handle(store: StoreHandle) -> Self {
        Self {
            store,
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn move_calls(&self) -> u32 {
        self.store.with(|s| s.move_calls())
    }

    async fn call<R>(
        &self,
        op: &str,
        f: impl FnOnce(&mut StubStore) -> Result<R, StoreError>,
    ) -> BoardResult<R> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.store.with(f).map_err(|err| BoardError::Status {
            url: format!("memory://{}", op),
            status: err.status_code(),
            body: err.to_string(),
        })
    }
}

#[async_trait]
impl BoardApi for MemoryApi {
    async fn list_lanes(&self, project_id: i64) -> BoardResult<Vec<Lane>> {
        self.call("list_lanes", |s| s.lanes(project_id)).await
    }

    async fn create_lane(&self, project_id: i64, req: &CreateLaneRequest) -> BoardResult<Lane> {
        self.call("create_lane", |s| s.create_lane(project_id, req)).await
    }

    async fn list_items(&self, project_id: i64) -> BoardResult<Vec<WorkItem>> {
        self.call("list_items", |s| s.items(project_id)).await
    }

    async fn create_item(&self, project_id: i64, req: &CreateItemRequest) -> BoardResult<WorkItem> {
        self.call("create_item", |s| s.create_item(project_id, req)).await
    }

    async fn update_item(&self, item_id: i64, req: &UpdateItemRequest) -> BoardResult<WorkItem> {
        self.call("update_item", |s| s.update_item(item_id, req)).await
    }

    async fn delete_item(&self, item_id: i64) -> BoardResult<()> {
        self.call("delete_item", |s| s.delete_item(item_id)).await
    }

    async fn move_item(&self, item_id: i64, req: &MoveItemRequest) -> BoardResult<WorkItem> {
        self.call("move_item", |s| s.move_item(item_id, req)).await
    }

    async fn assign_sprint(
        &self,
        item_id: i64,
        req: &AssignSprintRequest,
    ) -> BoardResult<WorkItem> {
        self.call("assign_sprint", |s| s.assign_sprint(item_id, req)).await
    }

    async fn list_sprints(&self, project_id: i64) -> BoardResult<Vec<Sprint>> {
        self.call("list_sprints", |s| s.sprints(project_id)).await
    }

    async fn list_activity(&self, item_id: i64) -> BoardResult<Vec<ActivityEntry>> {
        self.call("list_activity", |s| s.activity(item_id)).await
    }

    async fn record_activity(&self, entry: &ActivityEntry) -> BoardResult<()> {
        let entry = entry.clone();
        self.call("record_activity", move |s| s.record_activity(entry)).await
    }

    async fn delete_comment(&self, item_id: i64, comment_id: i64) -> BoardResult<()> {
        self.call("delete_comment", |s| s.delete_comment(item_id, comment_id))
            .await
    }

    async fn list_members(&self, project_id: i64) -> BoardResult<Vec<Member>> {
        self.call("list_members", |s| s.members(project_id)).await
    }

    async fn list_roles(&self, project_id: i64) -> BoardResult<Vec<Role>> {
        self.call("list_roles", |s| s.roles(project_id)).await
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        req: &UpdateMemberRequest,
    ) -> BoardResult<Member> {
        self.call("update_member_role", |s| s.update_member_role(member_id, req.role_id))
            .await
    }
}
