//! Optimistic board mutations.
//!
//! A move is written to local state first and persisted by a background
//! task. When the backend rejects it, the change is rolled back either by
//! reloading the authoritative board (`RollbackPolicy::Reload`) or by
//! reversing the recorded command (`RollbackPolicy::Undo`), optionally after
//! retrying with backoff.
//!
//! ## Flow
//!
//! ```text
//! move_to() ──> BoardState::apply_move()   (visible immediately)
//!    │               │
//!    │               └─ publish MoveApplied
//!    v
//! tokio::spawn(persist)
//!    ├─ Ok  ──> publish ItemMoved, record activity (best effort)
//!    └─ Err ──> publish MoveFailed ──> roll back ──> publish MoveRolledBack
//!                                          └─ reload fails ──> publish ReloadFailed
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use taskboard_common::{ActivityAction, ActivityEntry, Lane, WorkItem};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::moves::{Destination, MoveCommand, MoveRequest};
use super::retry::RetryPolicy;
use super::state::{BoardState, BoardView, OrphanPolicy, SprintChange};
use crate::api::{
    AssignSprintRequest, BoardApi, CreateItemRequest, CreateLaneRequest, MoveItemRequest,
    UpdateItemRequest,
};
use crate::errors::{BoardResult, MoveError};
use crate::events::{BoardEvent, EventBus};

/// How a failed persist call is reconciled with local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackPolicy {
    /// Re-fetch the whole board. Discards every other pending local change.
    #[default]
    Reload,
    /// Reverse only the failed command; reload if that is no longer possible.
    Undo,
}

impl std::fmt::Display for RollbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackPolicy::Reload => write!(f, "reload"),
            RollbackPolicy::Undo => write!(f, "undo"),
        }
    }
}

impl std::str::FromStr for RollbackPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reload" => Ok(RollbackPolicy::Reload),
            "undo" => Ok(RollbackPolicy::Undo),
            _ => anyhow::bail!("Invalid rollback policy '{}'. Valid values: reload, undo", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutatorSettings {
    pub rollback: RollbackPolicy,
    pub orphans: OrphanPolicy,
    pub retry: RetryPolicy,
}

/// Final state of one optimistic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to do: the item was already at the destination.
    Unchanged,
    Persisted,
    RolledBack { reloaded: bool },
    /// The persist call failed and so did the reload meant to repair it.
    RollbackFailed { error: String },
}

/// Handle to a change whose persistence is still in flight.
#[derive(Debug)]
pub struct PendingMove {
    item_id: i64,
    handle: Option<JoinHandle<MoveOutcome>>,
}

impl PendingMove {
    fn unchanged(item_id: i64) -> Self {
        Self {
            item_id,
            handle: None,
        }
    }

    pub fn item_id(&self) -> i64 {
        self.item_id
    }

    pub fn is_noop(&self) -> bool {
        self.handle.is_none()
    }

    /// Wait for the background persist (and any rollback) to finish.
    pub async fn outcome(self) -> MoveOutcome {
        match self.handle {
            None => MoveOutcome::Unchanged,
            Some(handle) => handle.await.unwrap_or_else(|e| MoveOutcome::RollbackFailed {
                error: format!("persist task failed: {}", e),
            }),
        }
    }
}

/// A local change awaiting backend confirmation.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Move(MoveCommand),
    Sprint(SprintChange),
}

impl Pending {
    fn item_id(&self) -> i64 {
        match self {
            Pending::Move(cmd) => cmd.item_id,
            Pending::Sprint(change) => change.item_id,
        }
    }

    fn undo(&self, state: &mut BoardState) -> bool {
        match self {
            Pending::Move(cmd) => state.undo_move(cmd),
            Pending::Sprint(change) => state.undo_sprint(change),
        }
    }
}

/// Owns the board state and applies mutations optimistically.
///
/// Cloning is cheap and every clone shares the same state, API and bus.
#[derive(Clone)]
pub struct OptimisticMutator {
    project_id: i64,
    state: Arc<Mutex<BoardState>>,
    api: Arc<dyn BoardApi>,
    bus: EventBus,
    settings: MutatorSettings,
}

impl OptimisticMutator {
    pub fn new(
        project_id: i64,
        api: Arc<dyn BoardApi>,
        bus: EventBus,
        settings: MutatorSettings,
    ) -> Self {
        Self {
            project_id,
            state: Arc::new(Mutex::new(BoardState::new(project_id))),
            api,
            bus,
            settings,
        }
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn api(&self) -> &Arc<dyn BoardApi> {
        &self.api
    }

    pub fn settings(&self) -> MutatorSettings {
        self.settings
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` against the current local state.
    pub fn read<R>(&self, f: impl FnOnce(&BoardState) -> R) -> R {
        f(&self.lock())
    }

    pub fn refresh_count(&self) -> u64 {
        self.lock().refresh_count()
    }

    pub fn view(&self) -> BoardView {
        self.lock().view()
    }

    /// Fetch lanes, items and sprints and replace local state with them.
    /// Returns the new refresh count.
    pub async fn load(&self) -> BoardResult<u64> {
        let pid = self.project_id;
        let (lanes, items, sprints) = tokio::try_join!(
            self.api.list_lanes(pid),
            self.api.list_items(pid),
            self.api.list_sprints(pid),
        )?;
        let item_count = items.len();

        let (reconciliation, refresh) = {
            let mut state = self.lock();
            let reconciliation = state.replace(lanes, items, sprints, self.settings.orphans)?;
            (reconciliation, state.refresh_count())
        };

        if !reconciliation.reassigned.is_empty() {
            self.bus.publish(BoardEvent::OrphansReassigned {
                item_ids: reconciliation.reassigned,
                lane_id: reconciliation.lane_id,
            });
        }
        info!(project_id = pid, refresh, items = item_count, "board loaded");
        self.bus.publish(BoardEvent::BoardReloaded {
            refresh,
            item_count,
        });
        Ok(refresh)
    }

    /// Move an item to `destination`, resolving its source from local state.
    pub fn move_to(&self, item_id: i64, destination: Destination) -> Result<PendingMove, MoveError> {
        let request = {
            let state = self.lock();
            MoveRequest::resolve(state.items(), item_id, destination)?
        };
        self.move_item(&request)
    }

    /// Apply `request` locally and persist it in the background.
    ///
    /// Must be called from within a tokio runtime. The returned handle can
    /// be dropped; the persist task keeps running.
    pub fn move_item(&self, request: &MoveRequest) -> Result<PendingMove, MoveError> {
        let item_id = request.item_id();
        let command = self.lock().apply_move(request)?;
        let Some(command) = command else {
            debug!(item_id, "move is a no-op");
            return Ok(PendingMove::unchanged(item_id));
        };

        debug!(item_id, from = %command.from, to = %command.to, index = command.to_index, "move applied locally");
        self.bus.publish(BoardEvent::MoveApplied {
            item_id,
            from: command.from,
            to: command.to,
            index: command.to_index,
        });
        Ok(self.spawn_persist(Pending::Move(command)))
    }

    /// Plan an item into a sprint (or back to the backlog with `None`).
    pub fn assign_sprint(
        &self,
        item_id: i64,
        sprint_id: Option<i64>,
    ) -> Result<PendingMove, MoveError> {
        let change = self.lock().set_sprint(item_id, sprint_id)?;
        let Some(change) = change else {
            return Ok(PendingMove::unchanged(item_id));
        };
        self.bus.publish(BoardEvent::SprintAssigned {
            item_id,
            sprint_id,
            confirmed: false,
        });
        Ok(self.spawn_persist(Pending::Sprint(change)))
    }

    fn spawn_persist(&self, pending: Pending) -> PendingMove {
        let this = self.clone();
        let item_id = pending.item_id();
        let handle = tokio::spawn(async move { this.persist(pending).await });
        PendingMove {
            item_id,
            handle: Some(handle),
        }
    }

    async fn persist(self, pending: Pending) -> MoveOutcome {
        let item_id = pending.item_id();
        let result = match &pending {
            Pending::Move(cmd) => {
                let req = MoveItemRequest::from(cmd);
                self.settings
                    .retry
                    .run(|| self.api.move_item(item_id, &req))
                    .await
            }
            Pending::Sprint(change) => {
                let req = AssignSprintRequest {
                    sprint_id: change.to,
                };
                self.settings
                    .retry
                    .run(|| self.api.assign_sprint(item_id, &req))
                    .await
            }
        };

        match result {
            Ok(_) => {
                let entry = match &pending {
                    Pending::Move(cmd) => {
                        self.bus.publish(BoardEvent::ItemMoved {
                            item_id,
                            to: cmd.to,
                            index: cmd.to_index,
                        });
                        ActivityEntry::now(
                            item_id,
                            ActivityAction::Moved,
                            format!("moved from {} to {}", cmd.from, cmd.to),
                        )
                    }
                    Pending::Sprint(change) => {
                        self.bus.publish(BoardEvent::SprintAssigned {
                            item_id,
                            sprint_id: change.to,
                            confirmed: true,
                        });
                        let message = match change.to {
                            Some(id) => format!("planned into sprint {}", id),
                            None => "returned to backlog".to_string(),
                        };
                        ActivityEntry::now(item_id, ActivityAction::SprintChanged, message)
                    }
                };
                self.record_activity(entry).await;
                MoveOutcome::Persisted
            }
            Err(err) => {
                warn!(item_id, error = %err, policy = %self.settings.rollback, "persist failed; rolling back");
                self.bus.publish(BoardEvent::MoveFailed {
                    item_id,
                    error: err.to_string(),
                });
                self.roll_back(pending).await
            }
        }
    }

    async fn roll_back(&self, pending: Pending) -> MoveOutcome {
        let item_id = pending.item_id();
        if self.settings.rollback == RollbackPolicy::Undo {
            let undone = {
                let mut state = self.lock();
                pending.undo(&mut state)
            };
            if undone {
                self.bus.publish(BoardEvent::MoveRolledBack {
                    item_id,
                    reloaded: false,
                });
                return MoveOutcome::RolledBack { reloaded: false };
            }
            debug!(item_id, "item changed since the move; falling back to reload");
        }

        match self.load().await {
            Ok(_) => {
                self.bus.publish(BoardEvent::MoveRolledBack {
                    item_id,
                    reloaded: true,
                });
                MoveOutcome::RolledBack { reloaded: true }
            }
            Err(err) => {
                error!(item_id, error = %err, "reload after failed persist also failed");
                self.bus.publish(BoardEvent::ReloadFailed {
                    item_id,
                    error: err.to_string(),
                });
                MoveOutcome::RollbackFailed {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Best effort: a failure is logged and does not change the outcome.
    async fn record_activity(&self, entry: ActivityEntry) {
        if let Err(err) = self.api.record_activity(&entry).await {
            warn!(item_id = entry.item_id, error = %err, "activity not recorded");
        }
    }

    // ── Confirmed (non-optimistic) mutations ────────────────────────

    pub async fn create_item(&self, req: &CreateItemRequest) -> BoardResult<WorkItem> {
        let item = self.api.create_item(self.project_id, req).await?;
        self.lock().upsert(item.clone());
        self.bus.publish(BoardEvent::ItemCreated { item: item.clone() });
        Ok(item)
    }

    pub async fn update_item(&self, item_id: i64, req: &UpdateItemRequest) -> BoardResult<WorkItem> {
        let item = self.api.update_item(item_id, req).await?;
        self.lock().upsert(item.clone());
        self.bus.publish(BoardEvent::ItemUpdated { item: item.clone() });
        Ok(item)
    }

    /// Backend delete, then local filter.
    pub async fn delete_item(&self, item_id: i64) -> BoardResult<()> {
        self.api.delete_item(item_id).await?;
        if self.lock().remove(item_id).is_none() {
            debug!(item_id, "deleted item was not on the local board");
        }
        self.bus.publish(BoardEvent::ItemDeleted { item_id });
        Ok(())
    }

    pub async fn create_lane(&self, name: &str) -> BoardResult<Lane> {
        let lane = self
            .api
            .create_lane(
                self.project_id,
                &CreateLaneRequest {
                    name: name.to_string(),
                },
            )
            .await?;
        self.lock().add_lane(lane.clone());
        self.bus.publish(BoardEvent::LaneCreated { lane: lane.clone() });
        Ok(lane)
    }

    /// Local-only collapse toggle.
    pub fn toggle_lane(&self, lane_id: i64) -> BoardResult<bool> {
        let collapsed = self.lock().toggle_lane(lane_id)?;
        self.bus.publish(BoardEvent::LaneToggled { lane_id, collapsed });
        Ok(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryApi;
    use crate::board::moves::Slot;
    use crate::errors::BoardError;
    use crate::events::Topic;
    use crate::stub::store::StubStore;
    use std::time::Duration;
    use taskboard_common::Column;

    const A: Column = Column::Ready;
    const B: Column = Column::InProgress;

    /// Project 1 with items 1, 2, 3 in column A and nothing in column B.
    fn three_in_a() -> StubStore {
        let mut store = StubStore::new();
        store.add_project(1);
        for id in 1..=3 {
            store
                .add_item(1, WorkItem::new(id, format!("story {}", id), A))
                .unwrap();
        }
        store
    }

    async fn mutator_with(store: StubStore, settings: MutatorSettings) -> (OptimisticMutator, MemoryApi) {
        let api = MemoryApi::new(store);
        let mutator = OptimisticMutator::new(1, Arc::new(api.clone()), EventBus::new(), settings);
        mutator.load().await.unwrap();
        (mutator, api)
    }

    fn ids(mutator: &OptimisticMutator, column: Column) -> Vec<i64> {
        mutator.read(|s| s.group_ids(Slot::new(column, None)))
    }

    #[tokio::test]
    async fn test_move_into_empty_column_persists() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let pending = mutator.move_to(2, Destination::new(B, None, 0)).unwrap();

        assert_eq!(ids(&mutator, A), vec![1, 3]);
        assert_eq!(ids(&mutator, B), vec![2]);
        assert_eq!(pending.outcome().await, MoveOutcome::Persisted);

        let server = api.store().with(|s| s.items(1).unwrap());
        let server_b: Vec<i64> = server.iter().filter(|i| i.column == B).map(|i| i.id).collect();
        assert_eq!(server_b, vec![2]);
    }

    #[tokio::test]
    async fn test_local_write_precedes_persistence() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let pending = mutator.move_to(1, Destination::new(B, None, 0)).unwrap();
        // The spawned task has not run yet on the current-thread runtime.
        assert_eq!(ids(&mutator, B), vec![1]);
        assert_eq!(api.move_calls(), 0);
        pending.outcome().await;
        assert_eq!(api.move_calls(), 1);
    }

    #[tokio::test]
    async fn test_noop_move_skips_network() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let before = mutator.read(|s| s.items().to_vec());
        let pending = mutator.move_to(2, Destination::new(A, None, 1)).unwrap();
        assert!(pending.is_noop());
        assert_eq!(pending.outcome().await, MoveOutcome::Unchanged);
        assert_eq!(api.move_calls(), 0);
        assert_eq!(mutator.read(|s| s.items().to_vec()), before);
    }

    #[tokio::test]
    async fn test_repeated_move_is_noop_second_time() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let dest = Destination::new(B, None, 0);
        mutator.move_to(3, dest).unwrap().outcome().await;
        let again = mutator.move_to(3, dest).unwrap();
        assert!(again.is_noop());
        assert_eq!(api.move_calls(), 1);
    }

    #[tokio::test]
    async fn test_drag_drop_feeds_mutator() {
        let (mutator, _api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let mut drag = crate::board::DragAdapter::new();
        mutator.read(|s| drag.begin(s, 3)).unwrap();
        drag.hover(Some(Destination::new(B, None, 0))).unwrap();
        let request = drag.drop_at_hover().unwrap();
        assert!(drag.active_item().is_none());
        assert_eq!(
            mutator.move_item(&request).unwrap().outcome().await,
            MoveOutcome::Persisted
        );
        assert_eq!(ids(&mutator, B), vec![3]);
    }

    #[tokio::test]
    async fn test_failed_persist_reloads_server_state() {
        let mut store = three_in_a();
        store.fail_moves(u32::MAX);
        let (mutator, _api) = mutator_with(store, MutatorSettings::default()).await;
        let mut events = mutator.bus().subscribe(&[Topic::Moves, Topic::Sync]);
        let refresh_before = mutator.refresh_count();

        let pending = mutator.move_to(2, Destination::new(B, None, 0)).unwrap();
        assert_eq!(ids(&mutator, B), vec![2]);
        assert_eq!(
            pending.outcome().await,
            MoveOutcome::RolledBack { reloaded: true }
        );

        assert_eq!(ids(&mutator, A), vec![1, 2, 3]);
        assert!(ids(&mutator, B).is_empty());
        assert_eq!(mutator.refresh_count(), refresh_before + 1);

        let names: Vec<&str> = events.drain().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["MoveApplied", "MoveFailed", "BoardReloaded", "MoveRolledBack"]
        );
    }

    #[tokio::test]
    async fn test_undo_policy_restores_without_reload() {
        let mut store = three_in_a();
        store.fail_moves(u32::MAX);
        let settings = MutatorSettings {
            rollback: RollbackPolicy::Undo,
            ..Default::default()
        };
        let (mutator, _api) = mutator_with(store, settings).await;
        let before = mutator.read(|s| s.items().to_vec());
        let refresh_before = mutator.refresh_count();

        let outcome = mutator
            .move_to(1, Destination::new(A, None, 2))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::RolledBack { reloaded: false });
        assert_eq!(mutator.read(|s| s.items().to_vec()), before);
        assert_eq!(mutator.refresh_count(), refresh_before);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let mut store = three_in_a();
        store.unavailable_moves(2);
        let settings = MutatorSettings {
            retry: RetryPolicy::new(3, Duration::from_millis(1)),
            ..Default::default()
        };
        let (mutator, api) = mutator_with(store, settings).await;
        let outcome = mutator
            .move_to(1, Destination::new(B, None, 0))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::Persisted);
        assert_eq!(api.move_calls(), 3);
        assert_eq!(ids(&mutator, B), vec![1]);
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_without_retry() {
        let mut store = three_in_a();
        store.fail_moves(u32::MAX);
        let settings = MutatorSettings {
            retry: RetryPolicy::new(3, Duration::from_millis(1)),
            ..Default::default()
        };
        let (mutator, api) = mutator_with(store, settings).await;
        let outcome = mutator
            .move_to(1, Destination::new(B, None, 0))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::RolledBack { reloaded: true });
        assert_eq!(api.move_calls(), 1);
    }

    #[tokio::test]
    async fn test_persisted_move_records_activity() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let outcome = mutator
            .move_to(2, Destination::new(B, None, 0))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::Persisted);

        // Recorded before the outcome resolves.
        let actions: Vec<ActivityAction> = api
            .store()
            .with(|s| s.activity(2).unwrap())
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec![ActivityAction::Moved]);
    }

    #[tokio::test]
    async fn test_rolled_back_move_records_no_activity() {
        let mut store = three_in_a();
        store.fail_moves(u32::MAX);
        let (mutator, api) = mutator_with(store, MutatorSettings::default()).await;
        let outcome = mutator
            .move_to(2, Destination::new(B, None, 0))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::RolledBack { reloaded: true });
        assert!(api.store().with(|s| s.activity(2).unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_publishes_reload_failed() {
        let mut store = three_in_a();
        store.fail_moves(u32::MAX);
        let (mutator, api) = mutator_with(store, MutatorSettings::default()).await;
        api.store().with(|s| s.fail_item_listing(true));
        let mut events = mutator.bus().subscribe(&[Topic::Sync]);
        let refresh_before = mutator.refresh_count();

        let outcome = mutator
            .move_to(2, Destination::new(B, None, 0))
            .unwrap()
            .outcome()
            .await;
        assert!(matches!(outcome, MoveOutcome::RollbackFailed { .. }));
        // Optimistic state is left in place at the same generation.
        assert_eq!(ids(&mutator, B), vec![2]);
        assert_eq!(mutator.refresh_count(), refresh_before);

        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(
            &drained[0],
            BoardEvent::ReloadFailed { item_id: 2, error } if error.contains("503")
        ));

        api.store().with(|s| s.fail_item_listing(false));
        assert_eq!(mutator.load().await.unwrap(), refresh_before + 1);
        assert!(ids(&mutator, B).is_empty());
    }

    #[tokio::test]
    async fn test_sprint_assignment_rolls_back_on_failure() {
        let mut store = three_in_a();
        let sprint = store.add_sprint(1, "Sprint 1").unwrap();
        store.fail_sprint_changes(true);
        let settings = MutatorSettings {
            rollback: RollbackPolicy::Undo,
            ..Default::default()
        };
        let (mutator, _api) = mutator_with(store, settings).await;

        let pending = mutator.assign_sprint(2, Some(sprint.id)).unwrap();
        assert_eq!(mutator.read(|s| s.item(2).unwrap().sprint_id), Some(sprint.id));
        assert_eq!(
            pending.outcome().await,
            MoveOutcome::RolledBack { reloaded: false }
        );
        assert_eq!(mutator.read(|s| s.item(2).unwrap().sprint_id), None);
    }

    #[tokio::test]
    async fn test_sprint_assignment_persists() {
        let mut store = three_in_a();
        let sprint = store.add_sprint(1, "Sprint 1").unwrap();
        let (mutator, api) = mutator_with(store, MutatorSettings::default()).await;
        let outcome = mutator
            .assign_sprint(3, Some(sprint.id))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(outcome, MoveOutcome::Persisted);
        let server_sprint = api
            .store()
            .with(|s| s.items(1).unwrap().into_iter().find(|i| i.id == 3).unwrap().sprint_id);
        assert_eq!(server_sprint, Some(sprint.id));
        let actions: Vec<ActivityAction> = api
            .store()
            .with(|s| s.activity(3).unwrap())
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec![ActivityAction::SprintChanged]);
        assert_eq!(
            mutator.assign_sprint(9, None).unwrap_err(),
            MoveError::ItemNotFound { id: 9 }
        );
    }

    #[tokio::test]
    async fn test_reject_policy_surfaces_orphans() {
        let mut store = StubStore::new();
        store.add_project(1);
        store
            .add_item(1, WorkItem::new(1, "orphan", A).with_lane(Some(55)))
            .unwrap();
        let api = MemoryApi::new(store);
        let settings = MutatorSettings {
            orphans: OrphanPolicy::Reject,
            ..Default::default()
        };
        let mutator = OptimisticMutator::new(1, Arc::new(api), EventBus::new(), settings);
        let err = mutator.load().await.unwrap_err();
        assert!(matches!(err, BoardError::OrphanedItems { .. }));
        assert_eq!(mutator.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_crud_updates_local_state_after_backend() {
        let (mutator, api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let mut events = mutator.bus().subscribe(&[Topic::Items]);

        let created = mutator
            .create_item(&CreateItemRequest {
                subject: "New story".into(),
                tags: vec!["api".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.column, Column::New);
        assert!(mutator.read(|s| s.item(created.id).is_some()));

        let updated = mutator
            .update_item(
                created.id,
                &UpdateItemRequest {
                    blocked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.blocked);
        assert_eq!(mutator.read(|s| s.facets().blocked_count()), 1);

        mutator.delete_item(created.id).await.unwrap();
        assert!(mutator.read(|s| s.item(created.id).is_none()));
        assert!(api.store().with(|s| s.item(created.id).is_none()));

        let names: Vec<&str> = events.drain().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["ItemCreated", "ItemUpdated", "ItemDeleted"]);
    }

    #[tokio::test]
    async fn test_lane_creation_and_toggle() {
        let (mutator, _api) = mutator_with(three_in_a(), MutatorSettings::default()).await;
        let lane = mutator.create_lane("Expedite").await.unwrap();
        assert!(mutator.read(|s| s.lane(lane.id).is_some()));
        assert!(mutator.toggle_lane(lane.id).unwrap());
        assert!(!mutator.toggle_lane(lane.id).unwrap());
        assert!(mutator.toggle_lane(999).is_err());
    }
}
