use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use taskboard_common::{Column, Lane, Sprint, WorkItem};
use tracing::warn;

use super::facets::FacetIndex;
use super::moves::{self, ItemPosition, MoveCommand, MoveRequest, Slot};
use crate::errors::{BoardError, MoveError};

/// What to do with items whose lane id names no known lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Move orphans to the first lane and carry on.
    #[default]
    Reassign,
    /// Refuse the snapshot.
    Reject,
}

impl std::fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrphanPolicy::Reassign => write!(f, "reassign"),
            OrphanPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for OrphanPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reassign" => Ok(OrphanPolicy::Reassign),
            "reject" => Ok(OrphanPolicy::Reject),
            _ => anyhow::bail!("Invalid orphan policy '{}'. Valid values: reassign, reject", s),
        }
    }
}

/// Result of reconciling a snapshot's lane references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub reassigned: Vec<i64>,
    pub lane_id: Option<i64>,
}

/// A sprint change applied locally, reversible while the item still sits
/// in the target sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintChange {
    pub item_id: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

// ── Views ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub project_id: i64,
    pub refresh: u64,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub column: Column,
    pub color: &'static str,
    pub lanes: Vec<LaneView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaneView {
    pub lane_id: Option<i64>,
    pub name: String,
    pub collapsed: bool,
    pub items: Vec<WorkItem>,
}

impl ColumnView {
    pub fn item_count(&self) -> usize {
        self.lanes.iter().map(|l| l.items.len()).sum()
    }
}

// ── State holder ─────────────────────────────────────────────────────

/// In-memory board: one flat ordered item list plus lanes and sprints.
#[derive(Debug, Clone)]
pub struct BoardState {
    project_id: i64,
    items: Vec<WorkItem>,
    lanes: Vec<Lane>,
    sprints: Vec<Sprint>,
    refresh: u64,
    facets: FacetIndex,
}

impl BoardState {
    pub fn new(project_id: i64) -> Self {
        Self {
            project_id,
            items: Vec::new(),
            lanes: Vec::new(),
            sprints: Vec::new(),
            refresh: 0,
            facets: FacetIndex::default(),
        }
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    /// Number of authoritative snapshots committed so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh
    }

    pub fn facets(&self) -> &FacetIndex {
        &self.facets
    }

    pub fn item(&self, id: i64) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn lane(&self, id: i64) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    /// Commit a fresh backend snapshot.
    ///
    /// Lane collapse flags survive the reload since the backend never
    /// stores them. With `OrphanPolicy::Reject` an inconsistent snapshot
    /// leaves the current state untouched.
    pub fn replace(
        &mut self,
        mut lanes: Vec<Lane>,
        mut items: Vec<WorkItem>,
        sprints: Vec<Sprint>,
        policy: OrphanPolicy,
    ) -> Result<Reconciliation, BoardError> {
        lanes.sort_by_key(|lane| (lane.order, lane.id));
        for lane in &mut lanes {
            if let Some(previous) = self.lane(lane.id) {
                lane.collapsed = previous.collapsed;
            }
        }

        let known: HashSet<i64> = lanes.iter().map(|lane| lane.id).collect();
        let orphans: Vec<i64> = items
            .iter()
            .filter(|item| matches!(item.lane_id, Some(id) if !known.contains(&id)))
            .map(|item| item.id)
            .collect();

        let fallback = lanes.first().map(|lane| lane.id);
        if !orphans.is_empty() {
            match policy {
                OrphanPolicy::Reject => {
                    return Err(BoardError::OrphanedItems { item_ids: orphans });
                }
                OrphanPolicy::Reassign => {
                    warn!(
                        project_id = self.project_id,
                        items = ?orphans,
                        lane_id = ?fallback,
                        "reassigning items with unknown lanes"
                    );
                    for item in items.iter_mut().filter(|item| orphans.contains(&item.id)) {
                        item.lane_id = fallback;
                    }
                }
            }
        }

        self.facets = FacetIndex::from_items(&items);
        self.items = items;
        self.lanes = lanes;
        self.sprints = sprints;
        self.refresh += 1;

        Ok(Reconciliation {
            reassigned: orphans,
            lane_id: fallback,
        })
    }

    pub fn position_of(&self, item_id: i64) -> Option<ItemPosition> {
        moves::position_of(&self.items, item_id)
    }

    /// Items in `slot`, in board order.
    pub fn group(&self, slot: Slot) -> Vec<&WorkItem> {
        self.items.iter().filter(|item| slot.holds(item)).collect()
    }

    pub fn group_ids(&self, slot: Slot) -> Vec<i64> {
        self.group(slot).into_iter().map(|item| item.id).collect()
    }

    pub fn apply_move(&mut self, request: &MoveRequest) -> Result<Option<MoveCommand>, MoveError> {
        if let Some(lane_id) = request.destination.slot.lane_id {
            if self.lane(lane_id).is_none() {
                return Err(MoveError::UnknownLane { id: lane_id });
            }
        }
        let command = moves::apply(&mut self.items, request)?;
        if let Some(cmd) = &command {
            self.facets.record_move(cmd.from.column, cmd.to.column);
        }
        Ok(command)
    }

    pub fn undo_move(&mut self, command: &MoveCommand) -> bool {
        let undone = moves::undo(&mut self.items, command);
        if undone {
            self.facets.record_move(command.to.column, command.from.column);
        }
        undone
    }

    pub fn set_sprint(
        &mut self,
        item_id: i64,
        sprint_id: Option<i64>,
    ) -> Result<Option<SprintChange>, MoveError> {
        if let Some(id) = sprint_id {
            if !self.sprints.iter().any(|s| s.id == id) {
                return Err(MoveError::UnknownSprint { id });
            }
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(MoveError::ItemNotFound { id: item_id })?;
        if item.sprint_id == sprint_id {
            return Ok(None);
        }
        let change = SprintChange {
            item_id,
            from: item.sprint_id,
            to: sprint_id,
        };
        item.sprint_id = sprint_id;
        Ok(Some(change))
    }

    pub fn undo_sprint(&mut self, change: &SprintChange) -> bool {
        match self.items.iter_mut().find(|item| item.id == change.item_id) {
            Some(item) if item.sprint_id == change.to => {
                item.sprint_id = change.from;
                true
            }
            _ => false,
        }
    }

    /// Insert a new item at the end of its slot, or replace an existing one
    /// in place.
    pub fn upsert(&mut self, item: WorkItem) {
        match self.items.iter().position(|existing| existing.id == item.id) {
            Some(idx) => {
                self.facets.replace(&self.items[idx], &item);
                self.items[idx] = item;
            }
            None => {
                self.facets.insert(&item);
                self.items.push(item);
            }
        }
    }

    /// Local filter after a backend delete.
    pub fn remove(&mut self, item_id: i64) -> Option<WorkItem> {
        let idx = self.items.iter().position(|item| item.id == item_id)?;
        let item = self.items.remove(idx);
        self.facets.remove(&item);
        Some(item)
    }

    pub fn add_lane(&mut self, lane: Lane) {
        self.lanes.retain(|existing| existing.id != lane.id);
        self.lanes.push(lane);
        self.lanes.sort_by_key(|lane| (lane.order, lane.id));
    }

    /// Flip a lane's collapse flag, returning the new value.
    pub fn toggle_lane(&mut self, lane_id: i64) -> Result<bool, BoardError> {
        let lane = self
            .lanes
            .iter_mut()
            .find(|lane| lane.id == lane_id)
            .ok_or(BoardError::LaneNotFound { id: lane_id })?;
        lane.collapsed = !lane.collapsed;
        Ok(lane.collapsed)
    }

    /// Columns × lanes grid. Items without a lane appear in an
    /// "Unclassified" row, which is always present when no lanes exist.
    pub fn view(&self) -> BoardView {
        let show_unclassified =
            self.lanes.is_empty() || self.items.iter().any(|item| item.lane_id.is_none());

        let columns = Column::ALL
            .iter()
            .map(|&column| {
                let mut lanes = Vec::with_capacity(self.lanes.len() + 1);
                if show_unclassified {
                    lanes.push(LaneView {
                        lane_id: None,
                        name: "Unclassified".to_string(),
                        collapsed: false,
                        items: self.group(Slot::new(column, None)).into_iter().cloned().collect(),
                    });
                }
                for lane in &self.lanes {
                    lanes.push(LaneView {
                        lane_id: Some(lane.id),
                        name: lane.name.clone(),
                        collapsed: lane.collapsed,
                        items: self
                            .group(Slot::new(column, Some(lane.id)))
                            .into_iter()
                            .cloned()
                            .collect(),
                    });
                }
                ColumnView {
                    column,
                    color: column.color(),
                    lanes,
                }
            })
            .collect();

        BoardView {
            project_id: self.project_id,
            refresh: self.refresh,
            columns,
        }
    }
}
