//! Move planning over the board's flat item list.
//!
//! Ordering is kept as one flat `Vec<WorkItem>`; an item's position within
//! its column is its index among the items sharing its (column, lane) slot.
//! A move therefore removes the item from the flat list and translates the
//! requested group index back into a flat insertion point.

use serde::{Deserialize, Serialize};
use taskboard_common::{Column, WorkItem};

use crate::errors::MoveError;

/// A (column, lane) cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub column: Column,
    pub lane_id: Option<i64>,
}

impl Slot {
    pub fn new(column: Column, lane_id: Option<i64>) -> Self {
        Self { column, lane_id }
    }

    pub fn of(item: &WorkItem) -> Self {
        Self::new(item.column, item.lane_id)
    }

    pub fn holds(&self, item: &WorkItem) -> bool {
        item.in_slot(self.column, self.lane_id)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lane_id {
            Some(lane) => write!(f, "{}/lane-{}", self.column, lane),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Where an item currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPosition {
    pub item_id: i64,
    pub slot: Slot,
    pub index: usize,
}

/// Where a dragged item was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub slot: Slot,
    pub index: usize,
}

impl Destination {
    pub fn new(column: Column, lane_id: Option<i64>, index: usize) -> Self {
        Self {
            slot: Slot::new(column, lane_id),
            index,
        }
    }
}

/// A requested move from a source position to a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub source: ItemPosition,
    pub destination: Destination,
}

impl MoveRequest {
    pub fn item_id(&self) -> i64 {
        self.source.item_id
    }

    /// Build a request whose source is the item's current position in `items`.
    pub fn resolve(
        items: &[WorkItem],
        item_id: i64,
        destination: Destination,
    ) -> Result<Self, MoveError> {
        let source = position_of(items, item_id).ok_or(MoveError::ItemNotFound { id: item_id })?;
        Ok(Self {
            source,
            destination,
        })
    }
}

/// A move that has been applied locally, with enough information to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub item_id: i64,
    pub from: Slot,
    pub from_flat: usize,
    pub from_index: usize,
    pub to: Slot,
    pub to_flat: usize,
    pub to_index: usize,
}

/// Flat indices of the items occupying `slot`, in board order.
pub fn group_indices(items: &[WorkItem], slot: Slot) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| slot.holds(item))
        .map(|(idx, _)| idx)
        .collect()
}

pub fn position_of(items: &[WorkItem], item_id: i64) -> Option<ItemPosition> {
    let flat = items.iter().position(|item| item.id == item_id)?;
    let slot = Slot::of(&items[flat]);
    let index = items[..flat].iter().filter(|item| slot.holds(item)).count();
    Some(ItemPosition {
        item_id,
        slot,
        index,
    })
}

/// Apply `request` to `items`.
///
/// The source is re-read from `items` rather than trusted from the request,
/// so replaying an already-applied request resolves to a no-op. Returns
/// `Ok(None)` when the item already sits at the (clamped) destination.
pub fn apply(items: &mut Vec<WorkItem>, request: &MoveRequest) -> Result<Option<MoveCommand>, MoveError> {
    let item_id = request.item_id();
    let current = position_of(items, item_id).ok_or(MoveError::ItemNotFound { id: item_id })?;
    let dest = request.destination;

    let others_in_dest = items
        .iter()
        .filter(|item| item.id != item_id && dest.slot.holds(item))
        .count();
    let to_index = dest.index.min(others_in_dest);

    if current.slot == dest.slot && current.index == to_index {
        return Ok(None);
    }

    let from_flat = items
        .iter()
        .position(|item| item.id == item_id)
        .ok_or(MoveError::ItemNotFound { id: item_id })?;
    let mut moved = items.remove(from_flat);
    moved.column = dest.slot.column;
    moved.lane_id = dest.slot.lane_id;

    let group = group_indices(items, dest.slot);
    let to_flat = match group.as_slice() {
        [] => items.len(),
        [first, ..] if to_index == 0 => *first,
        [.., last] if to_index >= group.len() => *last + 1,
        _ => group[to_index],
    };
    items.insert(to_flat, moved);

    Ok(Some(MoveCommand {
        item_id,
        from: current.slot,
        from_flat,
        from_index: current.index,
        to: dest.slot,
        to_flat,
        to_index,
    }))
}

/// Reverse `command` if the item is still exactly where the move left it.
pub fn undo(items: &mut Vec<WorkItem>, command: &MoveCommand) -> bool {
    let Some(flat) = items.iter().position(|item| item.id == command.item_id) else {
        return false;
    };
    if flat != command.to_flat || !command.to.holds(&items[flat]) {
        return false;
    }
    let mut item = items.remove(flat);
    item.column = command.from.column;
    item.lane_id = command.from.lane_id;
    let at = command.from_flat.min(items.len());
    items.insert(at, item);
    true
}
