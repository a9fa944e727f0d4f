//! Drag gesture → `MoveRequest` translation.
//!
//! Only one drag may be active at a time; that constraint is the sole
//! protection against overlapping moves.

use super::moves::{Destination, ItemPosition, MoveRequest};
use super::state::BoardState;
use crate::errors::DragError;

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    source: ItemPosition,
    hover: Option<Destination>,
}

#[derive(Debug, Default)]
pub struct DragAdapter {
    active: Option<ActiveDrag>,
}

impl DragAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item currently being dragged, if any.
    pub fn active_item(&self) -> Option<i64> {
        self.active.map(|drag| drag.source.item_id)
    }

    pub fn begin(&mut self, state: &BoardState, item_id: i64) -> Result<ItemPosition, DragError> {
        if let Some(active) = self.active_item() {
            return Err(DragError::AlreadyDragging { active });
        }
        let source = state
            .position_of(item_id)
            .ok_or(DragError::UnknownItem { id: item_id })?;
        self.active = Some(ActiveDrag {
            source,
            hover: None,
        });
        Ok(source)
    }

    /// Track the slot under the pointer. Passing `None` leaves the board area.
    pub fn hover(&mut self, destination: Option<Destination>) -> Result<(), DragError> {
        let drag = self.active.as_mut().ok_or(DragError::NotDragging)?;
        drag.hover = destination;
        Ok(())
    }

    pub fn drop_on(&mut self, destination: Destination) -> Result<MoveRequest, DragError> {
        let drag = self.active.take().ok_or(DragError::NotDragging)?;
        Ok(MoveRequest {
            source: drag.source,
            destination,
        })
    }

    /// Finish the drag at the last hovered destination.
    pub fn drop_at_hover(&mut self) -> Result<MoveRequest, DragError> {
        let drag = self.active.take().ok_or(DragError::NotDragging)?;
        let destination = drag.hover.ok_or(DragError::NoDropTarget {
            id: drag.source.item_id,
        })?;
        Ok(MoveRequest {
            source: drag.source,
            destination,
        })
    }

    pub fn cancel(&mut self) -> Option<i64> {
        self.active.take().map(|drag| drag.source.item_id)
    }
}
