//! Board state and the optimistic mutation pipeline.
//!
//! | Module    | Role                                                  |
//! |-----------|-------------------------------------------------------|
//! | `moves`   | Flat-list move/undo arithmetic over (column, lane)    |
//! | `state`   | Authoritative local snapshot, orphan reconciliation   |
//! | `facets`  | Incremental filter counts                             |
//! | `drag`    | Drag gesture to `MoveRequest` translation             |
//! | `retry`   | Backoff policy for persist calls                      |
//! | `mutator` | Optimistic apply, background persist, rollback        |

pub mod drag;
pub mod facets;
pub mod moves;
pub mod mutator;
pub mod retry;
pub mod state;

pub use drag::DragAdapter;
pub use facets::FacetIndex;
pub use moves::{Destination, ItemPosition, MoveCommand, MoveRequest, Slot};
pub use mutator::{MoveOutcome, MutatorSettings, OptimisticMutator, PendingMove, RollbackPolicy};
pub use retry::RetryPolicy;
pub use state::{BoardState, BoardView, OrphanPolicy};
