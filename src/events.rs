//! Typed publish/subscribe for board domain events.
//!
//! Each subscriber owns an unbounded queue. `publish` only enqueues, so a
//! publisher never runs listener code and listeners consume on their own
//! task. Events reach every subscriber in publish order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};
use taskboard_common::{Lane, WorkItem};
use tokio::sync::mpsc;
use tracing::debug;

use crate::board::moves::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Items,
    Moves,
    Sprints,
    Sync,
    Team,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Items,
        Topic::Moves,
        Topic::Sprints,
        Topic::Sync,
        Topic::Team,
    ];
}

// ── Event types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BoardEvent {
    ItemCreated {
        item: WorkItem,
    },
    ItemUpdated {
        item: WorkItem,
    },
    ItemDeleted {
        item_id: i64,
    },

    /// Local, not yet confirmed by the backend.
    MoveApplied {
        item_id: i64,
        from: Slot,
        to: Slot,
        index: usize,
    },
    /// Confirmed by the backend.
    ItemMoved {
        item_id: i64,
        to: Slot,
        index: usize,
    },
    MoveFailed {
        item_id: i64,
        error: String,
    },
    MoveRolledBack {
        item_id: i64,
        reloaded: bool,
    },

    SprintAssigned {
        item_id: i64,
        sprint_id: Option<i64>,
        confirmed: bool,
    },

    BoardReloaded {
        refresh: u64,
        item_count: usize,
    },
    /// Rollback reload failed; local state still holds the optimistic
    /// change and the refresh counter did not advance.
    ReloadFailed {
        item_id: i64,
        error: String,
    },
    OrphansReassigned {
        item_ids: Vec<i64>,
        lane_id: Option<i64>,
    },
    LaneCreated {
        lane: Lane,
    },
    LaneToggled {
        lane_id: i64,
        collapsed: bool,
    },

    MemberRoleChanged {
        member_id: i64,
        role_id: i64,
    },
}

impl BoardEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::ItemCreated { .. } | Self::ItemUpdated { .. } | Self::ItemDeleted { .. } => {
                Topic::Items
            }
            Self::MoveApplied { .. }
            | Self::ItemMoved { .. }
            | Self::MoveFailed { .. }
            | Self::MoveRolledBack { .. } => Topic::Moves,
            Self::SprintAssigned { .. } => Topic::Sprints,
            Self::BoardReloaded { .. }
            | Self::ReloadFailed { .. }
            | Self::OrphansReassigned { .. }
            | Self::LaneCreated { .. }
            | Self::LaneToggled { .. } => Topic::Sync,
            Self::MemberRoleChanged { .. } => Topic::Team,
        }
    }

    /// Variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "ItemCreated",
            Self::ItemUpdated { .. } => "ItemUpdated",
            Self::ItemDeleted { .. } => "ItemDeleted",
            Self::MoveApplied { .. } => "MoveApplied",
            Self::ItemMoved { .. } => "ItemMoved",
            Self::MoveFailed { .. } => "MoveFailed",
            Self::MoveRolledBack { .. } => "MoveRolledBack",
            Self::SprintAssigned { .. } => "SprintAssigned",
            Self::BoardReloaded { .. } => "BoardReloaded",
            Self::ReloadFailed { .. } => "ReloadFailed",
            Self::OrphansReassigned { .. } => "OrphansReassigned",
            Self::LaneCreated { .. } => "LaneCreated",
            Self::LaneToggled { .. } => "LaneToggled",
            Self::MemberRoleChanged { .. } => "MemberRoleChanged",
        }
    }
}

// ── Bus ──────────────────────────────────────────────────────────────

pub type SubscriptionId = u64;

struct Subscriber {
    topics: HashSet<Topic>,
    tx: mpsc::UnboundedSender<BoardEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: SubscriptionId,
    subscribers: HashMap<SubscriptionId, Subscriber>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the given topics. An empty slice subscribes to all.
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        let topics: HashSet<Topic> = if topics.is_empty() {
            Topic::ALL.into_iter().collect()
        } else {
            topics.iter().copied().collect()
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = registry.next_id;
        registry.next_id += 1;
        debug!(subscription = id, topics = ?topics, "event bus subscribe");
        registry.subscribers.insert(id, Subscriber { topics, tx });
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Queue `event` for every matching subscriber. Returns how many
    /// subscribers it was delivered to.
    pub fn publish(&self, event: BoardEvent) -> usize {
        let topic = event.topic();
        let mut registry = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sub) in registry.subscribers.iter() {
            if !sub.topics.contains(&topic) {
                continue;
            }
            if sub.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*id);
            }
        }
        for id in closed {
            registry.subscribers.remove(&id);
        }
        debug!(event = event.name(), ?topic, delivered, "event bus publish");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        match self.registry.lock() {
            Ok(guard) => guard.subscribers.len(),
            Err(poisoned) => poisoned.into_inner().subscribers.len(),
        }
    }
}

fn unregister(registry: &Weak<Mutex<Registry>>, id: SubscriptionId) {
    if let Some(registry) = registry.upgrade() {
        let mut registry = match registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if registry.subscribers.remove(&id).is_some() {
            debug!(subscription = id, "event bus unsubscribe");
        }
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<BoardEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. Returns `None` once the bus is gone and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<BoardEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<BoardEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued right now.
    pub fn drain(&mut self) -> Vec<BoardEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        unregister(&self.registry, self.id);
    }
}
