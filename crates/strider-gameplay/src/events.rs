//! Fan-out event bus for agent notifications.
//!
//! Animation, audio and UI collaborators subscribe to an agent's bus and
//! drain their receiver at their own pace. Publishing never blocks: a full
//! subscriber misses the event, a dropped subscriber is pruned.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use strider_common::AgentId;

/// Notifications produced by locomotion and focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// A jump impulse was applied
    Jump {
        /// Agent that jumped
        agent: AgentId,
    },
    /// The agent landed after a jump
    Land {
        /// Agent that landed
        agent: AgentId,
    },
    /// An NPC received a focus trigger
    Focus {
        /// Focused NPC
        agent: AgentId,
    },
    /// An NPC left focus and resumed patrolling
    ExitFocus {
        /// NPC that left focus
        agent: AgentId,
    },
}

impl AgentEvent {
    /// Agent the event refers to.
    #[must_use]
    pub const fn agent(&self) -> AgentId {
        match self {
            Self::Jump { agent }
            | Self::Land { agent }
            | Self::Focus { agent }
            | Self::ExitFocus { agent } => *agent,
        }
    }
}

/// Event bus broadcasting to any number of subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// One sender per live subscriber
    subscribers: Vec<Sender<AgentEvent>>,
    /// Per-subscriber channel capacity
    capacity: usize,
    /// Total events published
    published: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given per-subscriber capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
            published: 0,
        }
    }

    /// Registers a new subscriber.
    #[must_use]
    pub fn subscribe(&mut self) -> Receiver<AgentEvent> {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.push(sender);
        receiver
    }

    /// Publishes an event to every subscriber.
    pub fn publish(&mut self, event: AgentEvent) {
        self.published += 1;
        self.subscribers
            .retain(|sender| match sender.try_send(event) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total events published since creation.
    #[must_use]
    pub const fn published(&self) -> u64 {
        self.published
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Drains every pending event from a receiver.
#[must_use]
pub fn drain(receiver: &Receiver<AgentEvent>) -> Vec<AgentEvent> {
    receiver.try_iter().collect()
}
