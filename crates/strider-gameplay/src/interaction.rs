//! Nearest-interactable highlighting.
//!
//! Each frame the registry picks, among interactables whose own range covers
//! the player, the closest one. At most one entry is highlighted.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use strider_common::{AgentId, InteractableId};

/// Something the player can interact with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    /// Identifier
    pub id: InteractableId,
    /// World position
    pub position: Vec3,
    /// Distance at which it becomes interactable
    pub range: f32,
    /// Agent represented by this interactable, if any
    pub owner: Option<AgentId>,
}

impl Interactable {
    /// Creates an interactable with a fresh id.
    #[must_use]
    pub fn new(position: Vec3, range: f32) -> Self {
        Self {
            id: InteractableId::new(),
            position,
            range,
            owner: None,
        }
    }

    /// Ties the interactable to an agent.
    #[must_use]
    pub fn owned_by(mut self, agent: AgentId) -> Self {
        self.owner = Some(agent);
        self
    }
}

/// Explicitly constructed registry of interactables.
#[derive(Debug, Default)]
pub struct InteractionRegistry {
    entries: Vec<Interactable>,
    highlighted: Option<InteractableId>,
}

impl InteractionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interactable. Returns `false` if the id is already present.
    pub fn register(&mut self, interactable: Interactable) -> bool {
        if self.get(interactable.id).is_some() {
            return false;
        }
        self.entries.push(interactable);
        true
    }

    /// Removes an interactable. Returns `false` if it was not present.
    pub fn unregister(&mut self, id: InteractableId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.highlighted == Some(id) {
            self.highlighted = None;
        }
        self.entries.len() != before
    }

    /// Moves an interactable.
    pub fn set_position(&mut self, id: InteractableId, position: Vec3) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.position = position;
        }
    }

    /// Re-picks the highlighted interactable for the player at `player`.
    pub fn update(&mut self, player: Vec3) -> Option<InteractableId> {
        let nearest = self
            .entries
            .iter()
            .map(|entry| (entry.id, entry.position.distance(player), entry.range))
            .filter(|(_, distance, range)| distance <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _, _)| id);

        if nearest != self.highlighted {
            debug!("Highlight changed: {:?} -> {nearest:?}", self.highlighted);
            self.highlighted = nearest;
        }
        nearest
    }

    /// Currently highlighted interactable.
    #[must_use]
    pub fn highlighted(&self) -> Option<InteractableId> {
        self.highlighted
    }

    /// The highlighted interactable, as the target of an interaction.
    #[must_use]
    pub fn interact(&self) -> Option<&Interactable> {
        self.highlighted.and_then(|id| self.get(id))
    }

    /// Looks up an interactable.
    #[must_use]
    pub fn get(&self, id: InteractableId) -> Option<&Interactable> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Interactable owned by `agent`.
    #[must_use]
    pub fn owned_by(&self, agent: AgentId) -> Option<InteractableId> {
        self.entries
            .iter()
            .find(|entry| entry.owner == Some(agent))
            .map(|entry| entry.id)
    }

    /// Number of registered interactables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
