//! Focus sessions and single-target arbitration.
//!
//! Any number of NPCs may be triggered in the same frame. The coordinator
//! keeps the first focused NPC in registration order and forces every other
//! one out, so after [`FocusCoordinator::arbitrate`] at most one NPC is
//! focused.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strider_common::AgentId;

use crate::config::FocusConfig;
use crate::simulation::SimulationError;
use crate::world::NavQuery;

/// Result of a focus trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusOutcome {
    /// The session became focused
    Entered,
    /// The session was already focused; the counter went up
    Refreshed,
    /// The counter passed the threshold; the session must exit
    Exceeded,
}

/// Per-NPC focus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    counter: u32,
    focused: bool,
    threshold: u32,
    max_distance: f32,
}

impl FocusSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(config: &FocusConfig) -> Self {
        Self {
            counter: 0,
            focused: false,
            threshold: config.threshold,
            max_distance: config.max_distance,
        }
    }

    /// Records a trigger.
    pub fn trigger(&mut self) -> FocusOutcome {
        let was_focused = self.focused;
        self.counter = self.counter.saturating_add(1);
        self.focused = true;
        if self.counter > self.threshold {
            FocusOutcome::Exceeded
        } else if was_focused {
            FocusOutcome::Refreshed
        } else {
            FocusOutcome::Entered
        }
    }

    /// Whether a focused session must end given the subject's distance.
    #[must_use]
    pub fn should_exit(&self, subject_distance: f32) -> bool {
        self.focused && (subject_distance > self.max_distance || self.counter > self.threshold)
    }

    /// Ends the session. Returns `false` if it was not focused.
    pub fn exit(&mut self) -> bool {
        if !self.focused {
            return false;
        }
        self.focused = false;
        self.counter = 0;
        true
    }

    /// Whether the session is focused.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Triggers since the session was last reset.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Trigger count tolerated before the session closes itself.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Subject distance beyond which focus is dropped.
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

/// Anything the coordinator can arbitrate.
pub trait Focusable {
    /// Whether currently focused.
    fn is_focused(&self) -> bool;
    /// Where the look-at subject should point when this one wins.
    fn focus_position(&self) -> Vec3;
    /// Leaves focus. No-op when not focused.
    fn force_exit_focus<N: NavQuery + ?Sized>(&mut self, nav: &N);
}

/// Receives the look-at subject chosen by arbitration (camera framing,
/// head IK and similar collaborators).
pub trait LookAtSink: std::fmt::Debug {
    /// Called once per arbitration with the subject position.
    fn look_at(&mut self, target: Option<Vec3>);
}

/// Registry of focusable NPCs and the single accepted focus target.
#[derive(Debug, Default)]
pub struct FocusCoordinator {
    /// Registered agents in registration order
    registry: Vec<AgentId>,
    /// Winner of the last arbitration
    focus_target: Option<AgentId>,
    /// Look-at subject chosen by the last arbitration
    look_at: Option<Vec3>,
    /// Optional external look-at consumer
    sink: Option<Box<dyn LookAtSink>>,
}

impl FocusCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an external look-at consumer.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn LookAtSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds an agent at the end of the arbitration order.
    pub fn register(&mut self, id: AgentId) -> Result<(), SimulationError> {
        if self.registry.contains(&id) {
            return Err(SimulationError::AlreadyRegistered(id));
        }
        self.registry.push(id);
        debug!("Registered {id} for focus");
        Ok(())
    }

    /// Removes an agent, keeping the order of the others.
    pub fn unregister(&mut self, id: AgentId) -> Result<(), SimulationError> {
        let index = self
            .registry
            .iter()
            .position(|registered| *registered == id)
            .ok_or(SimulationError::NotRegistered(id))?;
        self.registry.remove(index);
        if self.focus_target == Some(id) {
            self.focus_target = None;
        }
        debug!("Unregistered {id} from focus");
        Ok(())
    }

    /// Registered agents in arbitration order.
    #[must_use]
    pub fn registered(&self) -> &[AgentId] {
        &self.registry
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: AgentId) -> bool {
        self.registry.contains(&id)
    }

    /// Winner of the last arbitration.
    #[must_use]
    pub fn focus_target(&self) -> Option<AgentId> {
        self.focus_target
    }

    /// Look-at subject chosen by the last arbitration.
    #[must_use]
    pub fn look_at(&self) -> Option<Vec3> {
        self.look_at
    }

    /// Keeps the first focused agent in registration order and force-exits
    /// the rest. Points the look-at subject at the winner, or at `fallback`
    /// when nobody is focused.
    pub fn arbitrate<F: Focusable, N: NavQuery + ?Sized>(
        &mut self,
        agents: &mut AHashMap<AgentId, F>,
        nav: &N,
        fallback: Option<Vec3>,
    ) -> Option<AgentId> {
        let mut winner: Option<(AgentId, Vec3)> = None;
        for id in &self.registry {
            let Some(agent) = agents.get_mut(id) else {
                continue;
            };
            if !agent.is_focused() {
                continue;
            }
            match winner {
                None => winner = Some((*id, agent.focus_position())),
                Some((kept, _)) => {
                    info!("{id} lost focus arbitration to {kept}");
                    agent.force_exit_focus(nav);
                }
            }
        }

        let previous = self.focus_target;
        self.focus_target = winner.map(|(id, _)| id);
        self.look_at = winner.map(|(_, position)| position).or(fallback);
        if previous != self.focus_target {
            debug!("Focus target changed: {previous:?} -> {:?}", self.focus_target);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.look_at(self.look_at);
        }
        self.focus_target
    }
}
