//! NPC composition: locomotion, patrol and focus.

use glam::Vec3;
use tracing::debug;

use strider_common::AgentId;

use crate::config::NpcConfig;
use crate::events::AgentEvent;
use crate::focus::{FocusOutcome, FocusSession, Focusable};
use crate::locomotion::LocomotionController;
use crate::patrol::PatrolCycle;
use crate::world::{FloorQuery, GroundQuery, NavQuery};

/// An autonomous agent that patrols until focused.
#[derive(Debug)]
pub struct Npc {
    controller: LocomotionController,
    patrol: PatrolCycle,
    focus: FocusSession,
}

impl Npc {
    /// Creates an NPC at `position`.
    #[must_use]
    pub fn new(position: Vec3, config: &NpcConfig) -> Self {
        Self::with_controller(
            LocomotionController::npc(position, config.locomotion.clone()),
            config,
        )
    }

    /// Wraps an existing NPC controller.
    #[must_use]
    pub fn with_controller(controller: LocomotionController, config: &NpcConfig) -> Self {
        Self {
            controller,
            patrol: PatrolCycle::new(config.patrol.clone()),
            focus: FocusSession::new(&config.focus),
        }
    }

    /// Agent identifier.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.controller.id()
    }

    /// Body position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.controller.position()
    }

    /// Locomotion controller.
    #[must_use]
    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    /// Mutable locomotion controller.
    pub fn controller_mut(&mut self) -> &mut LocomotionController {
        &mut self.controller
    }

    /// Patrol state.
    #[must_use]
    pub fn patrol(&self) -> &PatrolCycle {
        &self.patrol
    }

    /// Focus state.
    #[must_use]
    pub fn focus(&self) -> &FocusSession {
        &self.focus
    }

    /// Registers a focus trigger: halts the path and faces the subject from
    /// the next frame on. Exits straight away once the threshold is passed.
    pub fn trigger_focus<N: NavQuery + ?Sized>(&mut self, nav: &N) -> FocusOutcome {
        let outcome = self.focus.trigger();
        let id = self.id();
        debug!("{id} focus triggered ({})", self.focus.counter());
        self.controller.publish(AgentEvent::Focus { agent: id });
        self.controller.halt_path();
        if outcome == FocusOutcome::Exceeded {
            self.exit_focus(nav);
        }
        outcome
    }

    /// Leaves focus and resumes patrolling towards a fresh destination.
    /// Returns `false` when not focused.
    pub fn exit_focus<N: NavQuery + ?Sized>(&mut self, nav: &N) -> bool {
        if !self.focus.exit() {
            return false;
        }
        let id = self.id();
        self.controller.resume_path();
        self.patrol.reroll(&mut self.controller, nav);
        debug!("{id} left focus");
        self.controller.publish(AgentEvent::ExitFocus { agent: id });
        true
    }

    /// Physics pass.
    pub fn physics_step<W: GroundQuery + FloorQuery + ?Sized>(&mut self, world: &W, dt: f32) {
        self.controller.physics_step(world, dt);
    }

    /// Frame pass: faces `subject` while focused, patrols otherwise.
    ///
    /// Focus is dropped when the subject is missing or out of range.
    pub fn frame_step<N: NavQuery + ?Sized>(&mut self, nav: &N, subject: Option<Vec3>, dt: f32) {
        if self.focus.is_focused() {
            let distance = subject.map_or(f32::INFINITY, |s| s.distance(self.position()));
            if self.focus.should_exit(distance) {
                self.exit_focus(nav);
            } else if let Some(subject) = subject {
                self.controller.face_towards(subject, dt);
                return;
            }
        }

        self.controller.frame_step(dt);
        self.patrol.update(&mut self.controller, nav, dt);
    }
}

impl Focusable for Npc {
    fn is_focused(&self) -> bool {
        self.focus.is_focused()
    }

    fn focus_position(&self) -> Vec3 {
        self.position()
    }

    fn force_exit_focus<N: NavQuery + ?Sized>(&mut self, nav: &N) {
        self.exit_focus(nav);
    }
}
