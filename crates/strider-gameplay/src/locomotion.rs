//! Locomotion controller: the per-agent control law.
//!
//! One controller owns one body. Each tick the host calls
//! [`LocomotionController::physics_step`] and then
//! [`LocomotionController::frame_step`]; the physics step commits the pose
//! before the frame step reads it.

use crossbeam_channel::Receiver;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use strider_common::{horizontal, AgentId, DIRECTION_EPSILON_SQ};

use crate::backend::{turn_towards, AgentFrame, MovementBackend, PoseDelta, StepContext};
use crate::body::{Body, DEFAULT_GRAVITY};
use crate::config::LocomotionConfig;
use crate::events::{AgentEvent, EventBus};
use crate::ground::{Contact, GroundDebounce, GroundSensor};
use crate::input::{input_direction, Intents, MovementMode};
use crate::path::{NavigationResult, PathBackend, PathStatus, SteeringAgent};
use crate::world::{FloorQuery, GroundQuery};

/// Who drives the agent. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Driven by player intents
    Player,
    /// Driven by NPC behaviour; always navigates
    Npc,
}

/// Display state, derived every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LocomotionState {
    /// Not moving
    #[default]
    Idle,
    /// Moving on the ground
    Walking,
    /// Not grounded
    Jumping,
}

/// Drives one agent's body from intents and the active movement backend.
#[derive(Debug)]
pub struct LocomotionController {
    id: AgentId,
    kind: AgentKind,
    config: LocomotionConfig,
    body: Body,
    sensor: GroundSensor,
    debounce: GroundDebounce,
    raw_grounded: bool,
    ground_normal: Vec3,
    airborne: bool,
    airborne_time: f32,
    stored_air_direction: Vec3,
    intents: Intents,
    backend: MovementBackend,
    path: Option<PathBackend>,
    events: EventBus,
    state: LocomotionState,
    warned_no_mask: bool,
    warned_no_path: bool,
}

impl LocomotionController {
    /// Creates a controller with a straight-line path agent.
    ///
    /// Players start in keyboard mode; NPCs are locked to point-and-click.
    #[must_use]
    pub fn new(kind: AgentKind, position: Vec3, config: LocomotionConfig) -> Self {
        let mode = match kind {
            AgentKind::Player => MovementMode::Keyboard,
            AgentKind::Npc => MovementMode::PointAndClick,
        };
        let path = PathBackend::new(SteeringAgent::from_config(position, &config));
        Self {
            id: AgentId::new(),
            kind,
            body: Body::new(position, config.mass),
            sensor: GroundSensor::new(config.ground.clone()),
            debounce: GroundDebounce::from_config(&config.ground),
            raw_grounded: false,
            ground_normal: Vec3::Y,
            airborne: false,
            airborne_time: 0.0,
            stored_air_direction: Vec3::ZERO,
            intents: Intents::new(),
            backend: MovementBackend::for_mode(mode),
            path: Some(path),
            events: EventBus::default(),
            state: LocomotionState::Idle,
            warned_no_mask: false,
            warned_no_path: false,
            config,
        }
    }

    /// Creates a player controller.
    #[must_use]
    pub fn player(position: Vec3, config: LocomotionConfig) -> Self {
        Self::new(AgentKind::Player, position, config)
    }

    /// Creates an NPC controller.
    #[must_use]
    pub fn npc(position: Vec3, config: LocomotionConfig) -> Self {
        Self::new(AgentKind::Npc, position, config)
    }

    /// Replaces the path backend.
    #[must_use]
    pub fn with_path_backend(mut self, path: PathBackend) -> Self {
        self.path = Some(path);
        self
    }

    /// Removes the path backend; navigation steps are then skipped.
    #[must_use]
    pub fn without_path_backend(mut self) -> Self {
        self.path = None;
        self
    }

    // === Intents (player only) ===

    /// Sets the two-axis move input.
    pub fn set_move_input(&mut self, input: Vec2) {
        if self.kind != AgentKind::Player {
            return;
        }
        self.intents.move_input = input;
    }

    /// Raises or clears the jump intent.
    pub fn set_jump_input(&mut self, jump: bool) {
        if self.kind != AgentKind::Player {
            return;
        }
        self.intents.jump = jump;
    }

    /// Sets the navigation destination.
    ///
    /// Only forwarded to the path backend in point-and-click mode.
    pub fn set_target_position(&mut self, point: Vec3) {
        if self.kind != AgentKind::Player {
            return;
        }
        if self.mode() != MovementMode::PointAndClick {
            return;
        }
        if let Err(e) = self.navigate_to(point) {
            warn!("{} ignored destination: {e}", self.id);
        }
    }

    /// Switches the movement backend. Ignored for NPCs.
    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        if self.kind != AgentKind::Player {
            debug!("{} is an NPC; mode change ignored", self.id);
            return;
        }
        if mode == self.mode() {
            return;
        }

        self.backend = MovementBackend::for_mode(mode);
        self.body.set_horizontal_velocity(Vec3::ZERO);
        if let Some(path) = self.path.as_mut() {
            match mode {
                MovementMode::PointAndClick => {
                    path.warp(self.body.position);
                    path.resume();
                }
                MovementMode::Keyboard => path.clear(),
            }
        }
        info!("{} switched to {mode:?} movement", self.id);
    }

    /// Clears move and jump intents and stops horizontal motion.
    pub fn stop_movement(&mut self) {
        if self.kind != AgentKind::Player {
            return;
        }
        self.intents.clear();
        self.body.set_horizontal_velocity(Vec3::ZERO);
        self.backend = MovementBackend::for_mode(self.mode());
        if let Some(path) = self.path.as_mut() {
            path.warp(self.body.position);
        }
    }

    // === Path control (NPC behaviour) ===

    /// Requests a path to `point`, regardless of agent kind.
    pub fn navigate_to(&mut self, point: Vec3) -> NavigationResult<()> {
        match self.path.as_mut() {
            Some(path) => path.set_destination(point),
            None => {
                self.warn_missing_path();
                Ok(())
            }
        }
    }

    /// Halts the path agent, keeping its path.
    pub fn halt_path(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.stop();
        }
    }

    /// Releases a halted path agent.
    pub fn resume_path(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.resume();
        }
    }

    /// Current path progress, if a path backend is present.
    #[must_use]
    pub fn path_status(&self) -> Option<PathStatus> {
        self.path.as_ref().map(PathBackend::status)
    }

    /// Turns the body towards `point` without translating.
    pub fn face_towards(&mut self, point: Vec3, dt: f32) {
        let direction = horizontal(point - self.body.position);
        if let Some(rotation) = turn_towards(self.body.rotation, direction, &self.config, dt) {
            self.body.rotation = rotation;
        }
        self.update_state();
    }

    // === Ticks ===

    /// Fixed-rate step: sensing, debounce, jump, velocity, integration and
    /// landing.
    pub fn physics_step<W: GroundQuery + FloorQuery + ?Sized>(&mut self, world: &W, dt: f32) {
        if !self.sensor.is_configured() && !self.warned_no_mask {
            warn!("{} has no ground mask; treating as ungrounded", self.id);
            self.warned_no_mask = true;
        }
        let probe = self.sensor.probe(self.body.position, world);
        self.raw_grounded = probe.touching;
        self.ground_normal = probe.normal;
        if let Some(grounded) = self.debounce.update(probe.touching, dt) {
            debug!("{} grounded = {grounded}", self.id);
        }

        self.handle_jump();

        let frame = self.frame();
        let delta = self.backend.physics_step(StepContext {
            frame,
            intents: &self.intents,
            path: self.path.as_mut(),
            config: &self.config,
            dt,
        });
        self.apply(delta);

        self.body.angular_velocity = Vec3::ZERO;
        self.body.integrate(DEFAULT_GRAVITY, dt);

        if self.airborne {
            self.airborne_time += dt;
        }
        if let Some(contact) = self.body.resolve_floor(world) {
            self.on_collision(&[contact]);
        }
        self.update_state();
    }

    /// Per-frame step: path following and path rotation.
    pub fn frame_step(&mut self, dt: f32) {
        if self.mode() == MovementMode::PointAndClick {
            if self.path.is_none() {
                self.warn_missing_path();
            }
            let frame = self.frame();
            let delta = self.backend.frame_step(StepContext {
                frame,
                intents: &self.intents,
                path: self.path.as_mut(),
                config: &self.config,
                dt,
            });
            self.apply(delta);
        }
        self.update_state();
    }

    /// Feeds collision contacts from the physics collaborator.
    ///
    /// Ends a jump when the agent has been airborne long enough and any
    /// contact is ground-like.
    pub fn on_collision(&mut self, contacts: &[Contact]) {
        if !self.airborne || self.airborne_time < self.config.min_airborne_time {
            return;
        }
        let mask = self.config.ground.mask;
        let threshold = self.config.landing_slope_threshold;
        if !contacts
            .iter()
            .any(|contact| contact.is_ground_like(mask, threshold))
        {
            return;
        }

        self.airborne = false;
        self.airborne_time = 0.0;
        self.stored_air_direction = Vec3::ZERO;
        debug!("{} landed", self.id);
        self.events.publish(AgentEvent::Land { agent: self.id });

        if self.config.carry_input_on_land
            && self.mode() == MovementMode::Keyboard
            && self.intents.has_movement()
        {
            let carried = input_direction(self.intents.move_input) * self.config.keyboard_speed;
            self.body.set_horizontal_velocity(carried);
        }
    }

    fn handle_jump(&mut self) {
        if !self.intents.jump {
            return;
        }
        if self.airborne {
            self.intents.jump = false;
            return;
        }
        if !self.debounce.is_grounded() {
            return;
        }

        self.stored_air_direction = match self.mode() {
            MovementMode::Keyboard => input_direction(self.intents.move_input),
            MovementMode::PointAndClick => Vec3::ZERO,
        };
        self.body
            .apply_impulse(Vec3::new(0.0, self.config.jump_impulse, 0.0));
        self.airborne = true;
        self.airborne_time = 0.0;
        self.intents.jump = false;
        debug!("{} jumped", self.id);
        self.events.publish(AgentEvent::Jump { agent: self.id });
    }

    fn apply(&mut self, delta: PoseDelta) {
        if let Some(velocity) = delta.horizontal_velocity {
            self.body.set_horizontal_velocity(velocity);
        }
        if let Some(position) = delta.position {
            self.body.position = position;
        }
        if let Some(rotation) = delta.rotation {
            self.body.rotation = rotation;
        }
    }

    fn frame(&self) -> AgentFrame {
        AgentFrame {
            position: self.body.position,
            velocity: self.body.velocity,
            rotation: self.body.rotation,
            grounded: self.debounce.is_grounded(),
            airborne: self.airborne,
            ground_normal: self.ground_normal,
            stored_air_direction: self.stored_air_direction,
        }
    }

    fn update_state(&mut self) {
        self.state = if !self.debounce.is_grounded() {
            LocomotionState::Jumping
        } else {
            let moving = match &self.backend {
                MovementBackend::Keyboard(_) => {
                    self.intents.has_movement()
                        || horizontal(self.body.velocity).length_squared() > DIRECTION_EPSILON_SQ
                }
                MovementBackend::PointAndClick(nav) => {
                    let halted = self.path.as_ref().is_some_and(PathBackend::is_stopped);
                    !nav.has_arrived() && !halted
                }
            };
            if moving {
                LocomotionState::Walking
            } else {
                LocomotionState::Idle
            }
        };
    }

    fn warn_missing_path(&mut self) {
        if !self.warned_no_path {
            warn!("{} has no path backend; skipping navigation", self.id);
            self.warned_no_path = true;
        }
    }

    // === Events ===

    /// Subscribes to this agent's events.
    pub fn subscribe(&mut self) -> Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Publishes an event on this agent's bus.
    pub fn publish(&mut self, event: AgentEvent) {
        self.events.publish(event);
    }

    // === Queries ===

    /// Agent identifier.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Agent kind.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Active movement mode.
    #[must_use]
    pub fn mode(&self) -> MovementMode {
        self.backend.mode()
    }

    /// Derived display state.
    #[must_use]
    pub fn state(&self) -> LocomotionState {
        self.state
    }

    /// The physical body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Body position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Body orientation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.body.rotation
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Pending intents.
    #[must_use]
    pub fn intents(&self) -> &Intents {
        &self.intents
    }

    /// Raw sensor reading from the last physics step.
    #[must_use]
    pub fn is_touching_ground(&self) -> bool {
        self.raw_grounded
    }

    /// Debounced ground reading.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.debounce.is_grounded()
    }

    /// Between jump launch and landing.
    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    /// Direction captured at jump launch (zero when not airborne).
    #[must_use]
    pub fn stored_air_direction(&self) -> Vec3 {
        self.stored_air_direction
    }

    /// Ground normal from the last physics step.
    #[must_use]
    pub fn ground_normal(&self) -> Vec3 {
        self.ground_normal
    }

    /// Top speed of the active backend.
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        match self.mode() {
            MovementMode::Keyboard => self.config.keyboard_speed,
            MovementMode::PointAndClick => self.config.navigation_speed,
        }
    }

    /// Horizontal speed: the path agent's when navigating, the body's otherwise.
    #[must_use]
    pub fn horizontal_speed(&self) -> f32 {
        match self.backend.navigation() {
            Some(nav) => nav
                .last_status()
                .map_or(0.0, |status| horizontal(status.velocity).length()),
            None => horizontal(self.body.velocity).length(),
        }
    }

    /// Horizontal speed as a fraction of [`Self::max_speed`], in `[0, 1]`.
    #[must_use]
    pub fn normalized_speed(&self) -> f32 {
        let max = self.max_speed();
        if max <= 0.0 {
            return 0.0;
        }
        (self.horizontal_speed() / max).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::drain;
    use crate::ground::LayerMask;
    use crate::world::PlaneWorld;

    const DT: f32 = 0.02;

    fn player() -> (LocomotionController, Receiver<AgentEvent>) {
        let mut controller = LocomotionController::player(Vec3::ZERO, LocomotionConfig::default());
        let events = controller.subscribe();
        (controller, events)
    }

    fn step(controller: &mut LocomotionController, world: &PlaneWorld, ticks: usize) {
        for _ in 0..ticks {
            controller.physics_step(world, DT);
            controller.frame_step(DT);
        }
    }

    #[test]
    fn test_jump_applies_one_impulse_and_one_event() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, events) = player();
        step(&mut player, &world, 5);

        player.set_jump_input(true);
        player.physics_step(&world, DT);
        let launch_velocity = player.body().velocity.y;
        assert!(player.is_airborne());
        assert!((launch_velocity - (5.0 - 9.81 * DT)).abs() < 1.0e-4);
        assert!(!player.intents().jump);

        player.set_jump_input(true);
        player.physics_step(&world, DT);
        assert!(player.body().velocity.y < launch_velocity);
        assert!(!player.intents().jump);

        assert_eq!(drain(&events), vec![AgentEvent::Jump { agent: player.id() }]);
    }

    #[test]
    fn test_air_direction_is_invariant() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        player.set_move_input(Vec2::new(0.0, 1.0));
        step(&mut player, &world, 10);

        player.set_jump_input(true);
        player.physics_step(&world, DT);
        assert_eq!(player.stored_air_direction(), Vec3::new(-1.0, 0.0, 0.0));

        let inputs = [Vec2::new(1.0, 0.0), Vec2::new(0.0, -1.0), Vec2::new(-1.0, 1.0)];
        let mut tick = 0;
        while player.is_airborne() {
            player.set_move_input(inputs[tick % inputs.len()]);
            player.physics_step(&world, DT);
            if !player.is_airborne() {
                break;
            }
            let v = horizontal(player.body().velocity);
            assert!(v.z.abs() < 1.0e-5);
            assert!(v.x <= 0.0);
            tick += 1;
            assert!(tick < 500);
        }
    }

    #[test]
    fn test_land_emits_exactly_one_event() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, events) = player();
        step(&mut player, &world, 5);

        player.set_jump_input(true);
        step(&mut player, &world, 200);

        assert!(!player.is_airborne());
        assert_eq!(player.stored_air_direction(), Vec3::ZERO);
        let id = player.id();
        assert_eq!(
            drain(&events),
            vec![AgentEvent::Jump { agent: id }, AgentEvent::Land { agent: id }]
        );
        assert!(player.is_grounded());
    }

    #[test]
    fn test_landing_requires_ground_like_contact() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, events) = player();
        step(&mut player, &world, 5);
        player.set_jump_input(true);
        step(&mut player, &world, 15);
        assert!(player.is_airborne());

        player.on_collision(&[Contact::new(5, Vec3::X)]);
        assert!(player.is_airborne());

        player.on_collision(&[Contact::new(5, Vec3::X), Contact::new(5, Vec3::new(0.0, 1.0, 0.2))]);
        assert!(!player.is_airborne());
        assert_eq!(drain(&events).len(), 2);
    }

    #[test]
    fn test_ground_layer_lands_regardless_of_normal() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        step(&mut player, &world, 5);
        player.set_jump_input(true);
        step(&mut player, &world, 15);

        player.on_collision(&[Contact::new(0, Vec3::X)]);
        assert!(!player.is_airborne());
    }

    #[test]
    fn test_min_airborne_time_blocks_early_landing() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, events) = player();
        step(&mut player, &world, 5);
        player.set_jump_input(true);
        player.physics_step(&world, DT);

        player.on_collision(&[Contact::new(0, Vec3::Y)]);
        assert!(player.is_airborne());
        assert_eq!(drain(&events).len(), 1);
    }

    #[test]
    fn test_jump_waits_for_debounced_ground() {
        let world = PlaneWorld::flat(0.0);
        let mut player = LocomotionController::player(
            Vec3::new(0.0, 20.0, 0.0),
            LocomotionConfig::default(),
        );
        let events = player.subscribe();
        step(&mut player, &world, 30);
        assert!(!player.is_grounded());
        assert_eq!(player.state(), LocomotionState::Jumping);

        player.set_jump_input(true);
        player.physics_step(&world, DT);
        assert!(!player.is_airborne());
        assert!(player.body().velocity.y < 0.0);
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn test_state_derivation() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        step(&mut player, &world, 2);
        assert_eq!(player.state(), LocomotionState::Idle);

        player.set_move_input(Vec2::new(1.0, 0.0));
        step(&mut player, &world, 2);
        assert_eq!(player.state(), LocomotionState::Walking);
        assert!(player.normalized_speed() > 0.0);

        player.set_move_input(Vec2::ZERO);
        step(&mut player, &world, 100);
        assert_eq!(player.state(), LocomotionState::Idle);
    }

    #[test]
    fn test_npc_ignores_player_intents() {
        let mut npc = LocomotionController::npc(Vec3::ZERO, LocomotionConfig::default());
        npc.set_move_input(Vec2::new(1.0, 0.0));
        npc.set_jump_input(true);
        npc.set_target_position(Vec3::new(3.0, 0.0, 0.0));
        npc.set_movement_mode(MovementMode::Keyboard);

        assert_eq!(*npc.intents(), Intents::default());
        assert_eq!(npc.mode(), MovementMode::PointAndClick);
        assert!(npc.path_status().is_some_and(|s| s.remaining_distance == 0.0));
    }

    #[test]
    fn test_missing_ground_mask_degrades_to_ungrounded() {
        let world = PlaneWorld::flat(0.0);
        let mut config = LocomotionConfig::default();
        config.ground.mask = LayerMask::NONE;
        let mut player = LocomotionController::player(Vec3::ZERO, config);

        step(&mut player, &world, 30);
        assert!(!player.is_touching_ground());
        assert!(!player.is_grounded());
        assert_eq!(player.body().position.y, 0.0);
    }

    #[test]
    fn test_navigation_without_path_backend_is_skipped() {
        let world = PlaneWorld::flat(0.0);
        let mut player =
            LocomotionController::player(Vec3::ZERO, LocomotionConfig::default()).without_path_backend();
        player.set_movement_mode(MovementMode::PointAndClick);
        player.set_target_position(Vec3::new(4.0, 0.0, 0.0));

        step(&mut player, &world, 20);
        assert_eq!(horizontal(player.position()), Vec3::ZERO);
        assert!(player.path_status().is_none());
    }

    #[test]
    fn test_point_and_click_reaches_target() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        player.set_movement_mode(MovementMode::PointAndClick);
        let target = Vec3::new(0.0, 0.0, 4.0);
        player.set_target_position(target);

        step(&mut player, &world, 10);
        assert_eq!(player.state(), LocomotionState::Walking);
        assert!(player.horizontal_speed() > 0.0);

        step(&mut player, &world, 300);
        assert!(horizontal(player.position() - target).length() < 0.2);
        assert_eq!(player.state(), LocomotionState::Idle);
        assert_eq!(player.position().y, 0.0);
    }

    #[test]
    fn test_target_ignored_in_keyboard_mode() {
        let (mut player, _events) = player();
        player.set_target_position(Vec3::new(2.0, 0.0, 0.0));
        assert!(player
            .path_status()
            .is_some_and(|status| status.remaining_distance == 0.0));
    }

    #[test]
    fn test_stop_movement_clears_intents_and_velocity() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        player.set_move_input(Vec2::new(0.0, 1.0));
        step(&mut player, &world, 20);
        assert!(horizontal(player.body().velocity).length() > 1.0);

        player.stop_movement();
        assert_eq!(horizontal(player.body().velocity), Vec3::ZERO);
        assert!(!player.intents().has_movement());
        assert!(!player.intents().jump);
    }

    #[test]
    fn test_stop_movement_halts_navigating_player() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        player.set_movement_mode(MovementMode::PointAndClick);
        player.set_target_position(Vec3::new(0.0, 0.0, 30.0));
        step(&mut player, &world, 60);
        assert!(player.horizontal_speed() > 1.0);

        player.stop_movement();
        let stopped_at = player.position();
        step(&mut player, &world, 100);

        let drift = horizontal(player.position() - stopped_at).length();
        assert!(drift < 0.05, "moved {drift} after stop");
        assert_eq!(player.state(), LocomotionState::Idle);
        let status = player.path_status().expect("path backend present");
        assert_eq!(status.velocity, Vec3::ZERO);
        assert!(status.has_arrived());
    }

    #[test]
    fn test_mode_switch_resynchronises_path_agent() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        player.set_move_input(Vec2::new(1.0, 0.0));
        step(&mut player, &world, 20);
        let here = player.position();

        player.set_movement_mode(MovementMode::PointAndClick);
        assert_eq!(horizontal(player.body().velocity), Vec3::ZERO);
        let status = player.path_status().expect("path backend present");
        assert_eq!(status.next_position, here);
        assert_eq!(player.max_speed(), player.config().navigation_speed);

        player.set_movement_mode(MovementMode::Keyboard);
        assert!(player
            .path_status()
            .is_some_and(|status| status.remaining_distance == 0.0));
    }

    #[test]
    fn test_landing_carries_held_input() {
        let world = PlaneWorld::flat(0.0);
        let (mut player, _events) = player();
        step(&mut player, &world, 5);
        player.set_jump_input(true);
        step(&mut player, &world, 15);

        player.set_move_input(Vec2::new(1.0, 0.0));
        player.on_collision(&[Contact::new(0, Vec3::Y)]);
        assert!((player.body().velocity.z - 6.0).abs() < 1.0e-5);
    }

    #[test]
    fn test_face_towards_turns_without_moving() {
        let mut npc = LocomotionController::npc(Vec3::ZERO, LocomotionConfig::default());
        for _ in 0..100 {
            npc.face_towards(Vec3::new(5.0, 0.0, 0.0), DT);
        }
        assert_eq!(npc.position(), Vec3::ZERO);
        let forward = npc.rotation() * Vec3::Z;
        assert!(forward.x > 0.99);
    }
}
