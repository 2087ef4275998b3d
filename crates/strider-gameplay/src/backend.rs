//! Movement backends.
//!
//! A controller holds exactly one [`MovementBackend`] at a time. Backends only
//! propose a [`PoseDelta`]; the controller owns the body and commits it.

use glam::{Quat, Vec3};

use strider_common::{
    horizontal, look_rotation, project_on_plane, rotate_towards, smooth_damp, DIRECTION_EPSILON_SQ,
    WORLD_UP,
};

use crate::config::LocomotionConfig;
use crate::input::{input_direction, Intents, MovementMode};
use crate::path::{PathBackend, PathStatus};

/// Read-only view of an agent handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentFrame {
    /// Body position
    pub position: Vec3,
    /// Body velocity
    pub velocity: Vec3,
    /// Body orientation
    pub rotation: Quat,
    /// Debounced ground reading
    pub grounded: bool,
    /// Between jump launch and landing
    pub airborne: bool,
    /// Latest ground normal
    pub ground_normal: Vec3,
    /// Direction captured at jump launch
    pub stored_air_direction: Vec3,
}

/// Pose changes proposed by a backend. `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseDelta {
    /// Replacement horizontal velocity
    pub horizontal_velocity: Option<Vec3>,
    /// Replacement position
    pub position: Option<Vec3>,
    /// Replacement orientation
    pub rotation: Option<Quat>,
}

impl PoseDelta {
    /// A delta that changes nothing.
    pub const NONE: Self = Self {
        horizontal_velocity: None,
        position: None,
        rotation: None,
    };
}

/// Everything a backend may read during one step.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Agent snapshot
    pub frame: AgentFrame,
    /// Pending intents
    pub intents: &'a Intents,
    /// Path backend, if the agent has one
    pub path: Option<&'a mut PathBackend>,
    /// Tunables
    pub config: &'a LocomotionConfig,
    /// Step length (s)
    pub dt: f32,
}

/// Heading for `direction` with the configured yaw offset applied.
#[must_use]
pub fn facing(direction: Vec3, yaw_offset_degrees: f32) -> Option<Quat> {
    look_rotation(direction).map(|rotation| {
        rotation * Quat::from_rotation_y(yaw_offset_degrees.to_radians())
    })
}

/// Turns `current` towards `direction` at the configured angular speed.
///
/// Returns `None` when `direction` is too short to define a heading.
#[must_use]
pub fn turn_towards(
    current: Quat,
    direction: Vec3,
    config: &LocomotionConfig,
    dt: f32,
) -> Option<Quat> {
    if horizontal(direction).length_squared() <= DIRECTION_EPSILON_SQ {
        return None;
    }
    let target = facing(direction, config.rotation_offset)?;
    Some(rotate_towards(
        current,
        target,
        config.angular_speed.to_radians() * dt,
    ))
}

/// Direct two-axis input backend.
#[derive(Debug, Clone, Default)]
pub struct KeyboardBackend {
    smoothing: Vec3,
}

impl KeyboardBackend {
    /// Creates a backend with fresh smoothing state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn physics_step(&mut self, ctx: StepContext<'_>) -> PoseDelta {
        let StepContext {
            frame,
            intents,
            config,
            dt,
            ..
        } = ctx;

        let in_air = frame.airborne || !frame.grounded;
        let direction = if frame.airborne {
            frame.stored_air_direction
        } else {
            input_direction(intents.move_input)
        };

        let (speed, smooth_time) = if in_air {
            (
                config.keyboard_speed * config.air_control_factor,
                config.base_smooth_time * config.in_air_smooth_multiplier,
            )
        } else {
            (config.keyboard_speed, config.base_smooth_time)
        };

        let smoothed = smooth_damp(
            horizontal(frame.velocity),
            direction * speed,
            &mut self.smoothing,
            smooth_time,
            f32::INFINITY,
            dt,
        );
        let mut velocity = project_on_plane(smoothed, frame.ground_normal);

        if config.slope_assist != 0.0 && !in_air {
            let uphill = project_on_plane(WORLD_UP, frame.ground_normal).normalize_or_zero();
            let along = smoothed.normalize_or_zero().dot(uphill);
            velocity += uphill * along * config.slope_assist * dt;
        }

        let heading = if frame.airborne {
            frame.stored_air_direction
        } else {
            horizontal(velocity)
        };
        let rotation = turn_towards(frame.rotation, heading, config, dt);

        PoseDelta {
            horizontal_velocity: Some(horizontal(velocity)),
            position: None,
            rotation,
        }
    }
}

/// Destination-driven backend following a path agent.
#[derive(Debug, Clone, Default)]
pub struct NavigationBackend {
    smoothing: Vec3,
    last_status: Option<PathStatus>,
}

impl NavigationBackend {
    /// Creates a backend with fresh smoothing state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path progress observed on the last frame step.
    #[must_use]
    pub fn last_status(&self) -> Option<&PathStatus> {
        self.last_status.as_ref()
    }

    /// Whether the agent has reached its destination (or never had one).
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.last_status.as_ref().map_or(true, PathStatus::has_arrived)
    }

    // Horizontal motion comes from the frame step; the body only falls.
    fn physics_step(&mut self) -> PoseDelta {
        PoseDelta {
            horizontal_velocity: Some(Vec3::ZERO),
            ..PoseDelta::NONE
        }
    }

    fn frame_step(&mut self, ctx: StepContext<'_>) -> PoseDelta {
        let StepContext {
            frame,
            path,
            config,
            dt,
            ..
        } = ctx;
        let Some(path) = path else {
            self.last_status = None;
            return PoseDelta::NONE;
        };

        let status = path.tick(dt);
        self.last_status = Some(status);

        let target = Vec3::new(
            status.next_position.x,
            frame.position.y,
            status.next_position.z,
        );
        let position = smooth_damp(
            frame.position,
            target,
            &mut self.smoothing,
            config.navigation_smooth_time,
            f32::INFINITY,
            dt,
        );

        let rotation = if status.has_arrived()
            || status.desired_velocity.length() <= config.rotation_min_speed
        {
            None
        } else {
            turn_towards(frame.rotation, status.desired_velocity, config, dt)
        };

        PoseDelta {
            horizontal_velocity: None,
            position: Some(position),
            rotation,
        }
    }
}

/// The active movement strategy of one agent.
#[derive(Debug, Clone)]
pub enum MovementBackend {
    /// Two-axis input drives velocity directly
    Keyboard(KeyboardBackend),
    /// A path agent proposes positions
    PointAndClick(NavigationBackend),
}

impl MovementBackend {
    /// Fresh backend for `mode`.
    #[must_use]
    pub fn for_mode(mode: MovementMode) -> Self {
        match mode {
            MovementMode::Keyboard => Self::Keyboard(KeyboardBackend::new()),
            MovementMode::PointAndClick => Self::PointAndClick(NavigationBackend::new()),
        }
    }

    /// Mode this backend implements.
    #[must_use]
    pub fn mode(&self) -> MovementMode {
        match self {
            Self::Keyboard(_) => MovementMode::Keyboard,
            Self::PointAndClick(_) => MovementMode::PointAndClick,
        }
    }

    /// Navigation state, when navigating.
    #[must_use]
    pub fn navigation(&self) -> Option<&NavigationBackend> {
        match self {
            Self::PointAndClick(nav) => Some(nav),
            Self::Keyboard(_) => None,
        }
    }

    /// Fixed-rate step: velocity and keyboard rotation.
    pub fn physics_step(&mut self, ctx: StepContext<'_>) -> PoseDelta {
        match self {
            Self::Keyboard(keyboard) => keyboard.physics_step(ctx),
            Self::PointAndClick(nav) => nav.physics_step(),
        }
    }

    /// Per-frame step: path following and path rotation.
    pub fn frame_step(&mut self, ctx: StepContext<'_>) -> PoseDelta {
        match self {
            Self::Keyboard(_) => PoseDelta::NONE,
            Self::PointAndClick(nav) => nav.frame_step(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::SteeringAgent;
    use glam::Vec2;
    use strider_common::yaw_degrees;

    fn grounded_frame() -> AgentFrame {
        AgentFrame {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            grounded: true,
            airborne: false,
            ground_normal: WORLD_UP,
            stored_air_direction: Vec3::ZERO,
        }
    }

    fn run_keyboard(
        backend: &mut MovementBackend,
        frame: &mut AgentFrame,
        intents: &Intents,
        config: &LocomotionConfig,
        steps: usize,
    ) {
        for _ in 0..steps {
            let delta = backend.physics_step(StepContext {
                frame: *frame,
                intents,
                path: None,
                config,
                dt: 0.02,
            });
            if let Some(v) = delta.horizontal_velocity {
                frame.velocity.x = v.x;
                frame.velocity.z = v.z;
            }
            if let Some(r) = delta.rotation {
                frame.rotation = r;
            }
        }
    }

    #[test]
    fn test_keyboard_reaches_ground_speed() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
        let mut frame = grounded_frame();
        let intents = Intents {
            move_input: Vec2::new(0.0, 1.0),
            ..Intents::default()
        };

        run_keyboard(&mut backend, &mut frame, &intents, &config, 100);

        assert!((frame.velocity.x + 6.0).abs() < 1.0e-2);
        assert!(frame.velocity.z.abs() < 1.0e-4);
    }

    #[test]
    fn test_keyboard_airborne_uses_stored_direction_and_air_speed() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
        let mut frame = AgentFrame {
            grounded: false,
            airborne: true,
            stored_air_direction: Vec3::Z,
            ..grounded_frame()
        };
        let intents = Intents {
            move_input: Vec2::new(0.0, 1.0),
            ..Intents::default()
        };

        run_keyboard(&mut backend, &mut frame, &intents, &config, 200);

        let v = horizontal(frame.velocity);
        assert!(v.x.abs() < 1.0e-3);
        assert!((v.z - 3.0).abs() < 1.0e-2);
    }

    #[test]
    fn test_keyboard_rotates_with_offset() {
        let config = LocomotionConfig {
            rotation_offset: 90.0,
            ..LocomotionConfig::default()
        };
        let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
        let mut frame = grounded_frame();
        let intents = Intents {
            move_input: Vec2::new(1.0, 0.0),
            ..Intents::default()
        };

        run_keyboard(&mut backend, &mut frame, &intents, &config, 100);

        // Moving along +Z (yaw 0) plus the 90 degree offset
        assert!((yaw_degrees(frame.rotation) - 90.0).abs() < 0.5);
    }

    #[test]
    fn test_keyboard_projects_onto_slope() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
        let frame = AgentFrame {
            ground_normal: Vec3::new(0.0, 1.0, 1.0).normalize(),
            ..grounded_frame()
        };
        let intents = Intents {
            move_input: Vec2::new(1.0, 0.0),
            ..Intents::default()
        };

        let delta = backend.physics_step(StepContext {
            frame,
            intents: &intents,
            path: None,
            config: &config,
            dt: 0.02,
        });
        let flat = backend_flat_speed(&intents, &config);
        let v = delta.horizontal_velocity.expect("keyboard writes velocity");
        assert!(v.z > 0.0);
        assert!(v.z < flat);
    }

    fn backend_flat_speed(intents: &Intents, config: &LocomotionConfig) -> f32 {
        let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
        let delta = backend.physics_step(StepContext {
            frame: grounded_frame(),
            intents,
            path: None,
            config,
            dt: 0.02,
        });
        delta.horizontal_velocity.map_or(0.0, |v| v.length())
    }

    #[test]
    fn test_slope_assist_hook_changes_uphill_speed() {
        let normal = Vec3::new(0.0, 1.0, -1.0).normalize();
        let intents = Intents {
            move_input: Vec2::new(1.0, 0.0),
            ..Intents::default()
        };
        let step = |assist: f32| {
            let config = LocomotionConfig {
                slope_assist: assist,
                ..LocomotionConfig::default()
            };
            let mut backend = MovementBackend::for_mode(MovementMode::Keyboard);
            backend
                .physics_step(StepContext {
                    frame: AgentFrame {
                        ground_normal: normal,
                        ..grounded_frame()
                    },
                    intents: &intents,
                    path: None,
                    config: &config,
                    dt: 0.02,
                })
                .horizontal_velocity
                .map_or(0.0, |v| v.z)
        };
        assert!(step(5.0) > step(0.0));
    }

    #[test]
    fn test_navigation_physics_zeroes_horizontal_velocity() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::PointAndClick);
        let delta = backend.physics_step(StepContext {
            frame: grounded_frame(),
            intents: &Intents::default(),
            path: None,
            config: &config,
            dt: 0.02,
        });
        assert_eq!(delta.horizontal_velocity, Some(Vec3::ZERO));
        assert_eq!(delta.rotation, None);
    }

    #[test]
    fn test_navigation_without_path_is_skipped() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::PointAndClick);
        let delta = backend.frame_step(StepContext {
            frame: grounded_frame(),
            intents: &Intents::default(),
            path: None,
            config: &config,
            dt: 0.02,
        });
        assert_eq!(delta, PoseDelta::NONE);
    }

    #[test]
    fn test_navigation_follows_path_and_keeps_height() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::PointAndClick);
        let mut path = PathBackend::new(SteeringAgent::from_config(Vec3::ZERO, &config));
        path.set_destination(Vec3::new(0.0, 0.0, 5.0))
            .expect("accepted");

        let mut frame = AgentFrame {
            position: Vec3::new(0.0, 2.0, 0.0),
            ..grounded_frame()
        };
        for _ in 0..300 {
            let delta = backend.frame_step(StepContext {
                frame,
                intents: &Intents::default(),
                path: Some(&mut path),
                config: &config,
                dt: 0.02,
            });
            if let Some(p) = delta.position {
                frame.position = p;
            }
            if let Some(r) = delta.rotation {
                frame.rotation = r;
            }
        }

        assert!((frame.position.y - 2.0).abs() < 1.0e-6);
        assert!((frame.position.z - 5.0).abs() < 0.2);
        assert!(backend.navigation().is_some_and(NavigationBackend::has_arrived));
        assert!(yaw_degrees(frame.rotation).abs() < 1.0);
    }

    #[test]
    fn test_rotation_suppressed_after_arrival() {
        let config = LocomotionConfig::default();
        let mut backend = MovementBackend::for_mode(MovementMode::PointAndClick);
        let mut path = PathBackend::new(SteeringAgent::from_config(Vec3::ZERO, &config));
        let frame = AgentFrame {
            rotation: Quat::from_rotation_y(1.0),
            ..grounded_frame()
        };
        let delta = backend.frame_step(StepContext {
            frame,
            intents: &Intents::default(),
            path: Some(&mut path),
            config: &config,
            dt: 0.02,
        });
        assert_eq!(delta.rotation, None);
    }
}
