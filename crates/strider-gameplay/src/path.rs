//! Path backend over a pathfinding-agent abstraction.
//!
//! The path agent simulates its own position and never writes the body; the
//! controller reads `next_position` and smooths the body towards it.

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, trace};

use strider_common::{horizontal, DIRECTION_EPSILON_SQ};

use crate::config::LocomotionConfig;

/// Errors from path backend requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigationError {
    /// Destination contains NaN or infinity
    #[error("destination is not finite: {0:?}")]
    NonFiniteDestination(Vec3),

    /// The path agent refused the destination
    #[error("path agent rejected destination {0:?}")]
    Rejected(Vec3),
}

/// Result type for navigation requests.
pub type NavigationResult<T> = Result<T, NavigationError>;

/// Pathfinding agent driven by the path backend.
pub trait PathAgent: std::fmt::Debug {
    /// Requests a path to `destination`. Returns `false` if refused.
    fn set_destination(&mut self, destination: Vec3) -> bool;
    /// Drops the current path.
    fn clear_path(&mut self);
    /// Advances the agent's internal simulation.
    fn tick(&mut self, dt: f32);
    /// Agent's simulated position after the last tick.
    fn next_position(&self) -> Vec3;
    /// Agent's actual velocity.
    fn velocity(&self) -> Vec3;
    /// Velocity the agent wants to move at.
    fn desired_velocity(&self) -> Vec3;
    /// Distance left along the current path (zero without a path).
    fn remaining_distance(&self) -> f32;
    /// Whether a path is still being computed.
    fn path_pending(&self) -> bool;
    /// Distance at which the agent considers itself arrived.
    fn stopping_distance(&self) -> f32;
    /// Halts or releases the agent without dropping its path.
    fn set_stopped(&mut self, stopped: bool);
    /// Whether the agent is halted.
    fn is_stopped(&self) -> bool;
    /// Teleports the agent, dropping its path.
    fn warp(&mut self, position: Vec3);
    /// Current destination, if any.
    fn destination(&self) -> Option<Vec3>;
}

/// Straight-line path agent with acceleration-limited steering.
///
/// Path computation takes one tick, so `path_pending` is observable right
/// after a destination change.
#[derive(Debug, Clone)]
pub struct SteeringAgent {
    position: Vec3,
    velocity: Vec3,
    desired: Vec3,
    destination: Option<Vec3>,
    pending: bool,
    stopped: bool,
    speed: f32,
    acceleration: f32,
    stopping_distance: f32,
}

impl SteeringAgent {
    /// Fraction of top speed kept while braking, so arrival is reached.
    const MIN_APPROACH_FRACTION: f32 = 0.1;

    /// Creates an idle agent.
    #[must_use]
    pub fn new(position: Vec3, speed: f32, acceleration: f32, stopping_distance: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            desired: Vec3::ZERO,
            destination: None,
            pending: false,
            stopped: false,
            speed,
            acceleration: acceleration.max(f32::EPSILON),
            stopping_distance,
        }
    }

    /// Creates an agent using the navigation tunables.
    #[must_use]
    pub fn from_config(position: Vec3, config: &LocomotionConfig) -> Self {
        Self::new(
            position,
            config.navigation_speed,
            config.acceleration,
            config.stopping_distance,
        )
    }

    fn braking_distance(&self) -> f32 {
        self.speed * self.speed / (2.0 * self.acceleration)
    }

    fn compute_desired(&self) -> Vec3 {
        let Some(destination) = self.destination else {
            return Vec3::ZERO;
        };
        if self.stopped || self.pending {
            return Vec3::ZERO;
        }
        let to_goal = horizontal(destination - self.position);
        let remaining = to_goal.length();
        if remaining <= self.stopping_distance {
            return Vec3::ZERO;
        }
        let approach = ((remaining - self.stopping_distance) / self.braking_distance())
            .clamp(Self::MIN_APPROACH_FRACTION, 1.0);
        to_goal / remaining * self.speed * approach
    }
}

impl PathAgent for SteeringAgent {
    fn set_destination(&mut self, destination: Vec3) -> bool {
        self.destination = Some(destination);
        self.pending = true;
        true
    }

    fn clear_path(&mut self) {
        self.destination = None;
        self.pending = false;
        self.desired = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
    }

    fn tick(&mut self, dt: f32) {
        if self.pending {
            self.pending = false;
            trace!("Path computed to {:?}", self.destination);
        }

        if self.stopped {
            self.velocity = Vec3::ZERO;
            self.desired = Vec3::ZERO;
            return;
        }

        self.desired = self.compute_desired();
        let delta = self.desired - self.velocity;
        let max_change = self.acceleration * dt;
        self.velocity += delta.clamp_length_max(max_change);

        let step = self.velocity * dt;
        if let Some(destination) = self.destination {
            let to_goal = horizontal(destination - self.position);
            let reaching = step.dot(to_goal) > 0.0 && step.length() >= to_goal.length();
            if reaching {
                self.position += to_goal;
                self.velocity = Vec3::ZERO;
                return;
            }
        }
        self.position += step;
    }

    fn next_position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn desired_velocity(&self) -> Vec3 {
        self.desired
    }

    fn remaining_distance(&self) -> f32 {
        self.destination
            .map_or(0.0, |destination| horizontal(destination - self.position).length())
    }

    fn path_pending(&self) -> bool {
        self.pending
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
        if stopped {
            self.velocity = Vec3::ZERO;
            self.desired = Vec3::ZERO;
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.clear_path();
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }
}

/// Snapshot of path progress for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStatus {
    /// Agent's simulated position
    pub next_position: Vec3,
    /// Velocity the agent wants
    pub desired_velocity: Vec3,
    /// Velocity the agent has
    pub velocity: Vec3,
    /// Distance left to the destination
    pub remaining_distance: f32,
    /// Whether a path is still being computed
    pub path_pending: bool,
    /// Arrival tolerance
    pub stopping_distance: f32,
}

impl PathStatus {
    /// Arrived: path resolved, within stopping distance, no desire to move.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        !self.path_pending
            && self.remaining_distance <= self.stopping_distance
            && self.desired_velocity.length_squared() < DIRECTION_EPSILON_SQ
    }

    /// Not arrived but not trying to move either.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        !self.path_pending
            && self.remaining_distance > self.stopping_distance
            && self.desired_velocity.length_squared() < DIRECTION_EPSILON_SQ
    }
}

/// Owns the path agent of one navigating body.
#[derive(Debug)]
pub struct PathBackend {
    agent: Box<dyn PathAgent>,
}

impl PathBackend {
    /// Wraps a path agent.
    #[must_use]
    pub fn new(agent: impl PathAgent + 'static) -> Self {
        Self {
            agent: Box::new(agent),
        }
    }

    /// Requests a path to `point`.
    pub fn set_destination(&mut self, point: Vec3) -> NavigationResult<()> {
        if !point.is_finite() {
            return Err(NavigationError::NonFiniteDestination(point));
        }
        if !self.agent.set_destination(point) {
            return Err(NavigationError::Rejected(point));
        }
        debug!("Destination set: {point:?}");
        Ok(())
    }

    /// Advances the agent and reports progress.
    pub fn tick(&mut self, dt: f32) -> PathStatus {
        self.agent.tick(dt);
        self.status()
    }

    /// Progress without advancing the agent.
    #[must_use]
    pub fn status(&self) -> PathStatus {
        PathStatus {
            next_position: self.agent.next_position(),
            desired_velocity: self.agent.desired_velocity(),
            velocity: self.agent.velocity(),
            remaining_distance: self.agent.remaining_distance(),
            path_pending: self.agent.path_pending(),
            stopping_distance: self.agent.stopping_distance(),
        }
    }

    /// Halts the agent, keeping its path.
    pub fn stop(&mut self) {
        self.agent.set_stopped(true);
    }

    /// Releases a halted agent.
    pub fn resume(&mut self) {
        self.agent.set_stopped(false);
    }

    /// Whether the agent is halted.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.agent.is_stopped()
    }

    /// Drops the current path.
    pub fn clear(&mut self) {
        self.agent.clear_path();
    }

    /// Re-synchronises the agent onto `position`.
    pub fn warp(&mut self, position: Vec3) {
        self.agent.warp(position);
    }

    /// Current destination.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.agent.destination()
    }
}
