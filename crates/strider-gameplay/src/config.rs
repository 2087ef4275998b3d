//! Tunables for locomotion, ground checks, patrol, focus and interaction.
//!
//! Defaults reproduce the feel of the shipped avatar: 6 u/s ground speed,
//! 0.5 air control, 0.1 s / 0.5 s ground debounce.

use serde::{Deserialize, Serialize};
use strider_common::ConfigError;

use crate::ground::LayerMask;

/// Ground probe and debounce settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundCheckConfig {
    /// How far below the feet the probe sphere is centred
    pub offset: f32,
    /// Probe sphere radius
    pub radius: f32,
    /// Extra length of the normal ray past the sphere
    pub ray_margin: f32,
    /// Layers classified as ground
    pub mask: LayerMask,
    /// Time the raw reading must stay grounded before it is accepted
    pub grounded_delay: f32,
    /// Time the raw reading must stay ungrounded before it is accepted
    pub airborne_delay: f32,
}

impl Default for GroundCheckConfig {
    fn default() -> Self {
        Self {
            offset: 0.1,
            radius: 0.2,
            ray_margin: 0.2,
            mask: LayerMask::GROUND,
            grounded_delay: 0.1,
            airborne_delay: 0.5,
        }
    }
}

impl GroundCheckConfig {
    /// Length of the downward normal ray.
    #[must_use]
    pub fn ray_length(&self) -> f32 {
        self.offset + self.radius + self.ray_margin
    }

    /// Validates the ground check values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_positive("ground.radius", self.radius)?;
        ConfigError::check_range("ground.grounded_delay", self.grounded_delay, 0.0, 10.0)?;
        ConfigError::check_range("ground.airborne_delay", self.airborne_delay, 0.0, 10.0)?;
        Ok(())
    }
}

/// Locomotion controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Top ground speed in keyboard mode (units/s)
    pub keyboard_speed: f32,
    /// Path agent speed in navigation mode (units/s)
    pub navigation_speed: f32,
    /// Path agent acceleration (units/s²)
    pub acceleration: f32,
    /// Vertical impulse applied on jump
    pub jump_impulse: f32,
    /// Body mass
    pub mass: f32,
    /// Turn rate (degrees/s)
    pub angular_speed: f32,
    /// Yaw correction applied on top of the facing direction (degrees)
    pub rotation_offset: f32,
    /// Fraction of ground speed available while airborne (0, 1)
    pub air_control_factor: f32,
    /// Velocity smoothing time on the ground (s)
    pub base_smooth_time: f32,
    /// Multiplier on smoothing time while airborne
    pub in_air_smooth_multiplier: f32,
    /// Position smoothing time when following the path agent (s)
    pub navigation_smooth_time: f32,
    /// Distance at which the path agent considers itself arrived
    pub stopping_distance: f32,
    /// Path speed above which the body turns to follow the path
    pub rotation_min_speed: f32,
    /// Time after launch before a landing contact is honoured (s)
    pub min_airborne_time: f32,
    /// Minimum dot(contact normal, up) for a contact to count as ground
    pub landing_slope_threshold: f32,
    /// Gameplay-feel coefficient pushing velocity along the uphill direction.
    /// Zero disables it.
    pub slope_assist: f32,
    /// Restore held input to full ground velocity on the landing tick
    pub carry_input_on_land: bool,
    /// Ground probe settings
    pub ground: GroundCheckConfig,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            keyboard_speed: 6.0,
            navigation_speed: 6.0,
            acceleration: 10.0,
            jump_impulse: 5.0,
            mass: 1.0,
            angular_speed: 360.0,
            rotation_offset: 0.0,
            air_control_factor: 0.5,
            base_smooth_time: 0.05,
            in_air_smooth_multiplier: 3.0,
            navigation_smooth_time: 0.1,
            stopping_distance: 0.1,
            rotation_min_speed: 0.1,
            min_airborne_time: 0.2,
            landing_slope_threshold: 0.5,
            slope_assist: 0.0,
            carry_input_on_land: true,
            ground: GroundCheckConfig::default(),
        }
    }
}

impl LocomotionConfig {
    /// Validates all locomotion values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_positive("keyboard_speed", self.keyboard_speed)?;
        ConfigError::check_positive("navigation_speed", self.navigation_speed)?;
        ConfigError::check_positive("mass", self.mass)?;
        ConfigError::check_positive("angular_speed", self.angular_speed)?;
        // Open interval (0, 1)
        if self.air_control_factor <= 0.0 || self.air_control_factor >= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "air_control_factor",
                value: self.air_control_factor,
                min: 0.0,
                max: 1.0,
            });
        }
        ConfigError::check_positive("base_smooth_time", self.base_smooth_time)?;
        ConfigError::check_positive("navigation_smooth_time", self.navigation_smooth_time)?;
        ConfigError::check_range(
            "landing_slope_threshold",
            self.landing_slope_threshold,
            -1.0,
            1.0,
        )?;
        ConfigError::check_range("min_airborne_time", self.min_airborne_time, 0.0, 5.0)?;
        self.ground.validate()
    }
}

/// NPC patrol settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Inner radius of the destination annulus
    pub min_radius: f32,
    /// Outer radius of the destination annulus
    pub max_radius: f32,
    /// Shortest wait at a reached destination (s)
    pub min_wait: f32,
    /// Longest wait at a reached destination (s)
    pub max_wait: f32,
    /// Time without arrival or progress before the destination is re-rolled (s)
    pub timeout: f32,
    /// How far from the rolled point a reachable surface point may be
    pub sample_distance: f32,
    /// Remaining-distance decrease that counts as progress
    pub progress_epsilon: f32,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            min_radius: 2.0,
            max_radius: 10.0,
            min_wait: 1.0,
            max_wait: 3.0,
            timeout: 5.0,
            sample_distance: 10.0,
            progress_epsilon: 0.05,
            seed: None,
        }
    }
}

impl PatrolConfig {
    /// Validates the patrol values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("patrol.min_radius", self.min_radius, 0.0, f32::MAX)?;
        ConfigError::check_ordered(
            "patrol.min_radius",
            self.min_radius,
            "patrol.max_radius",
            self.max_radius,
        )?;
        ConfigError::check_range("patrol.min_wait", self.min_wait, 0.0, f32::MAX)?;
        ConfigError::check_ordered(
            "patrol.min_wait",
            self.min_wait,
            "patrol.max_wait",
            self.max_wait,
        )?;
        ConfigError::check_positive("patrol.timeout", self.timeout)?;
        Ok(())
    }
}

/// Focus session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Number of triggers tolerated before the session closes itself
    pub threshold: u32,
    /// Subject distance beyond which focus is dropped
    pub max_distance: f32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            max_distance: 5.0,
        }
    }
}

impl FocusConfig {
    /// Validates the focus values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_positive("focus.max_distance", self.max_distance)
    }
}

/// Interaction registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Range at which NPCs become interactable
    pub npc_range: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { npc_range: 3.0 }
    }
}

/// NPC configuration bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Locomotion tunables
    pub locomotion: LocomotionConfig,
    /// Patrol tunables
    pub patrol: PatrolConfig,
    /// Focus tunables
    pub focus: FocusConfig,
}

impl NpcConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locomotion.validate()?;
        self.patrol.validate()?;
        self.focus.validate()
    }
}
