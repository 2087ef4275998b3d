//! Ground sensing: instantaneous probe, hysteresis filter and landing
//! contact classification.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_common::WORLD_UP;

use crate::config::GroundCheckConfig;
use crate::world::GroundQuery;

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// Default ground layer (layer 0).
    pub const GROUND: Self = Self(1);

    /// Mask containing a single layer.
    #[must_use]
    pub const fn layer(layer: u8) -> Self {
        Self(1 << (layer & 31))
    }

    /// Whether `layer` is part of the mask.
    #[must_use]
    pub const fn contains(self, layer: u8) -> bool {
        self.0 & (1 << (layer & 31)) != 0
    }

    /// Whether the mask matches nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two masks.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Result of a single ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// Whether the probe volume intersects ground geometry
    pub touching: bool,
    /// Surface normal below the agent (world up when nothing is hit)
    pub normal: Vec3,
}

impl GroundProbe {
    /// Probe result used when ground cannot be sensed.
    pub const UNGROUNDED: Self = Self {
        touching: false,
        normal: WORLD_UP,
    };
}

/// Samples world geometry beneath an agent.
#[derive(Debug, Clone)]
pub struct GroundSensor {
    config: GroundCheckConfig,
}

impl GroundSensor {
    /// Creates a sensor from ground check settings.
    #[must_use]
    pub fn new(config: GroundCheckConfig) -> Self {
        Self { config }
    }

    /// Returns the sensor settings.
    #[must_use]
    pub fn config(&self) -> &GroundCheckConfig {
        &self.config
    }

    /// Whether a ground mask is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.config.mask.is_empty()
    }

    /// One sphere test plus one downward ray from the agent's feet.
    ///
    /// Without a ground mask the agent is reported ungrounded on flat ground.
    #[must_use]
    pub fn probe<Q: GroundQuery + ?Sized>(&self, feet: Vec3, query: &Q) -> GroundProbe {
        if !self.is_configured() {
            return GroundProbe::UNGROUNDED;
        }

        let center = feet - WORLD_UP * self.config.offset;
        let touching = query.check_sphere(center, self.config.radius, self.config.mask);
        let normal = query
            .raycast(feet, -WORLD_UP, self.config.ray_length(), self.config.mask)
            .map_or(WORLD_UP, |hit| hit.normal);

        GroundProbe { touching, normal }
    }
}

/// Asymmetric hysteresis filter over the raw ground reading.
///
/// A flip is committed once the raw reading has disagreed with the filtered
/// value for longer than the delay of the target state; any agreeing sample
/// resets the accumulator.
#[derive(Debug, Clone)]
pub struct GroundDebounce {
    grounded: bool,
    timer: f32,
    grounded_delay: f32,
    airborne_delay: f32,
}

impl GroundDebounce {
    /// Creates a filter that starts grounded.
    #[must_use]
    pub fn new(grounded_delay: f32, airborne_delay: f32) -> Self {
        Self {
            grounded: true,
            timer: 0.0,
            grounded_delay,
            airborne_delay,
        }
    }

    /// Creates a filter from ground check settings.
    #[must_use]
    pub fn from_config(config: &GroundCheckConfig) -> Self {
        Self::new(config.grounded_delay, config.airborne_delay)
    }

    /// Filtered ground state.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Time accumulated towards the pending flip.
    #[must_use]
    pub fn pending_time(&self) -> f32 {
        self.timer
    }

    /// Feeds one raw sample. Returns the new value when it flips.
    pub fn update(&mut self, raw: bool, dt: f32) -> Option<bool> {
        if raw == self.grounded {
            self.timer = 0.0;
            return None;
        }

        let required = if self.grounded {
            self.airborne_delay
        } else {
            self.grounded_delay
        };
        self.timer += dt;
        if self.timer >= required {
            self.grounded = raw;
            self.timer = 0.0;
            Some(raw)
        } else {
            None
        }
    }
}

/// A single collision contact reported by the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Layer of the other collider
    pub layer: u8,
    /// Contact normal pointing away from the other collider
    pub normal: Vec3,
}

impl Contact {
    /// Creates a contact.
    #[must_use]
    pub const fn new(layer: u8, normal: Vec3) -> Self {
        Self { layer, normal }
    }

    /// Whether the contact can end a jump: either the collider is on a
    /// ground layer or its normal is no steeper than `slope_threshold`.
    #[must_use]
    pub fn is_ground_like(&self, ground_mask: LayerMask, slope_threshold: f32) -> bool {
        ground_mask.contains(self.layer)
            || self.normal.normalize_or_zero().dot(WORLD_UP) >= slope_threshold
    }
}
