//! Movement intents set by the input layer.
//!
//! Intents are plain data consumed by the controller each tick; device
//! binding lives outside this crate.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Squared input magnitude below which the stick is considered centred.
pub const MOVE_DEADZONE_SQ: f32 = 0.01;

/// How an agent is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Direct two-axis input
    #[default]
    Keyboard,
    /// Destination-driven navigation
    PointAndClick,
}

/// Pending intents for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intents {
    /// Two-axis move input (x = right, y = forward)
    pub move_input: Vec2,
    /// Jump requested and not yet consumed
    pub jump: bool,
}

impl Intents {
    /// Creates empty intents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the move input is outside the deadzone.
    #[must_use]
    pub fn has_movement(&self) -> bool {
        self.move_input.length_squared() > MOVE_DEADZONE_SQ
    }

    /// Clears move and jump intents.
    pub fn clear(&mut self) {
        self.move_input = Vec2::ZERO;
        self.jump = false;
    }
}

/// Maps two-axis input to a world-space horizontal direction.
///
/// The basis is fixed: input forward (`+y`) points along world `-X` and input
/// right (`+x`) along world `+Z`. The result is normalised (or zero).
#[must_use]
pub fn input_direction(move_input: Vec2) -> Vec3 {
    Vec3::new(-move_input.y, 0.0, move_input.x).normalize_or_zero()
}
