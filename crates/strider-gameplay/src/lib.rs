//! # Strider Gameplay
//!
//! Agent locomotion and NPC behaviour for Strider.
//!
//! This crate provides:
//! - Ground sensing with asymmetric debounce
//! - Rigid body integration with a single floor contact
//! - Keyboard and point-and-click movement backends
//! - Path backend over a pluggable path agent
//! - Locomotion controller (jump/airborne state machine, rotation law)
//! - NPC patrol cycle and focus sessions
//! - Focus coordinator enforcing a single focused NPC
//! - Interaction registry (nearest interactable highlight)
//! - Event bus for jump/land/focus notifications
//! - Simulation tick scheduler

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod body;
pub mod config;
pub mod events;
pub mod focus;
pub mod ground;
pub mod input;
pub mod interaction;
pub mod locomotion;
pub mod npc;
pub mod path;
pub mod patrol;
pub mod simulation;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::body::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::focus::*;
    pub use crate::ground::*;
    pub use crate::input::*;
    pub use crate::interaction::*;
    pub use crate::locomotion::*;
    pub use crate::npc::*;
    pub use crate::path::*;
    pub use crate::patrol::*;
    pub use crate::simulation::*;
    pub use crate::world::*;
}

pub use prelude::*;
