//! # Strider Common
//!
//! Common types, utilities, and shared abstractions for Strider.
//!
//! This crate provides foundational types used across all Strider subsystems:
//! - ID types (AgentId, InteractableId)
//! - Configuration error types
//! - Motion math on top of glam (smoothing, rotation, plane projection)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use prelude::*;
