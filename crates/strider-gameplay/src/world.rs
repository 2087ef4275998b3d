//! Capabilities consumed from the world collaborator.
//!
//! Raycasts, volume tests and reachable-surface sampling belong to the host
//! engine; the locomotion layer only sees these traits. `PlaneWorld` is a
//! small analytic implementation used by tests and the headless demo.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use strider_common::WORLD_UP;

use crate::ground::LayerMask;

/// Hit information from a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance travelled along the ray
    pub distance: f32,
    /// Layer of the hit collider
    pub layer: u8,
}

/// Volume and ray tests against classified geometry.
pub trait GroundQuery {
    /// Whether a sphere intersects geometry on any layer of `mask`.
    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;

    /// First hit along a ray against geometry on `mask`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

/// Nearest-reachable-point sampling on the navigation surface.
pub trait NavQuery {
    /// Nearest reachable point within `max_distance` of `point`.
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// The supporting surface below a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Surface height below the queried position
    pub height: f32,
    /// Surface normal
    pub normal: Vec3,
    /// Surface layer
    pub layer: u8,
}

/// Single-contact floor resolution used after integrating a body.
pub trait FloorQuery {
    /// Floor directly below (or above, if sunk into it) `position`.
    fn floor_at(&self, position: Vec3) -> Option<Floor>;
}

/// Everything the simulation needs from the world.
pub trait World: GroundQuery + NavQuery + FloorQuery {}

impl<T: GroundQuery + NavQuery + FloorQuery> World for T {}

/// Circular gap in a plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    /// Centre on the XZ plane
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl Hole {
    fn contains(&self, position: Vec3) -> bool {
        Vec2::new(position.x, position.z).distance(self.center) < self.radius
    }
}

/// Infinite (optionally tilted) plane with holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneWorld {
    /// A point on the plane
    origin: Vec3,
    /// Plane normal (unit, positive Y)
    normal: Vec3,
    /// Layer of the plane collider
    layer: u8,
    /// Half extent of the navigable square around the origin
    nav_half_extent: Option<f32>,
    /// Gaps in the surface
    holes: Vec<Hole>,
}

impl PlaneWorld {
    /// Horizontal plane at `height`.
    #[must_use]
    pub fn flat(height: f32) -> Self {
        Self {
            origin: Vec3::new(0.0, height, 0.0),
            normal: WORLD_UP,
            layer: 0,
            nav_half_extent: None,
            holes: Vec::new(),
        }
    }

    /// Plane through the origin with the given normal.
    ///
    /// A normal without an upward component falls back to world up.
    #[must_use]
    pub fn sloped(normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        let normal = if normal.y > f32::EPSILON {
            normal
        } else {
            WORLD_UP
        };
        Self {
            normal,
            ..Self::flat(0.0)
        }
    }

    /// Puts the plane on another collision layer.
    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Limits navigation to a square around the origin.
    #[must_use]
    pub fn with_nav_extent(mut self, half_extent: f32) -> Self {
        self.nav_half_extent = Some(half_extent);
        self
    }

    /// Cuts a circular hole.
    #[must_use]
    pub fn with_hole(mut self, center: Vec2, radius: f32) -> Self {
        self.holes.push(Hole { center, radius });
        self
    }

    /// Plane normal.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Surface height at the XZ position of `position`.
    #[must_use]
    pub fn height_at(&self, position: Vec3) -> f32 {
        let n = self.normal;
        self.origin.y
            - (n.x * (position.x - self.origin.x) + n.z * (position.z - self.origin.z)) / n.y
    }

    fn in_hole(&self, position: Vec3) -> bool {
        self.holes.iter().any(|hole| hole.contains(position))
    }
}

impl GroundQuery for PlaneWorld {
    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        if !mask.contains(self.layer) || self.in_hole(center) {
            return false;
        }
        (center - self.origin).dot(self.normal) <= radius
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        if !mask.contains(self.layer) {
            return None;
        }
        let direction = direction.normalize_or_zero();
        let denom = direction.dot(self.normal);
        if denom >= 0.0 {
            return None;
        }
        let distance = ((self.origin - origin).dot(self.normal) / denom).max(0.0);
        if distance > max_distance {
            return None;
        }
        let point = origin + direction * distance;
        if self.in_hole(point) {
            return None;
        }
        Some(RayHit {
            point,
            normal: self.normal,
            distance,
            layer: self.layer,
        })
    }
}

impl NavQuery for PlaneWorld {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let mut candidate = point;
        if let Some(half) = self.nav_half_extent {
            candidate.x = candidate.x.clamp(self.origin.x - half, self.origin.x + half);
            candidate.z = candidate.z.clamp(self.origin.z - half, self.origin.z + half);
        }
        if self.in_hole(candidate) {
            return None;
        }
        candidate.y = self.height_at(candidate);
        (candidate.distance(point) <= max_distance).then_some(candidate)
    }
}

impl FloorQuery for PlaneWorld {
    fn floor_at(&self, position: Vec3) -> Option<Floor> {
        if self.in_hole(position) {
            return None;
        }
        Some(Floor {
            height: self.height_at(position),
            normal: self.normal,
            layer: self.layer,
        })
    }
}
