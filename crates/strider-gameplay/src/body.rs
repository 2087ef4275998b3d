//! Rigid body state integrated once per physics step.
//!
//! Only gravity, impulses and a single floor contact are modelled; stacking
//! and general collision response are left to the host engine.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ground::Contact;
use crate::world::FloorQuery;

/// Default gravity acceleration.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Physical pose of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Feet position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Angular velocity (kept at zero; rotation is driven explicitly)
    pub angular_velocity: Vec3,
    /// Mass
    pub mass: f32,
}

impl Body {
    /// Creates a body at rest.
    #[must_use]
    pub fn new(position: Vec3, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            mass: mass.max(f32::EPSILON),
        }
    }

    /// Applies an instantaneous impulse.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }

    /// Replaces the horizontal velocity, keeping the vertical component.
    pub fn set_horizontal_velocity(&mut self, horizontal: Vec3) {
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;
    }

    /// Semi-implicit Euler step.
    pub fn integrate(&mut self, gravity: Vec3, dt: f32) {
        self.velocity += gravity * dt;
        self.position += self.velocity * dt;
    }

    /// Pushes the body out of the floor below it.
    ///
    /// Returns the contact when the body touched or sank into the floor.
    pub fn resolve_floor<F: FloorQuery + ?Sized>(&mut self, world: &F) -> Option<Contact> {
        let floor = world.floor_at(self.position)?;
        if self.position.y > floor.height {
            return None;
        }
        self.position.y = floor.height;
        if self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
        Some(Contact::new(floor.layer, floor.normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PlaneWorld;

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut body = Body::new(Vec3::ZERO, 2.0);
        body.apply_impulse(Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(body.velocity.y, 2.0);
    }

    #[test]
    fn test_integrate_applies_gravity() {
        let mut body = Body::new(Vec3::new(0.0, 10.0, 0.0), 1.0);
        body.integrate(DEFAULT_GRAVITY, 0.1);
        assert!(body.velocity.y < 0.0);
        assert!(body.position.y < 10.0);
    }

    #[test]
    fn test_resolve_floor_clamps() {
        let world = PlaneWorld::flat(0.0);
        let mut body = Body::new(Vec3::new(0.0, -0.05, 0.0), 1.0);
        body.velocity.y = -3.0;

        let contact = body.resolve_floor(&world).expect("contact");
        assert_eq!(contact.layer, 0);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_resolve_floor_in_air() {
        let world = PlaneWorld::flat(0.0);
        let mut body = Body::new(Vec3::new(0.0, 1.0, 0.0), 1.0);
        assert!(body.resolve_floor(&world).is_none());
    }
}
