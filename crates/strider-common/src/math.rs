//! Motion math shared by the locomotion backends.
//!
//! All functions work on glam types. World up is `+Y`; the facing basis is
//! `+Z` forward, so a yaw of zero looks down `+Z`.

pub use glam::{Quat, Vec2, Vec3};

/// World up direction.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Squared magnitude below which a direction is treated as zero.
pub const DIRECTION_EPSILON_SQ: f32 = 0.01;

/// Returns `v` with its vertical component removed.
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Projects `v` onto the plane whose normal is `normal`.
///
/// A zero normal leaves `v` untouched.
#[must_use]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return v;
    }
    v - n * v.dot(n)
}

/// Rotation that faces along the horizontal part of `direction`.
///
/// Returns `None` when the horizontal part is too short to define a heading.
#[must_use]
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = horizontal(direction);
    if flat.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Yaw of a rotation in degrees, measured from `+Z` towards `+X`.
#[must_use]
pub fn yaw_degrees(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::Z;
    forward.x.atan2(forward.z).to_degrees()
}

/// Rotates `from` towards `to` by at most `max_radians`.
#[must_use]
pub fn rotate_towards(from: Quat, to: Quat, max_radians: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= f32::EPSILON || angle <= max_radians {
        return to;
    }
    from.slerp(to, (max_radians / angle).max(0.0))
}

/// Critically damped smoothing of `current` towards `target`.
///
/// `velocity` carries the smoothing state between calls and must be kept by
/// the caller. `max_speed` caps the rate of change; pass `f32::INFINITY` for
/// no cap. The result never overshoots `target`.
#[must_use]
pub fn smooth_damp(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let original_target = target;
    let change = (current - target).clamp_length_max(max_speed * smooth_time);
    let target = current - change;

    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * exp;
    let mut output = target + (change + temp) * exp;

    if (original_target - current).dot(output - original_target) > 0.0 {
        output = original_target;
        *velocity = (output - original_target) / dt;
    }

    output
}

/// Distance between the horizontal parts of two points.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(a - b).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1.0e-4;

    #[test]
    fn test_horizontal_strips_y() {
        assert_eq!(horizontal(Vec3::new(1.0, 5.0, -2.0)), Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_project_on_flat_plane_is_identity_for_horizontal() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        assert!((project_on_plane(v, WORLD_UP) - v).length() < EPS);
    }

    #[test]
    fn test_project_on_slope_is_tangent() {
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let projected = project_on_plane(Vec3::new(0.0, 0.0, 1.0), normal);
        assert!(projected.dot(normal).abs() < EPS);
        // Normal leans towards +Z, so +Z runs downhill
        assert!(projected.y < 0.0);
    }

    #[test]
    fn test_look_rotation_faces_direction() {
        let rot = look_rotation(Vec3::new(1.0, 0.0, 0.0)).expect("heading");
        let forward = rot * Vec3::Z;
        assert!((forward - Vec3::X).length() < EPS);
        assert!((yaw_degrees(rot) - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_look_rotation_rejects_vertical() {
        assert!(look_rotation(Vec3::Y).is_none());
        assert!(look_rotation(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_rotate_towards_is_bounded() {
        let from = Quat::IDENTITY;
        let to = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let step = rotate_towards(from, to, 10f32.to_radians());
        assert!((from.angle_between(step) - 10f32.to_radians()).abs() < 1.0e-3);

        let done = rotate_towards(from, to, std::f32::consts::PI);
        assert!(done.dot(to).abs() > 1.0 - 1.0e-6);
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let target = Vec3::new(6.0, 0.0, 0.0);
        let mut value = Vec3::ZERO;
        let mut vel = Vec3::ZERO;
        for _ in 0..200 {
            value = smooth_damp(value, target, &mut vel, 0.05, f32::INFINITY, 0.02);
            assert!(value.x <= target.x + EPS);
        }
        assert!((value - target).length() < 1.0e-3);
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_noop() {
        let mut vel = Vec3::ONE;
        let out = smooth_damp(Vec3::ZERO, Vec3::X, &mut vel, 0.1, f32::INFINITY, 0.0);
        assert_eq!(out, Vec3::ZERO);
        assert_eq!(vel, Vec3::ONE);
    }

    proptest! {
        #[test]
        fn prop_smooth_damp_moves_toward_target(
            tx in -50.0f32..50.0,
            tz in -50.0f32..50.0,
            smooth in 0.01f32..1.0,
        ) {
            let target = Vec3::new(tx, 0.0, tz);
            let mut vel = Vec3::ZERO;
            let next = smooth_damp(Vec3::ZERO, target, &mut vel, smooth, f32::INFINITY, 0.02);
            prop_assert!(next.distance(target) <= target.length() + EPS);
        }
    }
}
