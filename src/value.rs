//! Value types a tween can interpolate.
//!
//! The scheduler only ever batches records holding the same value type, so
//! every value type gets its own monomorphized evaluate system instead of a
//! runtime type switch.

use glam::{Quat, Vec2, Vec3, Vec4};
use std::fmt::Debug;

/// A value that can be carried by a tween record.
pub trait TweenValueType: Copy + Default + Debug + Send + Sync + 'static {
    /// Interpolate between `a` and `b`. `t` is not clamped, so eased
    /// parameters that overshoot (back easing) extrapolate.
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl TweenValueType for f32 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl TweenValueType for Vec2 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl TweenValueType for Vec3 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl TweenValueType for Vec4 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl TweenValueType for Quat {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.normalize().slerp(b.normalize(), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_lerp_f32_basic() {
        assert!(approx_eq(f32::lerp(0.0, 10.0, 0.5), 5.0));
        assert!(approx_eq(f32::lerp(0.0, 10.0, 0.0), 0.0));
        assert!(approx_eq(f32::lerp(0.0, 10.0, 1.0), 10.0));
    }

    #[test]
    fn test_lerp_f32_extrapolation() {
        // lerp doesn't clamp, so it extrapolates beyond [0, 1]
        assert!(approx_eq(f32::lerp(0.0, 10.0, -0.5), -5.0));
        assert!(approx_eq(f32::lerp(0.0, 10.0, 1.5), 15.0));
    }

    #[test]
    fn test_lerp_vec2_component_independence() {
        let a = Vec2::new(0.0, 100.0);
        let b = Vec2::new(100.0, 0.0);
        let r = Vec2::lerp(a, b, 0.25);
        assert!(approx_eq(r.x, 25.0));
        assert!(approx_eq(r.y, 75.0));
    }

    #[test]
    fn test_lerp_vec3_and_vec4() {
        let r = <Vec3 as TweenValueType>::lerp(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0), 0.5);
        assert!(approx_eq(r.x, 1.0) && approx_eq(r.y, 2.0) && approx_eq(r.z, 3.0));
        let r = <Vec4 as TweenValueType>::lerp(Vec4::ONE, Vec4::splat(3.0), 0.5);
        assert!(approx_eq(r.w, 2.0));
    }

    #[test]
    fn test_lerp_quat_halfway() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let r = <Quat as TweenValueType>::lerp(a, b, 0.5);
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(r.angle_between(expected) < 1e-4);
    }
}
