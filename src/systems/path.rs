//! Path sampling.
//!
//! [`sample_path`] maps a normalized parameter onto a sequence of control
//! points. The parameter is split uniformly across segments (segment `i`
//! covers `[i / n, (i + 1) / n]` for `n` segments), not by arc length, so
//! a point at index `k` is reached exactly at `t = k / n`.
//!
//! [`evaluate_path_tweens_system`] is the evaluate step for records carrying
//! a [`TweenPath`].

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::components::path::{PathOptions, PathType, TweenPath};
use crate::components::tween::{TweenProgress, TweenStartValue, TweenStatus, TweenValue};

/// Position along `points` at parameter `t`.
///
/// `t` is clamped to [0, 1]. A closed path adds a segment from the last
/// point back to the first. Callers guarantee at least two points
/// ([`TweenPath`] enforces it); a single point is returned as-is and an
/// empty slice yields the origin.
pub fn sample_path(points: &[Vec3], t: f32, options: &PathOptions) -> Vec3 {
    let n = points.len();
    match n {
        0 => return Vec3::ZERO,
        1 => return points[0],
        _ => {}
    }
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = if options.closed { n } else { n - 1 };

    let scaled = t * segments as f32;
    let index = (scaled.floor() as usize).min(segments - 1);
    let local = scaled - index as f32;

    let point = |i: isize| -> Vec3 {
        if options.closed {
            points[i.rem_euclid(n as isize) as usize]
        } else {
            points[i.clamp(0, n as isize - 1) as usize]
        }
    };
    let i = index as isize;
    match options.path_type {
        PathType::Linear => point(i).lerp(point(i + 1), local),
        PathType::CatmullRom => catmull_rom(point(i - 1), point(i), point(i + 1), point(i + 2), local),
    }
}

/// Uniform Catmull-Rom segment between `p1` (at 0) and `p2` (at 1).
fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Compute the current value of path records.
pub fn evaluate_path_tweens_system(
    mut query: Query<(
        &TweenProgress,
        &TweenStatus,
        &TweenPath,
        &TweenStartValue<Vec3>,
        &mut TweenValue<Vec3>,
    )>,
) {
    for (progress, status, path, start, mut value) in query.iter_mut() {
        if !progress.dirty || status.faulted {
            continue;
        }
        let mut position = sample_path(path.points(), progress.eased, &path.options);
        if path.options.relative {
            position += start.value;
        }
        value.0 = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    fn collinear() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_linear_collinear_samples() {
        let pts = collinear();
        let opts = PathOptions::default();
        assert_eq!(sample_path(&pts, 0.0, &opts), pts[0]);
        assert_eq!(sample_path(&pts, 0.5, &opts), pts[1]);
        assert_eq!(sample_path(&pts, 1.0, &opts), pts[2]);
        assert!(vec_approx_eq(sample_path(&pts, 0.25, &opts), Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_out_of_range_parameter_is_clamped() {
        let pts = collinear();
        let opts = PathOptions::default();
        assert_eq!(sample_path(&pts, 1.5, &opts), pts[2]);
        assert_eq!(sample_path(&pts, -0.5, &opts), pts[0]);
        assert_eq!(sample_path(&pts, f32::NAN, &opts), pts[0]);
    }

    #[test]
    fn test_catmull_rom_passes_through_points() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(4.0, 4.0, 1.0),
        ];
        let opts = PathOptions {
            path_type: PathType::CatmullRom,
            ..Default::default()
        };
        for (k, p) in pts.iter().enumerate() {
            let t = k as f32 / 3.0;
            assert!(vec_approx_eq(sample_path(&pts, t, &opts), *p), "point {k}");
        }
    }

    #[test]
    fn test_catmull_rom_collinear_midpoint() {
        let pts = collinear();
        let opts = PathOptions {
            path_type: PathType::CatmullRom,
            ..Default::default()
        };
        assert!(vec_approx_eq(sample_path(&pts, 0.5, &opts), pts[1]));
    }

    #[test]
    fn test_closed_path_returns_to_start() {
        let pts = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let opts = PathOptions {
            closed: true,
            ..Default::default()
        };
        assert!(vec_approx_eq(sample_path(&pts, 1.0, &opts), Vec3::ZERO));
        assert!(vec_approx_eq(sample_path(&pts, 1.0 / 3.0, &opts), Vec3::X));
        // halfway along the closing segment
        assert!(vec_approx_eq(
            sample_path(&pts, 5.0 / 6.0, &opts),
            Vec3::new(0.0, 0.5, 0.0)
        ));
    }

    #[test]
    fn test_two_point_path_is_lerp() {
        let pts = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let opts = PathOptions::default();
        assert!(vec_approx_eq(sample_path(&pts, 0.3, &opts), Vec3::new(3.0, 0.0, 0.0)));
    }
}
