//! Path component for records that follow a sequence of control points.
//!
//! A path record holds `Vec3` values and a [`TweenPath`]; its current value
//! is produced by [`sample_path`](crate::systems::path::sample_path) instead
//! of a two-point interpolation.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::TweenError;

/// Interpolation between consecutive control points.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    /// Straight segments.
    #[default]
    Linear,
    /// Uniform Catmull-Rom spline passing through every point.
    CatmullRom,
}

/// How a path is traversed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOptions {
    pub path_type: PathType,
    /// Add a segment from the last point back to the first.
    pub closed: bool,
    /// Points are offsets from the record's start value.
    pub relative: bool,
}

/// Immutable control points of a path record.
///
/// The points are owned by the record. Changing them means replacing the
/// whole sequence through [`TweenPath::replace_points`], which re-validates it.
#[derive(Component, Clone, Debug)]
pub struct TweenPath {
    points: Box<[Vec3]>,
    pub options: PathOptions,
}

impl TweenPath {
    /// Build a path; fails with [`TweenError::InvalidPathConfiguration`] for fewer than two points.
    pub fn new(points: impl Into<Vec<Vec3>>, options: PathOptions) -> Result<Self, TweenError> {
        let points = Self::validate(points.into())?;
        Ok(TweenPath { points, options })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn replace_points(&mut self, points: impl Into<Vec<Vec3>>) -> Result<(), TweenError> {
        self.points = Self::validate(points.into())?;
        Ok(())
    }

    fn validate(points: Vec<Vec3>) -> Result<Box<[Vec3]>, TweenError> {
        if points.len() < 2 {
            return Err(TweenError::InvalidPathConfiguration {
                count: points.len(),
            });
        }
        Ok(points.into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_requires_two_points() {
        assert_eq!(
            TweenPath::new(vec![Vec3::ZERO], PathOptions::default()).unwrap_err(),
            TweenError::InvalidPathConfiguration { count: 1 }
        );
        assert!(TweenPath::new(Vec::<Vec3>::new(), PathOptions::default()).is_err());
        assert!(TweenPath::new(vec![Vec3::ZERO, Vec3::X], PathOptions::default()).is_ok());
    }

    #[test]
    fn test_replace_points_keeps_old_on_error() {
        let mut path = TweenPath::new(vec![Vec3::ZERO, Vec3::X], PathOptions::default()).unwrap();
        assert!(path.replace_points(vec![Vec3::Y]).is_err());
        assert_eq!(path.points(), &[Vec3::ZERO, Vec3::X]);
        path.replace_points(vec![Vec3::Y, Vec3::Z, Vec3::ONE]).unwrap();
        assert_eq!(path.points().len(), 3);
    }
}
