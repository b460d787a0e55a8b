//! Translators: how a value type is read from and written to an external object.
//!
//! A translator is a component carried by the tween record. Its type is the
//! batching key: the scheduler runs one sample system and one apply system
//! per translator type, so every record in a batch shares both the value
//! type and the object kind.
//!
//! Built-in external object: [`Transform`], with translators for its
//! position, scale, rotation and 2D angle.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::TranslatorError;
use crate::value::TweenValueType;

/// Reads and writes one value type on one kind of external object.
pub trait Translator: Component {
    type Value: TweenValueType;
    type Object: Send + Sync + 'static;

    fn get(&self, object: &Self::Object) -> Result<Self::Value, TranslatorError>;

    fn apply(&self, object: &mut Self::Object, value: Self::Value) -> Result<(), TranslatorError>;
}

/// Generic external object: a 3D transform with a separate 2D angle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Rotation in degrees for 2D hosts.
    pub angle: f32,
    /// Host-side lock; writes to a locked transform are rejected.
    pub locked: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            angle: 0.0,
            locked: false,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }

    fn check_writable(&self) -> Result<(), TranslatorError> {
        if self.locked {
            return Err(TranslatorError::new("transform is locked"));
        }
        Ok(())
    }
}

/// Tweens [`Transform::position`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PositionTranslator;

impl Translator for PositionTranslator {
    type Value = Vec3;
    type Object = Transform;

    fn get(&self, object: &Transform) -> Result<Vec3, TranslatorError> {
        Ok(object.position)
    }

    fn apply(&self, object: &mut Transform, value: Vec3) -> Result<(), TranslatorError> {
        object.check_writable()?;
        if !value.is_finite() {
            return Err(TranslatorError::new(format!("non-finite position {value}")));
        }
        object.position = value;
        Ok(())
    }
}

/// Tweens [`Transform::scale`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct ScaleTranslator;

impl Translator for ScaleTranslator {
    type Value = Vec3;
    type Object = Transform;

    fn get(&self, object: &Transform) -> Result<Vec3, TranslatorError> {
        Ok(object.scale)
    }

    fn apply(&self, object: &mut Transform, value: Vec3) -> Result<(), TranslatorError> {
        object.check_writable()?;
        object.scale = value;
        Ok(())
    }
}

/// Tweens [`Transform::rotation`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct RotationTranslator;

impl Translator for RotationTranslator {
    type Value = Quat;
    type Object = Transform;

    fn get(&self, object: &Transform) -> Result<Quat, TranslatorError> {
        Ok(object.rotation)
    }

    fn apply(&self, object: &mut Transform, value: Quat) -> Result<(), TranslatorError> {
        object.check_writable()?;
        object.rotation = value.normalize();
        Ok(())
    }
}

/// Tweens [`Transform::angle`] (degrees).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct AngleTranslator;

impl Translator for AngleTranslator {
    type Value = f32;
    type Object = Transform;

    fn get(&self, object: &Transform) -> Result<f32, TranslatorError> {
        Ok(object.angle)
    }

    fn apply(&self, object: &mut Transform, value: f32) -> Result<(), TranslatorError> {
        object.check_writable()?;
        object.angle = value;
        Ok(())
    }
}
