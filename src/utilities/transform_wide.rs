use crate::utilities::quaternion_wide::QuaternionWide;
use crate::utilities::vector3_wide::Vector3Wide;
use glam::{Quat, Vec3};

/// Translation, rotation and scale broadcast over every SIMD lane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformWide {
    pub translation: Vector3Wide,
    pub rotation: QuaternionWide,
    pub scale: Vector3Wide,
}

impl TransformWide {
    /// Constructs a new transform.
    #[inline(always)]
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation: Vector3Wide::broadcast(translation),
            rotation: QuaternionWide::broadcast(rotation),
            scale: Vector3Wide::broadcast(scale),
        }
    }

    /// Constructs a new transform with unit scale.
    #[inline(always)]
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self::from_scale_rotation_translation(Vec3::ONE, rotation, translation)
    }

    /// Expresses a world position in the local space of the transform. Near-zero scale axes collapse to zero.
    #[inline(always)]
    pub fn inverse_transform_position(transform: &Self, position: &Vector3Wide) -> Vector3Wide {
        Self::inverse_transform_vector(transform, &(*position - transform.translation))
    }

    /// Expresses a world direction in the local space of the transform, ignoring translation.
    #[inline(always)]
    pub fn inverse_transform_vector(transform: &Self, v: &Vector3Wide) -> Vector3Wide {
        let unrotated = QuaternionWide::transform_by_conjugate(v, &transform.rotation);
        Vector3Wide::multiply(&unrotated, &Vector3Wide::safe_scale_reciprocal(&transform.scale))
    }

    /// Expresses a world rotation relative to the rotation of the transform.
    #[inline(always)]
    pub fn inverse_transform_rotation(transform: &Self, rotation: &QuaternionWide) -> QuaternionWide {
        QuaternionWide::conjugate(&transform.rotation) * *rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inverse_transform_position_undoes_the_transform() {
        let rotation = Quat::from_rotation_z(0.5);
        let transform = TransformWide::from_scale_rotation_translation(Vec3::splat(2.0), rotation, Vec3::new(1.0, 2.0, 3.0));
        let local = Vec3::new(0.5, -1.0, 0.25);
        let world = rotation * (local * 2.0) + Vec3::new(1.0, 2.0, 3.0);
        let result = TransformWide::inverse_transform_position(&transform, &Vector3Wide::broadcast(world));
        assert_relative_eq!(result.read_slot(1), local, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_scale_does_not_produce_nan() {
        let transform = TransformWide::from_scale_rotation_translation(Vec3::new(1.0, 0.0, 1.0), Quat::IDENTITY, Vec3::ZERO);
        let result = TransformWide::inverse_transform_vector(&transform, &Vector3Wide::broadcast(Vec3::ONE));
        assert_eq!(result.read_slot(0), Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn inverse_rotation_of_own_rotation_is_identity() {
        let rotation = Quat::from_rotation_y(1.3);
        let transform = TransformWide::from_rotation_translation(rotation, Vec3::ZERO);
        let relative = TransformWide::inverse_transform_rotation(&transform, &QuaternionWide::broadcast(rotation));
        assert_relative_eq!(relative.read_slot(2), Quat::IDENTITY, epsilon = 1e-6);
    }
}
