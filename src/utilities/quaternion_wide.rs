use crate::utilities::vector::{Vector, VectorMask, LANES, SMALL_REAL};
use crate::utilities::vector3_wide::Vector3Wide;
use glam::Quat;
use std::ops::Mul;
use std::simd::prelude::*;
use std::simd::StdFloat;

/// Quaternion with one rotation per SIMD lane.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuaternionWide {
    pub x: Vector,
    pub y: Vector,
    pub z: Vector,
    pub w: Vector,
}

impl Default for QuaternionWide {
    #[inline(always)]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl QuaternionWide {
    pub const IDENTITY: Self = Self {
        x: Vector::from_array([0.0; LANES]),
        y: Vector::from_array([0.0; LANES]),
        z: Vector::from_array([0.0; LANES]),
        w: Vector::from_array([1.0; LANES]),
    };

    #[inline(always)]
    pub fn broadcast(source: Quat) -> Self {
        Self {
            x: Vector::splat(source.x),
            y: Vector::splat(source.y),
            z: Vector::splat(source.z),
            w: Vector::splat(source.w),
        }
    }

    #[inline(always)]
    pub fn length_squared(&self) -> Vector {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline(always)]
    pub fn length(&self) -> Vector {
        self.length_squared().sqrt()
    }

    /// Normalizes every lane. A lane with a near-zero norm becomes the identity rotation.
    #[inline(always)]
    pub fn normalize(q: Self) -> Self {
        let length = q.length();
        let usable = length.simd_gt(Vector::splat(SMALL_REAL));
        let inverse_norm = Vector::splat(1.0) / usable.select(length, Vector::splat(1.0));
        let normalized = Self {
            x: q.x * inverse_norm,
            y: q.y * inverse_norm,
            z: q.z * inverse_norm,
            w: q.w * inverse_norm,
        };
        Self::conditional_select(usable, &normalized, &Self::IDENTITY)
    }

    /// Computes the conjugate of the quaternion. For unit quaternions this is the inverse rotation.
    #[inline(always)]
    pub fn conjugate(quaternion: &Self) -> Self {
        Self {
            x: -quaternion.x,
            y: -quaternion.y,
            z: -quaternion.z,
            w: quaternion.w,
        }
    }

    /// Hamilton product `a * b`: applying the result to a vector rotates by `b` first, then by `a`.
    #[inline(always)]
    pub fn concatenate(a: &Self, b: &Self) -> Self {
        Self {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y + a.y * b.w + a.z * b.x - a.x * b.z,
            z: a.w * b.z + a.z * b.w + a.x * b.y - a.y * b.x,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }

    /// Transforms the vector using a quaternion.
    #[inline(always)]
    pub fn transform(v: &Vector3Wide, rotation: &Self) -> Vector3Wide {
        // Optimized-down form of v' = q * v * q^-1 for unit q.
        let x2 = rotation.x + rotation.x;
        let y2 = rotation.y + rotation.y;
        let z2 = rotation.z + rotation.z;
        let xx2 = rotation.x * x2;
        let xy2 = rotation.x * y2;
        let xz2 = rotation.x * z2;
        let yy2 = rotation.y * y2;
        let yz2 = rotation.y * z2;
        let zz2 = rotation.z * z2;
        let wx2 = rotation.w * x2;
        let wy2 = rotation.w * y2;
        let wz2 = rotation.w * z2;
        let one = Vector::splat(1.0);
        Vector3Wide {
            x: v.x * (one - yy2 - zz2) + v.y * (xy2 - wz2) + v.z * (xz2 + wy2),
            y: v.x * (xy2 + wz2) + v.y * (one - xx2 - zz2) + v.z * (yz2 - wx2),
            z: v.x * (xz2 - wy2) + v.y * (yz2 + wx2) + v.z * (one - xx2 - yy2),
        }
    }

    /// Transforms the vector by the inverse of a unit quaternion.
    #[inline(always)]
    pub fn transform_by_conjugate(v: &Vector3Wide, rotation: &Self) -> Vector3Wide {
        Self::transform(v, &Self::conjugate(rotation))
    }

    /// Shortest-arc rotation taking the direction of `a` onto the direction of `b`. Neither input needs to be normalized.
    ///
    /// When the vectors point away from each other there are infinitely many shortest arcs. The lanes in that state
    /// rotate half a turn about an axis perpendicular to `a`: `a × Y` when |a.x| is the largest component of `a`,
    /// `a × -X` otherwise. Both cases are always computed and the result is selected per lane.
    #[inline(always)]
    pub fn from_to_rotation(a: &Vector3Wide, b: &Vector3Wide) -> Self {
        let norm_ab = (a.length_squared() * b.length_squared()).sqrt();
        let w = norm_ab + Vector3Wide::dot(a, b);
        let use_normal_case = w.simd_ge(Vector::splat(SMALL_REAL) * norm_ab);

        let cross = Vector3Wide::cross(a, b);
        let normal_case = Self {
            x: cross.x,
            y: cross.y,
            z: cross.z,
            w,
        };

        let abs = a.abs();
        let x_is_largest = abs.x.simd_gt(abs.y) & abs.x.simd_gt(abs.z);
        let basis = Vector3Wide::conditional_select(x_is_largest, &Vector3Wide::UNIT_Y, &-Vector3Wide::UNIT_X);
        let axis = Vector3Wide::cross(a, &basis);
        let opposed_case = Self {
            x: axis.x,
            y: axis.y,
            z: axis.z,
            w: Vector::splat(0.0),
        };

        Self::normalize(Self::conditional_select(use_normal_case, &normal_case, &opposed_case))
    }

    #[inline(always)]
    pub fn conditional_select(condition: VectorMask, left: &Self, right: &Self) -> Self {
        Self {
            x: condition.select(left.x, right.x),
            y: condition.select(left.y, right.y),
            z: condition.select(left.z, right.z),
            w: condition.select(left.w, right.w),
        }
    }

    #[inline(always)]
    pub fn read_slot(&self, slot_index: usize) -> Quat {
        Quat::from_xyzw(
            self.x[slot_index],
            self.y[slot_index],
            self.z[slot_index],
            self.w[slot_index],
        )
    }

    #[inline(always)]
    pub fn write_slot(&mut self, source: Quat, slot_index: usize) {
        self.x[slot_index] = source.x;
        self.y[slot_index] = source.y;
        self.z[slot_index] = source.z;
        self.w[slot_index] = source.w;
    }
}

impl Mul for QuaternionWide {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self::concatenate(&self, &rhs)
    }
}

impl Mul<Vector3Wide> for QuaternionWide {
    type Output = Vector3Wide;

    #[inline(always)]
    fn mul(self, v: Vector3Wide) -> Vector3Wide {
        Self::transform(&v, &self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn product_matches_glam() {
        let a = Quat::from_rotation_y(0.7);
        let b = Quat::from_rotation_x(-1.2);
        let wide = QuaternionWide::broadcast(a) * QuaternionWide::broadcast(b);
        assert_relative_eq!(wide.read_slot(3), a * b, epsilon = 1e-6);
    }

    #[test]
    fn transform_and_conjugate_transform_undo_each_other() {
        let rotation = QuaternionWide::broadcast(Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.9));
        let v = Vector3Wide::from_lanes([Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, -2.0, 0.5)]);
        let rotated = QuaternionWide::transform(&v, &rotation);
        let back = QuaternionWide::transform_by_conjugate(&rotated, &rotation).to_lanes();
        for (lane, expected) in v.to_lanes().into_iter().enumerate() {
            assert_relative_eq!(back[lane], expected, epsilon = 1e-5);
        }
        assert_relative_eq!(rotated.read_slot(0), rotation.read_slot(0) * Vec3::X, epsilon = 1e-6);
    }

    #[test]
    fn from_to_maps_source_direction_onto_target() {
        let a = [Vec3::X, Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.3, -0.2, 0.9)];
        let b = [Vec3::Y, Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(-1.0, 0.4, 0.1)];
        let q = QuaternionWide::from_to_rotation(&Vector3Wide::from_lanes(a), &Vector3Wide::from_lanes(b));
        for lane in 0..LANES {
            let rotated = q.read_slot(lane) * a[lane].normalize();
            assert_relative_eq!(rotated, b[lane].normalize(), epsilon = 1e-5);
        }
    }

    #[test]
    fn from_to_of_opposed_vectors_is_a_half_turn() {
        let a = [Vec3::X, Vec3::NEG_Y, Vec3::new(0.0, 0.0, 3.0), Vec3::new(2.0, 0.5, 0.0)];
        let b = a.map(|v| -v);
        let q = QuaternionWide::from_to_rotation(&Vector3Wide::from_lanes(a), &Vector3Wide::from_lanes(b));
        for lane in 0..LANES {
            let rotation = q.read_slot(lane);
            assert!(rotation.is_finite());
            assert_relative_eq!(rotation.length(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(rotation * a[lane], b[lane], epsilon = 1e-5);
        }
    }

    #[test]
    fn from_to_of_zero_vector_is_identity() {
        let q = QuaternionWide::from_to_rotation(&Vector3Wide::ZERO, &Vector3Wide::broadcast(Vec3::X));
        assert_eq!(q.read_slot(0), Quat::IDENTITY);
    }
}
