use crate::utilities::vector::{self, Vector, VectorMask, LANES, SMALL_REAL};
use glam::Vec3;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::simd::prelude::*;
use std::simd::StdFloat;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// Three dimensional vector with one chain point per SIMD lane.
pub struct Vector3Wide {
    /// First component of the vector.
    pub x: Vector,
    /// Second component of the vector.
    pub y: Vector,
    /// Third component of the vector.
    pub z: Vector,
}

impl From<Vector> for Vector3Wide {
    #[inline(always)]
    fn from(s: Vector) -> Self {
        Self::new(s)
    }
}

impl Vector3Wide {
    pub const ZERO: Self = Self {
        x: Vector::from_array([0.0; LANES]),
        y: Vector::from_array([0.0; LANES]),
        z: Vector::from_array([0.0; LANES]),
    };

    pub const UNIT_X: Self = Self {
        x: Vector::from_array([1.0; LANES]),
        y: Vector::from_array([0.0; LANES]),
        z: Vector::from_array([0.0; LANES]),
    };

    pub const UNIT_Y: Self = Self {
        x: Vector::from_array([0.0; LANES]),
        y: Vector::from_array([1.0; LANES]),
        z: Vector::from_array([0.0; LANES]),
    };

    /// Creates a vector by populating each component with the given scalars.
    #[inline(always)]
    pub fn new(s: Vector) -> Self {
        Self { x: s, y: s, z: s }
    }

    /// Packs four narrow vectors into the lanes of a wide vector, in order.
    #[inline(always)]
    pub fn from_lanes(lanes: [Vec3; LANES]) -> Self {
        Self {
            x: Vector::from_array(lanes.map(|v| v.x)),
            y: Vector::from_array(lanes.map(|v| v.y)),
            z: Vector::from_array(lanes.map(|v| v.z)),
        }
    }

    /// Unpacks every lane into a narrow vector.
    #[inline(always)]
    pub fn to_lanes(&self) -> [Vec3; LANES] {
        std::array::from_fn(|lane| self.read_slot(lane))
    }

    /// Computes the inner product between two vectors.
    #[inline(always)]
    pub fn dot(a: &Self, b: &Self) -> Vector {
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    #[inline(always)]
    pub fn cross(a: &Self, b: &Self) -> Self {
        Self {
            x: a.y * b.z - a.z * b.y,
            y: a.z * b.x - a.x * b.z,
            z: a.x * b.y - a.y * b.x,
        }
    }

    /// Scales a vector by a per-lane scalar.
    #[inline(always)]
    pub fn scale(vector: &Self, scalar: Vector) -> Self {
        Self {
            x: vector.x * scalar,
            y: vector.y * scalar,
            z: vector.z * scalar,
        }
    }

    /// Computes the per-component product of two vectors.
    #[inline(always)]
    pub fn multiply(a: &Self, b: &Self) -> Self {
        Self {
            x: a.x * b.x,
            y: a.y * b.y,
            z: a.z * b.z,
        }
    }

    #[inline(always)]
    pub fn abs(&self) -> Self {
        Self {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }

    #[inline(always)]
    pub fn length_squared(&self) -> Vector {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(&self) -> Vector {
        self.length_squared().sqrt()
    }

    #[inline(always)]
    pub fn distance(a: &Self, b: &Self) -> Vector {
        (*b - *a).length()
    }

    /// Normalizes every lane. Lanes whose length is at or below [`SMALL_REAL`] become the zero vector instead of NaN.
    #[inline(always)]
    pub fn normalize(&self) -> Self {
        let length = self.length();
        let usable = length.simd_gt(Vector::splat(SMALL_REAL));
        let safe_length = vector::select(usable, length, Vector::splat(1.0));
        let normalized = Self::scale(self, Vector::splat(1.0) / safe_length);
        Self::conditional_select(usable, &normalized, &Self::ZERO)
    }

    /// Per-component reciprocal of a scale vector; components at or below [`SMALL_REAL`] in magnitude map to zero.
    #[inline(always)]
    pub fn safe_scale_reciprocal(scale: &Self) -> Self {
        Self {
            x: vector::safe_reciprocal(scale.x),
            y: vector::safe_reciprocal(scale.y),
            z: vector::safe_reciprocal(scale.z),
        }
    }

    /// Chooses `left` in lanes where the condition is set and `right` elsewhere.
    #[inline(always)]
    pub fn conditional_select(condition: VectorMask, left: &Self, right: &Self) -> Self {
        Self {
            x: condition.select(left.x, right.x),
            y: condition.select(left.y, right.y),
            z: condition.select(left.z, right.z),
        }
    }

    /// Gathers each lane's chain successor: lanes {1,2,3} of `current` and lane {0} of `next`.
    #[inline(always)]
    pub fn shuffle_neighbor(current: &Self, next: &Self) -> Self {
        Self {
            x: vector::shuffle_neighbor(current.x, next.x),
            y: vector::shuffle_neighbor(current.y, next.y),
            z: vector::shuffle_neighbor(current.z, next.z),
        }
    }

    /// Scatters a successor vector built by [`Self::shuffle_neighbor`] back into its source registers.
    /// Lane 0 of `current` is left untouched, lanes 1..3 of `current` and lane 0 of `next` are replaced.
    #[inline(always)]
    pub fn unshuffle_neighbor(neighbor: &Self, current: &mut Self, next: &mut Self) {
        current.x = vector::unshuffle_current(current.x, neighbor.x);
        current.y = vector::unshuffle_current(current.y, neighbor.y);
        current.z = vector::unshuffle_current(current.z, neighbor.z);
        next.x = vector::unshuffle_next(neighbor.x, next.x);
        next.y = vector::unshuffle_next(neighbor.y, next.y);
        next.z = vector::unshuffle_next(neighbor.z, next.z);
    }

    #[inline(always)]
    pub fn read_slot(&self, slot_index: usize) -> Vec3 {
        Vec3::new(self.x[slot_index], self.y[slot_index], self.z[slot_index])
    }

    #[inline(always)]
    pub fn write_slot(&mut self, source: Vec3, slot_index: usize) {
        self.x[slot_index] = source.x;
        self.y[slot_index] = source.y;
        self.z[slot_index] = source.z;
    }

    #[inline(always)]
    pub fn broadcast(source: Vec3) -> Self {
        Self {
            x: Vector::splat(source.x),
            y: Vector::splat(source.y),
            z: Vector::splat(source.z),
        }
    }
}

impl Add for Vector3Wide {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vector3Wide {
    #[inline(always)]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Vector3Wide {
    type Output = Self;

    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl SubAssign for Vector3Wide {
    #[inline(always)]
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl Mul<Vector> for Vector3Wide {
    type Output = Self;

    #[inline(always)]
    fn mul(self, scalar: Vector) -> Self::Output {
        Self::scale(&self, scalar)
    }
}

impl Mul<Vector3Wide> for Vector {
    type Output = Vector3Wide;

    #[inline(always)]
    fn mul(self, vector: Vector3Wide) -> Self::Output {
        Vector3Wide::scale(&vector, self)
    }
}

impl Neg for Vector3Wide {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::fmt::Display for Vector3Wide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:?}, {:?}, {:?}>", self.x, self.y, self.z)
    }
}
