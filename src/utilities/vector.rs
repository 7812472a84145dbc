use std::simd::prelude::*;
use std::simd::{f32x4, mask32x4, simd_swizzle};

/// Number of points packed into one register.
pub const LANES: usize = 4;

/// Four lanes of `f32`, one lane per packed chain point.
pub type Vector = f32x4;

/// Lane mask produced by comparisons on [`Vector`].
pub type VectorMask = mask32x4;

/// Magnitudes at or below this are treated as zero by the safe helpers.
pub const SMALL_REAL: f32 = 1e-5;

/// Branch-free per-lane choice between two vectors.
#[inline(always)]
pub fn select(mask: VectorMask, if_true: Vector, if_false: Vector) -> Vector {
    mask.select(if_true, if_false)
}

/// Builds the successor vector for a register: lanes {1,2,3} of `current` followed by lane {0} of `next`.
/// For a register holding points `[p0, p1, p2, p3]` this produces `[p1, p2, p3, p4]`.
#[inline(always)]
pub fn shuffle_neighbor(current: Vector, next: Vector) -> Vector {
    simd_swizzle!(current, next, [1, 2, 3, 4])
}

/// Inverse of [`shuffle_neighbor`] for the current register: keeps lane 0 of `current` and takes lanes 1..3 from
/// lanes 0..2 of `neighbor`.
#[inline(always)]
pub fn unshuffle_current(current: Vector, neighbor: Vector) -> Vector {
    simd_swizzle!(current, neighbor, [0, 4, 5, 6])
}

/// Inverse of [`shuffle_neighbor`] for the next register: replaces lane 0 of `next` with lane 3 of `neighbor`.
#[inline(always)]
pub fn unshuffle_next(neighbor: Vector, next: Vector) -> Vector {
    simd_swizzle!(neighbor, next, [3, 5, 6, 7])
}

/// Converts a set of flags into a multiplicative gate, 1.0 where the flag is clear and 0.0 where it is set.
#[inline(always)]
pub fn gate_from_flags(flags: [bool; LANES]) -> Vector {
    Vector::from_array(flags.map(|flag| if flag { 0.0 } else { 1.0 }))
}

/// Reciprocal that yields zero instead of infinity for near-zero inputs.
#[inline(always)]
pub fn safe_reciprocal(v: Vector) -> Vector {
    let usable = v.abs().simd_gt(Vector::splat(SMALL_REAL));
    let safe = select(usable, v, Vector::splat(1.0));
    select(usable, Vector::splat(1.0) / safe, Vector::splat(0.0))
}
