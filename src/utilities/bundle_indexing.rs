use crate::utilities::vector::LANES;

pub const VECTOR_MASK: usize = LANES - 1;

/// Some helpers for indexing into packed registers.
pub struct BundleIndexing;

impl BundleIndexing {
    /// Gets the mask value such that x & VECTOR_MASK computes x % LANES.
    #[inline(always)]
    pub const fn vector_mask() -> usize {
        VECTOR_MASK
    }

    /// Gets the shift value such that x >> vector_shift() divides x by LANES.
    #[inline(always)]
    pub const fn vector_shift() -> usize {
        LANES.trailing_zeros() as usize
    }

    /// Splits a linear point index into a register index and a lane within that register.
    #[inline(always)]
    pub fn get_bundle_indices(linear_index: usize) -> (usize, usize) {
        (linear_index >> Self::vector_shift(), linear_index & Self::vector_mask())
    }

    #[inline(always)]
    pub fn get_bundle_count(element_count: usize) -> usize {
        (element_count + Self::vector_mask()) >> Self::vector_shift()
    }

    /// Rounds `value` up to the nearest multiple of `multiple`.
    #[inline(always)]
    pub const fn ceil_multiple(value: usize, multiple: usize) -> usize {
        value.div_ceil(multiple) * multiple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_indices() {
        assert_eq!(BundleIndexing::get_bundle_indices(0), (0, 0));
        assert_eq!(BundleIndexing::get_bundle_indices(7), (1, 3));
        assert_eq!(BundleIndexing::get_bundle_indices(8), (2, 0));
    }

    #[test]
    fn bundle_count_rounds_up() {
        assert_eq!(BundleIndexing::get_bundle_count(0), 0);
        assert_eq!(BundleIndexing::get_bundle_count(1), 1);
        assert_eq!(BundleIndexing::get_bundle_count(8), 2);
        assert_eq!(BundleIndexing::get_bundle_count(9), 3);
    }

    #[test]
    fn ceil_multiple() {
        assert_eq!(BundleIndexing::ceil_multiple(6, 4), 8);
        assert_eq!(BundleIndexing::ceil_multiple(8, 4), 8);
        assert_eq!(BundleIndexing::ceil_multiple(0, 4), 0);
    }
}
