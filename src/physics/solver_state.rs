use crate::physics::chain_builder::{ChainStructure, ChainTopology};
use crate::physics::handles::BoneHandle;
use crate::utilities::bundle_indexing::BundleIndexing;
use crate::utilities::vector::{self, Vector, LANES};
use crate::utilities::vector3_wide::Vector3Wide;
use glam::Vec3;
use std::ops::Range;

/// Packed per-point arrays shared by the integrator, the constraint solver and pose extraction.
///
/// Every array is indexed by register; register `k` holds the points `4k..4k + 4` of the flattened chain list.
/// Chains never share a register.
#[derive(Clone, Debug)]
pub struct SolverState {
    pub structures: Vec<ChainStructure>,
    /// Physics result of the current step.
    pub sim_positions: Vec<Vector3Wide>,
    /// Physics result of the previous step; the difference to `sim_positions` is the Verlet velocity.
    pub prev_sim_positions: Vec<Vector3Wide>,
    /// Authored pose of the current step. Synthetic lanes keep their build-time placement.
    pub anim_positions: Vec<Vector3Wide>,
    /// 0.0 in synthetic lanes, 1.0 elsewhere.
    pub dummy_bone_masks: Vec<Vector>,
    /// 0.0 in chain root lanes, 1.0 elsewhere.
    pub fixed_masks: Vec<Vector>,
    /// Accumulated multiplier of the distance constraint between each point and its successor.
    pub lambdas: Vec<Vector>,
    /// Host bone of every point, `None` for synthetic points.
    pub bones: Vec<Option<BoneHandle>>,
    pub actual_bone_count: usize,
}

impl SolverState {
    pub fn new(topology: &ChainTopology) -> Self {
        let packed_bone_count = topology.packed_bone_count();
        let mut sim_positions = Vec::with_capacity(packed_bone_count);
        let mut dummy_bone_masks = Vec::with_capacity(packed_bone_count);
        let mut fixed_masks = Vec::with_capacity(packed_bone_count);
        let mut bones = Vec::with_capacity(topology.all_bone_count);

        for chain in &topology.chains {
            for register in chain.chunks_exact(LANES) {
                sim_positions.push(Vector3Wide::from_lanes(std::array::from_fn(|lane| register[lane].position)));
                dummy_bone_masks.push(vector::gate_from_flags(std::array::from_fn(|lane| register[lane].is_dummy)));
                fixed_masks.push(vector::gate_from_flags(std::array::from_fn(|lane| register[lane].is_root)));
                bones.extend(register.iter().map(|bone| bone.bone));
            }
        }

        Self {
            structures: topology.structures.clone(),
            prev_sim_positions: sim_positions.clone(),
            anim_positions: sim_positions.clone(),
            sim_positions,
            dummy_bone_masks,
            fixed_masks,
            lambdas: vec![Vector::splat(0.0); packed_bone_count],
            bones,
            actual_bone_count: topology.actual_bone_count,
        }
    }

    #[inline(always)]
    pub fn packed_bone_count(&self) -> usize {
        self.sim_positions.len()
    }

    #[inline(always)]
    pub fn chain_count(&self) -> usize {
        self.structures.len()
    }

    /// Register ranges of every chain, in chain order.
    pub fn chain_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.structures.iter().scan(0, |begin, structure| {
            let range = *begin..*begin + structure.packed_bone_count;
            *begin = range.end;
            Some(range)
        })
    }

    /// Multiplicative gate of the free lanes of a register: 1.0 where the point is neither a root nor synthetic.
    #[inline(always)]
    pub fn free_mask(&self, packed_index: usize) -> Vector {
        self.fixed_masks[packed_index] * self.dummy_bone_masks[packed_index]
    }

    #[inline(always)]
    pub fn simulated_position(&self, point_index: usize) -> Vec3 {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        self.sim_positions[bundle].read_slot(lane)
    }

    #[inline(always)]
    pub fn set_simulated_position(&mut self, point_index: usize, position: Vec3) {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        self.sim_positions[bundle].write_slot(position, lane);
    }

    #[inline(always)]
    pub fn previous_position(&self, point_index: usize) -> Vec3 {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        self.prev_sim_positions[bundle].read_slot(lane)
    }

    #[inline(always)]
    pub fn animated_position(&self, point_index: usize) -> Vec3 {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        self.anim_positions[bundle].read_slot(lane)
    }

    #[inline(always)]
    pub fn is_dummy(&self, point_index: usize) -> bool {
        self.bones[point_index].is_none()
    }

    #[inline(always)]
    pub fn is_root(&self, point_index: usize) -> bool {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        self.fixed_masks[bundle][lane] == 0.0
    }

    pub fn reset_lambdas(&mut self) {
        self.lambdas.fill(Vector::splat(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::chain_builder::ChainBone;

    fn topology(lengths: &[usize]) -> ChainTopology {
        let mut next_handle = 0;
        let chains = lengths
            .iter()
            .enumerate()
            .map(|(chain_index, &length)| {
                (0..length)
                    .map(|i| {
                        next_handle += 1;
                        let position = Vec3::new(chain_index as f32, -(i as f32), 0.5 * i as f32);
                        ChainBone::new(BoneHandle(next_handle), position, i == 0)
                    })
                    .collect()
            })
            .collect();
        ChainTopology::from_chains(chains)
    }

    #[test]
    fn packing_round_trips_every_point() {
        let topology = topology(&[5, 3, 8]);
        let state = SolverState::new(&topology);

        let flattened: Vec<ChainBone> = topology.chains.iter().flatten().copied().collect();
        assert_eq!(state.packed_bone_count() * LANES, flattened.len());
        for (point_index, bone) in flattened.iter().enumerate() {
            assert_eq!(state.simulated_position(point_index), bone.position);
            assert_eq!(state.previous_position(point_index), bone.position);
            assert_eq!(state.animated_position(point_index), bone.position);
            assert_eq!(state.is_dummy(point_index), bone.is_dummy);
            assert_eq!(state.is_root(point_index), bone.is_root);
            assert_eq!(state.bones[point_index], bone.bone);
        }
    }

    #[test]
    fn masks_gate_roots_and_padding() {
        let state = SolverState::new(&topology(&[2]));
        assert_eq!(state.fixed_masks[0].to_array(), [0.0, 1.0, 1.0, 1.0]);
        assert_eq!(state.dummy_bone_masks[0].to_array(), [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(state.free_mask(0).to_array(), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn chain_ranges_cover_the_registers_in_order() {
        let state = SolverState::new(&topology(&[5, 3, 8]));
        let ranges: Vec<Range<usize>> = state.chain_ranges().collect();
        assert_eq!(ranges, vec![0..2, 2..3, 3..6]);
        assert_eq!(state.actual_bone_count, 16);
        assert!(state.lambdas.iter().all(|lambda| *lambda == Vector::splat(0.0)));
    }
}
