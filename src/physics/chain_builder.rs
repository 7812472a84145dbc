//! Splits a bone hierarchy into linear chains and pads them for 4-wide packing.
//!
//! A chain starts at a designated root and follows the hierarchy downwards. Wherever a bone has more than one
//! child, every child continues its own copy of the chain built so far, so a branching hierarchy (several hair
//! strands under one root, say) becomes several independent linear chains sharing a common prefix.
//!
//! Each chain then receives one extrapolated leaf point, which gives the last real bone a successor, followed by
//! alignment padding until its length is a multiple of the register width.

use crate::error::ChainError;
use crate::physics::handles::BoneHandle;
use crate::physics::skeleton::SkeletonHierarchy;
use crate::utilities::bundle_indexing::BundleIndexing;
use crate::utilities::vector::LANES;
use glam::Vec3;
use log::{debug, warn};

/// One point of a chain prior to packing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainBone {
    /// Host bone backing this point. `None` for synthetic points.
    pub bone: Option<BoneHandle>,
    pub position: Vec3,
    /// Anchored to the animated pose, never moved by forces or constraints.
    pub is_root: bool,
    /// Synthetic leaf or padding point; never forced and never written back to the host.
    pub is_dummy: bool,
}

impl ChainBone {
    #[inline(always)]
    pub fn new(bone: BoneHandle, position: Vec3, is_root: bool) -> Self {
        Self {
            bone: Some(bone),
            position,
            is_root,
            is_dummy: false,
        }
    }

    #[inline(always)]
    pub fn dummy(position: Vec3) -> Self {
        Self {
            bone: None,
            position,
            is_root: false,
            is_dummy: true,
        }
    }
}

/// Register bookkeeping for one chain within the flat solver arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainStructure {
    /// Number of packed registers the chain occupies.
    pub packed_bone_count: usize,
    /// Number of synthetic points: the extrapolated leaf plus alignment padding.
    pub dummy_bone_count: usize,
}

impl ChainStructure {
    /// Total number of points including synthetic ones.
    #[inline(always)]
    pub fn bone_count(&self) -> usize {
        self.packed_bone_count * LANES
    }

    /// Number of points backed by host bones.
    #[inline(always)]
    pub fn actual_bone_count(&self) -> usize {
        self.bone_count() - self.dummy_bone_count
    }
}

/// Extrapolates one point past the end of the chain: `last + (last - second_to_last)`.
#[inline(always)]
fn extrapolate(chain: &[ChainBone]) -> Result<Vec3, ChainError> {
    match chain {
        [.., before_last, last] => Ok(last.position + (last.position - before_last.position)),
        _ => Err(ChainError::TooShort(chain.len())),
    }
}

/// Appends the synthetic leaf point that gives the final real bone a successor.
pub fn insert_leaf_bone(chain: &mut Vec<ChainBone>) -> Result<(), ChainError> {
    let position = extrapolate(chain)?;
    chain.push(ChainBone::dummy(position));
    Ok(())
}

/// Appends `dummy_bone_count` padding points, each extrapolated from the current last two points.
pub fn fill_register_with_dummy_bones(chain: &mut Vec<ChainBone>, dummy_bone_count: usize) -> Result<(), ChainError> {
    for _ in 0..dummy_bone_count {
        let position = extrapolate(chain)?;
        chain.push(ChainBone::dummy(position));
    }
    Ok(())
}

/// Adds the leaf and padding points to a chain of real bones and describes the result.
pub fn make_chain_structure(chain: &mut Vec<ChainBone>) -> Result<ChainStructure, ChainError> {
    if chain.len() < 2 {
        return Err(ChainError::TooShort(chain.len()));
    }

    insert_leaf_bone(chain)?;
    let padding = BundleIndexing::ceil_multiple(chain.len(), LANES) - chain.len();
    fill_register_with_dummy_bones(chain, padding)?;

    Ok(ChainStructure {
        packed_bone_count: BundleIndexing::get_bundle_count(chain.len()),
        dummy_bone_count: 1 + padding,
    })
}

/// Walks the hierarchy below every root and returns one chain per leaf reached.
///
/// Each child of a root starts a chain `[root, child, ...]`. A root without children yields a chain holding only
/// the root, which [`ChainTopology::from_chains`] later rejects.
pub fn gather_chains<H: SkeletonHierarchy + ?Sized>(hierarchy: &H, roots: &[BoneHandle]) -> Vec<Vec<ChainBone>> {
    let mut chains = Vec::new();
    let mut stack: Vec<(BoneHandle, Vec<ChainBone>)> = Vec::new();

    for &root in roots {
        let root_bone = ChainBone::new(root, hierarchy.world_position(root), true);
        let children = hierarchy.children(root);
        if children.is_empty() {
            chains.push(vec![root_bone]);
            continue;
        }

        for &child in children.iter().rev() {
            stack.push((child, vec![root_bone]));
        }

        while let Some((bone, mut chain)) = stack.pop() {
            chain.push(ChainBone::new(bone, hierarchy.world_position(bone), false));
            match hierarchy.children(bone) {
                [] => chains.push(chain),
                [only] => stack.push((*only, chain)),
                [first, rest @ ..] => {
                    // Reversed so the first child is popped, and therefore emitted, first.
                    for &child in rest.iter().rev() {
                        stack.push((child, chain.clone()));
                    }
                    stack.push((*first, chain));
                }
            }
        }
    }

    chains
}

/// Padded chains ready to be packed, plus their register bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct ChainTopology {
    pub structures: Vec<ChainStructure>,
    /// Padded point lists, parallel to `structures`.
    pub chains: Vec<Vec<ChainBone>>,
    /// Number of points backed by host bones across every chain.
    pub actual_bone_count: usize,
    /// Number of points including synthetic ones across every chain.
    pub all_bone_count: usize,
}

impl ChainTopology {
    pub fn build<H: SkeletonHierarchy + ?Sized>(hierarchy: &H, roots: &[BoneHandle]) -> Self {
        Self::from_chains(gather_chains(hierarchy, roots))
    }

    /// Pads every chain. Chains too short to extrapolate a leaf are logged and left out.
    pub fn from_chains(chains: Vec<Vec<ChainBone>>) -> Self {
        let mut topology = Self::default();
        for (chain_index, mut chain) in chains.into_iter().enumerate() {
            match make_chain_structure(&mut chain) {
                Ok(structure) => {
                    topology.actual_bone_count += structure.actual_bone_count();
                    topology.all_bone_count += structure.bone_count();
                    topology.structures.push(structure);
                    topology.chains.push(chain);
                }
                Err(error) => warn!("skipping chain {chain_index}: {error}"),
            }
        }
        debug!(
            "built {} chains, {} bones, {} packed registers",
            topology.chains.len(),
            topology.actual_bone_count,
            topology.packed_bone_count()
        );
        topology
    }

    /// Total number of packed registers across every chain.
    #[inline(always)]
    pub fn packed_bone_count(&self) -> usize {
        BundleIndexing::get_bundle_count(self.all_bone_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::skeleton::{RigidPose, Skeleton};

    fn straight_chain(count: usize) -> Vec<ChainBone> {
        (0..count)
            .map(|i| ChainBone::new(BoneHandle(i as u32), Vec3::new(0.0, -(i as f32), 0.0), i == 0))
            .collect()
    }

    #[test]
    fn leaf_is_extrapolated_from_the_last_two_points() {
        let mut chain = straight_chain(2);
        insert_leaf_bone(&mut chain).unwrap();
        assert_eq!(chain.len(), 3);
        assert!(chain[2].is_dummy);
        assert_eq!(chain[2].bone, None);
        assert_eq!(chain[2].position, Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn single_point_cannot_grow_a_leaf() {
        let mut chain = straight_chain(1);
        assert_eq!(insert_leaf_bone(&mut chain), Err(ChainError::TooShort(1)));
        assert_eq!(make_chain_structure(&mut chain), Err(ChainError::TooShort(1)));
    }

    #[test]
    fn every_length_pads_to_whole_registers_with_one_leaf() {
        for real in 2..=13 {
            let mut chain = straight_chain(real);
            let structure = make_chain_structure(&mut chain).unwrap();
            let leaf = chain[real];
            let padding = structure.dummy_bone_count - 1;

            assert!(leaf.is_dummy);
            assert_eq!(leaf.position, Vec3::new(0.0, -(real as f32), 0.0));
            assert_eq!((real + 1 + padding) % LANES, 0, "real = {real}");
            assert!(padding < LANES);
            assert_eq!(structure.bone_count(), chain.len());
            assert_eq!(structure.actual_bone_count(), real);
            assert!(chain[real..].iter().all(|bone| bone.is_dummy));
            assert!(chain[..real].iter().all(|bone| !bone.is_dummy));
        }
    }

    #[test]
    fn padding_continues_the_extrapolated_line() {
        let mut chain = straight_chain(5);
        make_chain_structure(&mut chain).unwrap();
        let positions: Vec<f32> = chain.iter().map(|bone| bone.position.y).collect();
        assert_eq!(positions, vec![0.0, -1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0]);
    }

    #[test]
    fn branches_become_independent_chains_sharing_a_prefix() {
        let mut skeleton = Skeleton::new(RigidPose::IDENTITY);
        let root = skeleton.add_bone(None, Vec3::ZERO);
        let trunk = skeleton.add_bone(Some(root), Vec3::NEG_Y);
        let left = skeleton.add_chain(Some(trunk), &[Vec3::new(-1.0, -2.0, 0.0), Vec3::new(-1.0, -3.0, 0.0)]);
        let right = skeleton.add_bone(Some(trunk), Vec3::new(1.0, -2.0, 0.0));

        let chains = gather_chains(&skeleton, &[root]);
        let handles: Vec<Vec<BoneHandle>> = chains
            .iter()
            .map(|chain| chain.iter().filter_map(|bone| bone.bone).collect())
            .collect();
        assert_eq!(handles, vec![vec![root, trunk, left[0], left[1]], vec![root, trunk, right]]);
        assert!(chains.iter().all(|chain| chain[0].is_root && chain[1..].iter().all(|bone| !bone.is_root)));
    }

    #[test]
    fn each_child_of_a_root_starts_its_own_chain() {
        let mut skeleton = Skeleton::new(RigidPose::IDENTITY);
        let root = skeleton.add_bone(None, Vec3::ZERO);
        let a = skeleton.add_bone(Some(root), Vec3::X);
        let b = skeleton.add_bone(Some(root), Vec3::NEG_X);

        let topology = ChainTopology::build(&skeleton, &[root]);
        assert_eq!(topology.chains.len(), 2);
        assert_eq!(topology.chains[0][1].bone, Some(a));
        assert_eq!(topology.chains[1][1].bone, Some(b));
        assert_eq!(topology.actual_bone_count, 4);
        assert_eq!(topology.all_bone_count, 8);
        assert_eq!(topology.packed_bone_count(), 2);
    }

    #[test]
    fn childless_root_is_skipped_without_dropping_other_chains() {
        let mut skeleton = Skeleton::new(RigidPose::IDENTITY);
        let lonely = skeleton.add_bone(None, Vec3::ZERO);
        let root = skeleton.add_bone(None, Vec3::X);
        skeleton.add_chain(Some(root), &[Vec3::new(1.0, -1.0, 0.0), Vec3::new(1.0, -2.0, 0.0)]);

        let topology = ChainTopology::build(&skeleton, &[lonely, root]);
        assert_eq!(topology.chains.len(), 1);
        assert_eq!(topology.structures, vec![ChainStructure { packed_bone_count: 1, dummy_bone_count: 1 }]);
        assert_eq!(topology.chains[0][0].bone, Some(root));
    }
}
