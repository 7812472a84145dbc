//! Exchange of poses between the host skeleton and the packed solver arrays.

use crate::physics::skeleton::PoseStream;
use crate::physics::solver_state::SolverState;
use crate::utilities::bundle_indexing::BundleIndexing;
use crate::utilities::quaternion_wide::QuaternionWide;
use crate::utilities::vector::LANES;
use crate::utilities::vector3_wide::Vector3Wide;
use glam::{Quat, Vec3};

/// Reads the current animated world position of every real point from the host.
pub fn sample_animation_pose<S: PoseStream + ?Sized>(state: &mut SolverState, stream: &S) {
    for (point_index, bone) in state.bones.iter().enumerate() {
        if let Some(bone) = bone {
            let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
            state.anim_positions[bundle].write_slot(stream.bone_position(*bone), lane);
        }
    }
}

/// Snaps the simulated position of every chain root to the host's current position.
pub fn pin_fixed_positions<S: PoseStream + ?Sized>(state: &mut SolverState, stream: &S) {
    for (point_index, bone) in state.bones.iter().enumerate() {
        let (bundle, lane) = BundleIndexing::get_bundle_indices(point_index);
        if let Some(bone) = bone {
            if state.fixed_masks[bundle][lane] == 0.0 {
                state.sim_positions[bundle].write_slot(stream.bone_position(*bone), lane);
            }
        }
    }
}

/// Writes the simulated pose back to the host.
///
/// Every real point with a real successor is rotated by the shortest arc taking its host-side segment direction
/// onto its simulated segment direction. Roots receive only the rotation, the last real point of a chain only its
/// position, and every other real point both. Synthetic points are never written.
///
/// Host positions and rotations are read once, before any write. A bone shared by several chains of a branching
/// hierarchy is therefore rotated from the same host pose by each chain, and the last chain's result replaces the
/// earlier ones instead of compounding with them.
pub fn apply_simulation_result<S: PoseStream + ?Sized>(state: &SolverState, stream: &mut S) {
    let host_poses: Vec<Option<(Vec3, Quat)>> = state
        .bones
        .iter()
        .map(|bone| bone.map(|bone| (stream.bone_position(bone), stream.bone_rotation(bone))))
        .collect();
    let host_position = |point_index: usize| host_poses[point_index].map_or(Vec3::ZERO, |(position, _)| position);

    for range in state.chain_ranges() {
        let chain_end = range.end * LANES;
        for packed_index in range.clone() {
            let next_index = if packed_index + 1 < range.end { packed_index + 1 } else { packed_index };
            let sim_current = state.sim_positions[packed_index];
            let simulated = Vector3Wide::shuffle_neighbor(&sim_current, &state.sim_positions[next_index]) - sim_current;

            let base = packed_index * LANES;
            let has_segment: [bool; LANES] = std::array::from_fn(|lane| {
                let point_index = base + lane;
                point_index + 1 < chain_end
                    && host_poses[point_index].is_some()
                    && host_poses[point_index + 1].is_some()
            });

            let mut original = Vector3Wide::ZERO;
            for lane in (0..LANES).filter(|lane| has_segment[*lane]) {
                let point_index = base + lane;
                original.write_slot(host_position(point_index + 1) - host_position(point_index), lane);
            }
            let rotations = QuaternionWide::from_to_rotation(&original, &simulated);

            for lane in 0..LANES {
                let point_index = base + lane;
                let (Some(bone), Some((_, host_rotation))) = (state.bones[point_index], host_poses[point_index]) else {
                    continue;
                };
                if has_segment[lane] {
                    stream.set_bone_rotation(bone, rotations.read_slot(lane) * host_rotation);
                }
                if !state.is_root(point_index) {
                    stream.set_bone_position(bone, sim_current.read_slot(lane));
                }
            }
        }
    }
}
