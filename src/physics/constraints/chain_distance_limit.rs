use crate::physics::solver_state::SolverState;
use crate::utilities::vector::{self, Vector};
use crate::utilities::vector3_wide::Vector3Wide;
use std::simd::prelude::*;

/// Both points of a chain segment carry unit mass, so the generalized inverse mass of the pair is 2.
pub const PAIR_INVERSE_MASS: f32 = 2.0;

/// One-sided XPBD distance limit between every chain point and its successor.
///
/// The rest length of a segment is its length in the animated pose. Segments shorter than their rest length are
/// left alone; stretched segments are pulled back by moving the successor only, so chain roots never move and
/// corrections flow from root to tip. Previous positions are not touched, so the next Verlet step sees a correction
/// as velocity and the stretch gravity builds up each frame is cancelled instead of carried forward.
///
/// The four pairs that start in one register are solved together from the same pre-update state. Registers are
/// visited in order, so a register sees the corrections already applied to its first lane by its predecessor.
pub struct ChainDistanceLimitFunctions;

impl ChainDistanceLimitFunctions {
    /// `α̃ = compliance / dt²`.
    #[inline(always)]
    pub fn compliance_tilde(compliance: f32, delta_time: f32) -> Vector {
        Vector::splat(compliance / (delta_time * delta_time))
    }

    /// `Δλ = (C - α̃λ) / (w + α̃)`.
    #[inline(always)]
    pub fn compute_delta_lambda(
        constraint: Vector,
        lambda: Vector,
        inverse_mass: Vector,
        compliance_tilde: Vector,
    ) -> Vector {
        (constraint - compliance_tilde * lambda) / (inverse_mass + compliance_tilde)
    }

    /// Solves the four pairs starting in register `packed_index`.
    ///
    /// `next_index` is the following register of the same chain, or `None` for the chain's last register. In the
    /// last register the lane-3 pair has no successor in the chain and is never active.
    pub fn solve_register(
        state: &mut SolverState,
        packed_index: usize,
        next_index: Option<usize>,
        compliance_tilde: Vector,
    ) {
        let mut sim_current = state.sim_positions[packed_index];
        let anim_current = state.anim_positions[packed_index];
        let (mut sim_next, anim_next, next_free) = match next_index {
            Some(next) => (state.sim_positions[next], state.anim_positions[next], state.free_mask(next)),
            None => (sim_current, anim_current, Vector::splat(0.0)),
        };

        let rest_length = (Vector3Wide::shuffle_neighbor(&anim_current, &anim_next) - anim_current).length();
        let mut neighbor = Vector3Wide::shuffle_neighbor(&sim_current, &sim_next);
        let segment = neighbor - sim_current;
        let constraint = (segment.length() - rest_length).simd_max(Vector::splat(0.0));

        // Only successors that are free to move take part; roots and synthetic points stay where they are.
        let successor_free = vector::shuffle_neighbor(state.free_mask(packed_index), next_free);
        let active = constraint.simd_gt(Vector::splat(0.0)) & successor_free.simd_gt(Vector::splat(0.0));

        let lambda = state.lambdas[packed_index];
        let delta_lambda = vector::select(
            active,
            Self::compute_delta_lambda(constraint, lambda, Vector::splat(PAIR_INVERSE_MASS), compliance_tilde),
            Vector::splat(0.0),
        );
        state.lambdas[packed_index] = lambda + delta_lambda;

        neighbor -= segment.normalize() * delta_lambda;

        Vector3Wide::unshuffle_neighbor(&neighbor, &mut sim_current, &mut sim_next);
        state.sim_positions[packed_index] = sim_current;
        if let Some(next) = next_index {
            state.sim_positions[next] = sim_next;
        }
    }

    /// One pass over every chain.
    pub fn solve(state: &mut SolverState, compliance: f32, delta_time: f32) {
        let compliance_tilde = Self::compliance_tilde(compliance, delta_time);
        let ranges: Vec<_> = state.chain_ranges().collect();
        for range in ranges {
            for packed_index in range.clone() {
                let next_index = Some(packed_index + 1).filter(|next| range.contains(next));
                Self::solve_register(state, packed_index, next_index, compliance_tilde);
            }
        }
    }
}
