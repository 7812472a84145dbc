//! External forces and Verlet integration over the packed point arrays.
//!
//! Every update is multiplied by the register's free mask, so chain roots stay pinned to the animated pose and
//! synthetic lanes stay at their build-time placement.

use crate::physics::settings::PhysicsSettings;
use crate::physics::simulation_context::SimulationContext;
use crate::physics::solver_state::SolverState;
use crate::utilities::quaternion_wide::QuaternionWide;
use crate::utilities::transform_wide::TransformWide;
use crate::utilities::vector::Vector;
use crate::utilities::vector3_wide::Vector3Wide;

/// Fraction of the owner's linear displacement fed back into the chains each step.
pub const LINEAR_VELOCITY_DAMPING: f32 = 0.98;
/// Fraction of the owner's rotation fed back into the chains each step.
pub const ANGULAR_VELOCITY_DAMPING: f32 = 0.4;

/// Copies the animated pose into the simulated pose.
pub fn reset_simulation_pose(state: &mut SolverState) {
    state.sim_positions.copy_from_slice(&state.anim_positions);
}

/// Zeroes every Verlet velocity by making the previous pose equal the current one.
pub fn reset_velocity(state: &mut SolverState) {
    state.prev_sim_positions.copy_from_slice(&state.sim_positions);
}

/// Applies gravity and the inertial response to the owner's motion since the previous step.
///
/// The inertial term moves free points against the owner's motion expressed in the owner's current frame: the
/// owner's previous position and the rotation from its current to its previous orientation, applied to each
/// point's previous position about the owner's current origin. Each part is scaled by a fixed per-step fraction
/// independent of the timestep.
pub fn apply_forces(state: &mut SolverState, context: &SimulationContext, settings: &PhysicsSettings) {
    let delta_time = Vector::splat(context.delta_time);
    let gravity = Vector3Wide::broadcast(settings.gravity) * (delta_time * delta_time);

    let owner = &context.owner_transform;
    let linear = TransformWide::inverse_transform_position(owner, &context.prev_owner_transform.translation)
        * Vector::splat(LINEAR_VELOCITY_DAMPING);
    let angular = TransformWide::inverse_transform_rotation(owner, &context.prev_owner_transform.rotation);
    let angular_damping = Vector::splat(ANGULAR_VELOCITY_DAMPING);

    for packed_index in 0..state.packed_bone_count() {
        let free = state.free_mask(packed_index);
        let relative = state.prev_sim_positions[packed_index] - owner.translation;
        let swept = QuaternionWide::transform(&relative, &angular) - relative;

        let displacement = gravity + linear + swept * angular_damping;
        state.sim_positions[packed_index] += displacement * free;
    }
}

/// Position Verlet step: `next = current + (current - previous)` for free lanes, then `previous = current`.
pub fn verlet_integrate(state: &mut SolverState) {
    for packed_index in 0..state.packed_bone_count() {
        let free = state.free_mask(packed_index);
        let current = state.sim_positions[packed_index];
        let velocity = current - state.prev_sim_positions[packed_index];

        state.sim_positions[packed_index] = current + velocity * free;
        state.prev_sim_positions[packed_index] = current;
    }
}
