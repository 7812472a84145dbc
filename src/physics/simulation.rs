use crate::error::Result;
use crate::physics::chain_builder::ChainTopology;
use crate::physics::constraints::ChainDistanceLimitFunctions;
use crate::physics::handles::BoneHandle;
use crate::physics::pose_extraction;
use crate::physics::pose_integrator;
use crate::physics::settings::PhysicsSettings;
use crate::physics::simulation_context::SimulationContext;
use crate::physics::skeleton::{PoseStream, SkeletonHierarchy};
use crate::physics::solver_state::SolverState;
use log::debug;

/// Orchestrates the per-step pipeline for every chain bound from one rig.
#[derive(Clone, Debug)]
pub struct ChainSimulation {
    state: SolverState,
    settings: PhysicsSettings,
    context: SimulationContext,
}

impl ChainSimulation {
    /// Builds the chains below `roots` and packs them for simulation.
    ///
    /// Fails only on invalid settings. Chains too short to simulate are logged and left out, so a rig whose every
    /// chain is rejected yields a simulation that steps without touching the host.
    pub fn new<H: SkeletonHierarchy + ?Sized>(
        hierarchy: &H,
        roots: &[BoneHandle],
        settings: PhysicsSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let topology = ChainTopology::build(hierarchy, roots);
        let state = SolverState::new(&topology);
        debug!(
            "chain simulation ready: {} chains, {} registers, {:?} compliance, {} iterations",
            state.chain_count(),
            state.packed_bone_count(),
            settings.stiffness,
            settings.solver_iterations
        );
        Ok(Self {
            state,
            context: SimulationContext::new(&settings),
            settings,
        })
    }

    /// Advances every chain by one host frame and writes the result back to the host.
    pub fn step<S: PoseStream + ?Sized>(&mut self, stream: &mut S) {
        self.context.update(stream.owner_pose(), stream.delta_time());

        pose_extraction::sample_animation_pose(&mut self.state, &*stream);
        pose_extraction::pin_fixed_positions(&mut self.state, &*stream);
        if self.context.is_first_update {
            pose_integrator::reset_simulation_pose(&mut self.state);
            pose_integrator::reset_velocity(&mut self.state);
            self.context.is_first_update = false;
        }

        self.integrate();
        self.solve();

        pose_extraction::apply_simulation_result(&self.state, stream);
    }

    /// Applies external forces and advances positions with Verlet integration.
    pub fn integrate(&mut self) {
        pose_integrator::apply_forces(&mut self.state, &self.context, &self.settings);
        pose_integrator::verlet_integrate(&mut self.state);
    }

    /// Resets the multipliers and runs the configured number of constraint iterations.
    pub fn solve(&mut self) {
        self.state.reset_lambdas();
        let compliance = self.settings.compliance();
        for _ in 0..self.settings.solver_iterations {
            ChainDistanceLimitFunctions::solve(&mut self.state, compliance, self.context.delta_time);
        }
    }

    /// Makes the next step behave like the first one: the chains snap to the animated pose with no velocity and the
    /// owner is treated as stationary. Use after teleporting the owner.
    pub fn reset(&mut self) {
        self.context.is_first_update = true;
    }

    #[inline(always)]
    pub fn state(&self) -> &SolverState {
        &self.state
    }

    /// Direct access to the packed arrays, for hosts that displace points outside of [`Self::step`].
    #[inline(always)]
    pub fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    #[inline(always)]
    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    #[inline(always)]
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FuwaError;
    use crate::error::SettingsError;
    use crate::physics::skeleton::{RigidPose, Skeleton};
    use glam::Vec3;

    fn rig() -> (Skeleton, BoneHandle) {
        let mut skeleton = Skeleton::new(RigidPose::IDENTITY);
        let bones = skeleton.add_chain(None, &[Vec3::ZERO, Vec3::NEG_Y, Vec3::NEG_Y * 2.0]);
        skeleton.set_delta_time(1.0 / 60.0);
        (skeleton, bones[0])
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let (skeleton, root) = rig();
        let settings = PhysicsSettings {
            solver_iterations: 0,
            ..Default::default()
        };
        let result = ChainSimulation::new(&skeleton, &[root], settings);
        assert!(matches!(result, Err(FuwaError::Settings(SettingsError::NoSolverIterations))));
    }

    #[test]
    fn first_step_clears_the_first_update_flag_and_reset_rearms_it() {
        let (mut skeleton, root) = rig();
        let mut simulation = ChainSimulation::new(&skeleton, &[root], PhysicsSettings::default()).unwrap();
        assert!(simulation.context().is_first_update);

        simulation.step(&mut skeleton);
        assert!(!simulation.context().is_first_update);

        simulation.reset();
        assert!(simulation.context().is_first_update);
    }

    #[test]
    fn first_step_starts_from_the_animated_pose() {
        let (mut skeleton, root) = rig();
        let mut simulation = ChainSimulation::new(
            &skeleton,
            &[root],
            PhysicsSettings {
                gravity: Vec3::ZERO,
                ..Default::default()
            },
        )
        .unwrap();

        simulation.step(&mut skeleton);

        let state = simulation.state();
        for point in 0..4 {
            assert_eq!(state.simulated_position(point), state.animated_position(point));
            assert_eq!(state.previous_position(point), state.animated_position(point));
        }
        assert!(state.lambdas.iter().all(|lambda| lambda.to_array() == [0.0; 4]));
    }

    #[test]
    fn rig_without_usable_chains_steps_without_writing() {
        let mut skeleton = Skeleton::new(RigidPose::IDENTITY);
        let lonely = skeleton.add_bone(None, Vec3::ONE);
        let before = skeleton.clone();

        let mut simulation = ChainSimulation::new(&skeleton, &[lonely], PhysicsSettings::default()).unwrap();
        simulation.step(&mut skeleton);

        assert_eq!(simulation.state().chain_count(), 0);
        assert_eq!(skeleton.bone_position(lonely), before.bone_position(lonely));
        assert_eq!(skeleton.bone_rotation(lonely), before.bone_rotation(lonely));
    }
}
