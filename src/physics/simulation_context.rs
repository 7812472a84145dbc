use crate::physics::settings::PhysicsSettings;
use crate::physics::skeleton::RigidPose;
use crate::utilities::transform_wide::TransformWide;
use log::trace;

/// Per-step execution state supplied by the host: timestep and the owner's pose now and one step ago.
#[derive(Clone, Copy, Debug)]
pub struct SimulationContext {
    /// Set until the first step has run. The first step uses the nominal timestep and treats the owner as stationary.
    pub is_first_update: bool,
    pub base_frame_rate: f32,
    pub hitch_threshold: f32,
    pub delta_time: f32,
    /// `delta_time * base_frame_rate`; 1.0 when running exactly at the base frame rate.
    pub delta_time_factor: f32,
    pub prev_owner_transform: TransformWide,
    pub owner_transform: TransformWide,
}

impl SimulationContext {
    pub fn new(settings: &PhysicsSettings) -> Self {
        let owner = TransformWide::from_rotation_translation(glam::Quat::IDENTITY, glam::Vec3::ZERO);
        Self {
            is_first_update: true,
            base_frame_rate: settings.base_frame_rate,
            hitch_threshold: settings.hitch_threshold,
            delta_time: settings.nominal_delta_time(),
            delta_time_factor: 1.0,
            prev_owner_transform: owner,
            owner_transform: owner,
        }
    }

    #[inline(always)]
    pub fn nominal_delta_time(&self) -> f32 {
        1.0 / self.base_frame_rate
    }

    /// Advances the context to a new step.
    ///
    /// The first step always uses the nominal timestep, since frame timing right after start-up is unreliable, and
    /// starts with no owner motion. Later steps whose measured time reaches the hitch threshold fall back to the
    /// nominal timestep as well.
    pub fn update(&mut self, owner: RigidPose, measured_delta_time: f32) {
        let owner = TransformWide::from_rotation_translation(owner.orientation, owner.position);
        if self.is_first_update {
            self.delta_time = self.nominal_delta_time();
            self.prev_owner_transform = owner;
        } else {
            self.delta_time = if measured_delta_time >= self.hitch_threshold || !(measured_delta_time > 0.0) {
                trace!("substituting nominal timestep for measured {measured_delta_time}s");
                self.nominal_delta_time()
            } else {
                measured_delta_time
            };
            self.prev_owner_transform = self.owner_transform;
        }
        self.owner_transform = owner;
        self.delta_time_factor = self.delta_time * self.base_frame_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};

    #[test]
    fn first_update_uses_nominal_timestep_and_no_owner_motion() {
        let mut context = SimulationContext::new(&PhysicsSettings::default());
        let owner = RigidPose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.3));
        context.update(owner, 0.5);

        assert!(context.is_first_update);
        assert_relative_eq!(context.delta_time, 1.0 / 60.0);
        assert_relative_eq!(context.delta_time_factor, 1.0);
        assert_eq!(context.prev_owner_transform, context.owner_transform);
    }

    #[test]
    fn later_updates_track_the_owner_and_clamp_hitches() {
        let mut context = SimulationContext::new(&PhysicsSettings::default());
        context.update(RigidPose::IDENTITY, 0.0);
        context.is_first_update = false;

        let moved = RigidPose::new(Vec3::X, Quat::IDENTITY);
        context.update(moved, 0.02);
        assert_relative_eq!(context.delta_time, 0.02);
        assert_relative_eq!(context.delta_time_factor, 1.2, epsilon = 1e-6);
        assert_eq!(context.prev_owner_transform.translation.read_slot(0), Vec3::ZERO);
        assert_eq!(context.owner_transform.translation.read_slot(0), Vec3::X);

        context.update(moved, 0.25);
        assert_relative_eq!(context.delta_time, 1.0 / 60.0);

        context.update(moved, 0.0);
        assert_relative_eq!(context.delta_time, 1.0 / 60.0);
    }
}
