use crate::error::SettingsError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Material categories for the chain distance constraint, from stiffest to softest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceType {
    Concrete,
    Wood,
    #[default]
    Leather,
    Tendon,
    Rubber,
    Muscle,
    Fat,
}

impl ComplianceType {
    pub const ALL: [ComplianceType; 7] = [
        ComplianceType::Concrete,
        ComplianceType::Wood,
        ComplianceType::Leather,
        ComplianceType::Tendon,
        ComplianceType::Rubber,
        ComplianceType::Muscle,
        ComplianceType::Fat,
    ];

    /// XPBD compliance (inverse stiffness) of the material.
    /// Values follow https://blog.mmacklin.com/2016/10/12/xpbd-slides-and-stiffness/
    #[inline(always)]
    pub const fn compliance(self) -> f32 {
        match self {
            ComplianceType::Concrete => 0.000_000_000_04,
            ComplianceType::Wood => 0.000_000_000_16,
            ComplianceType::Leather => 0.000_000_001,
            ComplianceType::Tendon => 0.000_000_002,
            ComplianceType::Rubber => 0.000_000_1,
            ComplianceType::Muscle => 0.000_02,
            ComplianceType::Fat => 0.000_1,
        }
    }
}

/// Per-rig solver configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Material used for every chain distance constraint of the rig.
    pub stiffness: ComplianceType,
    /// Constraint passes per step.
    pub solver_iterations: u32,
    /// Frame rate whose period is used as the timestep on the first step and after hitches.
    pub base_frame_rate: f32,
    /// Acceleration applied to every free point, in world units per second squared.
    pub gravity: Vec3,
    /// Measured frame times at or above this many seconds are replaced by the nominal timestep.
    pub hitch_threshold: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            stiffness: ComplianceType::Leather,
            solver_iterations: 8,
            base_frame_rate: 60.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            hitch_threshold: 0.066,
        }
    }
}

impl PhysicsSettings {
    #[inline(always)]
    pub fn compliance(&self) -> f32 {
        self.stiffness.compliance()
    }

    /// Period of the base frame rate.
    #[inline(always)]
    pub fn nominal_delta_time(&self) -> f32 {
        1.0 / self.base_frame_rate
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.solver_iterations == 0 {
            return Err(SettingsError::NoSolverIterations);
        }
        if !self.base_frame_rate.is_finite() || self.base_frame_rate <= 0.0 {
            return Err(SettingsError::InvalidFrameRate(self.base_frame_rate));
        }
        if !self.hitch_threshold.is_finite() || self.hitch_threshold <= 0.0 {
            return Err(SettingsError::InvalidHitchThreshold(self.hitch_threshold));
        }
        if !self.gravity.is_finite() {
            return Err(SettingsError::NonFiniteGravity);
        }
        Ok(())
    }
}
