#![feature(portable_simd)]

//! Secondary-motion simulation for bone chains such as hair, tails and cloth strips.
//!
//! Chains are packed four points to a SIMD register, integrated with position Verlet and held to their animated
//! segment lengths by a one-sided XPBD distance constraint. See [`ChainSimulation`] for the per-step pipeline.

pub mod error;
pub mod physics;
pub mod utilities;

pub use crate::error::{ChainError, FuwaError, Result, SettingsError};
pub use crate::physics::{
    BoneHandle, ChainSimulation, ComplianceType, PhysicsSettings, PoseStream, RigidPose, Skeleton, SkeletonHierarchy,
};
