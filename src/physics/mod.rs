pub mod chain_builder;
pub mod constraints;
pub mod handles;
pub mod pose_extraction;
pub mod pose_integrator;
pub mod settings;
pub mod simulation;
pub mod simulation_context;
pub mod skeleton;
pub mod solver_state;

pub use self::handles::BoneHandle;
pub use self::settings::{ComplianceType, PhysicsSettings};
pub use self::simulation::ChainSimulation;
pub use self::skeleton::{PoseStream, RigidPose, Skeleton, SkeletonHierarchy};
