use crate::physics::handles::BoneHandle;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space position and orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for RigidPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidPose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    #[inline(always)]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Read access to the bone hierarchy, used once when a rig is bound.
pub trait SkeletonHierarchy {
    /// Direct children of `bone`, in hierarchy order.
    fn children(&self, bone: BoneHandle) -> &[BoneHandle];
    /// World-space position of `bone` in the bind pose.
    fn world_position(&self, bone: BoneHandle) -> Vec3;
}

/// Per-step view of the host pose. The simulation reads the animated pose from it and writes the corrected pose back.
pub trait PoseStream {
    /// Seconds elapsed since the previous step as measured by the host.
    fn delta_time(&self) -> f32;
    /// World pose of the object that owns the simulated chains.
    fn owner_pose(&self) -> RigidPose;
    fn bone_position(&self, bone: BoneHandle) -> Vec3;
    fn bone_rotation(&self, bone: BoneHandle) -> Quat;
    fn set_bone_position(&mut self, bone: BoneHandle, position: Vec3);
    fn set_bone_rotation(&mut self, bone: BoneHandle, rotation: Quat);
}

#[derive(Clone, Debug)]
struct SkeletonBone {
    children: Vec<BoneHandle>,
    position: Vec3,
    rotation: Quat,
}

/// A minimal in-memory host: a bone tree with world-space positions and rotations plus an owner pose.
///
/// Handles are dense indices handed out by [`Skeleton::add_bone`]; passing a handle from another skeleton panics.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<SkeletonBone>,
    owner: RigidPose,
    delta_time: f32,
}

impl Skeleton {
    pub fn new(owner: RigidPose) -> Self {
        Self {
            bones: Vec::new(),
            owner,
            delta_time: 0.0,
        }
    }

    /// Adds a bone at a world position with identity rotation and returns its handle.
    pub fn add_bone(&mut self, parent: Option<BoneHandle>, position: Vec3) -> BoneHandle {
        let handle = BoneHandle(self.bones.len() as u32);
        self.bones.push(SkeletonBone {
            children: Vec::new(),
            position,
            rotation: Quat::IDENTITY,
        });
        if let Some(parent) = parent {
            self.bones[parent.index()].children.push(handle);
        }
        handle
    }

    /// Adds a straight run of bones, each parented to the previous one, and returns their handles.
    pub fn add_chain(&mut self, parent: Option<BoneHandle>, positions: &[Vec3]) -> Vec<BoneHandle> {
        let mut handles = Vec::with_capacity(positions.len());
        let mut parent = parent;
        for &position in positions {
            let handle = self.add_bone(parent, position);
            handles.push(handle);
            parent = Some(handle);
        }
        handles
    }

    #[inline(always)]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn set_owner(&mut self, owner: RigidPose) {
        self.owner = owner;
    }

    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
    }
}

impl SkeletonHierarchy for Skeleton {
    fn children(&self, bone: BoneHandle) -> &[BoneHandle] {
        &self.bones[bone.index()].children
    }

    fn world_position(&self, bone: BoneHandle) -> Vec3 {
        self.bones[bone.index()].position
    }
}

impl PoseStream for Skeleton {
    fn delta_time(&self) -> f32 {
        self.delta_time
    }

    fn owner_pose(&self) -> RigidPose {
        self.owner
    }

    fn bone_position(&self, bone: BoneHandle) -> Vec3 {
        self.bones[bone.index()].position
    }

    fn bone_rotation(&self, bone: BoneHandle) -> Quat {
        self.bones[bone.index()].rotation
    }

    fn set_bone_position(&mut self, bone: BoneHandle, position: Vec3) {
        self.bones[bone.index()].position = position;
    }

    fn set_bone_rotation(&mut self, bone: BoneHandle, rotation: Quat) {
        self.bones[bone.index()].rotation = rotation;
    }
}
