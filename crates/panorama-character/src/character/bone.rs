use glam::{EulerRot, Quat};
use log::{debug, warn};

use crate::{
    config::RigConfig,
    error::RigError,
    stage::scene::{BoneTarget, JointId, SceneHandle, WeakScene},
};

/// Eye joints of the character rig.
///
/// Inert until [`setup_bone`](Self::setup_bone) found the hierarchy.
#[derive(Debug, Default)]
pub struct BoneRig {
    scene: WeakScene,
    root: Option<JointId>,
    eyes: Vec<JointId>,
    last_target: Option<BoneTarget>,
}

impl BoneRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup_bone(&mut self, scene: &SceneHandle, config: &RigConfig) -> Result<(), RigError> {
        let (root, eyes) = {
            let scene = scene.borrow();
            if scene.is_disposed() {
                return Err(RigError::SceneGone);
            }
            let root = scene
                .joint_by_name(&config.root_joint)
                .ok_or_else(|| RigError::MissingJoint(config.root_joint.clone()))?;
            let mut eyes = Vec::new();
            for name in &config.eye_joints {
                match scene.joint_by_name(name) {
                    Some(eye) if scene.is_descendant(eye, root) => eyes.push(eye),
                    Some(_) => warn!("Joint {} is not below {}", name, config.root_joint),
                    None => warn!("Eye joint {} not found", name),
                }
            }
            (root, eyes)
        };
        if eyes.is_empty() {
            return Err(RigError::NoEyeJoints);
        }
        debug!("Rig ready with {} eye joints", eyes.len());
        self.scene = scene.downgrade();
        self.root = Some(root);
        self.eyes = eyes;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<JointId> {
        self.root
    }

    pub fn eyes(&self) -> &[JointId] {
        &self.eyes
    }

    /// Turn the eyes. Writing the same target again leaves the same pose.
    ///
    /// Returns whether anything was written.
    pub fn set_eye_target(&mut self, pitch: f32, yaw: f32, roll: f32) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(scene) = self.scene.upgrade() else {
            return false;
        };
        let target = BoneTarget { pitch, yaw, roll };
        let offset = Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll);
        let mut scene = scene.borrow_mut();
        scene.set_eye_target(target);
        for eye in &self.eyes {
            if let Some(joint) = scene.joint_mut(*eye) {
                joint.rotation = joint.rest_rotation * offset;
            }
        }
        self.last_target = Some(target);
        true
    }

    pub fn last_target(&self) -> Option<BoneTarget> {
        self.last_target
    }
}
