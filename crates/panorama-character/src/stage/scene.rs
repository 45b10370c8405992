use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use glam::{Quat, Vec3};
use log::debug;
use panorama_asset::{material::MaterialGraph, scene::CharacterAsset};

use super::{
    light::{LightId, SceneLight},
    shadow::ShadowCaster,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(usize);

/// Orientation the eyes of the rig are turned to, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneTarget {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// The last bone target written, and the frame it was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTarget {
    pub target: BoneTarget,
    pub frame: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MorphTarget {
    pub name: String,
    pub influence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub width: f32,
    pub color: Vec3,
}

#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub id: MeshId,
    pub name: String,
    pub vertex_count: usize,
    pub enabled: bool,
    pub rendering_group: u8,
    pub has_vertex_alpha: bool,
    pub receive_shadows: bool,
    pub outline: Option<Outline>,
    pub material: Option<MaterialGraph>,
    pub morph_targets: Vec<MorphTarget>,
}

impl SceneMesh {
    fn new(id: MeshId, name: String) -> Self {
        Self {
            id,
            name,
            vertex_count: 0,
            enabled: true,
            rendering_group: 0,
            has_vertex_alpha: false,
            receive_shadows: false,
            outline: None,
            material: None,
            morph_targets: Vec::new(),
        }
    }

    pub fn morph_target_index(&self, name: &str) -> Option<usize> {
        self.morph_targets
            .iter()
            .position(|target| target.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct SceneJoint {
    pub id: JointId,
    pub name: String,
    pub parent: Option<JointId>,
    pub rest_rotation: Quat,
    /// Local rotation used for posing. Starts at the rest rotation.
    pub rotation: Quat,
}

/// Everything the renderer draws, owned by the frame thread.
#[derive(Debug, Default)]
pub struct Scene {
    frame: u64,
    disposed: bool,
    next_mesh: u32,
    meshes: BTreeMap<MeshId, SceneMesh>,
    joints: Vec<SceneJoint>,
    lights: Vec<SceneLight>,
    shadow_generators: Vec<ShadowCaster>,
    eye_target: Option<EyeTarget>,
    eye_target_writes: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn begin_frame(&mut self, index: u64) {
        self.frame = index;
    }

    pub fn add_mesh(&mut self, name: &str) -> MeshId {
        let id = MeshId(self.next_mesh);
        self.next_mesh += 1;
        self.meshes.insert(id, SceneMesh::new(id, name.to_string()));
        id
    }

    /// Add the parts and joints of a loaded character, returning the new
    /// meshes in part order.
    pub fn append(&mut self, asset: &CharacterAsset) -> Vec<MeshId> {
        let mut added = Vec::with_capacity(asset.parts.len());
        for part in &asset.parts {
            let id = self.add_mesh(&part.name);
            if let Some(mesh) = self.meshes.get_mut(&id) {
                mesh.vertex_count = part.vertex_count;
                mesh.has_vertex_alpha = part.vertex_alpha;
                mesh.morph_targets = part
                    .target_names
                    .iter()
                    .zip(&part.weights)
                    .map(|(name, weight)| MorphTarget {
                        name: name.clone(),
                        influence: *weight,
                    })
                    .collect();
            }
            added.push(id);
        }

        let joint_base = self.joints.len();
        for (index, joint) in asset.joints.iter().enumerate() {
            self.joints.push(SceneJoint {
                id: JointId(joint_base + index),
                name: joint.name.clone(),
                parent: joint.parent.map(|parent| JointId(joint_base + parent)),
                rest_rotation: joint.rest_rotation,
                rotation: joint.rest_rotation,
            });
        }
        debug!(
            "Appended bundle {}: {} meshes, {} joints",
            asset.bundle.short(),
            added.len(),
            asset.joints.len()
        );
        added
    }

    pub fn meshes(&self) -> impl Iterator<Item = &SceneMesh> {
        self.meshes.values()
    }

    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(&id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut SceneMesh> {
        self.meshes.get_mut(&id)
    }

    /// First mesh with the given name, in creation order.
    pub fn get_mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.meshes
            .values()
            .find(|mesh| mesh.name == name)
            .map(|mesh| mesh.id)
    }

    pub fn remove_mesh(&mut self, id: MeshId) -> Option<SceneMesh> {
        let mesh = self.meshes.remove(&id)?;
        for generator in &mut self.shadow_generators {
            generator.remove_shadow_caster(id);
        }
        Some(mesh)
    }

    pub fn set_meshes_enabled(&mut self, enabled: bool) {
        for mesh in self.meshes.values_mut() {
            mesh.enabled = enabled;
        }
    }

    pub fn joints(&self) -> &[SceneJoint] {
        &self.joints
    }

    pub fn joint(&self, id: JointId) -> Option<&SceneJoint> {
        self.joints.get(id.0)
    }

    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut SceneJoint> {
        self.joints.get_mut(id.0)
    }

    pub fn joint_by_name(&self, name: &str) -> Option<JointId> {
        self.joints
            .iter()
            .find(|joint| joint.name == name)
            .map(|joint| joint.id)
    }

    /// Whether `joint` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, joint: JointId, ancestor: JointId) -> bool {
        let mut current = self.joint(joint).and_then(|joint| joint.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.joint(id).and_then(|joint| joint.parent);
        }
        false
    }

    pub fn add_light(&mut self, light: SceneLight) -> LightId {
        let id = LightId(self.lights.len());
        self.lights.push(light);
        id
    }

    pub fn light(&self, id: LightId) -> Option<&SceneLight> {
        self.lights.get(id.0)
    }

    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    pub fn add_shadow_generator(&mut self, generator: ShadowCaster) -> usize {
        self.shadow_generators.push(generator);
        self.shadow_generators.len() - 1
    }

    pub fn shadow_generators(&self) -> &[ShadowCaster] {
        &self.shadow_generators
    }

    pub fn shadow_generator_for(&self, mesh: MeshId) -> Option<&ShadowCaster> {
        self.shadow_generators
            .iter()
            .find(|generator| generator.render_list().contains(&mesh))
    }

    /// Record the eye target for the current frame.
    pub fn set_eye_target(&mut self, target: BoneTarget) {
        self.eye_target = Some(EyeTarget {
            target,
            frame: self.frame,
        });
        self.eye_target_writes += 1;
    }

    pub fn eye_target(&self) -> Option<EyeTarget> {
        self.eye_target
    }

    /// Number of eye target writes since the scene was created.
    pub fn eye_target_writes(&self) -> u64 {
        self.eye_target_writes
    }

    /// Release everything. Weak handles stop upgrading from here on.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!(
            "Disposing scene with {} meshes, {} shadow generators",
            self.meshes.len(),
            self.shadow_generators.len()
        );
        self.disposed = true;
        self.meshes.clear();
        self.joints.clear();
        self.lights.clear();
        self.shadow_generators.clear();
        self.eye_target = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Shared owner of the scene on the frame thread.
#[derive(Debug, Clone, Default)]
pub struct SceneHandle(Rc<RefCell<Scene>>);

impl SceneHandle {
    pub fn new(scene: Scene) -> Self {
        Self(Rc::new(RefCell::new(scene)))
    }

    pub fn borrow(&self) -> Ref<'_, Scene> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Scene> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> WeakScene {
        WeakScene(Rc::downgrade(&self.0))
    }
}

/// Scene reference held by components that outlive a frame.
#[derive(Debug, Clone, Default)]
pub struct WeakScene(Weak<RefCell<Scene>>);

impl WeakScene {
    /// The scene, if it is still alive and not disposed.
    pub fn upgrade(&self) -> Option<SceneHandle> {
        let scene = self.0.upgrade().map(SceneHandle)?;
        if scene.borrow().is_disposed() {
            return None;
        }
        Some(scene)
    }
}
