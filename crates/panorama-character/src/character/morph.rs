use std::collections::BTreeMap;

use log::debug;

use crate::{
    config::MorphSetConfig,
    stage::scene::{MeshId, SceneHandle, WeakScene},
};

/// Blend-shape weights a controller drives, resolved against the scene.
///
/// A target is resolved on every configured mesh that carries it. Names
/// resolving nowhere are dropped at setup, so writing them later is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MorphSet {
    scene: WeakScene,
    targets: BTreeMap<String, Vec<(MeshId, usize)>>,
}

impl MorphSet {
    pub fn setup(scene: &SceneHandle, config: &MorphSetConfig) -> Self {
        let mut targets: BTreeMap<String, Vec<(MeshId, usize)>> = BTreeMap::new();
        {
            let scene = scene.borrow();
            for mesh_name in &config.meshes {
                let Some(mesh) = scene
                    .get_mesh_by_name(mesh_name)
                    .and_then(|id| scene.mesh(id))
                else {
                    debug!("Morph mesh {} not found", mesh_name);
                    continue;
                };
                for target in &config.targets {
                    if let Some(index) = mesh.morph_target_index(target) {
                        targets
                            .entry(target.clone())
                            .or_default()
                            .push((mesh.id, index));
                    }
                }
            }
        }
        Self {
            scene: scene.downgrade(),
            targets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn has_target(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Set the influence of `name` on every mesh carrying it, clamped to
    /// `[0, 1]`. Returns whether anything was written.
    pub fn set_weight(&self, name: &str, weight: f32) -> bool {
        let Some(bindings) = self.targets.get(name) else {
            return false;
        };
        let Some(scene) = self.scene.upgrade() else {
            return false;
        };
        let weight = weight.clamp(0.0, 1.0);
        let mut scene = scene.borrow_mut();
        let mut written = false;
        for (mesh, index) in bindings {
            if let Some(target) = scene
                .mesh_mut(*mesh)
                .and_then(|mesh| mesh.morph_targets.get_mut(*index))
            {
                target.influence = weight;
                written = true;
            }
        }
        written
    }

    pub fn weight(&self, name: &str) -> Option<f32> {
        let (mesh, index) = *self.targets.get(name)?.first()?;
        let scene = self.scene.upgrade()?;
        let scene = scene.borrow();
        scene
            .mesh(mesh)
            .and_then(|mesh| mesh.morph_targets.get(index))
            .map(|target| target.influence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphKind {
    Body,
    Eye,
    Brow,
    Mouth,
}

impl MorphKind {
    pub fn name(self) -> &'static str {
        match self {
            MorphKind::Body => "body",
            MorphKind::Eye => "eye",
            MorphKind::Brow => "brow",
            MorphKind::Mouth => "mouth",
        }
    }
}

pub trait MorphController {
    fn kind(&self) -> MorphKind;

    /// Resolve the targets against `scene`. Returns how many resolved.
    fn setup_morph(&mut self, scene: &SceneHandle) -> usize;

    fn morph(&self) -> &MorphSet;
}

/// Target configured at `index`, if the set resolved it.
fn target_at<'a>(config: &'a MorphSetConfig, morph: &MorphSet, index: usize) -> Option<&'a str> {
    config
        .targets
        .get(index)
        .map(String::as_str)
        .filter(|name| morph.has_target(name))
}

macro_rules! morph_controller {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            config: MorphSetConfig,
            morph: MorphSet,
        }

        impl $name {
            pub fn new(config: MorphSetConfig) -> Self {
                Self {
                    config,
                    morph: MorphSet::default(),
                }
            }

            fn set(&self, index: usize, weight: f32) -> bool {
                target_at(&self.config, &self.morph, index)
                    .map(|name| self.morph.set_weight(name, weight))
                    .unwrap_or(false)
            }

            fn get(&self, index: usize) -> Option<f32> {
                target_at(&self.config, &self.morph, index).and_then(|name| self.morph.weight(name))
            }
        }

        impl MorphController for $name {
            fn kind(&self) -> MorphKind {
                $kind
            }

            fn setup_morph(&mut self, scene: &SceneHandle) -> usize {
                self.morph = MorphSet::setup(scene, &self.config);
                self.morph.len()
            }

            fn morph(&self) -> &MorphSet {
                &self.morph
            }
        }
    };
}

morph_controller!(CharacterBody, MorphKind::Body);
morph_controller!(CharacterEye, MorphKind::Eye);
morph_controller!(CharacterBrow, MorphKind::Brow);
morph_controller!(CharacterMouth, MorphKind::Mouth);

impl CharacterBody {
    pub fn set_breath(&self, weight: f32) -> bool {
        self.set(0, weight)
    }

    pub fn breath(&self) -> Option<f32> {
        self.get(0)
    }
}

impl CharacterEye {
    pub fn set_blink(&self, weight: f32) -> bool {
        self.set(0, weight)
    }

    pub fn set_blink_sides(&self, left: f32, right: f32) -> bool {
        let left = self.set(1, left);
        let right = self.set(2, right);
        left || right
    }

    pub fn blink(&self) -> Option<f32> {
        self.get(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowExpression {
    Angry,
    Sad,
    Surprised,
}

impl BrowExpression {
    pub const ALL: [BrowExpression; 3] = [
        BrowExpression::Angry,
        BrowExpression::Sad,
        BrowExpression::Surprised,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl CharacterBrow {
    pub fn set_expression(&self, expression: BrowExpression, weight: f32) -> bool {
        self.set(expression.index(), weight)
    }

    pub fn expression(&self, expression: BrowExpression) -> Option<f32> {
        self.get(expression.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vowel {
    A,
    I,
    U,
    E,
    O,
}

impl Vowel {
    pub const ALL: [Vowel; 5] = [Vowel::A, Vowel::I, Vowel::U, Vowel::E, Vowel::O];

    fn index(self) -> usize {
        self as usize
    }
}

impl CharacterMouth {
    /// Open the mouth on one vowel, closing the others.
    pub fn set_vowel(&self, vowel: Vowel, weight: f32) -> bool {
        for other in Vowel::ALL {
            if other != vowel {
                self.set(other.index(), 0.0);
            }
        }
        self.set(vowel.index(), weight)
    }

    pub fn close(&self) {
        for vowel in Vowel::ALL {
            self.set(vowel.index(), 0.0);
        }
    }

    pub fn vowel(&self, vowel: Vowel) -> Option<f32> {
        self.get(vowel.index())
    }
}
