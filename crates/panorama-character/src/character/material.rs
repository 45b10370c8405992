use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use glam::Vec3;
use log::{debug, warn};
use panorama_asset::{loader::material::parse_material, material::MaterialGraph};

use crate::{
    config::{CharacterConfig, PartBinding},
    dispatch::{take_finished, Dispatcher, Pending},
    error::{BindError, LoadError},
    source::AssetSource,
    stage::{
        light::LightId,
        scene::{MeshId, Outline, Scene, WeakScene},
        shadow::ShadowCaster,
    },
};

/// Scalar input of the character materials overridden after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialParameter {
    DiffuseCut,
    ShadowIntensity,
    RimIntensity,
}

impl MaterialParameter {
    pub const ALL: [MaterialParameter; 3] = [
        MaterialParameter::DiffuseCut,
        MaterialParameter::ShadowIntensity,
        MaterialParameter::RimIntensity,
    ];

    pub fn name(self) -> &'static str {
        self.keys()[0]
    }

    /// Input block names carrying the parameter. The published shadow
    /// materials spell it `shadowItensity`.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            MaterialParameter::DiffuseCut => &["diffuseCut"],
            MaterialParameter::ShadowIntensity => &["shadowIntensity", "shadowItensity"],
            MaterialParameter::RimIntensity => &["rimIntensity"],
        }
    }

    pub fn value(self) -> f32 {
        match self {
            MaterialParameter::DiffuseCut => 0.21,
            MaterialParameter::ShadowIntensity => 0.87,
            MaterialParameter::RimIntensity => 0.08,
        }
    }

    /// Write the value to every matching input of `graph`. Returns whether
    /// the graph had one.
    pub fn apply(self, graph: &mut MaterialGraph) -> bool {
        let mut applied = false;
        for key in self.keys() {
            applied |= graph.set_scalar(key, self.value());
        }
        applied
    }
}

/// A part to dress: which description, and the mesh if the bundle has it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSpec {
    pub part_name: String,
    pub description_path: String,
    pub target_mesh: Option<MeshId>,
}

impl MaterialSpec {
    pub fn resolve(binding: &PartBinding, config: &CharacterConfig, scene: &Scene) -> Self {
        Self {
            part_name: binding.part.clone(),
            description_path: config.asset_path(&binding.description),
            target_mesh: scene.get_mesh_by_name(&binding.mesh),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// No mesh to dress, nothing happened.
    Skipped,
    Pending,
}

#[derive(Debug, Clone)]
pub enum BindEvent {
    Bound {
        part: String,
        mesh: MeshId,
        /// Parameters the graph had and that were overridden.
        parameters: Vec<MaterialParameter>,
    },
    Failed {
        part: String,
        error: BindError,
    },
    /// The scene or the mesh went away while the description was loading.
    Discarded {
        part: String,
    },
}

struct PendingBind {
    part: String,
    mesh: MeshId,
    graph: Pending<Result<MaterialGraph, LoadError>>,
}

/// Dresses character parts with node materials, outlines and shadows.
pub struct MaterialBinder {
    scene: WeakScene,
    light: LightId,
    source: Arc<dyn AssetSource>,
    dispatcher: Dispatcher,
    config: Arc<CharacterConfig>,
    pending: Vec<PendingBind>,
}

impl Debug for MaterialBinder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialBinder")
            .field("light", &self.light)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl MaterialBinder {
    pub fn new(
        scene: WeakScene,
        light: LightId,
        source: Arc<dyn AssetSource>,
        dispatcher: Dispatcher,
        config: Arc<CharacterConfig>,
    ) -> Self {
        Self {
            scene,
            light,
            source,
            dispatcher,
            config,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn bind(&mut self, spec: &MaterialSpec) -> BindOutcome {
        let Some(mesh_id) = spec.target_mesh else {
            debug!("No mesh for part {}, skipped", spec.part_name);
            return BindOutcome::Skipped;
        };
        let Some(scene) = self.scene.upgrade() else {
            return BindOutcome::Skipped;
        };
        {
            let mut scene = scene.borrow_mut();
            let Some(mesh) = scene.mesh_mut(mesh_id) else {
                debug!("Mesh of part {} is gone, skipped", spec.part_name);
                return BindOutcome::Skipped;
            };
            mesh.rendering_group = self.config.rendering_group;
        }

        let fetch = self.source.fetch(&spec.description_path, None);
        let graph = self.dispatcher.spawn(async move {
            let data = fetch.await?;
            let graph = parse_material(&data)?;
            Ok::<MaterialGraph, LoadError>(graph)
        });
        self.pending.push(PendingBind {
            part: spec.part_name.clone(),
            mesh: mesh_id,
            graph,
        });
        BindOutcome::Pending
    }

    /// Apply finished descriptions to their meshes.
    pub fn poll(&mut self) -> Vec<BindEvent> {
        take_finished(&mut self.pending, |bind| &mut bind.graph)
            .into_iter()
            .map(|(bind, result)| {
                let result = result.map_err(|_| LoadError::Canceled).and_then(|graph| graph);
                self.complete(bind, result)
            })
            .collect()
    }

    fn complete(&self, bind: PendingBind, result: Result<MaterialGraph, LoadError>) -> BindEvent {
        let PendingBind { part, mesh, .. } = bind;
        let Some(scene) = self.scene.upgrade() else {
            debug!("Scene gone before material of {} arrived", part);
            return BindEvent::Discarded { part };
        };
        let mut graph = match result {
            Ok(graph) => graph,
            Err(error) => {
                warn!("Material of part {} failed: {}", part, error);
                return BindEvent::Failed {
                    part,
                    error: BindError::Load(error),
                };
            }
        };
        let mut scene = scene.borrow_mut();
        if scene.mesh(mesh).is_none() {
            debug!("Mesh of part {} removed before its material arrived", part);
            return BindEvent::Discarded { part };
        }

        let parameters: Vec<MaterialParameter> = MaterialParameter::ALL
            .into_iter()
            .filter(|parameter| parameter.apply(&mut graph))
            .collect();
        // Not frozen: morph targets need the graph re-evaluated every frame.
        if let Some(target) = scene.mesh_mut(mesh) {
            target.outline = Some(Outline {
                width: self.config.outline.width,
                color: Vec3::from_array(self.config.outline.color),
            });
            target.has_vertex_alpha = false;
            target.material = Some(graph);
        }
        if scene.shadow_generator_for(mesh).is_none() {
            let mut caster = ShadowCaster::from_params(&self.config.shadow, self.light);
            caster.add_shadow_caster(mesh);
            scene.add_shadow_generator(caster);
        }
        if let Some(target) = scene.mesh_mut(mesh) {
            target.receive_shadows = true;
        }
        debug!("Bound material of part {} ({:?})", part, parameters);
        BindEvent::Bound {
            part,
            mesh,
            parameters,
        }
    }
}
