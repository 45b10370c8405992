use std::{collections::HashMap, sync::Arc};

use glam::Quat;

use crate::{index::BundleIndex, loader::AssetLoadParams};

use super::{node::NodeAsset, skin::SkinAsset};

#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub name: Option<String>,
    pub nodes: Vec<NodeAsset>,
    pub skins: Vec<Arc<SkinAsset>>,
}

/// A renderable part of the character, one per GLTF primitive.
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub name: String,
    pub node: usize,
    pub primitive: usize,
    pub vertex_count: usize,
    pub vertex_alpha: bool,
    pub target_names: Vec<String>,
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct JointAsset {
    pub node: usize,
    pub name: String,
    /// Position of the closest ancestor joint in the joint list.
    pub parent: Option<usize>,
    pub rest_rotation: Quat,
}

/// The loaded mesh graph of a character bundle.
#[derive(Debug, Clone)]
pub struct CharacterAsset {
    pub bundle: BundleIndex,
    pub scene: SceneAsset,
    pub parts: Vec<MeshPart>,
    pub joints: Vec<JointAsset>,
}

impl CharacterAsset {
    pub fn new(bundle: BundleIndex, scene: SceneAsset, params: &AssetLoadParams) -> Self {
        let parts = collect_parts(&scene, params);
        let joints = collect_joints(&scene);
        Self {
            bundle,
            scene,
            parts,
            joints,
        }
    }

    pub fn part(&self, name: &str) -> Option<&MeshPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn joint(&self, name: &str) -> Option<&JointAsset> {
        self.joints.iter().find(|joint| joint.name == name)
    }
}

fn node_display_name(node: &NodeAsset) -> String {
    node.name
        .clone()
        .or_else(|| node.mesh.as_ref().and_then(|mesh| mesh.name.clone()))
        .unwrap_or_else(|| format!("node{}", node.index))
}

fn collect_parts(scene: &SceneAsset, params: &AssetLoadParams) -> Vec<MeshPart> {
    let mut parts = Vec::new();
    for root in &scene.nodes {
        root.walk(&mut |node, _parent| {
            let Some(mesh) = &node.mesh else {
                return;
            };
            let base_name = node_display_name(node);
            let split = mesh.primitives.len() > 1;
            for (index, primitive) in mesh.primitives.iter().enumerate() {
                let name = if split {
                    params.primitive_name(&base_name, index)
                } else {
                    base_name.clone()
                };
                let target_names = (0..primitive.morph_target_count)
                    .map(|target| {
                        mesh.target_names
                            .get(target)
                            .cloned()
                            .unwrap_or_else(|| format!("target{}", target))
                    })
                    .collect();
                let weights = (0..primitive.morph_target_count)
                    .map(|target| mesh.default_weight(target))
                    .collect();
                parts.push(MeshPart {
                    name,
                    node: node.index,
                    primitive: index,
                    vertex_count: primitive.vertex_count,
                    vertex_alpha: primitive.vertex_alpha,
                    target_names,
                    weights,
                });
            }
        });
    }
    parts
}

fn collect_joints(scene: &SceneAsset) -> Vec<JointAsset> {
    let joint_nodes: Vec<usize> = scene
        .skins
        .iter()
        .flat_map(|skin| skin.joint_nodes.iter().copied())
        .collect();

    let mut joints: Vec<JointAsset> = Vec::new();
    // node index -> closest joint at or above the node
    let mut closest_joint: HashMap<usize, Option<usize>> = HashMap::new();
    for root in &scene.nodes {
        root.walk(&mut |node, parent| {
            let inherited = parent
                .and_then(|parent| closest_joint.get(&parent.index).copied())
                .flatten();
            if joint_nodes.contains(&node.index)
                && !joints.iter().any(|joint| joint.node == node.index)
            {
                joints.push(JointAsset {
                    node: node.index,
                    name: node_display_name(node),
                    parent: inherited,
                    rest_rotation: node.rest_rotation(),
                });
                closest_joint.insert(node.index, Some(joints.len() - 1));
            } else {
                closest_joint.insert(node.index, inherited);
            }
        });
    }
    joints
}
