use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::index::AssetIndex;

use super::{mesh::MeshAsset, skin::SkinAsset};

#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<DecomposedTransform> for Mat4 {
    fn from(value: DecomposedTransform) -> Self {
        Mat4::from_scale_rotation_translation(value.scale, value.rotation, value.translation)
    }
}

impl From<NodeTransform> for DecomposedTransform {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                DecomposedTransform {
                    translation,
                    rotation,
                    scale,
                }
            }
            NodeTransform::Decomposed(decomposed) => decomposed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeAsset {
    pub id: AssetIndex,
    /// Index of the node inside the GLTF document.
    pub index: usize,
    pub name: Option<String>,
    pub children: Vec<NodeAsset>,
    pub skin: Option<Arc<SkinAsset>>,
    pub transform: NodeTransform,
    pub mesh: Option<MeshAsset>,
}

impl NodeAsset {
    /// Visit this node and its descendants depth-first, parents before
    /// children. The visitor receives the parent of each node.
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a NodeAsset, Option<&'a NodeAsset>)) {
        fn walk_inner<'a>(
            node: &'a NodeAsset,
            parent: Option<&'a NodeAsset>,
            visitor: &mut impl FnMut(&'a NodeAsset, Option<&'a NodeAsset>),
        ) {
            visitor(node, parent);
            for child in &node.children {
                walk_inner(child, Some(node), visitor);
            }
        }
        walk_inner(self, None, visitor)
    }

    pub fn rest_rotation(&self) -> Quat {
        DecomposedTransform::from(self.transform.clone()).rotation
    }
}
