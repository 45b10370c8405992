use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::Dimensions, scene::Transform, Document, Gltf, Mesh, Node, Primitive, Scene, Semantic,
    Skin,
};
use log::{debug, warn};

use crate::{
    index::{AssetIndex, BundleAssetType, BundleIndex},
    mesh::{MeshAsset, PrimitiveAsset},
    node::{DecomposedTransform, NodeAsset, NodeTransform},
    scene::{CharacterAsset, SceneAsset},
    skin::SkinAsset,
};

use super::{strip_shared_prefix, AssetLoadParams};

#[derive(Debug)]
pub enum GltfLoaderError {
    Gltf(gltf::Error),
    NoScene,
    MissingPositions(String),
}

impl Display for GltfLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoaderError::Gltf(error) => Display::fmt(error, f),
            GltfLoaderError::NoScene => write!(f, "Bundle contains no scene"),
            GltfLoaderError::MissingPositions(mesh) => {
                write!(f, "Primitive of mesh {} has no POSITION attribute", mesh)
            }
        }
    }
}

impl From<gltf::Error> for GltfLoaderError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

impl Error for GltfLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GltfLoaderError::Gltf(error) => Some(error),
            _ => None,
        }
    }
}

struct GltfDocumentLoader<'a> {
    document: &'a Document,
    bundle_index: BundleIndex,
    params: &'a AssetLoadParams,
    skin_cache: HashMap<usize, Arc<SkinAsset>>,
}

type GltfLoadResult<T> = Result<T, GltfLoaderError>;

impl<'a> GltfDocumentLoader<'a> {
    fn new(document: &'a Document, bundle_index: BundleIndex, params: &'a AssetLoadParams) -> Self {
        Self {
            document,
            bundle_index,
            params,
            skin_cache: HashMap::new(),
        }
    }

    fn index(&self, asset_type: BundleAssetType, index: usize) -> AssetIndex {
        AssetIndex::BundleTypeIndex(self.bundle_index.clone(), asset_type, index)
    }

    fn load_primitive(mesh_name: &str, primitive: Primitive) -> GltfLoadResult<PrimitiveAsset> {
        let vertex_count = primitive
            .get(&Semantic::Positions)
            .map(|accessor| accessor.count())
            .ok_or_else(|| GltfLoaderError::MissingPositions(mesh_name.to_string()))?;
        let vertex_alpha = primitive
            .get(&Semantic::Colors(0))
            .map(|accessor| accessor.dimensions() == Dimensions::Vec4)
            .unwrap_or(false);
        Ok(PrimitiveAsset {
            vertex_count,
            vertex_alpha,
            morph_target_count: primitive.morph_targets().count(),
        })
    }

    // Morph target names are not part of core GLTF; exporters put them
    // into the mesh extras.
    fn load_target_names(&self, mesh: &Mesh) -> Vec<String> {
        let Some(extras) = mesh.extras().as_ref() else {
            return Vec::new();
        };
        let value = match serde_json::from_str::<serde_json::Value>(extras.get()) {
            Ok(value) => value,
            Err(err) => {
                warn!("Ignoring unreadable extras of mesh #{}: {}", mesh.index(), err);
                return Vec::new();
            }
        };
        let names: Vec<String> = value
            .get("targetNames")
            .and_then(|names| names.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if self.params.strip_target_prefix {
            strip_shared_prefix(names)
        } else {
            names
        }
    }

    fn load_mesh(&mut self, mesh: Mesh, node: &Node) -> GltfLoadResult<MeshAsset> {
        let name = mesh.name().map(str::to_string);
        let display_name = name.clone().unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let primitives = mesh
            .primitives()
            .map(|primitive| Self::load_primitive(&display_name, primitive))
            .collect::<Result<_, _>>()?;
        // Node weights override the mesh defaults.
        let weights = node
            .weights()
            .or_else(|| mesh.weights())
            .map(|weights| weights.to_vec())
            .unwrap_or_default();
        Ok(MeshAsset {
            id: self.index(BundleAssetType::Mesh, mesh.index()),
            name,
            primitives,
            target_names: self.load_target_names(&mesh),
            weights,
        })
    }

    fn load_skin(&mut self, skin: &Skin) -> Arc<SkinAsset> {
        if let Some(skin) = self.skin_cache.get(&skin.index()) {
            return skin.clone();
        }

        let skin_asset = Arc::new(SkinAsset {
            id: self.index(BundleAssetType::Skin, skin.index()),
            name: skin.name().map(str::to_string),
            joint_nodes: skin.joints().map(|joint| joint.index()).collect(),
            skeleton: skin.skeleton().map(|skeleton| skeleton.index()),
        });
        self.skin_cache.insert(skin.index(), skin_asset.clone());
        skin_asset
    }

    fn load_node(&mut self, node: Node) -> GltfLoadResult<NodeAsset> {
        let transform = match node.transform() {
            Transform::Matrix { matrix } => {
                NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix))
            }
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        let mesh = node
            .mesh()
            .map(|mesh| self.load_mesh(mesh, &node))
            .transpose()?;
        let skin = node.skin().map(|skin| self.load_skin(&skin));
        let children = node
            .children()
            .map(|child| self.load_node(child))
            .collect::<Result<_, _>>()?;

        Ok(NodeAsset {
            id: self.index(BundleAssetType::Node, node.index()),
            index: node.index(),
            name: node.name().map(str::to_string),
            transform,
            mesh,
            skin,
            children,
        })
    }

    fn load_scene(&mut self, scene: Scene) -> GltfLoadResult<SceneAsset> {
        let nodes = scene
            .nodes()
            .map(|node| self.load_node(node))
            .collect::<Result<_, _>>()?;
        // Skins are not required to be attached to a node of the scene, the
        // skeleton is still needed for joint lookups.
        let document = self.document;
        let skins = document.skins().map(|skin| self.load_skin(&skin)).collect();
        Ok(SceneAsset {
            name: scene.name().map(str::to_string),
            nodes,
            skins,
        })
    }

    fn load(&mut self) -> GltfLoadResult<SceneAsset> {
        let document = self.document;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(GltfLoaderError::NoScene)?;
        self.load_scene(scene)
    }
}

/// Load a GLB (or embedded GLTF) bundle from a slice.
///
/// BundleIndex will be generated by hashing the content of the slice.
pub fn load_glb_from_buffer(
    buffer: &[u8],
    params: &AssetLoadParams,
) -> GltfLoadResult<CharacterAsset> {
    let id = BundleIndex::digest_from_buffer(buffer);
    load_glb_from_buffer_with_id(buffer, id, params)
}

/// Load a GLB bundle from a slice, with a BundleIndex specified.
///
/// Only the document structure is read: node hierarchy, mesh parts, morph
/// target names and skins. Vertex data stays with the renderer.
pub fn load_glb_from_buffer_with_id(
    buffer: &[u8],
    id: BundleIndex,
    params: &AssetLoadParams,
) -> GltfLoadResult<CharacterAsset> {
    let gltf = Gltf::from_slice(buffer)?;
    let document = gltf.document;
    let mut loader = GltfDocumentLoader::new(&document, id.clone(), params);
    let scene = loader.load()?;
    let asset = CharacterAsset::new(id, scene, params);
    debug!(
        "Loaded bundle {}: {} mesh parts, {} joints",
        asset.bundle.short(),
        asset.parts.len(),
        asset.joints.len()
    );
    Ok(asset)
}
