use crate::index::AssetIndex;

#[derive(Debug, Clone, Default)]
pub struct PrimitiveAsset {
    pub vertex_count: usize,
    /// The primitive carries a four component `COLOR_0`, which renderers
    /// blend as vertex alpha unless told otherwise.
    pub vertex_alpha: bool,
    pub morph_target_count: usize,
}

#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub id: AssetIndex,
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveAsset>,
    /// Names of the morph targets, shared by every primitive of the mesh.
    pub target_names: Vec<String>,
    /// Default morph weights.
    pub weights: Vec<f32>,
}

impl MeshAsset {
    /// Default weight of the morph target at `index`, zero when the document
    /// doesn't declare one.
    pub fn default_weight(&self, index: usize) -> f32 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }
}
