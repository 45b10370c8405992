use crate::index::AssetIndex;

#[derive(Debug, Clone)]
pub struct SkinAsset {
    pub id: AssetIndex,
    pub name: Option<String>,
    /// Document indices of the joint nodes.
    pub joint_nodes: Vec<usize>,
    pub skeleton: Option<usize>,
}
