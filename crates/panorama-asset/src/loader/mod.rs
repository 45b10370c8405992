/// GLTF and GLB loader with `gltf` crate.
#[cfg(feature = "gltf")]
pub mod gltf;

/// Node-material description parser.
#[cfg(feature = "material")]
pub mod material;

#[derive(Debug, Clone)]
pub struct AssetLoadParams {
    /// Infix between the node name and the primitive number of split meshes.
    pub primitive_separator: String,
    /// Strip a `prefix.` shared by all morph target names of a mesh.
    pub strip_target_prefix: bool,
}

impl Default for AssetLoadParams {
    fn default() -> Self {
        Self {
            primitive_separator: String::from("_primitive"),
            strip_target_prefix: true,
        }
    }
}

impl AssetLoadParams {
    pub(crate) fn primitive_name(&self, node_name: &str, index: usize) -> String {
        format!("{}{}{}", node_name, self.primitive_separator, index)
    }
}

/// Strip a dot-delimited prefix shared by every name.
///
/// Exporters often store morph names as `"Face.Blink"`; only the part after
/// the prefix is used for lookups. Names with no dot or with mixed prefixes
/// are returned as-is.
pub(crate) fn strip_shared_prefix(names: Vec<String>) -> Vec<String> {
    if names.len() < 2 {
        return names;
    }
    let Some(dot) = names[0].find('.') else {
        return names;
    };
    let prefix_len = dot + 1;
    let prefix = names[0][..prefix_len].to_string();
    if !names.iter().all(|name| name.starts_with(&prefix)) {
        return names;
    }
    names
        .into_iter()
        .map(|name| name[prefix_len..].to_string())
        .collect()
}
