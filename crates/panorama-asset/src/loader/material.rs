use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use serde::Deserialize;
use serde_json::Value;

use crate::material::{InputValue, MaterialBlock, MaterialGraph};

const NODE_MATERIAL_TYPE: &str = "BABYLON.NodeMaterial";
const INPUT_BLOCK_TYPE: &str = "BABYLON.InputBlock";

#[derive(Debug)]
pub enum MaterialError {
    Json(serde_json::Error),
    NotNodeMaterial(String),
}

impl Display for MaterialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MaterialError::Json(error) => Display::fmt(error, f),
            MaterialError::NotNodeMaterial(custom_type) => {
                write!(f, "Expected a node material, but got {}", custom_type)
            }
        }
    }
}

impl From<serde_json::Error> for MaterialError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl Error for MaterialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MaterialError::Json(error) => Some(error),
            MaterialError::NotNodeMaterial(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDocument {
    custom_type: Option<String>,
    name: Option<String>,
    #[serde(default)]
    blocks: Vec<BlockDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockDocument {
    custom_type: String,
    id: Option<u64>,
    #[serde(default)]
    name: String,
    value: Option<Value>,
}

fn input_value(value: Option<&Value>) -> InputValue {
    match value {
        Some(Value::Number(number)) => number
            .as_f64()
            .map(|number| InputValue::Scalar(number as f32))
            .unwrap_or(InputValue::Opaque),
        Some(Value::Array(items)) => {
            let components: Option<Vec<f32>> = items
                .iter()
                .map(|item| item.as_f64().map(|number| number as f32))
                .collect();
            components.map(InputValue::Vector).unwrap_or(InputValue::Opaque)
        }
        _ => InputValue::Opaque,
    }
}

impl From<BlockDocument> for MaterialBlock {
    fn from(block: BlockDocument) -> Self {
        let input = (block.custom_type == INPUT_BLOCK_TYPE)
            .then(|| input_value(block.value.as_ref()));
        MaterialBlock {
            id: block.id,
            name: block.name,
            custom_type: block.custom_type,
            input,
        }
    }
}

/// Parse a serialized node material.
pub fn parse_material(data: &[u8]) -> Result<MaterialGraph, MaterialError> {
    let document: MaterialDocument = serde_json::from_slice(data)?;
    if let Some(custom_type) = document.custom_type {
        if custom_type != NODE_MATERIAL_TYPE {
            return Err(MaterialError::NotNodeMaterial(custom_type));
        }
    }
    let blocks = document.blocks.into_iter().map(MaterialBlock::from).collect();
    Ok(MaterialGraph::new(document.name, blocks))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRESS: &str = r#"{
        "customType": "BABYLON.NodeMaterial",
        "name": "dress",
        "blocks": [
            { "customType": "BABYLON.InputBlock", "id": 1, "name": "diffuseCut",
              "type": 1, "value": 0.5 },
            { "customType": "BABYLON.InputBlock", "id": 2, "name": "shadowItensity",
              "valueType": "number", "value": 1 },
            { "customType": "BABYLON.InputBlock", "id": 3, "name": "rimColor",
              "value": [1, 0.5, 0.25] },
            { "customType": "BABYLON.InputBlock", "id": 4, "name": "World", "systemValue": 2 },
            { "customType": "BABYLON.TextureBlock", "id": 5, "name": "Texture", "value": 3 }
        ]
    }"#;

    #[test]
    fn parses_input_blocks() {
        let graph = parse_material(DRESS.as_bytes()).unwrap();
        assert_eq!(graph.name.as_deref(), Some("dress"));
        assert_eq!(graph.blocks().len(), 5);
        assert_eq!(graph.scalar("diffuseCut"), Some(0.5));
        assert_eq!(graph.scalar("shadowItensity"), Some(1.0));
        assert_eq!(
            graph.block_by_name("rimColor").unwrap().input,
            Some(InputValue::Vector(vec![1.0, 0.5, 0.25]))
        );
        assert_eq!(
            graph.block_by_name("World").unwrap().input,
            Some(InputValue::Opaque)
        );
        // Non-input blocks never become writable, whatever their value.
        assert_eq!(graph.block_by_name("Texture").unwrap().input, None);
        assert!(!graph.has_scalar("Texture"));
    }

    #[test]
    fn rejects_other_materials() {
        let result = parse_material(br#"{ "customType": "BABYLON.StandardMaterial" }"#);
        assert!(matches!(result, Err(MaterialError::NotNodeMaterial(_))));
    }

    #[test]
    fn rejects_broken_json() {
        assert!(matches!(
            parse_material(b"{ \"blocks\": [ "),
            Err(MaterialError::Json(_))
        ));
    }

    #[test]
    fn untyped_document_without_blocks_is_empty() {
        let graph = parse_material(b"{}").unwrap();
        assert!(graph.blocks().is_empty());
        assert_eq!(graph.scalar_names().count(), 0);
    }
}
