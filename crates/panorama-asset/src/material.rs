use std::collections::HashMap;

/// Value carried by an input block of a node material.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Scalar(f32),
    Vector(Vec<f32>),
    /// Textures, matrices and system values. Not writable from here.
    Opaque,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBlock {
    pub id: Option<u64>,
    pub name: String,
    pub custom_type: String,
    /// Present on input blocks only.
    pub input: Option<InputValue>,
}

/// A parsed node-material graph.
///
/// Scalar inputs are indexed by block name when the graph is built, so
/// parameter writes are plain map lookups. A name the graph doesn't carry is
/// simply absent.
#[derive(Debug, Clone)]
pub struct MaterialGraph {
    pub name: Option<String>,
    blocks: Vec<MaterialBlock>,
    scalar_inputs: HashMap<String, usize>,
}

impl MaterialGraph {
    pub fn new(name: Option<String>, blocks: Vec<MaterialBlock>) -> Self {
        let mut scalar_inputs = HashMap::new();
        for (index, block) in blocks.iter().enumerate() {
            if let Some(InputValue::Scalar(_)) = block.input {
                // First block wins on duplicate names.
                scalar_inputs.entry(block.name.clone()).or_insert(index);
            }
        }
        Self {
            name,
            blocks,
            scalar_inputs,
        }
    }

    pub fn blocks(&self) -> &[MaterialBlock] {
        &self.blocks
    }

    pub fn block_by_name(&self, name: &str) -> Option<&MaterialBlock> {
        self.blocks.iter().find(|block| block.name == name)
    }

    pub fn has_scalar(&self, name: &str) -> bool {
        self.scalar_inputs.contains_key(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f32> {
        let index = *self.scalar_inputs.get(name)?;
        match self.blocks[index].input {
            Some(InputValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Overwrite a scalar input. Returns `false` when the graph has no scalar
    /// input of that name.
    pub fn set_scalar(&mut self, name: &str, value: f32) -> bool {
        let Some(index) = self.scalar_inputs.get(name).copied() else {
            return false;
        };
        self.blocks[index].input = Some(InputValue::Scalar(value));
        true
    }

    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.scalar_inputs.keys().map(String::as_str)
    }
}
