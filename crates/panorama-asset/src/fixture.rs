//! Small rigged GLB documents assembled in memory.
//!
//! Every primitive shares one triangle, so the documents are tiny but still
//! pass `gltf` validation: positions carry bounds, morph targets carry
//! position deltas, and joints are real nodes referenced by a skin.

use serde_json::{json, Value};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

// Accessor layout of the shared binary chunk.
const POSITIONS: usize = 0;
const DELTAS: usize = 1;
const COLORS_RGB: usize = 2;
const COLORS_RGBA: usize = 3;

#[derive(Debug, Clone)]
pub struct FixtureMesh {
    name: String,
    primitives: usize,
    targets: Vec<String>,
    vertex_alpha: bool,
}

impl FixtureMesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            primitives: 1,
            targets: Vec::new(),
            vertex_alpha: false,
        }
    }

    pub fn primitives(mut self, count: usize) -> Self {
        self.primitives = count.max(1);
        self
    }

    pub fn targets(mut self, names: &[&str]) -> Self {
        self.targets = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn vertex_alpha(mut self, enabled: bool) -> Self {
        self.vertex_alpha = enabled;
        self
    }
}

#[derive(Debug, Clone)]
struct FixtureJoint {
    name: String,
    parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GltfFixture {
    meshes: Vec<FixtureMesh>,
    joints: Vec<FixtureJoint>,
}

impl GltfFixture {
    /// The Gloria layout: dress, hat, hair, a five-primitive head carrying
    /// the face morphs, a body, and a root joint with two eye joints.
    pub fn character() -> Self {
        let face_targets = [
            "Blink", "Blink.L", "Blink.R", "A", "I", "U", "E", "O", "Angry", "Sad", "Surprised",
        ];
        Self::default()
            .mesh(FixtureMesh::new("MarnieDress").targets(&["Breath"]))
            .mesh(FixtureMesh::new("Hat").vertex_alpha(true))
            .mesh(FixtureMesh::new("Hair"))
            .mesh(FixtureMesh::new("Head").primitives(5).targets(&face_targets))
            .mesh(FixtureMesh::new("Body").targets(&["Breath"]))
            .joint("Root", None)
            .joint("Eye.L", Some("Root"))
            .joint("Eye.R", Some("Root"))
    }

    pub fn mesh(mut self, mesh: FixtureMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn without_mesh(mut self, name: &str) -> Self {
        self.meshes.retain(|mesh| mesh.name != name);
        self
    }

    pub fn joint(mut self, name: &str, parent: Option<&str>) -> Self {
        self.joints.push(FixtureJoint {
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        self
    }

    pub fn without_joints(mut self) -> Self {
        self.joints.clear();
        self
    }

    fn binary_chunk() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let deltas: [[f32; 3]; 3] = [[0.0, 0.1, 0.0]; 3];
        let rgb: [[f32; 3]; 3] = [[1.0, 1.0, 1.0]; 3];
        let rgba: [[f32; 4]; 3] = [[1.0, 1.0, 1.0, 0.5]; 3];

        let mut data = Vec::new();
        let floats = positions
            .iter()
            .flatten()
            .chain(deltas.iter().flatten())
            .chain(rgb.iter().flatten())
            .chain(rgba.iter().flatten());
        for value in floats {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    fn document(&self, buffer_length: usize) -> Value {
        let buffer_views = json!([
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 108, "byteLength": 48 },
        ]);
        let accessors = json!([
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.1, 0.0], "max": [0.0, 0.1, 0.0] },
            { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" },
        ]);

        let meshes: Vec<Value> = self
            .meshes
            .iter()
            .map(|mesh| {
                let color = if mesh.vertex_alpha { COLORS_RGBA } else { COLORS_RGB };
                let targets: Vec<Value> = mesh
                    .targets
                    .iter()
                    .map(|_| json!({ "POSITION": DELTAS }))
                    .collect();
                let primitives: Vec<Value> = (0..mesh.primitives)
                    .map(|_| {
                        let mut primitive = json!({
                            "attributes": { "POSITION": POSITIONS, "COLOR_0": color },
                        });
                        if !targets.is_empty() {
                            primitive["targets"] = Value::Array(targets.clone());
                        }
                        primitive
                    })
                    .collect();
                let mut value = json!({ "name": mesh.name, "primitives": primitives });
                if !mesh.targets.is_empty() {
                    value["weights"] = json!(vec![0.0; mesh.targets.len()]);
                    value["extras"] = json!({ "targetNames": mesh.targets });
                }
                value
            })
            .collect();

        // Joints come first so that their node index equals their position.
        let mut nodes: Vec<Value> = self
            .joints
            .iter()
            .map(|joint| {
                let children: Vec<usize> = self
                    .joints
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| child.parent.as_deref() == Some(joint.name.as_str()))
                    .map(|(index, _)| index)
                    .collect();
                let mut node = json!({ "name": joint.name, "rotation": [0.0, 0.0, 0.0, 1.0] });
                if !children.is_empty() {
                    node["children"] = json!(children);
                }
                node
            })
            .collect();
        let mut scene_nodes: Vec<usize> = self
            .joints
            .iter()
            .enumerate()
            .filter(|(_, joint)| joint.parent.is_none())
            .map(|(index, _)| index)
            .collect();
        for (index, mesh) in self.meshes.iter().enumerate() {
            scene_nodes.push(nodes.len());
            nodes.push(json!({ "name": mesh.name, "mesh": index }));
        }

        let mut document = json!({
            "asset": { "version": "2.0", "generator": "panorama-asset fixture" },
            "scene": 0,
            "scenes": [{ "name": "Scene", "nodes": scene_nodes }],
            "nodes": nodes,
            "buffers": [{ "byteLength": buffer_length }],
            "bufferViews": buffer_views,
            "accessors": accessors,
        });
        if !meshes.is_empty() {
            document["meshes"] = Value::Array(meshes);
        }
        if !self.joints.is_empty() {
            let joints: Vec<usize> = (0..self.joints.len()).collect();
            document["skins"] = json!([{ "name": "Armature", "joints": joints, "skeleton": 0 }]);
        }
        document
    }

    /// Assemble the binary GLB container.
    pub fn build(&self) -> Vec<u8> {
        let binary = Self::binary_chunk();
        let mut json = serde_json::to_vec(&self.document(binary.len()))
            .expect("fixture document serializes");
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + binary.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(binary.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(&binary);
        glb
    }
}
