use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    fs, io,
    path::Path,
};

use serde::Deserialize;

/// One row of the part table: which mesh a material description dresses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartBinding {
    pub part: String,
    pub mesh: String,
    pub description: String,
}

impl PartBinding {
    fn new(part: &str, mesh: &str, description: &str) -> Self {
        Self {
            part: part.to_string(),
            mesh: mesh.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutlineParams {
    pub width: f32,
    pub color: [f32; 3],
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            width: 0.001,
            color: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowFilter {
    None,
    Poisson,
    Pcf,
    /// Percentage-closer soft shadows.
    #[default]
    Pcss,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    pub map_size: u32,
    pub filter: ShadowFilter,
    pub darkness: f32,
    pub contact_hardening_light_size_uv_ratio: f32,
    pub bias: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            map_size: 2048,
            filter: ShadowFilter::Pcss,
            darkness: 0.2,
            contact_hardening_light_size_uv_ratio: 0.05,
            bias: 0.014,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub root_joint: String,
    pub eye_joints: Vec<String>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            root_joint: String::from("Root"),
            eye_joints: vec![String::from("Eye.L"), String::from("Eye.R")],
        }
    }
}

/// Meshes a morph controller drives, and the targets it looks for on them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MorphSetConfig {
    pub meshes: Vec<String>,
    pub targets: Vec<String>,
}

impl MorphSetConfig {
    fn new(meshes: &[&str], targets: &[&str]) -> Self {
        Self {
            meshes: meshes.iter().map(|name| name.to_string()).collect(),
            targets: targets.iter().map(|name| name.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    pub body: MorphSetConfig,
    pub eye: MorphSetConfig,
    pub brow: MorphSetConfig,
    pub mouth: MorphSetConfig,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            body: MorphSetConfig::new(&["Body", "MarnieDress"], &["Breath"]),
            eye: MorphSetConfig::new(
                &["Head_primitive1", "Head_primitive3", "Head_primitive4"],
                &["Blink", "Blink.L", "Blink.R"],
            ),
            brow: MorphSetConfig::new(&["Head_primitive2"], &["Angry", "Sad", "Surprised"]),
            mouth: MorphSetConfig::new(&["Head_primitive1"], &["A", "I", "U", "E", "O"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Prefix of every asset path, with a trailing slash.
    pub base_path: String,
    pub bundle_file: String,
    pub parts: Vec<PartBinding>,
    /// Render group of outlined and shadowed parts.
    pub rendering_group: u8,
    pub outline: OutlineParams,
    pub shadow: ShadowParams,
    pub rig: RigConfig,
    pub morph: MorphConfig,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            base_path: String::from("/area360/characters/"),
            bundle_file: String::from("gloria.glb"),
            parts: vec![
                PartBinding::new("Dress", "MarnieDress", "dressMaterial.json"),
                PartBinding::new("Hat", "Hat", "hatMaterial.json"),
                PartBinding::new("Hair", "Hair", "hairMaterial.json"),
                PartBinding::new("Head", "Head_primitive0", "headMaterial.json"),
                PartBinding::new("Face", "Head_primitive1", "faceMaterial.json"),
                PartBinding::new("Mayu", "Head_primitive2", "mayuMaterial.json"),
                PartBinding::new("Eye.l", "Head_primitive3", "bodyMaterial.json"),
                PartBinding::new("Eye.r", "Head_primitive4", "bodyMaterial.json"),
                PartBinding::new("Body", "Body", "bodyMaterial.json"),
            ],
            rendering_group: 1,
            outline: OutlineParams::default(),
            shadow: ShadowParams::default(),
            rig: RigConfig::default(),
            morph: MorphConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(error) => write!(f, "Failed to read config: {}", error),
            ConfigError::Json(error) => write!(f, "Bad config: {}", error),
        }
    }
}

impl Error for ConfigError {}

impl CharacterConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(data).map_err(ConfigError::Json)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read(path).map_err(ConfigError::Io)?;
        Self::from_json(&data)
    }

    pub fn bundle_path(&self) -> String {
        self.asset_path(&self.bundle_file)
    }

    pub fn asset_path(&self, file: &str) -> String {
        format!("{}{}", self.base_path, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_gloria() {
        let config = CharacterConfig::default();
        assert_eq!(config.bundle_path(), "/area360/characters/gloria.glb");
        assert_eq!(config.parts.len(), 9);
        assert_eq!(
            config.asset_path(&config.parts[0].description),
            "/area360/characters/dressMaterial.json"
        );
        assert_eq!(config.shadow.map_size, 2048);
        assert_eq!(config.shadow.filter, ShadowFilter::Pcss);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CharacterConfig::from_json(
            br#"{ "base_path": "/assets/", "shadow": { "darkness": 0.5, "filter": "pcf" } }"#,
        )
        .unwrap();
        assert_eq!(config.base_path, "/assets/");
        assert_eq!(config.bundle_file, "gloria.glb");
        assert_eq!(config.shadow.darkness, 0.5);
        assert_eq!(config.shadow.filter, ShadowFilter::Pcf);
        assert_eq!(config.shadow.map_size, 2048);
        assert_eq!(config.rig, RigConfig::default());
    }

    #[test]
    fn bad_json_is_reported() {
        assert!(matches!(
            CharacterConfig::from_json(b"{ base_path"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            CharacterConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
