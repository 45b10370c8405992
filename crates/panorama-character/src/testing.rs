use std::{
    thread,
    time::{Duration, Instant},
};

use panorama_asset::fixture::GltfFixture;
use serde_json::json;

use crate::{config::CharacterConfig, source::MemorySource};

/// A node material whose input blocks are all scalar and set to 1.
pub fn material_json(inputs: &[&str]) -> Vec<u8> {
    let blocks: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(id, name)| {
            json!({
                "customType": "BABYLON.InputBlock",
                "id": id,
                "name": name,
                "value": 1.0,
            })
        })
        .collect();
    json!({
        "customType": "BABYLON.NodeMaterial",
        "name": "fixture",
        "blocks": blocks,
    })
    .to_string()
    .into_bytes()
}

/// Source holding the fixture bundle and a material for every part.
pub fn character_source(config: &CharacterConfig) -> MemorySource {
    let source = MemorySource::new();
    source.insert(&config.bundle_path(), GltfFixture::character().build());
    for part in &config.parts {
        source.insert(
            &config.asset_path(&part.description),
            material_json(&["diffuseCut", "shadowItensity", "rimIntensity"]),
        );
    }
    source
}

/// Call `step` until it returns true.
pub fn pump(mut step: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !step() {
        assert!(Instant::now() < deadline, "gave up waiting");
        thread::sleep(Duration::from_millis(1));
    }
}
