mod common;

use std::{f32::consts::FRAC_PI_2, sync::Arc, thread, time::Duration};

use common::{character_source, GatedSource, Harness};
use panorama_character::{
    character::CharacterState,
    config::{CharacterConfig, ShadowFilter},
    error::LoadError,
    source::MemorySource,
};

#[test]
fn every_part_is_dressed_once() {
    let config = CharacterConfig::default();
    let mut harness = Harness::new(Arc::new(character_source(&config)));
    harness.ready();
    harness.settle();

    assert_eq!(harness.loader.bound_parts().len(), config.parts.len());
    let scene = harness.scene.borrow();
    for binding in &config.parts {
        let id = scene.get_mesh_by_name(&binding.mesh).unwrap();
        let mesh = scene.mesh(id).unwrap();
        let material = mesh.material.as_ref().unwrap();
        assert_eq!(material.scalar("diffuseCut"), Some(0.21));
        assert_eq!(material.scalar("shadowIntensity"), Some(0.87));
        assert_eq!(material.scalar("rimIntensity"), Some(0.08));
        assert_eq!(material.scalar("baseColor"), Some(1.0));
        assert!(mesh.outline.is_some());
        assert!(mesh.receive_shadows);
        assert!(!mesh.has_vertex_alpha);

        let caster = scene.shadow_generator_for(id).unwrap();
        assert_eq!(caster.render_list(), &[id]);
        assert_eq!(caster.map_size, 2048);
        assert_eq!(caster.filter, ShadowFilter::Pcss);
    }
    assert_eq!(scene.shadow_generators().len(), config.parts.len());
}

#[test]
fn gaze_waits_for_the_bundle() {
    let config = CharacterConfig::default();
    let source = GatedSource::new(character_source(&config), ".glb");
    let mut harness = Harness::new(Arc::new(source.clone()));
    harness.loader.load();
    for _ in 0..20 {
        harness.tick();
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(harness.loader.state(), CharacterState::Loading);
    assert_eq!(harness.scene.borrow().eye_target_writes(), 0);
    assert_eq!(harness.scene.borrow().eye_target(), None);

    source.release(1);
    harness.tick_until(|harness| harness.loader.state() == CharacterState::Ready);
    let writes = harness.scene.borrow().eye_target_writes();
    assert_eq!(writes, 1);

    for expected in writes + 1..writes + 10 {
        harness.tick();
        let scene = harness.scene.borrow();
        assert_eq!(scene.eye_target_writes(), expected);
        let written = scene.eye_target().unwrap();
        assert_eq!(written.frame, harness.frame);
        assert_eq!(written.target.roll, 0.0);
    }

    // The same frame again tracks nothing.
    let frame = harness.context();
    let before = harness.scene.borrow().eye_target_writes();
    harness.loader.update(&frame);
    assert_eq!(harness.scene.borrow().eye_target_writes(), before);
}

#[test]
fn gaze_follows_the_camera() {
    let config = CharacterConfig::default();
    let mut harness = Harness::new(Arc::new(character_source(&config)));
    harness.ready();

    let target = harness.scene.borrow().eye_target().unwrap().target;
    assert!(target.pitch.abs() < 1e-5);
    assert!(target.yaw.abs() < 1e-5);

    harness.camera.set_beta(FRAC_PI_2 + 0.4);
    harness.tick();
    let target = harness.scene.borrow().eye_target().unwrap().target;
    assert!((target.pitch - 0.2).abs() < 1e-5);
    assert!(target.yaw.abs() < 1e-5);

    harness.camera.orbit(0.5, 0.0);
    harness.tick();
    let target = harness.scene.borrow().eye_target().unwrap().target;
    assert!((target.yaw - 0.5).abs() < 1e-4);
}

#[test]
fn disposal_during_bundle_load_discards_it() {
    let config = CharacterConfig::default();
    let source = GatedSource::new(character_source(&config), ".glb");
    let mut harness = Harness::new(Arc::new(source.clone()));
    harness.loader.load();
    harness.tick();
    harness.scene.borrow_mut().dispose();

    source.release(1);
    harness.settle();
    assert_eq!(harness.loader.state(), CharacterState::Failed);
    assert!(matches!(harness.loader.failure(), Some(LoadError::Disposed)));
    let scene = harness.scene.borrow();
    assert_eq!(scene.meshes().count(), 0);
    assert_eq!(scene.joints().len(), 0);
    assert_eq!(scene.eye_target_writes(), 0);
    assert!(harness.loader.report().is_none());
}

#[test]
fn disposal_during_material_load_discards_it() {
    let config = CharacterConfig::default();
    let source = GatedSource::new(character_source(&config), ".json");
    let mut harness = Harness::new(Arc::new(source.clone()));
    harness.ready();
    assert_eq!(harness.loader.report().unwrap().pending_parts(), config.parts.len());
    let writes = harness.scene.borrow().eye_target_writes();

    harness.scene.borrow_mut().dispose();
    source.release(config.parts.len());
    harness.settle();

    assert!(harness.loader.bound_parts().is_empty());
    assert!(harness.loader.failed_parts().is_empty());
    let scene = harness.scene.borrow();
    assert!(scene.shadow_generators().is_empty());
    assert_eq!(scene.eye_target_writes(), writes);
}

#[test]
fn parts_complete_independently() {
    let config = CharacterConfig::default();
    let memory = character_source(&config);
    memory.remove(&config.asset_path("faceMaterial.json"));
    let source = GatedSource::new(memory, "hatMaterial.json");
    let mut harness = Harness::new(Arc::new(source.clone()));
    harness.ready();
    harness.tick_until(|harness| harness.loader.bound_parts().len() == config.parts.len() - 2);

    {
        let scene = harness.scene.borrow();
        let hat = scene.get_mesh_by_name("Hat").unwrap();
        assert!(scene.mesh(hat).unwrap().material.is_none());
        assert!(scene.shadow_generator_for(hat).is_none());
        let face = scene.get_mesh_by_name("Head_primitive1").unwrap();
        assert!(scene.mesh(face).unwrap().material.is_none());
    }
    assert_eq!(harness.loader.failed_parts().len(), 1);
    assert_eq!(harness.loader.failed_parts()[0].0, "Face");

    source.release(1);
    harness.settle();
    let scene = harness.scene.borrow();
    let hat = scene.get_mesh_by_name("Hat").unwrap();
    assert!(scene.mesh(hat).unwrap().material.is_some());
    assert_eq!(scene.shadow_generators().len(), config.parts.len() - 1);
}

#[test]
fn garbage_bundle_fails_without_retry() {
    let config = CharacterConfig::default();
    let source = MemorySource::new();
    source.insert(&config.bundle_path(), b"definitely not glTF".to_vec());
    let mut harness = Harness::new(Arc::new(source.clone()));
    harness.loader.load();
    harness.settle();
    for _ in 0..5 {
        harness.tick();
    }
    assert_eq!(harness.loader.state(), CharacterState::Failed);
    assert!(matches!(harness.loader.failure(), Some(LoadError::Bundle(_))));
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(harness.scene.borrow().meshes().count(), 0);
}
