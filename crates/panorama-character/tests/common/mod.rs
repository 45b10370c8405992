#![allow(dead_code)]

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use futures::{future::BoxFuture, FutureExt};
use panorama_asset::fixture::GltfFixture;
use panorama_character::{
    character::{CharacterLoader, CharacterState},
    config::CharacterConfig,
    dispatch::Dispatcher,
    error::SourceError,
    source::{AssetSource, MemorySource, ProgressSender},
    stage::{FrameContext, Scene, SceneHandle, StageCamera, StageLight},
};
use serde_json::json;
use tokio::sync::Semaphore;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn material_json(inputs: &[&str]) -> Vec<u8> {
    let blocks: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(id, name)| {
            json!({ "customType": "BABYLON.InputBlock", "id": id, "name": name, "value": 1 })
        })
        .collect();
    serde_json::to_vec(&json!({ "customType": "BABYLON.NodeMaterial", "blocks": blocks })).unwrap()
}

pub fn character_files(config: &CharacterConfig) -> Vec<(String, Vec<u8>)> {
    let mut files = vec![(config.bundle_path(), GltfFixture::character().build())];
    for part in &config.parts {
        files.push((
            config.asset_path(&part.description),
            material_json(&["diffuseCut", "shadowIntensity", "rimIntensity", "baseColor"]),
        ));
    }
    files
}

pub fn character_source(config: &CharacterConfig) -> MemorySource {
    let source = MemorySource::new();
    for (path, data) in character_files(config) {
        source.insert(&path, data);
    }
    source
}

/// Memory source whose matching fetches wait for [`GatedSource::release`].
#[derive(Debug, Clone)]
pub struct GatedSource {
    inner: MemorySource,
    suffix: String,
    permits: Arc<Semaphore>,
}

impl GatedSource {
    pub fn new(inner: MemorySource, suffix: &str) -> Self {
        Self {
            inner,
            suffix: suffix.to_string(),
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }
}

impl AssetSource for GatedSource {
    fn probe(&self, path: &str) -> BoxFuture<'static, Result<u16, SourceError>> {
        self.inner.probe(path)
    }

    fn fetch(
        &self,
        path: &str,
        progress: Option<ProgressSender>,
    ) -> BoxFuture<'static, Result<Vec<u8>, SourceError>> {
        let fetch = self.inner.fetch(path, progress);
        let gated = path.ends_with(&self.suffix);
        let permits = self.permits.clone();
        async move {
            if gated {
                let permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| SourceError::Aborted)?;
                permit.forget();
            }
            fetch.await
        }
        .boxed()
    }
}

/// A character loader on a fresh scene, ticked by hand.
pub struct Harness {
    pub scene: SceneHandle,
    pub loader: CharacterLoader,
    pub camera: StageCamera,
    pub frame: u64,
}

impl Harness {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        init_logger();
        let scene = SceneHandle::new(Scene::new());
        let light = StageLight::new(&mut scene.borrow_mut());
        let loader = CharacterLoader::new(
            &scene,
            &light,
            source,
            Dispatcher::new().unwrap(),
            Arc::new(CharacterConfig::default()),
        );
        Self {
            scene,
            loader,
            camera: StageCamera::default(),
            frame: 0,
        }
    }

    pub fn context(&self) -> FrameContext {
        FrameContext {
            index: self.frame,
            delta: Duration::from_millis(16),
            camera: self.camera.pose(),
        }
    }

    pub fn tick(&mut self) {
        self.frame += 1;
        if !self.scene.borrow().is_disposed() {
            self.scene.borrow_mut().begin_frame(self.frame);
        }
        let frame = self.context();
        self.loader.update(&frame);
    }

    pub fn tick_until(&mut self, mut done: impl FnMut(&Harness) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            self.tick();
            if done(self) {
                return;
            }
            assert!(Instant::now() < deadline, "gave up waiting");
            thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn settle(&mut self) {
        self.tick_until(|harness| harness.loader.is_idle());
    }

    pub fn ready(&mut self) {
        self.loader.load();
        self.tick_until(|harness| harness.loader.state() == CharacterState::Ready);
    }
}
