//! The character: bundle loading, part materials, rig and face morphs.
use std::{
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

use log::{debug, error, info, warn};
use panorama_asset::{
    loader::{gltf::load_glb_from_buffer, AssetLoadParams},
    scene::CharacterAsset,
};
use tokio::{sync::mpsc, task};

use crate::{
    config::CharacterConfig,
    dispatch::{Dispatcher, Pending},
    error::{BindError, LoadError, RigError},
    source::{AssetSource, LoadProgress},
    stage::{FrameContext, SceneHandle, StageLight, WeakScene},
};

pub mod availability;
pub mod bone;
pub mod gaze;
pub mod material;
pub mod morph;

use self::{
    bone::BoneRig,
    gaze::GazeTracker,
    material::{BindEvent, BindOutcome, MaterialBinder, MaterialSpec},
    morph::{
        CharacterBody, CharacterBrow, CharacterEye, CharacterMouth, MorphController, MorphKind,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterState {
    NotLoaded,
    Loading,
    /// The bundle is in the scene, possibly with some parts missing.
    Ready,
    /// The attempt ended. [`CharacterLoader::failure`] tells why.
    Failed,
}

#[derive(Debug, Default)]
pub struct CharacterBones {
    pub root: BoneRig,
}

#[derive(Debug, Clone)]
pub struct CharacterMorph {
    pub body: CharacterBody,
    pub eye: CharacterEye,
    pub brow: CharacterBrow,
    pub mouth: CharacterMouth,
}

impl CharacterMorph {
    fn new(config: &CharacterConfig) -> Self {
        Self {
            body: CharacterBody::new(config.morph.body.clone()),
            eye: CharacterEye::new(config.morph.eye.clone()),
            brow: CharacterBrow::new(config.morph.brow.clone()),
            mouth: CharacterMouth::new(config.morph.mouth.clone()),
        }
    }
}

/// What setting up a loaded bundle did.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub bundle: String,
    pub meshes: usize,
    pub parts: Vec<(String, BindOutcome)>,
    pub rig: Result<(), RigError>,
    pub morphs: Vec<(MorphKind, usize)>,
}

impl SetupReport {
    pub fn pending_parts(&self) -> usize {
        self.parts
            .iter()
            .filter(|(_, outcome)| *outcome == BindOutcome::Pending)
            .count()
    }

    pub fn skipped_parts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter(|(_, outcome)| *outcome == BindOutcome::Skipped)
            .map(|(part, _)| part.as_str())
    }
}

impl Display for SetupReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bundle {}: {} meshes, {}/{} parts binding",
            self.bundle,
            self.meshes,
            self.pending_parts(),
            self.parts.len()
        )?;
        let skipped: Vec<&str> = self.skipped_parts().collect();
        if !skipped.is_empty() {
            write!(f, " (skipped {})", skipped.join(", "))?;
        }
        match &self.rig {
            Ok(()) => write!(f, ", rig ready")?,
            Err(error) => write!(f, ", rig inert ({})", error)?,
        }
        for (kind, targets) in &self.morphs {
            write!(f, ", {} morphs {}", kind.name(), targets)?;
        }
        Ok(())
    }
}

type ProgressCallback = Box<dyn FnMut(LoadProgress)>;

/// Loads the character bundle into the scene and drives it every frame.
pub struct CharacterLoader {
    scene: WeakScene,
    source: Arc<dyn AssetSource>,
    dispatcher: Dispatcher,
    config: Arc<CharacterConfig>,
    state: CharacterState,
    failure: Option<LoadError>,
    bundle: Option<Pending<Result<CharacterAsset, LoadError>>>,
    progress_rx: Option<mpsc::UnboundedReceiver<LoadProgress>>,
    on_progress: Option<ProgressCallback>,
    binder: MaterialBinder,
    bound_parts: Vec<String>,
    failed_parts: Vec<(String, BindError)>,
    gaze: GazeTracker,
    report: Option<SetupReport>,
    pub bones: CharacterBones,
    pub morph: CharacterMorph,
}

impl Debug for CharacterLoader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterLoader")
            .field("state", &self.state)
            .field("failure", &self.failure)
            .field("binder", &self.binder)
            .finish()
    }
}

impl CharacterLoader {
    pub fn new(
        scene: &SceneHandle,
        light: &StageLight,
        source: Arc<dyn AssetSource>,
        dispatcher: Dispatcher,
        config: Arc<CharacterConfig>,
    ) -> Self {
        let binder = MaterialBinder::new(
            scene.downgrade(),
            light.character_light,
            source.clone(),
            dispatcher.clone(),
            config.clone(),
        );
        Self {
            scene: scene.downgrade(),
            source,
            dispatcher,
            morph: CharacterMorph::new(&config),
            config,
            state: CharacterState::NotLoaded,
            failure: None,
            bundle: None,
            progress_rx: None,
            on_progress: None,
            binder,
            bound_parts: Vec::new(),
            failed_parts: Vec::new(),
            gaze: GazeTracker::new(),
            report: None,
            bones: CharacterBones::default(),
        }
    }

    /// Called on the frame thread with every progress report of the bundle.
    pub fn on_progress(&mut self, callback: impl FnMut(LoadProgress) + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    /// Start fetching the bundle. Does nothing while loading or once ready.
    pub fn load(&mut self) {
        match self.state {
            CharacterState::Loading | CharacterState::Ready => {
                debug!("Character already {:?}, load ignored", self.state);
                return;
            }
            CharacterState::NotLoaded | CharacterState::Failed => {}
        }

        let path = self.config.bundle_path();
        info!("Loading character bundle {}", path);
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let fetch = self.source.fetch(&path, Some(progress_tx));
        let params = AssetLoadParams::default();
        self.bundle = Some(self.dispatcher.spawn(async move {
            let data = fetch.await?;
            let asset = task::spawn_blocking(move || load_glb_from_buffer(&data, &params))
                .await
                .map_err(|_| LoadError::Canceled)??;
            Ok::<CharacterAsset, LoadError>(asset)
        }));
        self.progress_rx = Some(progress_rx);
        self.failure = None;
        self.state = CharacterState::Loading;
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn failure(&self) -> Option<&LoadError> {
        self.failure.as_ref()
    }

    pub fn report(&self) -> Option<&SetupReport> {
        self.report.as_ref()
    }

    pub fn bound_parts(&self) -> &[String] {
        &self.bound_parts
    }

    pub fn failed_parts(&self) -> &[(String, BindError)] {
        &self.failed_parts
    }

    /// Whether nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.bundle.is_none() && self.binder.pending() == 0
    }

    pub fn set_meshes_enabled(&self, enabled: bool) {
        if let Some(scene) = self.scene.upgrade() {
            scene.borrow_mut().set_meshes_enabled(enabled);
        }
    }

    /// Apply finished work, then track the camera if the character is ready.
    pub fn update(&mut self, frame: &FrameContext) {
        self.drain_progress();
        self.poll_bundle();
        for event in self.binder.poll() {
            match event {
                BindEvent::Bound { part, .. } => self.bound_parts.push(part),
                BindEvent::Failed { part, error } => self.failed_parts.push((part, error)),
                BindEvent::Discarded { .. } => {}
            }
        }
        if self.state == CharacterState::Ready && self.scene.upgrade().is_some() {
            self.gaze.update(frame, &mut self.bones.root);
        }
    }

    fn drain_progress(&mut self) {
        let Some(progress_rx) = &mut self.progress_rx else {
            return;
        };
        while let Ok(progress) = progress_rx.try_recv() {
            debug!("Character bundle {:?}", progress);
            if let Some(on_progress) = &mut self.on_progress {
                on_progress(progress);
            }
        }
    }

    fn poll_bundle(&mut self) {
        let Some(result) = self.bundle.as_mut().and_then(Pending::try_take) else {
            return;
        };
        self.bundle = None;
        // Reports sent before the result are still queued.
        self.drain_progress();
        self.progress_rx = None;

        let result = result.map_err(|_| LoadError::Canceled).and_then(|asset| asset);
        let Some(scene) = self.scene.upgrade() else {
            debug!("Scene disposed before the character bundle arrived");
            self.fail(LoadError::Disposed);
            return;
        };
        match result {
            Ok(asset) => self.setup(&scene, &asset),
            Err(error) => {
                error!("Failed to load character bundle: {}", error);
                self.fail(error);
            }
        }
    }

    fn fail(&mut self, error: LoadError) {
        self.failure = Some(error);
        self.state = CharacterState::Failed;
    }

    fn setup(&mut self, scene: &SceneHandle, asset: &CharacterAsset) {
        let meshes = scene.borrow_mut().append(asset).len();

        let specs: Vec<MaterialSpec> = {
            let scene = scene.borrow();
            self.config
                .parts
                .iter()
                .map(|binding| MaterialSpec::resolve(binding, &self.config, &scene))
                .collect()
        };
        let parts = specs
            .iter()
            .map(|spec| (spec.part_name.clone(), self.binder.bind(spec)))
            .collect();

        let rig = self.bones.root.setup_bone(scene, &self.config.rig);
        if let Err(error) = &rig {
            warn!("Character rig unavailable: {}", error);
        }
        let morphs = vec![
            (MorphKind::Body, self.morph.body.setup_morph(scene)),
            (MorphKind::Eye, self.morph.eye.setup_morph(scene)),
            (MorphKind::Mouth, self.morph.mouth.setup_morph(scene)),
            (MorphKind::Brow, self.morph.brow.setup_morph(scene)),
        ];

        let report = SetupReport {
            bundle: asset.bundle.short(),
            meshes,
            parts,
            rig,
            morphs,
        };
        info!("Character ready, {}", report);
        self.report = Some(report);
        self.state = CharacterState::Ready;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::{
        source::MemorySource,
        stage::{Scene, StageCamera},
        testing::{character_source, pump},
    };

    struct Fixture {
        scene: SceneHandle,
        loader: CharacterLoader,
        frame: u64,
    }

    impl Fixture {
        fn new(source: MemorySource) -> Self {
            let scene = SceneHandle::new(Scene::new());
            let light = StageLight::new(&mut scene.borrow_mut());
            let loader = CharacterLoader::new(
                &scene,
                &light,
                Arc::new(source),
                Dispatcher::new().unwrap(),
                Arc::new(CharacterConfig::default()),
            );
            Self {
                scene,
                loader,
                frame: 0,
            }
        }

        fn tick(&mut self) {
            self.frame += 1;
            self.scene.borrow_mut().begin_frame(self.frame);
            let frame = FrameContext {
                index: self.frame,
                delta: Duration::from_millis(16),
                camera: StageCamera::default().pose(),
            };
            self.loader.update(&frame);
        }

        fn settle(&mut self) {
            pump(|| {
                self.tick();
                self.loader.is_idle()
            });
        }
    }

    #[test]
    fn load_sets_up_everything() {
        let config = CharacterConfig::default();
        let mut fixture = Fixture::new(character_source(&config));
        let progress = Rc::new(RefCell::new(Vec::new()));
        let seen = progress.clone();
        fixture
            .loader
            .on_progress(move |report| seen.borrow_mut().push(report));

        assert_eq!(fixture.loader.state(), CharacterState::NotLoaded);
        fixture.loader.load();
        assert_eq!(fixture.loader.state(), CharacterState::Loading);
        fixture.settle();

        assert_eq!(fixture.loader.state(), CharacterState::Ready);
        assert!(!progress.borrow().is_empty());
        let report = fixture.loader.report().unwrap();
        assert_eq!(report.meshes, 9);
        assert_eq!(report.pending_parts(), 9);
        assert_eq!(report.rig, Ok(()));
        assert_eq!(fixture.loader.bound_parts().len(), 9);
        assert!(fixture.loader.failed_parts().is_empty());

        let scene = fixture.scene.borrow();
        assert_eq!(scene.shadow_generators().len(), 9);
        for mesh in scene.meshes() {
            let material = mesh.material.as_ref().unwrap();
            assert_eq!(material.scalar("diffuseCut"), Some(0.21));
            assert_eq!(material.scalar("shadowItensity"), Some(0.87));
            assert_eq!(material.scalar("rimIntensity"), Some(0.08));
            assert_eq!(mesh.rendering_group, 1);
        }
        assert_eq!(scene.eye_target().unwrap().frame, fixture.frame);
    }

    #[test]
    fn failed_load_is_terminal_until_retried() {
        let config = CharacterConfig::default();
        let source = MemorySource::new();
        let mut fixture = Fixture::new(source.clone());
        fixture.loader.load();
        fixture.settle();

        assert_eq!(fixture.loader.state(), CharacterState::Failed);
        assert!(matches!(
            fixture.loader.failure(),
            Some(LoadError::Source(crate::error::SourceError::NotFound(_)))
        ));
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(fixture.scene.borrow().meshes().count(), 0);
        assert_eq!(fixture.scene.borrow().eye_target_writes(), 0);

        source.insert(&config.bundle_path(), b"not a bundle".to_vec());
        fixture.loader.load();
        fixture.settle();
        assert!(matches!(fixture.loader.failure(), Some(LoadError::Bundle(_))));
    }

    #[test]
    fn load_is_ignored_while_loading() {
        let config = CharacterConfig::default();
        let source = character_source(&config);
        let mut fixture = Fixture::new(source.clone());
        fixture.loader.load();
        fixture.loader.load();
        fixture.settle();
        fixture.loader.load();
        assert_eq!(fixture.loader.state(), CharacterState::Ready);
        // One bundle fetch, one per part.
        assert_eq!(source.fetch_count(), 1 + config.parts.len());
    }

    #[test]
    fn missing_parts_and_rig_degrade_gracefully() {
        let config = CharacterConfig::default();
        let source = character_source(&config);
        source.insert(
            &config.bundle_path(),
            panorama_asset::fixture::GltfFixture::character()
                .without_mesh("Hat")
                .without_joints()
                .build(),
        );
        source.remove(&config.asset_path("hairMaterial.json"));
        let mut fixture = Fixture::new(source);
        fixture.loader.load();
        fixture.settle();

        assert_eq!(fixture.loader.state(), CharacterState::Ready);
        let report = fixture.loader.report().unwrap();
        assert_eq!(report.skipped_parts().collect::<Vec<_>>(), vec!["Hat"]);
        assert!(report.rig.is_err());
        assert_eq!(fixture.loader.bound_parts().len(), 7);
        assert_eq!(fixture.loader.failed_parts().len(), 1);
        assert_eq!(fixture.loader.failed_parts()[0].0, "Hair");
        // Inert rig: the tracker runs but nothing is written.
        assert_eq!(fixture.scene.borrow().eye_target_writes(), 0);
        assert!(report.to_string().contains("rig inert"));
    }
}
