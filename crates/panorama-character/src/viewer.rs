use std::{
    cell::Cell,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use log::{debug, info};
use web_time::Instant;

use crate::{
    character::{availability::AssetAvailability, CharacterLoader},
    config::CharacterConfig,
    dispatch::Dispatcher,
    error::ViewerError,
    source::AssetSource,
    stage::{FrameContext, Scene, SceneHandle, StageCamera, StageLight},
};

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub with_character: bool,
    pub config: Arc<CharacterConfig>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            with_character: true,
            config: Arc::new(CharacterConfig::default()),
        }
    }
}

/// Outcome of the availability check gating the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Closed,
    Checking,
    Open,
    /// The bundle can't be reached; the viewer runs without a character.
    Unavailable,
}

/// The panorama stage and its frame loop.
pub struct PanoramaViewer {
    scene: SceneHandle,
    camera: StageCamera,
    light: StageLight,
    dispatcher: Dispatcher,
    source: Arc<dyn AssetSource>,
    options: ViewerOptions,
    availability: Option<AssetAvailability>,
    gate: Rc<Cell<Gate>>,
    character: Option<CharacterLoader>,
    frame: u64,
    last_frame: Option<Instant>,
    disposed: bool,
}

impl std::fmt::Debug for PanoramaViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanoramaViewer")
            .field("frame", &self.frame)
            .field("gate", &self.gate.get())
            .field("character", &self.character)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl PanoramaViewer {
    pub fn new(source: Arc<dyn AssetSource>, options: ViewerOptions) -> Result<Self, ViewerError> {
        Ok(Self::with_dispatcher(source, Dispatcher::new()?, options))
    }

    pub fn with_dispatcher(
        source: Arc<dyn AssetSource>,
        dispatcher: Dispatcher,
        options: ViewerOptions,
    ) -> Self {
        info!("Init panorama viewer");
        let scene = SceneHandle::new(Scene::new());
        let light = StageLight::new(&mut scene.borrow_mut());
        Self {
            scene,
            camera: StageCamera::default(),
            light,
            dispatcher,
            source,
            options,
            availability: None,
            gate: Rc::new(Cell::new(Gate::Closed)),
            character: None,
            frame: 0,
            last_frame: None,
            disposed: false,
        }
    }

    /// Build the stage and, when enabled, start checking for the character.
    pub fn create_scene(&mut self) -> Result<(), ViewerError> {
        if self.disposed {
            return Err(ViewerError::Disposed);
        }
        self.scene.borrow_mut().add_mesh("WorldSphere");
        if !self.options.with_character {
            return Ok(());
        }

        let mut availability = AssetAvailability::new(
            self.source.clone(),
            self.dispatcher.clone(),
            self.options.config.bundle_path(),
        );
        let available = self.gate.clone();
        let unavailable = self.gate.clone();
        self.gate.set(Gate::Checking);
        availability.check(
            move || available.set(Gate::Open),
            move || {
                info!("Running without character");
                unavailable.set(Gate::Unavailable);
            },
        );
        self.availability = Some(availability);
        Ok(())
    }

    /// Advance one frame.
    pub fn render_frame(&mut self) -> Result<FrameContext, ViewerError> {
        if self.disposed {
            return Err(ViewerError::Disposed);
        }
        let now = Instant::now();
        let delta = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);
        self.frame += 1;
        self.scene.borrow_mut().begin_frame(self.frame);

        if let Some(availability) = &mut self.availability {
            availability.poll();
            if !availability.is_pending() {
                self.availability = None;
            }
        }
        if self.gate.get() == Gate::Open && self.character.is_none() {
            let mut character = CharacterLoader::new(
                &self.scene,
                &self.light,
                self.source.clone(),
                self.dispatcher.clone(),
                self.options.config.clone(),
            );
            character.load();
            self.character = Some(character);
        }

        let frame = FrameContext {
            index: self.frame,
            delta,
            camera: self.camera.pose(),
        };
        if let Some(character) = &mut self.character {
            character.update(&frame);
        }
        Ok(frame)
    }

    /// Tear the scene down. Work still in flight is discarded when it lands.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!("Disposing viewer after {} frames", self.frame);
        self.scene.borrow_mut().dispose();
        self.character = None;
        self.availability = None;
        self.disposed = true;
    }

    /// Show or hide every mesh of the stage, character included.
    pub fn set_meshes_enabled(&self, enabled: bool) {
        if !self.disposed {
            self.scene.borrow_mut().set_meshes_enabled(enabled);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn gate(&self) -> Gate {
        self.gate.get()
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn camera(&self) -> &StageCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut StageCamera {
        &mut self.camera
    }

    pub fn character(&self) -> Option<&CharacterLoader> {
        self.character.as_ref()
    }

    pub fn character_mut(&mut self) -> Option<&mut CharacterLoader> {
        self.character.as_mut()
    }
}
