use std::{env, process::ExitCode, sync::Arc, thread, time::Duration};

use log::{error, info};
use panorama_character::{
    character::CharacterState,
    config::CharacterConfig,
    source::{AssetSource, DirectorySource},
    viewer::{Gate, PanoramaViewer, ViewerOptions},
};

const FRAME_TIME: Duration = Duration::from_millis(16);
const FRAMES: u64 = 60 * 30;
const ORBIT_SPEED: f32 = 0.01;

fn asset_source(base: &str) -> Arc<dyn AssetSource> {
    #[cfg(feature = "http")]
    if base.starts_with("http://") || base.starts_with("https://") {
        return Arc::new(panorama_character::source::HttpSource::new(base));
    }
    Arc::new(DirectorySource::new(base))
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match env::var("PANORAMA_CONFIG") {
        Ok(path) => match CharacterConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        Err(_) => CharacterConfig::default(),
    };
    let base = env::var("PANORAMA_ASSET_BASE").unwrap_or_else(|_| String::from("."));
    info!("Assets from {}", base);

    let options = ViewerOptions {
        with_character: true,
        config: Arc::new(config),
    };
    let mut viewer = match PanoramaViewer::new(asset_source(&base), options) {
        Ok(viewer) => viewer,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = viewer.create_scene() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut status = ExitCode::SUCCESS;
    for _ in 0..FRAMES {
        let frame = match viewer.render_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("{}", e);
                status = ExitCode::FAILURE;
                break;
            }
        };
        if viewer.gate() == Gate::Unavailable {
            break;
        }
        if let Some(character) = viewer.character() {
            if character.state() == CharacterState::Failed {
                status = ExitCode::FAILURE;
                break;
            }
        }
        viewer.camera_mut().orbit(ORBIT_SPEED, 0.0);

        if frame.index % 60 == 0 {
            if let Some(target) = viewer.scene().borrow().eye_target() {
                info!(
                    "Frame {}: pitch {:.3} yaw {:.3}",
                    target.frame, target.target.pitch, target.target.yaw
                );
            }
        }
        thread::sleep(FRAME_TIME);
    }
    viewer.dispose();
    status
}
