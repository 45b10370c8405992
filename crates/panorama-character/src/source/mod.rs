use std::fmt::Debug;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::SourceError;

mod directory;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use directory::DirectorySource;
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use memory::MemorySource;

/// Status reported by a probe for an existing asset.
pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    /// Known only when the source reports a length up front.
    pub total: Option<u64>,
}

pub type ProgressSender = mpsc::UnboundedSender<LoadProgress>;

/// Where the bundle and material descriptions come from.
///
/// Paths are the full asset paths built by
/// [`CharacterConfig::asset_path`](crate::config::CharacterConfig::asset_path).
/// The returned futures own everything they need so they can run on the
/// dispatcher.
pub trait AssetSource: Debug + Send + Sync {
    /// Metadata-only request. Resolves to the status code of the asset.
    fn probe(&self, path: &str) -> BoxFuture<'static, Result<u16, SourceError>>;

    fn fetch(
        &self,
        path: &str,
        progress: Option<ProgressSender>,
    ) -> BoxFuture<'static, Result<Vec<u8>, SourceError>>;
}

fn report(progress: &Option<ProgressSender>, loaded: u64, total: Option<u64>) {
    if let Some(progress) = progress {
        // Nobody listening any more.
        let _ = progress.send(LoadProgress { loaded, total });
    }
}
