use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use futures::{future::BoxFuture, FutureExt};
use log::debug;
use tokio::{fs::File, io::AsyncReadExt};

use crate::error::SourceError;

use super::{report, AssetSource, ProgressSender, STATUS_NOT_FOUND, STATUS_OK};

const READ_CHUNK: usize = 64 * 1024;

/// Serves asset paths from a local directory, `path` being relative to `root`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Map an asset path below the root. Paths escaping the root resolve to
    /// nothing.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }
}

impl AssetSource for DirectorySource {
    fn probe(&self, path: &str) -> BoxFuture<'static, Result<u16, SourceError>> {
        let resolved = self.resolve(path);
        async move {
            let Some(resolved) = resolved else {
                return Ok(STATUS_NOT_FOUND);
            };
            match tokio::fs::metadata(&resolved).await {
                Ok(metadata) if metadata.is_file() => Ok(STATUS_OK),
                Ok(_) => Ok(STATUS_NOT_FOUND),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(STATUS_NOT_FOUND),
                Err(error) => Err(error.into()),
            }
        }
        .boxed()
    }

    fn fetch(
        &self,
        path: &str,
        progress: Option<ProgressSender>,
    ) -> BoxFuture<'static, Result<Vec<u8>, SourceError>> {
        let resolved = self.resolve(path);
        let path = path.to_string();
        async move {
            let resolved = resolved.ok_or_else(|| SourceError::NotFound(path.clone()))?;
            let mut file = match File::open(&resolved).await {
                Ok(file) => file,
                Err(error) if error.kind() == ErrorKind::NotFound => {
                    return Err(SourceError::NotFound(path))
                }
                Err(error) => return Err(error.into()),
            };
            let total = file.metadata().await.ok().map(|metadata| metadata.len());

            let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                let read = file.read(&mut chunk).await?;
                if read == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..read]);
                report(&progress, data.len() as u64, total);
            }
            debug!("Read {} bytes from {}", data.len(), resolved.display());
            Ok(data)
        }
        .boxed()
    }
}
