use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use futures::{future::BoxFuture, FutureExt};

use crate::error::SourceError;

use super::{report, AssetSource, ProgressSender, STATUS_NOT_FOUND, STATUS_OK};

#[derive(Debug, Default)]
struct Shared {
    files: Mutex<HashMap<String, Vec<u8>>>,
    probes: AtomicUsize,
    fetches: AtomicUsize,
}

/// Assets held in memory, keyed by full asset path.
///
/// Clones share their files and request counters.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    shared: Arc<Shared>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files().insert(path.to_string(), data.into());
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files().remove(path)
    }

    pub fn probe_count(&self) -> usize {
        self.shared.probes.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.shared.fetches.load(Ordering::SeqCst)
    }

    fn files(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.shared
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl AssetSource for MemorySource {
    fn probe(&self, path: &str) -> BoxFuture<'static, Result<u16, SourceError>> {
        self.shared.probes.fetch_add(1, Ordering::SeqCst);
        let status = if self.files().contains_key(path) {
            STATUS_OK
        } else {
            STATUS_NOT_FOUND
        };
        async move { Ok(status) }.boxed()
    }

    fn fetch(
        &self,
        path: &str,
        progress: Option<ProgressSender>,
    ) -> BoxFuture<'static, Result<Vec<u8>, SourceError>> {
        self.shared.fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.files().get(path).cloned();
        let path = path.to_string();
        async move {
            let data = data.ok_or(SourceError::NotFound(path))?;
            let total = data.len() as u64;
            report(&progress, total / 2, Some(total));
            report(&progress, total, Some(total));
            Ok(data)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn clones_share_files_and_counters() {
        let source = MemorySource::new();
        let clone = source.clone();
        clone.insert("/a.json", b"{}".to_vec());

        assert_eq!(block_on(source.probe("/a.json")).unwrap(), STATUS_OK);
        assert_eq!(block_on(source.probe("/b.json")).unwrap(), STATUS_NOT_FOUND);
        assert_eq!(block_on(source.fetch("/a.json", None)).unwrap(), b"{}");
        assert!(matches!(
            block_on(source.fetch("/b.json", None)),
            Err(SourceError::NotFound(_))
        ));
        assert_eq!(clone.probe_count(), 2);
        assert_eq!(clone.fetch_count(), 2);

        assert!(source.remove("/a.json").is_some());
        assert_eq!(block_on(clone.probe("/a.json")).unwrap(), STATUS_NOT_FOUND);
    }
}
