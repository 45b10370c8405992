use std::{
    fmt::{self, Debug, Formatter},
    future::Future,
    io,
    sync::Arc,
};

use log::warn;
use tokio::{
    runtime::{Builder, Handle, Runtime},
    sync::oneshot::{self, error::TryRecvError},
};

struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        // Blocking fetches may still be running; don't wait for them.
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Runs probes, fetches and parsing off the frame thread.
///
/// Work handed to [`Dispatcher::spawn`] runs on a tokio runtime. Its result
/// comes back through a [`Pending`] that the frame thread polls, so nothing
/// touches scene state outside the frame loop.
#[derive(Clone)]
pub struct Dispatcher {
    handle: Handle,
    _runtime: Option<Arc<OwnedRuntime>>,
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("owns_runtime", &self._runtime.is_some())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with its own runtime.
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("panorama-io")
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            _runtime: Some(Arc::new(OwnedRuntime(Some(runtime)))),
        })
    }

    /// Create a dispatcher spawning onto an existing runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    pub fn spawn<T, F>(&self, future: F) -> Pending<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        self.handle.spawn(async move {
            // The receiver is gone when its owner was dropped, nothing to do.
            let _ = result_tx.send(future.await);
        });
        Pending { result_rx }
    }
}

/// The pending operation ended without delivering a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

/// Result of work spawned by a [`Dispatcher`], collected by polling.
#[derive(Debug)]
pub struct Pending<T> {
    result_rx: oneshot::Receiver<T>,
}

impl<T> Pending<T> {
    /// Take the result if the work has finished.
    ///
    /// Returns `None` while it is still running. Once this returned
    /// `Some`, the pending value is spent and should be dropped.
    pub fn try_take(&mut self) -> Option<Result<T, Canceled>> {
        match self.result_rx.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                warn!("Pending task ended without a result");
                Some(Err(Canceled))
            }
        }
    }
}

/// Poll every pending entry of `pending`, removing and returning those that
/// finished, in completion order of the scan.
pub(crate) fn take_finished<E, T>(
    pending: &mut Vec<E>,
    mut task: impl FnMut(&mut E) -> &mut Pending<T>,
) -> Vec<(E, Result<T, Canceled>)> {
    let mut finished = Vec::new();
    let mut index = 0;
    while index < pending.len() {
        match task(&mut pending[index]).try_take() {
            Some(result) => {
                let entry = pending.remove(index);
                finished.push((entry, result));
            }
            None => index += 1,
        }
    }
    finished
}
