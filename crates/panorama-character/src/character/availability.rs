use std::sync::Arc;

use log::{info, warn};

use crate::{
    dispatch::{take_finished, Dispatcher, Pending},
    error::SourceError,
    source::{AssetSource, STATUS_OK},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Available,
    /// Status other than 200.
    Status(u16),
    /// The probe never got a status.
    Failed(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

type Callback = Box<dyn FnOnce()>;

struct PendingCheck {
    probe: Pending<Result<u16, SourceError>>,
    on_available: Callback,
    on_unavailable: Callback,
}

/// Existence probe for the character bundle.
pub struct AssetAvailability {
    source: Arc<dyn AssetSource>,
    dispatcher: Dispatcher,
    path: String,
    checks: Vec<PendingCheck>,
}

impl std::fmt::Debug for AssetAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetAvailability")
            .field("path", &self.path)
            .field("pending", &self.checks.len())
            .finish()
    }
}

impl AssetAvailability {
    pub fn new(source: Arc<dyn AssetSource>, dispatcher: Dispatcher, path: String) -> Self {
        Self {
            source,
            dispatcher,
            path,
            checks: Vec::new(),
        }
    }

    /// Start one probe. Exactly one of the callbacks runs, from a later
    /// [`poll`](Self::poll) on this thread.
    pub fn check(
        &mut self,
        on_available: impl FnOnce() + 'static,
        on_unavailable: impl FnOnce() + 'static,
    ) {
        let probe = self.dispatcher.spawn(self.source.probe(&self.path));
        self.checks.push(PendingCheck {
            probe,
            on_available: Box::new(on_available),
            on_unavailable: Box::new(on_unavailable),
        });
    }

    pub fn is_pending(&self) -> bool {
        !self.checks.is_empty()
    }

    /// Run the callbacks of finished probes and return their outcomes.
    pub fn poll(&mut self) -> Vec<Availability> {
        take_finished(&mut self.checks, |check| &mut check.probe)
            .into_iter()
            .map(|(check, result)| {
                let availability = match result {
                    Ok(Ok(STATUS_OK)) => Availability::Available,
                    Ok(Ok(status)) => Availability::Status(status),
                    Ok(Err(error)) => Availability::Failed(error.to_string()),
                    Err(_) => Availability::Failed(SourceError::Aborted.to_string()),
                };
                if availability.is_available() {
                    info!("Character bundle {} is available", self.path);
                    (check.on_available)();
                } else {
                    warn!("Character bundle {} unavailable: {:?}", self.path, availability);
                    (check.on_unavailable)();
                }
                availability
            })
            .collect()
    }
}
