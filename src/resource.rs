// ResourceArc wrapper for the streaming scanner
//
// This allows the streaming scanner state to persist across NIF calls.

use crate::core::{ConfigError, ParserConfig, Projection};
use crate::strategy::StreamingScanner;
use rustler::{Error, NifResult, ResourceArc};
use std::sync::{Mutex, MutexGuard};

/// Wrapper for StreamingScanner that can be stored in a ResourceArc
pub struct StreamingScannerResource {
    pub inner: Mutex<StreamingScanner<Projection>>,
}

impl StreamingScannerResource {
    pub fn new(config: ParserConfig, projection: Projection) -> Result<Self, ConfigError> {
        Ok(StreamingScannerResource {
            inner: Mutex::new(StreamingScanner::new(config, projection)?),
        })
    }

    /// Lock the scanner; raises `:scanner_poisoned` if an earlier call panicked.
    pub fn lock(&self) -> NifResult<MutexGuard<'_, StreamingScanner<Projection>>> {
        self.inner
            .lock()
            .map_err(|_| Error::RaiseAtom("scanner_poisoned"))
    }
}

/// Type alias for the ResourceArc
pub type StreamingScannerRef = ResourceArc<StreamingScannerResource>;
