use std::sync::Arc;

use tracing::debug;

use crate::domain::{BackendDescriptor, BackendKind};

use super::{BackendHandle, BackendProvider, LoadFailure};

/// The terminal fallback backend.
///
/// CPU inference needs no runtime, no driver and no device, so acquiring
/// it is defined to always succeed. Every registry registers this
/// provider, which is what makes a well-formed fallback chain total.
pub struct CpuBackendProvider;

impl CpuBackendProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpuBackendProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendProvider for CpuBackendProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn acquire(
        &self,
        _descriptor: &BackendDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, LoadFailure> {
        let threads = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(1);
        debug!(threads, "Acquired CPU backend");
        Ok(Arc::new(CpuBackendHandle { threads }))
    }
}

/// Handle for plain CPU inference.
pub struct CpuBackendHandle {
    threads: u32,
}

impl CpuBackendHandle {
    /// Logical processors available to the engine.
    pub fn threads(&self) -> u32 {
        self.threads
    }
}

impl BackendHandle for CpuBackendHandle {
    fn backend(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn self_test(&self) -> Result<(), String> {
        // Nothing to probe; a machine that runs this code can run CPU
        // inference.
        Ok(())
    }
}
