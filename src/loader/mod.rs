pub mod cpu;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{BackendDescriptor, BackendKind, DomainError, FallbackChain};

pub use cpu::{CpuBackendHandle, CpuBackendProvider};

/// Failure while preparing one backend candidate.
///
/// Local to the loader: the fallback walk consumes these, so callers of
/// `load_with_fallback` never see them.
#[derive(Debug, Clone, Error)]
pub enum LoadFailure {
    /// The implementation could not be acquired (runtime or file missing).
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Acquired, but the lightweight self-test failed.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// A loaded, self-tested backend instance.
pub trait BackendHandle: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Lightweight smoke check that the acquired runtime actually works.
    fn self_test(&self) -> Result<(), String>;
}

/// Source of backend instances for one `BackendKind`.
///
/// Providers are registered at startup; there is no dynamic discovery at
/// load time. Availability is decided inside `acquire`.
pub trait BackendProvider: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn acquire(
        &self,
        descriptor: &BackendDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, LoadFailure>;
}

/// Capability registry: which backends this process can load.
///
/// The CPU provider is always present; constructors that forget it would
/// break the totality guarantee of the fallback walk, so `new` installs
/// it unconditionally.
pub struct BackendRegistry {
    providers: HashMap<BackendKind, Arc<dyn BackendProvider>>,
}

impl BackendRegistry {
    /// Registry with the built-in CPU provider.
    pub fn new() -> Self {
        let mut providers: HashMap<BackendKind, Arc<dyn BackendProvider>> = HashMap::new();
        providers.insert(BackendKind::Cpu, Arc::new(CpuBackendProvider::new()));
        Self { providers }
    }

    /// Register a provider, replacing any previous one for the same kind.
    pub fn register(&mut self, provider: Arc<dyn BackendProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Builder-style registration.
    pub fn with_provider(mut self, provider: Arc<dyn BackendProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Backend kinds this registry can load.
    pub fn available_kinds(&self) -> Vec<BackendKind> {
        self.providers.keys().copied().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Record of one candidate tried during a fallback walk.
#[derive(Debug, Clone)]
pub struct LoadAttempt {
    pub backend: BackendKind,
    pub display_name: String,
    pub outcome: Result<(), LoadFailure>,
}

impl LoadAttempt {
    fn succeeded(candidate: &BackendDescriptor) -> Self {
        Self {
            backend: candidate.backend,
            display_name: candidate.display_name.clone(),
            outcome: Ok(()),
        }
    }

    fn failed(candidate: &BackendDescriptor, failure: LoadFailure) -> Self {
        Self {
            backend: candidate.backend,
            display_name: candidate.display_name.clone(),
            outcome: Err(failure),
        }
    }
}

/// Result of a successful fallback walk: the handle, the descriptor that
/// actually loaded, and every attempt made along the way.
pub struct LoadedBackend {
    pub handle: Arc<dyn BackendHandle>,
    pub descriptor: BackendDescriptor,
    pub attempts: Vec<LoadAttempt>,
}

/// Loads backends from the registry: lookup, acquire, self-test, then
/// environment configuration strictly before the handle is handed out.
pub struct BackendLoader {
    registry: BackendRegistry,
}

impl BackendLoader {
    pub fn new(registry: BackendRegistry) -> Self {
        Self { registry }
    }

    /// Load a single descriptor, surfacing the failure kind.
    pub fn load(
        &self,
        descriptor: &BackendDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, DomainError> {
        self.try_load(descriptor).map_err(|failure| match failure {
            LoadFailure::Unavailable(reason) => DomainError::BackendUnavailable {
                backend: descriptor.backend,
                reason,
            },
            LoadFailure::Validation(reason) => DomainError::BackendValidationFailed {
                backend: descriptor.backend,
                reason,
            },
        })
    }

    /// Try candidates in order and return the first that loads.
    ///
    /// Both failure kinds are caught and recorded; with a well-formed
    /// chain (CPU last) this cannot fail, since CPU acquisition is
    /// defined to succeed. An exhausted chain therefore signals a
    /// mis-built registry, reported as `SelectionExhausted`.
    pub fn load_with_fallback(&self, chain: &FallbackChain) -> Result<LoadedBackend, DomainError> {
        let mut attempts: Vec<LoadAttempt> = Vec::new();

        for candidate in chain.candidates() {
            match self.try_load(candidate) {
                Ok(handle) => {
                    let mut descriptor = candidate.clone();
                    if !attempts.is_empty() && descriptor.fallback_reason.is_none() {
                        let skipped: Vec<String> = attempts
                            .iter()
                            .map(|a| format!("{} ({})", a.display_name, a.backend))
                            .collect();
                        descriptor.fallback_reason =
                            Some(format!("failed to load: {}", skipped.join(", ")));
                    }
                    info!(
                        backend = %descriptor.backend,
                        display_name = %descriptor.display_name,
                        attempts = attempts.len() + 1,
                        "Backend loaded"
                    );
                    attempts.push(LoadAttempt::succeeded(candidate));
                    return Ok(LoadedBackend {
                        handle,
                        descriptor,
                        attempts,
                    });
                }
                Err(failure) => {
                    warn!(
                        backend = %candidate.backend,
                        display_name = %candidate.display_name,
                        error = %failure,
                        "Backend candidate failed, trying next"
                    );
                    attempts.push(LoadAttempt::failed(candidate, failure));
                }
            }
        }

        Err(DomainError::SelectionExhausted(format!(
            "fallback chain exhausted after {} candidates",
            attempts.len()
        )))
    }

    fn try_load(
        &self,
        descriptor: &BackendDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, LoadFailure> {
        let provider = self.registry.get(descriptor.backend).ok_or_else(|| {
            LoadFailure::Unavailable(format!(
                "no provider registered for {}",
                descriptor.backend
            ))
        })?;
        let handle = provider.acquire(descriptor)?;
        handle.self_test().map_err(LoadFailure::Validation)?;
        apply_environment(descriptor);
        Ok(handle)
    }
}

/// Configure the process environment for the chosen backend.
///
/// Runs strictly before the handle is returned so the engine, whenever
/// it starts, observes the device binding.
fn apply_environment(descriptor: &BackendDescriptor) {
    let index = descriptor
        .device
        .as_ref()
        .map(|d| device_index(&d.device_id))
        .unwrap_or_else(|| "0".to_string());

    match descriptor.backend {
        BackendKind::OpenVino => {
            std::env::set_var("WHISPER_OPENVINO_DEVICE", "GPU");
            debug!(device = "GPU", "Applied OpenVINO environment");
        }
        BackendKind::Cuda => {
            std::env::set_var("CUDA_VISIBLE_DEVICES", &index);
            debug!(index = %index, "Applied CUDA environment");
        }
        BackendKind::Vulkan => {
            std::env::set_var("GGML_VK_VISIBLE_DEVICES", &index);
            debug!(index = %index, "Applied Vulkan environment");
        }
        BackendKind::Cpu => {}
    }
}

/// Trailing numeric suffix of an enumeration id ("gpu-1" -> "1"),
/// defaulting to "0" when the id carries none.
fn device_index(device_id: &str) -> String {
    let digits: String = device_id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits
    }
}
