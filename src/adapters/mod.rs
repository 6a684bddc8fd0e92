pub mod artifact_writer;
pub mod device_enumerator;
pub mod media_probe;
pub mod recovery;
pub mod settings_store;

pub use artifact_writer::FsArtifactWriter;
pub use device_enumerator::StaticDeviceEnumerator;
pub use media_probe::WavMediaProbe;
pub use recovery::DiagnosticRecovery;
pub use settings_store::TomlSettingsStore;
