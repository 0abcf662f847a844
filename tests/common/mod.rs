#![allow(dead_code)]

use std::sync::Arc;

use jobguard::config::JobConfig;
use jobguard::engine::JobEngine;

pub use jobguard_test_utils::{
    JobConfigBuilder, RecordingBackend, SharedBuffer, init_tracing, with_timeout,
};

/// Console doubles handed to an engine under test.
#[derive(Debug, Clone, Default)]
pub struct Console {
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

/// Engine with real handler processes and captured console output.
pub fn engine(config: JobConfig) -> (JobEngine, Console) {
    let console = Console::default();
    let engine = JobEngine::new(config)
        .with_console(console.stdout.writer(), console.stderr.writer());
    (engine, console)
}

/// Engine whose handlers are recorded instead of spawned.
pub fn recording_engine(config: JobConfig) -> (JobEngine, Console, RecordingBackend) {
    recording_engine_with(config, RecordingBackend::new())
}

pub fn recording_engine_with(
    config: JobConfig,
    backend: RecordingBackend,
) -> (JobEngine, Console, RecordingBackend) {
    let (engine, console) = engine(config);
    let engine = engine.with_backend(Arc::new(backend.clone()));
    (engine, console, backend)
}

pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
