#![allow(dead_code)]

use std::path::Path;

use jobguard::config::{JobConfig, OverlapGuardConfig};
use jobguard::hooks::HandlerCategory;

/// Builder for `JobConfig` to simplify test setup.
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(args: &[&str]) -> Self {
        Self {
            config: JobConfig {
                command_args: args.iter().map(|a| a.to_string()).collect(),
                ..JobConfig::default()
            },
        }
    }

    /// Shorthand for `sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new(&["sh", "-c", script])
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.config.tag = Some(tag.to_string());
        self
    }

    pub fn working_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.config.quiet = true;
        self
    }

    /// Append a synchronous handler to `category`.
    pub fn handler(mut self, category: HandlerCategory, command: &str) -> Self {
        self.config
            .hooks
            .get_mut(category)
            .sync_handlers
            .push(command.to_string());
        self
    }

    /// Append an asynchronous handler to `category`.
    pub fn async_handler(mut self, category: HandlerCategory, command: &str) -> Self {
        self.config
            .hooks
            .get_mut(category)
            .async_handlers
            .push(command.to_string());
        self
    }

    pub fn log_file(mut self, pattern: impl AsRef<Path>) -> Self {
        self.config.log_file = Some(pattern.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn log_prefix(mut self, template: &str) -> Self {
        self.config.log_prefix = Some(template.to_string());
        self
    }

    /// Enable the overlap guard with lock files under `dir`.
    pub fn without_overlapping(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.overlap_guard = Some(OverlapGuardConfig::new(dir.as_ref()));
        self
    }

    /// Explicit lock identity; enable the guard first.
    pub fn mutex(mut self, id: &str) -> Self {
        if let Some(guard) = self.config.overlap_guard.as_mut() {
            guard.explicit_id = Some(id.to_string());
        }
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.timeout_seconds = Some(secs);
        self
    }

    pub fn build(self) -> JobConfig {
        self.config
    }
}
