// src/config/mod.rs

//! Configuration for jobguard.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`) and the resolved job
//!   input consumed by the engine (`job.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Merge CLI flags over the file (`build.rs`) and validate (`validate.rs`).
//! - Resolve user/group names (`identity.rs`).

pub mod build;
pub mod identity;
pub mod job;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_job_config;
pub use job::{JobConfig, OverlapGuardConfig, RunAs, default_lock_dir};
pub use loader::{default_config_path, load_config, load_from_path};
pub use model::RawConfigFile;
pub use validate::{parse_environment, validate_job_config};
