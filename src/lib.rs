// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod guard;
pub mod hooks;
pub mod logging;
pub mod output;
pub mod report;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{build_job_config, load_config};
use crate::engine::JobEngine;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config file loading and CLI merging
/// - the job engine with the process handler backend
///
/// Returns the exit code for the supervisor process. Configuration
/// problems are returned as errors; everything after that is folded into
/// the exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let file = load_config(args.config_file.as_deref())?;
    let job = build_job_config(file, &args)?;
    debug!(command = ?job.command_args, tag = ?job.tag, "resolved job configuration");

    let engine = JobEngine::new(job);
    let outcome = engine.run().await;

    if let Some(err) = &outcome.error {
        eprintln!("jobguard: {err}");
    }

    Ok(outcome.exit_code)
}
