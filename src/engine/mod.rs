// src/engine/mod.rs

//! Job engine for jobguard.
//!
//! This module owns one run of the wrapped command:
//! - preparing the environment table, log file and overlap lock
//! - spawning the child and draining its output
//! - racing completion against the optional timeout
//! - finalizing the report and firing lifecycle handlers in order
//!
//! The state machine itself lives in [`runner`]; this file holds the types
//! shared with callers.

use std::fmt;

use crate::errors::JobError;
use crate::report::Report;

pub mod runner;

pub use runner::JobEngine;

/// Phases of a run, in the order the engine moves through them.
///
/// Used for structured logging only; error paths skip ahead to the
/// outcome phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    PreparingResources,
    LockAcquisition,
    Spawning,
    Running,
    Completing,
    Finalizing,
    Outcome,
    Releasing,
    Done,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Init => "init",
            RunPhase::PreparingResources => "preparing-resources",
            RunPhase::LockAcquisition => "lock-acquisition",
            RunPhase::Spawning => "spawning",
            RunPhase::Running => "running",
            RunPhase::Completing => "completing",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Outcome => "outcome",
            RunPhase::Releasing => "releasing",
            RunPhase::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`JobEngine::run`].
#[derive(Debug)]
pub struct JobRun {
    /// The final report (or the sentinel report for runs that never started).
    pub report: Report,
    /// Set only when the engine could not attempt the command at all.
    pub error: Option<JobError>,
    /// Exit code for the supervisor process itself.
    pub exit_code: i32,
}

impl JobRun {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.report.succeeded()
    }
}
