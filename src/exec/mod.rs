// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `HandlerBackend` trait and the
//!   `ProcessHandlerBackend` used in production; tests replace it with a
//!   recording implementation.
//! - [`environment`] builds the explicit environment table handed to every
//!   subprocess.
//! - [`status`] normalises wait results into shell-style exit codes.
//! - [`rusage`] reads CPU accounting for reaped children.
//! - [`signal`] kills a timed-out command's process group.

pub mod backend;
pub mod environment;
pub mod rusage;
pub mod signal;
pub mod status;

pub use backend::{HandlerBackend, HandlerInvocation, ProcessHandlerBackend};
pub use environment::ChildEnvironment;
pub use status::ExitResolution;
