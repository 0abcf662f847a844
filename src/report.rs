// src/report.rs

//! The structured record of one run.
//!
//! A `Report` is created at the start of a run, filled in by the engine as
//! the run progresses, and serialized to JSON for every handler invocation.
//! Optional fields stay absent from the JSON until they are known.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use shell_escape::unix::escape;

use crate::errors::Result;

/// Exit code held by a report whose command has not (yet) produced one.
pub const EXIT_CODE_NOT_RUN: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub command: String,
    pub command_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub exit_code: i32,
    #[serde(default)]
    pub signaled: bool,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_time: Option<f64>,
}

impl Report {
    /// Fresh in-flight report for the given argv.
    pub fn new(command_args: &[String], tag: Option<String>) -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            command: quote_command(command_args),
            command_args: command_args.to_vec(),
            tag: tag.filter(|t| !t.is_empty()),
            output: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: EXIT_CODE_NOT_RUN,
            signaled: false,
            result: String::new(),
            hostname,
            pid: None,
            start_at: None,
            end_at: None,
            user_time: None,
            system_time: None,
        }
    }

    /// True once the command ran and exited cleanly with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.signaled
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Re-quote an argv so it can be pasted back into a POSIX shell.
pub fn quote_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| escape(arg.as_str().into()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
