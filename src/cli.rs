// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobguard`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "jobguard",
    version,
    about = "Run a command with lifecycle hooks, logging, overlap protection and timeouts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a TOML config file.
    ///
    /// Default: `/etc/jobguard/jobguard.toml` when it exists.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Arbitrary tag of the job.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Directory to run the command in.
    #[arg(short, long, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,

    /// Set custom environment variables, e.g. `-e KEY=VALUE`.
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Suppress echoing the command's stdout.
    #[arg(short, long)]
    pub quiet: bool,

    /// Pre handler (runs before the command starts).
    #[arg(long, value_name = "HANDLER")]
    pub pre: Vec<String>,

    #[arg(long, value_name = "HANDLER")]
    pub pre_async: Vec<String>,

    /// Notice handler (runs while the command is running).
    #[arg(long, value_name = "HANDLER")]
    pub notice: Vec<String>,

    #[arg(long, value_name = "HANDLER")]
    pub notice_async: Vec<String>,

    /// Success handler.
    #[arg(long, value_name = "HANDLER")]
    pub success: Vec<String>,

    #[arg(long, value_name = "HANDLER")]
    pub success_async: Vec<String>,

    /// Failure handler.
    #[arg(long, value_name = "HANDLER")]
    pub failure: Vec<String>,

    #[arg(long, value_name = "HANDLER")]
    pub failure_async: Vec<String>,

    /// Post handler (always runs last).
    #[arg(long, value_name = "HANDLER")]
    pub post: Vec<String>,

    #[arg(long, value_name = "HANDLER")]
    pub post_async: Vec<String>,

    /// File to append merged output to. Accepts strftime patterns.
    #[arg(long, value_name = "PATTERN")]
    pub log_file: Option<String>,

    /// Per-line prefix for the log file (`%timestamp`, `%ts`, `%tag`, `%t`).
    #[arg(long, value_name = "TEMPLATE")]
    pub log_prefix: Option<String>,

    /// Run the command as this user (requires root).
    #[arg(short, long)]
    pub user: Option<String>,

    /// Run the command with this group (requires root).
    #[arg(short, long)]
    pub group: Option<String>,

    /// Refuse to start while another run of the same job holds the lock.
    #[arg(long)]
    pub without_overlapping: bool,

    /// Explicit lock identity for `--without-overlapping`.
    #[arg(long, value_name = "ID")]
    pub mutex: Option<String>,

    /// Directory for lock files.
    #[arg(long, value_name = "DIR")]
    pub mutexdir: Option<PathBuf>,

    /// Kill the command after this many seconds (0 = no limit).
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBGUARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
