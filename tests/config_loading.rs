// tests/config_loading.rs

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;

use jobguard::cli::{CliArgs, LogLevel};
use jobguard::config::identity::resolve_run_as;
use jobguard::config::{
    RawConfigFile, build_job_config, default_lock_dir, load_config, load_from_path,
    parse_environment,
};
use jobguard::errors::JobError;
use jobguard::logging::resolve_level;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn cli(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("jobguard").chain(args.iter().copied())).unwrap()
}

#[test]
fn toml_file_is_parsed() {
    let file = write_config(
        r#"
tag = "backup"
quiet = true
log_file = "/var/log/backup-%Y%m%d.log"
log_prefix = "%ts [%tag] "
environments = ["PATH=/usr/bin:/bin", "MODE=full"]
pre = ["echo pre"]
failure_async = ["notify-slack"]
without_overlapping = true
mutex = "backup"
mutexdir = "/var/lock/jobguard"
timeout = 3600
"#,
    );

    let raw = load_from_path(file.path()).unwrap();
    assert_eq!(raw.tag.as_deref(), Some("backup"));
    assert!(raw.quiet);
    assert_eq!(raw.pre, vec!["echo pre"]);
    assert_eq!(raw.failure_async, vec!["notify-slack"]);
    assert!(raw.post.is_empty());
    assert_eq!(raw.environments.len(), 2);
    assert!(raw.without_overlapping);
    assert_eq!(raw.mutexdir, Some(PathBuf::from("/var/lock/jobguard")));
    assert_eq!(raw.timeout, Some(3600));
}

#[test]
fn malformed_toml_is_an_error() {
    let file = write_config("tag = [unterminated");
    assert!(matches!(
        load_from_path(file.path()),
        Err(JobError::TomlError(_))
    ));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = load_config(Some(std::path::Path::new("/nonexistent/jobguard.toml"))).unwrap_err();
    assert!(err.to_string().contains("failed to open file: /nonexistent/jobguard.toml"));
}

#[test]
fn environment_entries_split_at_first_equals() {
    let env = parse_environment(&["A=1".to_string(), "B=x=y".to_string(), "A=2".to_string()])
        .unwrap();
    let expected: BTreeMap<String, String> = [("A", "2"), ("B", "x=y")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(env, expected);

    let err = parse_environment(&["NOPE".to_string()]).unwrap_err();
    assert!(err.to_string().contains("must be 'KEY=VALUE'"));

    assert!(parse_environment(&["=value".to_string()]).is_err());
}

#[test]
fn cli_takes_trailing_command_verbatim() {
    let args = cli(&["-q", "--timeout", "5", "echo", "-n", "hi"]);
    assert!(args.quiet);
    assert_eq!(args.timeout, Some(5));
    assert_eq!(args.command, vec!["echo", "-n", "hi"]);
}

#[test]
fn cli_overrides_scalars_and_appends_lists() {
    let file = RawConfigFile {
        tag: Some("file-tag".to_string()),
        post: vec!["file-post".to_string()],
        environments: vec!["A=1".to_string(), "B=1".to_string()],
        timeout: Some(10),
        mutexdir: Some(PathBuf::from("/var/lock/jobguard")),
        ..RawConfigFile::default()
    };
    let args = cli(&[
        "-t",
        "cli-tag",
        "--post",
        "cli-post",
        "--post-async",
        "cli-post-async",
        "-e",
        "B=2",
        "--timeout",
        "30",
        "--without-overlapping",
        "--mutex",
        "m1",
        "--",
        "sh",
        "-c",
        "exit 3",
    ]);

    let job = build_job_config(file, &args).unwrap();

    assert_eq!(job.command_args, vec!["sh", "-c", "exit 3"]);
    assert_eq!(job.tag.as_deref(), Some("cli-tag"));
    assert_eq!(job.hooks.post.sync_handlers, vec!["file-post", "cli-post"]);
    assert_eq!(job.hooks.post.async_handlers, vec!["cli-post-async"]);
    assert_eq!(job.hooks.post.len(), 3);
    assert!(job.hooks.pre.is_empty());
    assert_eq!(job.environment.get("A").map(String::as_str), Some("1"));
    assert_eq!(job.environment.get("B").map(String::as_str), Some("2"));
    assert_eq!(job.timeout_seconds, Some(30));

    let guard = job.overlap_guard().unwrap();
    assert_eq!(guard.explicit_id.as_deref(), Some("m1"));
    assert_eq!(guard.directory, PathBuf::from("/var/lock/jobguard"));
}

#[test]
fn overlap_guard_defaults_to_temp_dir() {
    let job = build_job_config(
        RawConfigFile::default(),
        &cli(&["--without-overlapping", "true"]),
    )
    .unwrap();
    assert_eq!(job.overlap_guard().unwrap().directory, default_lock_dir());

    let unguarded = build_job_config(RawConfigFile::default(), &cli(&["true"])).unwrap();
    assert!(unguarded.overlap_guard().is_none());
}

#[test]
fn invalid_mutex_id_is_rejected() {
    let err = build_job_config(
        RawConfigFile::default(),
        &cli(&["--without-overlapping", "--mutex", "a/b", "true"]),
    )
    .unwrap_err();
    assert!(matches!(err, JobError::ConfigError(_)));
}

#[test]
fn user_and_group_resolution() {
    let root = resolve_run_as(Some("0"), None).unwrap();
    assert_eq!(root.uid, Some(0));
    assert_eq!(root.gid, Some(0));

    let by_group = resolve_run_as(None, Some("0")).unwrap();
    assert_eq!(by_group.uid, None);
    assert_eq!(by_group.gid, Some(0));

    assert!(resolve_run_as(None, None).unwrap().is_empty());
    assert!(resolve_run_as(Some("jobguard-no-such-user"), None).is_err());
}

#[test]
fn log_level_priority() {
    assert_eq!(resolve_level(Some(LogLevel::Error), Some("debug")), tracing::Level::ERROR);
    assert_eq!(resolve_level(None, Some("debug")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some("bogus")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, None), tracing::Level::WARN);
}
