// tests/engine_timeout.rs

mod common;

use std::time::{Duration, Instant};

use jobguard::hooks::HandlerCategory::{Failure, Post, Success};

use crate::common::{JobConfigBuilder, init_tracing, recording_engine, with_timeout};

/// Bound on a run configured with a 1 second timeout.
const SETTLE: Duration = Duration::from_secs(4);

#[tokio::test]
async fn timeout_kills_a_long_running_command() {
    init_tracing();
    let config = JobConfigBuilder::new(&["sleep", "10"])
        .timeout(1)
        .handler(Success, "success-hook")
        .handler(Failure, "failure-hook")
        .handler(Post, "post-hook")
        .build();
    let (engine, console, backend) = recording_engine(config);

    let started = Instant::now();
    let run = with_timeout(SETTLE, engine.run()).await;
    assert!(started.elapsed() >= Duration::from_secs(1));

    let report = &run.report;
    assert_eq!(report.exit_code, 137);
    assert!(report.signaled);
    assert_eq!(report.result, "terminated the command: it ran longer than 1 sec");
    assert!(report.end_at.is_some());
    assert_eq!(run.exit_code, 137);
    assert!(run.error.is_none());

    assert!(
        console
            .stderr
            .contents()
            .contains("terminated the command: it ran longer than 1 sec")
    );

    assert!(backend.calls_for(Success).is_empty());
    for call in backend.calls() {
        assert_eq!(call.timeout_marker().as_deref(), Some("1"));
        assert_eq!(call.report.exit_code, 137);
    }
    assert_eq!(backend.commands(), vec!["failure-hook", "post-hook"]);
}

#[tokio::test]
async fn output_before_the_timeout_is_kept() {
    init_tracing();
    let config = JobConfigBuilder::shell("echo started; exec sleep 10")
        .timeout(1)
        .build();
    let (engine, _console, _backend) = recording_engine(config);

    let run = with_timeout(SETTLE, engine.run()).await;

    assert_eq!(run.report.stdout, "started\n");
    assert!(run.report.signaled);
}

#[tokio::test]
async fn timeout_kills_descendants_of_the_command() {
    init_tracing();
    let config = JobConfigBuilder::shell("sleep 6; echo done")
        .timeout(1)
        .handler(Failure, "failure-hook")
        .build();
    let (engine, _console, backend) = recording_engine(config);

    let run = with_timeout(SETTLE, engine.run()).await;

    let report = &run.report;
    assert_eq!(report.result, "terminated the command: it ran longer than 1 sec");
    assert!(report.signaled);
    assert_eq!(report.exit_code, 137);
    assert!(!report.stdout.contains("done"));
    assert_eq!(backend.commands(), vec!["failure-hook"]);
}

#[tokio::test]
async fn background_process_holding_output_still_times_out() {
    init_tracing();
    let config = JobConfigBuilder::shell("sleep 6 & echo hi")
        .timeout(1)
        .handler(Success, "success-hook")
        .handler(Failure, "failure-hook")
        .handler(Post, "post-hook")
        .build();
    let (engine, console, backend) = recording_engine(config);

    let started = Instant::now();
    let run = with_timeout(SETTLE, engine.run()).await;
    assert!(started.elapsed() >= Duration::from_secs(1));

    let report = &run.report;
    assert_eq!(report.stdout, "hi\n");
    assert_eq!(report.result, "terminated the command: it ran longer than 1 sec");
    assert!(report.end_at.is_some());
    assert_ne!(run.exit_code, 0);
    assert!(run.error.is_none());
    assert!(
        console
            .stderr
            .contents()
            .contains("terminated the command: it ran longer than 1 sec")
    );

    assert_eq!(backend.commands(), vec!["failure-hook", "post-hook"]);
    for call in backend.calls() {
        assert_eq!(call.timeout_marker().as_deref(), Some("1"));
    }
}

#[tokio::test]
async fn fast_command_is_unaffected_by_timeout() {
    init_tracing();
    let config = JobConfigBuilder::new(&["true"])
        .timeout(5)
        .handler(Success, "success-hook")
        .build();
    let (engine, _console, backend) = recording_engine(config);

    let run = with_timeout(SETTLE, engine.run()).await;

    assert_eq!(run.report.exit_code, 0);
    assert_eq!(run.exit_code, 0);
    assert_eq!(run.report.result, "command exited with code: 0");
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].timeout_marker(), None);
}

#[test]
fn zero_timeout_means_unbounded() {
    let config = JobConfigBuilder::new(&["true"]).timeout(0).build();
    assert_eq!(config.timeout(), None);

    let config = JobConfigBuilder::new(&["true"]).timeout(3).build();
    assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn killing_an_exited_group_is_not_an_error() {
    let mut child = tokio::process::Command::new("true")
        .process_group(0)
        .spawn()
        .unwrap();
    let pgid = child.id().unwrap();
    child.wait().await.unwrap();

    jobguard::exec::signal::kill_process_group(pgid).unwrap();
}
