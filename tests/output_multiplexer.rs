// tests/output_multiplexer.rs

mod common;

use std::io::Write;

use chrono::{DateTime, Local, TimeZone};

use jobguard::output::{
    LinePrefixer, LogSink, OutputMultiplexer, PrefixTemplate, Stream, expand_log_path,
};

use crate::common::SharedBuffer;

fn prefixed(template: &str, tag: Option<&str>, chunks: &[&str]) -> String {
    let mut writer = LinePrefixer::new(Vec::new(), PrefixTemplate::new(template, tag));
    for chunk in chunks {
        writer.write_all(chunk.as_bytes()).unwrap();
    }
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn prefix_is_inserted_before_every_line() {
    assert_eq!(prefixed("[%tag] ", Some("x"), &["a\nb\n"]), "[x] a\n[x] b\n");
}

#[test]
fn prefix_survives_lines_split_across_writes() {
    assert_eq!(
        prefixed("[%t] ", Some("x"), &["a", "b\nc", "\n", "d"]),
        "[x] ab\n[x] c\n[x] d"
    );
}

#[test]
fn missing_tag_expands_to_empty() {
    assert_eq!(prefixed("<%tag>", None, &["line\n"]), "<>line\n");
}

#[test]
fn timestamp_placeholder_is_rfc3339_with_millis() {
    let template = PrefixTemplate::new("%timestamp|%ts", None);
    let expanded = template.expand();
    let (long, short) = expanded.split_once('|').unwrap();

    for stamp in [long, short] {
        let parsed = DateTime::parse_from_rfc3339(stamp).unwrap();
        let fraction = stamp.split_once('.').unwrap().1;
        assert_eq!(fraction.chars().take_while(|c| c.is_ascii_digit()).count(), 3);
        assert!(parsed.timestamp() > 0);
    }
}

#[test]
fn log_path_pattern_expands_against_start_time() {
    let at = Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
    let path = expand_log_path("/var/log/job-%Y%m%d.log", at).unwrap();
    assert_eq!(path.to_str(), Some("/var/log/job-20240305.log"));

    let plain = expand_log_path("/var/log/job.log", at).unwrap();
    assert_eq!(plain.to_str(), Some("/var/log/job.log"));

    assert!(expand_log_path("/var/log/job-%", at).is_err());
}

#[test]
fn multiplexer_captures_and_fans_out() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("job.log");
    let log = LogSink::open(
        log_path.to_str().unwrap(),
        Local::now(),
        Some(PrefixTemplate::new("[%tag] ", Some("job"))),
    )
    .unwrap();

    let stdout = SharedBuffer::new();
    let stderr = SharedBuffer::new();
    let mux = OutputMultiplexer::new(stdout.writer(), stderr.writer(), Some(&log));

    let mut out = mux.stream_writer(Stream::Stdout);
    let mut err = mux.stream_writer(Stream::Stderr);
    out.write_all(b"out\n").unwrap();
    err.write_all(b"err\n").unwrap();
    out.write_all(b"more\n").unwrap();

    let captured = mux.captured();
    assert_eq!(captured.stdout, "out\nmore\n");
    assert_eq!(captured.stderr, "err\n");
    assert_eq!(captured.output, "out\nerr\nmore\n");

    assert_eq!(stdout.contents(), "out\nmore\n");
    assert_eq!(stderr.contents(), "err\n");

    let logged = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(logged, "[job] out\n[job] err\n[job] more\n");
    assert_eq!(log.path(), &log_path);
}

#[test]
fn live_writers_do_not_capture() {
    let stdout = SharedBuffer::new();
    let mux = OutputMultiplexer::new(stdout.writer(), SharedBuffer::new().writer(), None);

    let mut live = mux.stdout();
    live.write_all(b"handler output\n").unwrap();

    assert_eq!(stdout.contents(), "handler output\n");
    assert_eq!(mux.captured().output, "");
}

#[tokio::test]
async fn drain_copies_until_eof() {
    let (mut tx, rx) = tokio::io::duplex(16);
    let sink = SharedBuffer::new();

    let writer = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        tx.write_all(b"0123456789abcdefghijklmnopqrstuvwxyz").await.unwrap();
    });

    let copied = jobguard::output::drain(rx, sink.writer()).await.unwrap();
    writer.await.unwrap();

    assert_eq!(copied, 36);
    assert_eq!(sink.contents(), "0123456789abcdefghijklmnopqrstuvwxyz");
}
