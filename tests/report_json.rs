// tests/report_json.rs

mod common;

use chrono::{Local, TimeZone};
use serde_json::{Value, json};

use jobguard::report::{EXIT_CODE_NOT_RUN, Report, quote_command};

use crate::common::args;

#[test]
fn fresh_report_omits_unknown_fields() {
    let report = Report::new(&args(&["echo", "hi"]), None);
    let value: Value = serde_json::from_slice(&report.to_json().unwrap()).unwrap();
    let obj = value.as_object().unwrap();

    assert_eq!(obj["command"], "echo hi");
    assert_eq!(obj["commandArgs"], json!(["echo", "hi"]));
    assert_eq!(obj["exitCode"], EXIT_CODE_NOT_RUN);
    assert_eq!(obj["signaled"], false);

    for key in ["output", "stdout", "stderr", "result", "hostname"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
    for key in ["tag", "pid", "startAt", "endAt", "userTime", "systemTime"] {
        assert!(!obj.contains_key(key), "{key} should be absent");
    }
}

#[test]
fn empty_tag_is_treated_as_unset() {
    let report = Report::new(&args(&["true"]), Some(String::new()));
    assert_eq!(report.tag, None);

    let tagged = Report::new(&args(&["true"]), Some("nightly".to_string()));
    assert_eq!(tagged.tag.as_deref(), Some("nightly"));
}

#[test]
fn populated_report_round_trips() {
    let mut report = Report::new(&args(&["sh", "-c", "exit 3"]), Some("backup".to_string()));
    report.pid = Some(4242);
    report.start_at = Some(Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    report.end_at = Some(Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 7).unwrap());
    report.exit_code = 3;
    report.result = "command exited with code: 3".to_string();
    report.stdout = "out\n".to_string();
    report.stderr = "err\n".to_string();
    report.output = "out\nerr\n".to_string();
    report.user_time = Some(0.5);
    report.system_time = Some(0.25);

    let bytes = report.to_json().unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["pid"], 4242);
    assert_eq!(value["userTime"], 0.5);
    assert_eq!(value["tag"], "backup");

    let back = Report::from_json(&bytes).unwrap();
    assert_eq!(back, report);
    assert!(!back.succeeded());
}

#[test]
fn command_is_shell_quoted() {
    assert_eq!(quote_command(&args(&["echo", "hi"])), "echo hi");
    assert_eq!(
        quote_command(&args(&["echo", "hello world"])),
        "echo 'hello world'"
    );
    assert_eq!(
        quote_command(&args(&["sh", "-c", "sleep 1"])),
        "sh -c 'sleep 1'"
    );
}
