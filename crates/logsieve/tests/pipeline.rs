//! Integration tests for the logging pipeline
//!
//! These tests cover the filtering sink, fan-out and file sinks working
//! together, plus the global install/teardown lifecycle.

use logsieve::prelude::*;
use logsieve::testing::{FailingSink, MemorySink};
use logsieve::{FanoutSink, FileSinkConfig, LevelVar, Pipeline, Rotation};
use std::path::Path;
use std::sync::Arc;

fn read_json_lines(dir: &Path) -> Vec<serde_json::Value> {
    let mut lines = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let contents = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        for line in contents.lines() {
            lines.push(serde_json::from_str(line).unwrap());
        }
    }
    lines
}

fn fanout_pipeline(rules: Vec<FilterRule>) -> (Pipeline, MemorySink, MemorySink, FailingSink) {
    let first = MemorySink::new();
    let second = MemorySink::new();
    let failing = FailingSink::new();
    let fanout = FanoutSink::new(vec![
        first.shared(),
        Arc::new(failing.clone()),
        second.shared(),
    ]);
    let pipeline = Pipeline::from_sink(
        Arc::new(fanout),
        rules,
        Arc::new(LevelVar::new(Level::Trace)),
    );
    (pipeline, first, second, failing)
}

// ============================================================================
// Filtering + fan-out
// ============================================================================

#[test]
fn test_unmatched_records_reach_every_healthy_sink() {
    let (pipeline, first, second, failing) =
        fanout_pipeline(vec![FilterRule::deny().message("never sent")]);

    pipeline
        .logger()
        .info("login", &[Attr::new("user", "bob")]);

    assert_eq!(first.messages(), vec!["login"]);
    assert_eq!(second.messages(), vec!["login"]);
    assert_eq!(failing.attempts(), 1);
    assert_eq!(first.records(), second.records());
}

#[test]
fn test_denied_records_reach_no_sink() {
    let (pipeline, first, second, failing) = fanout_pipeline(vec![
        FilterRule::deny().attribute("user", "alice"),
        FilterRule::allow(),
    ]);

    pipeline
        .logger()
        .info("login", &[Attr::new("user", "alice")]);
    pipeline
        .logger()
        .info("login", &[Attr::new("user", "bob")]);

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(failing.attempts(), 1);
    assert_eq!(first.last_attr("user"), Some(Value::from("bob")));
    assert_eq!(pipeline.filter().stats().denied(), 1);
}

#[test]
fn test_rules_added_at_runtime_apply_to_derived_loggers() {
    let (pipeline, first, _second, _failing) = fanout_pipeline(Vec::new());
    let request_logger = pipeline
        .logger()
        .with(&[Attr::new("id", "client-1")])
        .with_group("request");

    request_logger.info("api", &[Attr::new("body", "a fairly long request body")]);
    pipeline
        .filter()
        .add_rule(FilterRule::shorten(8, ["body"]));
    pipeline
        .filter()
        .add_rule(FilterRule::deny().level(Level::Trace));

    request_logger.info("api", &[Attr::new("body", "a fairly long request body")]);
    request_logger.trace("noise", &[]);

    let records = first.records();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].attrs,
        vec![
            Attr::new("id", "client-1"),
            Attr::group("request", vec![Attr::new("body", "a fai...")]),
        ]
    );
}

#[test]
fn test_rule_document_drives_pipeline() {
    let rules = logsieve::parse_rules(
        r#"[
            {"level": "DEBUG", "action": "deny"},
            {"attributes": {"msg": "heartbeat"}, "action": "deny"},
            {"action": "shorten", "options": {"shorten": {"limit": 6, "keys": ["token"]}}}
        ]"#,
    )
    .unwrap();
    let (pipeline, first, _second, _failing) = fanout_pipeline(rules);
    let logger = pipeline.logger();

    logger.debug("cache warm", &[]);
    logger.info("heartbeat", &[]);
    logger.info("auth", &[Attr::new("token", "abcdef123456")]);

    assert_eq!(first.messages(), vec!["auth"]);
    assert_eq!(first.last_attr("token"), Some(Value::from("abc...")));
}

// ============================================================================
// File sink
// ============================================================================

#[test]
fn test_file_sink_writes_filtered_json_records() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = LoggingConfig::new()
        .console(false)
        .level(Level::Trace)
        .file(FileSinkConfig::new(dir.path(), "awee").rotation(Rotation::Never))
        .rule(FilterRule::deny().message("secret"))
        .build()
        .unwrap();

    let logger = pipeline.logger().with(&[Attr::new("id", "c1")]);
    logger.trace("low", &[]);
    logger.info("secret", &[]);
    logger.fatal("high", &[Attr::new("code", 7)]);
    drop(logger);
    drop(pipeline);

    let lines = read_json_lines(dir.path());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "TRACE");
    assert_eq!(lines[0]["id"], "c1");
    assert_eq!(lines[1]["level"], "FATAL");
    assert_eq!(lines[1]["msg"], "high");
    assert_eq!(lines[1]["code"], 7);
}

// ============================================================================
// Global lifecycle
// ============================================================================

#[test]
fn test_install_swaps_global_logger_until_guard_drops() {
    let dir = tempfile::tempdir().unwrap();
    let guard = LoggingConfig::new()
        .console(false)
        .level(Level::Info)
        .file(FileSinkConfig::new(dir.path(), "awee").rotation(Rotation::Never))
        .install()
        .unwrap();

    assert_eq!(logsieve::level(), Level::Info);
    logsieve::debug("filtered by level", &[]);
    logsieve::info("visible", &[]);

    logsieve::set_level(Level::Debug);
    logsieve::debug("now visible", &[]);

    guard.filter().add_rule(FilterRule::deny().message("muted"));
    logsieve::warn("muted", &[]);
    logsieve::logger().error("via handle", &[]);
    drop(guard);

    let messages: Vec<String> = read_json_lines(dir.path())
        .iter()
        .map(|line| line["msg"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        messages,
        vec!["visible", "now visible", "via handle", "Shutting down logging"]
    );
}
