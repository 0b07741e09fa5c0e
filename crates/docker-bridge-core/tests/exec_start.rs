// crates/docker-bridge-core/tests/exec_start.rs
// ============================================================================
// Module: Exec Start Tests
// Description: Demultiplexed exec output to console and file destinations.
// Purpose: Verify stream routing, remote error detection, and atomic output files.
// Dependencies: docker-bridge-core, tempfile, tiny_http
// ============================================================================
//! ## Overview
//! Serves multiplexed exec bodies from the mock engine and checks where each
//! frame lands and whether an output file is published.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;

use docker_bridge_core::ArgumentError;
use docker_bridge_core::BridgeError;
use docker_bridge_core::output::NO_STREAM_DATA;
use docker_bridge_core::output::REMOTE_ERROR;
use docker_bridge_core::run_invocation;
use serde_json::Value;
use tempfile::tempdir;

use crate::common::MockEngine;
use crate::common::Reply;
use crate::common::frame;
use crate::common::harness;
use crate::common::invocation;

// ============================================================================
// SECTION: Console Destination
// ============================================================================

#[test]
fn stdout_frames_print_to_console() {
    let mut body = frame(1, b"hello");
    body.extend(frame(1, b"world"));
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &["e1", "no", "no"]);
    run_invocation(&mut harness.controller, args).unwrap();
    assert_eq!(harness.out.contents(), "STDOUT -> hello\nSTDOUT -> world\n");
    assert!(harness.err.contents().is_empty());

    let requests = engine.finish();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/exec/e1/start");
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, serde_json::json!({"Detach": false}));
}

#[test]
fn stderr_frame_is_remote_failure() {
    let mut body = frame(1, b"partial");
    body.extend(frame(2, b"boom"));
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &["e1", "yes", "no"]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert!(matches!(&err, BridgeError::RemoteExecution(message) if message == REMOTE_ERROR));
    assert_eq!(harness.out.contents(), "STDOUT -> partial\n");
    assert_eq!(harness.err.contents(), "STDERR -> boom\n");
    let requests = engine.finish();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, serde_json::json!({"Detach": true}));
}

#[test]
fn empty_stream_reports_no_data() {
    let engine = MockEngine::start(vec![Reply::bytes(200, Vec::new())]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &["e1", "no", "no"]);
    run_invocation(&mut harness.controller, args).unwrap();
    assert_eq!(harness.out.lines(), vec![NO_STREAM_DATA.to_string()]);
    engine.finish();
}

#[test]
fn unknown_exec_instance_maps_status() {
    let engine = MockEngine::start(vec![Reply::json(404, r#"{"message":"No such exec instance"}"#)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &["e1", "no", "no"]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert_eq!(err.to_string(), "no such exec instance");
    engine.finish();
}

#[test]
fn binary_payloads_reach_the_console_unchanged() {
    let mut body = frame(1, &[0xff, 0xfe, 0x00, 0x41]);
    body.extend(frame(2, &[0x1b, 0x80]));
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &["e1", "no", "no"]);
    run_invocation(&mut harness.controller, args).unwrap_err();
    assert_eq!(harness.out.bytes(), b"STDOUT -> \xff\xfe\x00A\n".to_vec());
    assert_eq!(harness.err.bytes(), b"STDERR -> \x1b\x80\n".to_vec());
    engine.finish();
}

// ============================================================================
// SECTION: File Destination
// ============================================================================

#[test]
fn stdout_is_saved_and_path_announced() {
    let dir = tempdir().unwrap();
    let mut body = frame(1, b"a");
    body.extend(frame(1, b"b"));
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &[
        "e1",
        "no",
        "yes",
        dir.path().to_str().unwrap(),
        "out.txt",
    ]);
    run_invocation(&mut harness.controller, args).unwrap();
    let target = dir.path().join("out.txt");
    assert_eq!(fs::read_to_string(&target).unwrap(), "STDOUT -> a\nSTDOUT -> b\n");
    assert_eq!(harness.out.lines(), vec![format!("OUTPUT_FILE_PATH ::= {}", target.display())]);
    engine.finish();
}

#[test]
fn saved_stdout_keeps_non_utf8_bytes() {
    let dir = tempdir().unwrap();
    let engine = MockEngine::start(vec![Reply::bytes(200, frame(1, &[0xff, 0xfe, 0x00, 0x41]))]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &[
        "e1",
        "no",
        "yes",
        dir.path().to_str().unwrap(),
        "raw.bin",
    ]);
    run_invocation(&mut harness.controller, args).unwrap();
    let saved = fs::read(dir.path().join("raw.bin")).unwrap();
    assert_eq!(saved, b"STDOUT -> \xff\xfe\x00A\n".to_vec());
    engine.finish();
}

#[test]
fn stderr_discards_file_and_replays_partial_output() {
    let dir = tempdir().unwrap();
    let mut body = frame(1, b"a");
    body.extend(frame(2, b"boom"));
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &[
        "e1",
        "no",
        "yes",
        dir.path().to_str().unwrap(),
        "out.txt",
    ]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert!(matches!(err, BridgeError::RemoteExecution(_)));
    assert!(!dir.path().join("out.txt").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(harness.err.contents(), "STDERR -> boom\nSTDOUT -> a\n");
    engine.finish();
}

#[test]
fn truncated_stream_leaves_no_file() {
    let dir = tempdir().unwrap();
    let mut body = frame(1, b"complete");
    body.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 9, b'x']);
    let engine = MockEngine::start(vec![Reply::bytes(200, body)]);
    let mut harness = harness();
    let args = invocation("START_EXEC", &engine.endpoint, &[
        "e1",
        "no",
        "yes",
        dir.path().to_str().unwrap(),
        "out.txt",
    ]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert!(matches!(err, BridgeError::StreamRead(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    engine.finish();
}

#[test]
fn existing_destination_is_rejected_before_connecting() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("out.txt"), "keep").unwrap();
    let mut harness = harness();
    let args = invocation("START_EXEC", "http://127.0.0.1:9", &[
        "e1",
        "no",
        "yes",
        dir.path().to_str().unwrap(),
        "out.txt",
    ]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert!(matches!(err, BridgeError::Argument(ArgumentError::FileExists(_))));
}

#[test]
fn saving_requires_a_folder() {
    let mut harness = harness();
    let args = invocation("START_EXEC", "http://127.0.0.1:9", &["e1", "no", "yes"]);
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    assert_eq!(err.to_string(), "[Output folder] is missing");
}
