// crates/docker-bridge-core/tests/certificates.rs
// ============================================================================
// Module: Certificate Bundle Tests
// Description: Loading mutual TLS material from a certificate directory.
// Purpose: Verify bundle loading and that certificate failures happen before any connection.
// Dependencies: docker-bridge-core, rcgen, tempfile
// ============================================================================
//! ## Overview
//! Generates TLS material with `rcgen`, loads it through
//! [`CertificateBundle::load`], and checks that HTTPS invocations with broken
//! material fail without opening a socket.

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
use std::io::ErrorKind;
use std::net::TcpListener;
use std::path::Path;

use docker_bridge_core::BridgeError;
use docker_bridge_core::CertificateBundle;
use docker_bridge_core::CertificateError;
use docker_bridge_core::run_invocation;
use rcgen::CertifiedKey;
use rcgen::generate_simple_self_signed;
use tempfile::tempdir;

use crate::common::harness;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

fn write_bundle(dir: &Path) {
    let CertifiedKey {
        cert,
        signing_key,
    } = generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    fs::write(dir.join("ca.pem"), cert.pem()).unwrap();
    fs::write(dir.join("cert.pem"), cert.pem()).unwrap();
    fs::write(dir.join("key.pem"), signing_key.serialize_pem()).unwrap();
}

/// Runs GET_VERSION over https against a listener that must never see a connection.
fn assert_fails_without_connecting(cert_dir: &str) -> BridgeError {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let endpoint = format!("https://{}", listener.local_addr().unwrap());
    let mut harness = harness();
    let args = vec![
        "GET_VERSION".to_string(),
        "0".to_string(),
        "0".to_string(),
        endpoint,
        cert_dir.to_string(),
    ];
    let err = run_invocation(&mut harness.controller, args).unwrap_err();
    let accepted = listener.accept();
    assert!(matches!(accepted, Err(ref err) if err.kind() == ErrorKind::WouldBlock));
    err
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn generated_bundle_loads() {
    let dir = tempdir().unwrap();
    write_bundle(dir.path());
    let bundle = CertificateBundle::load(dir.path()).unwrap();
    let (_root, _identity) = bundle.into_parts();
}

#[test]
fn missing_key_names_expected_files() {
    let dir = tempdir().unwrap();
    write_bundle(dir.path());
    fs::remove_file(dir.path().join("key.pem")).unwrap();
    let Err(err) = CertificateBundle::load(dir.path()) else {
        panic!("bundle without key.pem loaded");
    };
    assert!(matches!(&err, CertificateError::Missing { absent } if absent == &vec!["key.pem"]));
    assert_eq!(
        err.to_string(),
        "Docker certificate(s) missing, expected files are [ca.pem, cert.pem, key.pem]"
    );
}

#[test]
fn garbage_certificate_is_a_parse_error() {
    let dir = tempdir().unwrap();
    write_bundle(dir.path());
    fs::write(dir.path().join("ca.pem"), "not a certificate").unwrap();
    let Err(err) = CertificateBundle::load(dir.path()) else {
        panic!("garbage ca.pem loaded");
    };
    assert!(matches!(err, CertificateError::Parse { artifact: "ca.pem", .. }));
}

// ============================================================================
// SECTION: No Connection On Failure
// ============================================================================

#[test]
fn missing_key_fails_before_connecting() {
    let dir = tempdir().unwrap();
    write_bundle(dir.path());
    fs::remove_file(dir.path().join("key.pem")).unwrap();
    let err = assert_fails_without_connecting(dir.path().to_str().unwrap());
    assert!(matches!(err, BridgeError::Certificate(CertificateError::Missing { .. })));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn empty_certificate_path_fails_before_connecting() {
    let err = assert_fails_without_connecting("");
    assert!(matches!(err, BridgeError::Certificate(CertificateError::EmptyPath)));
}

#[test]
fn certificate_path_with_missing_parent_is_invalid() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("absent").join("certs");
    let err = assert_fails_without_connecting(nested.to_str().unwrap());
    assert!(matches!(err, BridgeError::Certificate(CertificateError::InvalidPath(_))));
}
