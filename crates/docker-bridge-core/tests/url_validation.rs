// crates/docker-bridge-core/tests/url_validation.rs
// ============================================================================
// Module: Endpoint Validation Tests
// Description: Scheme, port, and shared-argument parsing checks.
// Purpose: Verify which endpoint URLs and timeouts are accepted before any I/O.
// Dependencies: docker-bridge-core, proptest
// ============================================================================
//! ## Overview
//! Covers [`validate_url`] including the `-1` port heuristic, and the shared
//! leading positions parsed by [`ConnectionConfig::from_args`].

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

use docker_bridge_core::ArgumentError;
use docker_bridge_core::ConnectionConfig;
use docker_bridge_core::InvocationArguments;
use docker_bridge_core::Protocol;
use docker_bridge_core::validate_url;
use proptest::prelude::*;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

fn common(connect: &str, read: &str, url: &str, certs: &str) -> InvocationArguments {
    InvocationArguments::new(vec![
        connect.to_string(),
        read.to_string(),
        url.to_string(),
        certs.to_string(),
    ])
}

// ============================================================================
// SECTION: URL Rules
// ============================================================================

#[test]
fn http_and_https_are_accepted() {
    assert!(validate_url("http://localhost:2375"));
    assert!(validate_url("https://docker.internal:2376/v1.24"));
    assert!(validate_url("http://localhost"));
}

#[test]
fn other_schemes_and_garbage_are_rejected() {
    assert!(!validate_url("tcp://localhost:2375"));
    assert!(!validate_url("unix:///var/run/docker.sock"));
    assert!(!validate_url("localhost:2375"));
    assert!(!validate_url(""));
}

#[test]
fn minus_one_without_port_is_rejected() {
    assert!(!validate_url("http://docker-1.local"));
    assert!(validate_url("http://docker-1.local:2375"));
}

#[test]
fn explicit_default_ports_validate_on_minus_one_hosts() {
    assert!(validate_url("http://node-1:80"));
    assert!(validate_url("https://node-1:443"));
    assert!(validate_url("http://user@node-1:80/v1.24"));
    assert!(validate_url("http://[::1]:80"));
    assert!(!validate_url("http://node-1/v1.24?port=80"));
}

proptest! {
    #[test]
    fn non_http_schemes_never_validate(
        scheme in "[a-z][a-z0-9+]{1,8}",
        port in 1u16..,
    ) {
        prop_assume!(scheme != "http" && scheme != "https");
        let url = format!("{scheme}://engine.local:{port}");
        prop_assert!(!validate_url(&url));
    }

    #[test]
    fn explicit_ports_always_validate(port in 1u16.., https in any::<bool>()) {
        let scheme = if https { "https" } else { "http" };
        let url = format!("{scheme}://engine.local:{port}");
        prop_assert!(validate_url(&url));
    }

    #[test]
    fn explicit_ports_override_the_minus_one_rule(port in 0u16.., https in any::<bool>()) {
        let scheme = if https { "https" } else { "http" };
        let url = format!("{scheme}://node-1:{port}");
        prop_assert!(validate_url(&url));
    }
}

// ============================================================================
// SECTION: Shared Arguments
// ============================================================================

#[test]
fn timeouts_of_any_magnitude_parse() {
    let config = ConnectionConfig::from_args(&common("0", "86400000", "http://localhost:2375", ""))
        .unwrap();
    assert_eq!(config.connect_timeout_ms, 0);
    assert_eq!(config.read_timeout_ms, 86_400_000);
    assert_eq!(config.protocol, Protocol::Http);
    assert!(config.cert_dir.is_empty());
}

#[test]
fn negative_or_blank_timeouts_are_rejected() {
    let err = ConnectionConfig::from_args(&common("-5", "0", "http://localhost:2375", ""))
        .unwrap_err();
    assert!(matches!(err, ArgumentError::InvalidTimeout { label: "Connection timeout", .. }));
    let err = ConnectionConfig::from_args(&common("0", "", "http://localhost:2375", ""))
        .unwrap_err();
    assert_eq!(err.to_string(), "Read timeout should be positive value");
}

#[test]
fn https_scheme_is_detected_case_insensitively() {
    let config =
        ConnectionConfig::from_args(&common("0", "0", "HTTPS://localhost:2376", "/certs")).unwrap();
    assert_eq!(config.protocol, Protocol::Https);
    assert_eq!(config.cert_dir, "/certs");
}

#[test]
fn invalid_url_names_the_input() {
    let err = ConnectionConfig::from_args(&common("0", "0", "ftp://x:21", "")).unwrap_err();
    assert_eq!(err, ArgumentError::InvalidUrl("ftp://x:21".to_string()));
}
