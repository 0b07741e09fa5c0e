// crates/docker-bridge-core/src/endpoint.rs
// ============================================================================
// Module: Endpoint Configuration
// Description: URL shape validation and shared connection settings.
// Purpose: Parse the fixed leading positions into a typed connection config.
// Dependencies: url
// ============================================================================

//! ## Overview
//! [`validate_url`] gates the endpoint URL before any other work happens and
//! [`ConnectionConfig::from_args`] turns positions 0-3 into typed settings.
//! Invariants:
//! - Only `http` and `https` endpoints are accepted.
//! - Timeouts are non-negative integers; `0` means "no timeout".
//! - `https` implies a certificate directory is configured (checked when the
//!   client is built).

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::Url;

use crate::args::CERT_DIR_POSITION;
use crate::args::CONNECT_TIMEOUT_POSITION;
use crate::args::ENDPOINT_POSITION;
use crate::args::InvocationArguments;
use crate::args::READ_TIMEOUT_POSITION;
use crate::args::parse_unsigned;
use crate::error::ArgumentError;

// ============================================================================
// SECTION: URL Validation
// ============================================================================

/// Returns true when `raw` is an acceptable container engine endpoint.
///
/// The scheme must be `http` or `https`. A written port, even the scheme
/// default, is explicit and always in range once parsed. When no port is
/// written the URL is accepted only if the literal text `-1` does not appear
/// anywhere in it.
///
/// The `-1` rule treats the text as a stand-in for "no port" and so also
/// rejects hosts such as `docker-1.local` written without a port. The rule is
/// kept as documented; callers that need such hosts should pass an explicit
/// port.
#[must_use]
pub fn validate_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    if url.port().is_some() || has_explicit_port(raw) {
        return true;
    }
    !raw.contains("-1")
}

/// Returns true when the authority of `raw` spells out a port.
///
/// [`Url::port`] hides a port equal to the scheme default, so the raw text is
/// inspected instead.
fn has_explicit_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let port = if host_port.starts_with('[') {
        host_port.rsplit_once("]:").map(|(_, port)| port)
    } else {
        host_port.rsplit_once(':').map(|(_, port)| port)
    };
    port.is_some_and(|port| !port.is_empty() && port.bytes().all(|byte| byte.is_ascii_digit()))
}

// ============================================================================
// SECTION: Connection Config
// ============================================================================

/// Transport scheme of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTP over mutual TLS.
    Https,
}

impl Protocol {
    /// Resolves the protocol from a scheme, case-insensitively.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("https") { Self::Https } else { Self::Http }
    }
}

/// Settings shared by every operation.
///
/// # Invariants
/// - `endpoint` passed [`validate_url`].
/// - `cert_dir` is blank when no certificate directory was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Connect timeout in milliseconds; `0` disables it.
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds; `0` disables it.
    pub read_timeout_ms: u64,
    /// Parsed container engine endpoint.
    pub endpoint: Url,
    /// Endpoint protocol.
    pub protocol: Protocol,
    /// Certificate bundle directory, possibly blank.
    pub cert_dir: String,
}

impl ConnectionConfig {
    /// Parses the shared leading positions.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidTimeout`] for a bad timeout and
    /// [`ArgumentError::InvalidUrl`] when the endpoint fails validation.
    pub fn from_args(args: &InvocationArguments) -> Result<Self, ArgumentError> {
        let connect_timeout_ms = parse_timeout(args, CONNECT_TIMEOUT_POSITION, "Connection timeout")?;
        let read_timeout_ms = parse_timeout(args, READ_TIMEOUT_POSITION, "Read timeout")?;
        let raw_url = args.get(ENDPOINT_POSITION);
        if !validate_url(raw_url) {
            return Err(ArgumentError::InvalidUrl(raw_url.to_string()));
        }
        let endpoint =
            Url::parse(raw_url).map_err(|_| ArgumentError::InvalidUrl(raw_url.to_string()))?;
        let protocol = Protocol::from_scheme(endpoint.scheme());
        Ok(Self {
            connect_timeout_ms,
            read_timeout_ms,
            endpoint,
            protocol,
            cert_dir: args.get(CERT_DIR_POSITION).to_string(),
        })
    }
}

/// Parses one timeout position.
fn parse_timeout(
    args: &InvocationArguments,
    index: usize,
    label: &'static str,
) -> Result<u64, ArgumentError> {
    let raw = args.get(index);
    parse_unsigned(raw).ok_or_else(|| ArgumentError::InvalidTimeout {
        label,
        value: raw.to_string(),
    })
}
