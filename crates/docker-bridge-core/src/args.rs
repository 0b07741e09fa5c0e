// crates/docker-bridge-core/src/args.rs
// ============================================================================
// Module: Invocation Arguments
// Description: Positional argument capture and value parsing helpers.
// Purpose: Give every operation the same view of the fixed-position contract.
// Dependencies: none
// ============================================================================

//! ## Overview
//! [`InvocationArguments`] holds the positional values that follow the
//! operation name. Positions 0-3 are shared by every operation (connect
//! timeout, read timeout, endpoint URL, certificate directory); later
//! positions are operation-specific.
//! Invariants:
//! - Values are only ever trimmed, never reordered or removed.
//! - Reading past the end yields an empty string rather than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::ArgumentError;

// ============================================================================
// SECTION: Positions
// ============================================================================

/// Position of the connection timeout in milliseconds.
pub const CONNECT_TIMEOUT_POSITION: usize = 0;
/// Position of the read timeout in milliseconds.
pub const READ_TIMEOUT_POSITION: usize = 1;
/// Position of the container engine endpoint URL.
pub const ENDPOINT_POSITION: usize = 2;
/// Position of the certificate directory (blank for plain HTTP).
pub const CERT_DIR_POSITION: usize = 3;
/// First operation-specific position.
pub const SPECIFIC_START: usize = 4;

/// Labels for the shared positions, used when logging inputs.
pub const COMMON_LABELS: [&str; 4] =
    ["Connection timeout", "Read timeout", "Docker url", "Certificate directory"];

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Ordered positional arguments for one invocation.
///
/// # Invariants
/// - Order matches the process argument order after the operation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationArguments {
    /// Raw positional values.
    values: Vec<String>,
}

impl InvocationArguments {
    /// Wraps raw positional values.
    #[must_use]
    pub const fn new(values: Vec<String>) -> Self {
        Self {
            values,
        }
    }

    /// Returns the number of supplied positions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no positions were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Trims surrounding whitespace from every value in place.
    pub fn trim(&mut self) {
        for value in &mut self.values {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
    }

    /// Returns the value at `index`, or an empty string when absent.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map_or("", String::as_str)
    }

    /// Returns the value at `index` when present and non-blank.
    #[must_use]
    pub fn optional(&self, index: usize) -> Option<&str> {
        let value = self.get(index);
        if value.is_empty() { None } else { Some(value) }
    }

    /// Returns the value at `index`, failing when blank.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] naming `label` when the value is blank.
    pub fn required(&self, index: usize, label: &str) -> Result<String, ArgumentError> {
        self.optional(index)
            .map(ToString::to_string)
            .ok_or_else(|| ArgumentError::Missing(label.to_string()))
    }

    /// Returns all values in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.values
    }
}

// ============================================================================
// SECTION: Value Parsing
// ============================================================================

/// Interprets a boolean-ish argument; `YES`, `TRUE` and `1` are true.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    ["yes", "true", "1"].iter().any(|candidate| value.eq_ignore_ascii_case(candidate))
}

/// Parses a non-negative integer argument.
#[must_use]
pub fn parse_unsigned(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Extracts the value of a `key = value` expression when `key` matches.
///
/// Key comparison is case-insensitive; a blank value counts as not supplied.
#[must_use]
pub fn query_expression<'a>(expression: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = expression.split_once('=')?;
    if !name.trim().eq_ignore_ascii_case(key) {
        return None;
    }
    let value = value.trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Splits a `k=v,k=v` option list into trimmed pairs, skipping blank entries.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidValue`] when an entry has no `=`.
pub fn option_pairs(options: &str) -> Result<Vec<(String, String)>, ArgumentError> {
    let mut pairs = Vec::new();
    for entry in options.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((key, value)) = entry.split_once('=') else {
            return Err(ArgumentError::InvalidValue(format!(
                "Invalid option [{entry}]. Expected key=value"
            )));
        };
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(pairs)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
