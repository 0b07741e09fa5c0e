// crates/docker-bridge-core/src/validate.rs
// ============================================================================
// Module: Input Validation
// Description: Filesystem and naming checks used by operation validation.
// Purpose: Reject bad inputs before any network call is attempted.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Small predicates shared by operation `validate` hooks. Each returns an
//! [`ArgumentError`] carrying the offending path or value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use crate::error::ArgumentError;

// ============================================================================
// SECTION: Filesystem Checks
// ============================================================================

/// Requires `path` to be an existing regular file.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidFile`] otherwise.
pub fn existing_file(path: &Path) -> Result<(), ArgumentError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ArgumentError::InvalidFile(path.display().to_string()))
    }
}

/// Requires `path` to be an existing directory.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidDirectory`] otherwise.
pub fn existing_dir(path: &Path) -> Result<(), ArgumentError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ArgumentError::InvalidDirectory(path.display().to_string()))
    }
}

/// Requires the parent directory of an output file to exist.
///
/// A bare file name resolves against the working directory and passes.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidDirectory`] naming the parent otherwise.
pub fn writable_target(path: &Path) -> Result<(), ArgumentError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => existing_dir(parent),
        _ => Ok(()),
    }
}

/// Requires `path` not to exist yet.
///
/// # Errors
///
/// Returns [`ArgumentError::FileExists`] otherwise.
pub fn absent_file(path: &Path) -> Result<(), ArgumentError> {
    if path.exists() {
        Err(ArgumentError::FileExists(path.display().to_string()))
    } else {
        Ok(())
    }
}

// ============================================================================
// SECTION: Naming Checks
// ============================================================================

/// Requires a container name to match `/?[a-zA-Z0-9_-]+`.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidValue`] otherwise.
pub fn container_name(name: &str) -> Result<(), ArgumentError> {
    let body = name.strip_prefix('/').unwrap_or(name);
    let valid = !body.is_empty()
        && body.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');
    if valid {
        Ok(())
    } else {
        Err(ArgumentError::InvalidValue(format!(
            "Invalid container name [{name}]. Allowed pattern is /?[a-zA-Z0-9_-]+"
        )))
    }
}
