// crates/docker-bridge-core/src/descriptor.rs
// ============================================================================
// Module: Action Descriptors
// Description: Static per-operation configuration consumed by the pipeline.
// Purpose: Describe argument layout, HTTP shape, and output handling as data.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every operation declares one [`ActionDescriptor`]: how many positions it
//! needs, which verb and path template it calls, what payload it sends, how
//! its response is decoded, and how non-2xx statuses read to a human.
//! Invariants:
//! - Descriptors are `'static` and never mutated.
//! - Path templates are `/`-separated; `{name}` is one segment and `{name*}`
//!   may expand to several.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fallback message for statuses missing from an operation's error table.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Media type of the multiplexed exec stream.
pub const RAW_STREAM: &str = "application/vnd.docker.raw-stream";

/// JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// Tar archive media type.
pub const APPLICATION_TAR: &str = "application/tar";

// ============================================================================
// SECTION: Types
// ============================================================================

/// HTTP verb used by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `DELETE`.
    Delete,
}

impl HttpVerb {
    /// Returns the verb as a reqwest method.
    #[must_use]
    pub fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload shape declared by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// No request body.
    Empty,
    /// Inline JSON text.
    Json,
    /// A file streamed from disk with the given content type.
    File(&'static str),
}

/// Response handling declared by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Body is discarded.
    Discard,
    /// JSON object rendered as one XML document.
    XmlDocument {
        /// Root element name.
        root: &'static str,
    },
    /// JSON array rendered as repeated child elements.
    XmlCollection {
        /// Root element name.
        root: &'static str,
        /// Element name for every array entry.
        item: &'static str,
    },
    /// JSON object printed as `KEY = VALUE` lines.
    KeyValues,
    /// Exec creation result printed as `EXEC_INSTANCE_ID::=<id>`.
    ExecInstance,
    /// Progress stream reduced to its final status line.
    ProgressStatus,
    /// Progress stream echoed object by object.
    ProgressLog,
    /// JSON array printed one compact object per line.
    JsonLines,
    /// Wait result printed as `STATUS_CODE = <n>`.
    ExitStatus,
    /// Body copied into the operation's output file.
    RawFile,
    /// Multiplexed stdout/stderr frame stream.
    Multiplexed,
}

/// Static configuration for one operation.
///
/// # Invariants
/// - `arg_labels[i]` names position `4 + i`.
/// - `required_args` counts positions after the operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Upper-case operation name.
    pub operation: &'static str,
    /// Minimum number of positional arguments.
    pub required_args: usize,
    /// Labels for operation-specific positions.
    pub arg_labels: &'static [&'static str],
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Path template relative to the endpoint.
    pub path: &'static str,
    /// `Accept` media type, if the operation pins one.
    pub accept: Option<&'static str>,
    /// Request payload shape.
    pub payload: PayloadKind,
    /// Response handling.
    pub output: OutputKind,
    /// Status code to message table.
    pub errors: &'static [(u16, &'static str)],
}

impl ActionDescriptor {
    /// Maps a non-2xx status through the operation's error table.
    #[must_use]
    pub fn error_message(&self, status: u16) -> &'static str {
        self.errors
            .iter()
            .find(|(code, _)| *code == status)
            .map_or(UNKNOWN_ERROR, |(_, message)| *message)
    }

    /// Returns the label of an argument position for diagnostics.
    #[must_use]
    pub fn label(&self, index: usize) -> &'static str {
        crate::args::COMMON_LABELS.get(index).copied().unwrap_or_else(|| {
            index
                .checked_sub(crate::args::SPECIFIC_START)
                .and_then(|offset| self.arg_labels.get(offset).copied())
                .unwrap_or("Extra argument")
        })
    }
}
