// crates/docker-bridge-core/src/error.rs
// ============================================================================
// Module: Bridge Errors
// Description: Error taxonomy for a single bridge invocation.
// Purpose: Classify every failure so the process boundary can report and map it.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible step of an invocation returns [`BridgeError`]. The variants
//! mirror the failure families the calling engine distinguishes: argument
//! problems, certificate problems, connectivity (timeout vs refused), non-2xx
//! responses, truncated streams, undecodable output, and remote stderr.
//! Invariants:
//! - Connect and read timeouts classify as [`ConnectivityError::Timeout`] and
//!   map to exit code 2; every other error maps to exit code 1.
//! - Underlying causes are preserved through `source()` for cause-chain logging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Boxed cause carried by errors that wrap foreign failures.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Exit code reported on success.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code reported for validation, business, and technical failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code reported when the container engine could not be reached in time.
pub const EXIT_TIMEOUT: u8 = 2;

/// Root error for a bridge invocation.
///
/// # Invariants
/// - Display text is the human-readable line printed after `ERROR | `.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Argument count, shape, or value errors.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// Certificate bundle missing or unparseable.
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    /// Transport-level failures talking to the container engine.
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    /// Non-2xx response from the container engine.
    #[error("{message}")]
    HttpResponse {
        /// HTTP status code returned by the engine.
        status: u16,
        /// Body text returned by the engine.
        upstream: String,
        /// Operation-specific mapping of the status code.
        message: String,
    },
    /// Multiplexed stream ended inside a frame.
    #[error("stream read failed: {0}")]
    StreamRead(String),
    /// Response payload could not be decoded or written.
    #[error("{0}")]
    OutputDecode(String),
    /// Remote command wrote to its standard error stream.
    #[error("{0}")]
    RemoteExecution(String),
}

impl BridgeError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Connectivity(ConnectivityError::Timeout {
                ..
            }) => EXIT_TIMEOUT,
            _ => EXIT_FAILURE,
        }
    }

    /// Returns true when the failure happened while reaching the engine.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Argument validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// The process received no arguments at all.
    #[error("No arguments received...")]
    NoArguments,
    /// The operation name was blank.
    #[error("Action cannot be empty or null.")]
    EmptyOperation,
    /// The operation name is not recognized.
    #[error("Invalid Action.. Please enter valid action [{valid}]")]
    UnknownOperation {
        /// Operation name as supplied.
        name: String,
        /// Comma-separated list of valid names.
        valid: String,
    },
    /// Fewer positional arguments than the operation requires.
    #[error("Insufficient number of arguments. Expected [{required}] but received [{supplied}]")]
    InsufficientArguments {
        /// Required argument count.
        required: usize,
        /// Supplied argument count.
        supplied: usize,
    },
    /// A timeout argument is not a non-negative integer.
    #[error("{label} should be positive value")]
    InvalidTimeout {
        /// Which timeout failed.
        label: &'static str,
        /// Raw argument value.
        value: String,
    },
    /// The endpoint URL failed validation.
    #[error("Invalid docker url [{0}]")]
    InvalidUrl(String),
    /// A required argument is blank.
    #[error("[{0}] is missing")]
    Missing(String),
    /// A file argument does not reference an existing file.
    #[error("File [{0}] is invalid. Possibly file does not exist")]
    InvalidFile(String),
    /// A directory argument does not reference an existing directory.
    #[error("Directory [{0}] is invalid")]
    InvalidDirectory(String),
    /// A destination file already exists.
    #[error("Invalid file [{0}]. Possibly file already exists")]
    FileExists(String),
    /// Any other invalid value, with a complete message.
    #[error("{0}")]
    InvalidValue(String),
}

/// Certificate bundle failures.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// Secure scheme requested without a certificate directory.
    #[error("Docker certificate path is empty")]
    EmptyPath,
    /// The certificate directory's parent does not exist.
    #[error("Docker certificate path [{0}] is invalid")]
    InvalidPath(String),
    /// One or more bundle files are absent.
    #[error("Docker certificate(s) missing, expected files are [ca.pem, cert.pem, key.pem]")]
    Missing {
        /// File names that were not found.
        absent: Vec<&'static str>,
    },
    /// A bundle file could not be read or parsed.
    #[error("Unable to load certificate artifact [{artifact}]")]
    Parse {
        /// Bundle file that failed.
        artifact: &'static str,
        /// Underlying parse or I/O failure.
        #[source]
        source: BoxedCause,
    },
    /// The TLS client could not be constructed from the bundle.
    #[error("Unable to build TLS client")]
    Client {
        /// Underlying client builder failure.
        #[source]
        source: BoxedCause,
    },
}

/// Transport failures reaching the container engine.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// Connect or read timeout elapsed.
    #[error("Connection Timeout.")]
    Timeout {
        /// Underlying transport failure.
        #[source]
        source: BoxedCause,
    },
    /// The engine refused or could not accept the connection.
    #[error("Unable to connect.")]
    Refused {
        /// Underlying transport failure.
        #[source]
        source: BoxedCause,
    },
    /// Any other transport failure.
    #[error("Request to docker failed")]
    Transport {
        /// Underlying transport failure.
        #[source]
        source: BoxedCause,
    },
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a reqwest failure into the connectivity taxonomy.
pub(crate) fn classify_transport(err: reqwest::Error) -> BridgeError {
    let error = if err.is_timeout() {
        ConnectivityError::Timeout {
            source: Box::new(err),
        }
    } else if err.is_connect() {
        ConnectivityError::Refused {
            source: Box::new(err),
        }
    } else {
        ConnectivityError::Transport {
            source: Box::new(err),
        }
    };
    BridgeError::Connectivity(error)
}

/// Classifies a body read failure, keeping timeouts distinct.
pub(crate) fn classify_body_read(
    err: std::io::Error,
    fallback: impl FnOnce(std::io::Error) -> BridgeError,
) -> BridgeError {
    if err.kind() == std::io::ErrorKind::TimedOut {
        return BridgeError::Connectivity(ConnectivityError::Timeout {
            source: Box::new(err),
        });
    }
    fallback(err)
}
