// crates/docker-bridge-core/src/lib.rs
// ============================================================================
// Module: Docker Bridge Core Library
// Description: Container engine bridge for job-scheduling automation.
// Purpose: Translate positional invocations into engine API calls and console output.
// Dependencies: quick-xml, reqwest, rustls, serde_json, tempfile, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! Docker Bridge Core runs one container engine operation per invocation.
//! [`run_invocation`] resolves the operation name, and
//! [`ExecutionController`] drives the fixed pipeline: argument checks,
//! validation, client construction, dispatch, response classification, and
//! output decoding.
//! Invariants:
//! - No request is sent before every argument and certificate check passed.
//! - Non-2xx responses always surface as [`BridgeError::HttpResponse`].
//! - File outputs are staged and persisted atomically.
//!
//! Security posture: HTTPS endpoints require mutual TLS material from a
//! certificate directory; hostname verification stays on.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod actions;
pub mod args;
pub mod certificates;
pub mod client;
pub mod controller;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod log;
pub mod output;
pub mod request;
pub mod stream;
pub mod validate;
pub mod xml;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actions::Operation;
pub use actions::run_invocation;
pub use args::InvocationArguments;
pub use certificates::CertificateBundle;
pub use client::ApiClient;
pub use client::ApiResponse;
pub use client::build_client;
pub use controller::Action;
pub use controller::ActionContext;
pub use controller::ExecutionController;
pub use descriptor::ActionDescriptor;
pub use descriptor::OutputKind;
pub use endpoint::ConnectionConfig;
pub use endpoint::Protocol;
pub use endpoint::validate_url;
pub use error::ArgumentError;
pub use error::BridgeError;
pub use error::CertificateError;
pub use error::ConnectivityError;
pub use log::BridgeLog;
pub use log::NoopLog;
pub use log::TracingLog;
pub use output::Console;
pub use request::ApiRequest;
pub use stream::FramedMessage;
pub use stream::StreamMultiplexDecoder;
pub use stream::StreamTag;
