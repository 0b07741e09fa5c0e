// crates/docker-bridge-core/src/client.rs
// ============================================================================
// Module: Client Factory
// Description: Builds the blocking HTTP client used for one invocation.
// Purpose: Apply timeouts and mutual TLS, then send descriptor-shaped requests.
// Dependencies: reqwest, rustls, url
// ============================================================================

//! ## Overview
//! [`build_client`] turns a [`ConnectionConfig`] into an [`ApiClient`]. For
//! `https` endpoints it loads the certificate bundle first, so a bad bundle
//! fails before any socket is opened.
//! Invariants:
//! - A timeout of `0` disables that timeout.
//! - Redirects are never followed.
//! - Transport failures are classified as timeout, refused, or other.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Body;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use url::Url;

use crate::certificates::CertificateBundle;
use crate::descriptor::APPLICATION_JSON;
use crate::endpoint::ConnectionConfig;
use crate::endpoint::Protocol;
use crate::error::ArgumentError;
use crate::error::BridgeError;
use crate::error::CertificateError;
use crate::error::classify_body_read;
use crate::error::classify_transport;
use crate::request::ApiRequest;
use crate::request::RequestBody;

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds the engine client described by `config`.
///
/// # Errors
///
/// Returns [`CertificateError::EmptyPath`] or [`CertificateError::InvalidPath`]
/// for an unusable certificate directory on `https`, any bundle loading
/// failure, and [`CertificateError::Client`] when the client cannot be built.
pub fn build_client(config: &ConnectionConfig) -> Result<ApiClient, BridgeError> {
    let mut builder = Client::builder()
        .redirect(Policy::none())
        .connect_timeout(timeout_from_ms(config.connect_timeout_ms))
        .timeout(timeout_from_ms(config.read_timeout_ms));

    if config.protocol == Protocol::Https {
        let bundle = load_bundle(&config.cert_dir)?;
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let (root, identity) = bundle.into_parts();
        builder = builder.add_root_certificate(root).identity(identity);
    }

    let client = builder.build().map_err(|err| CertificateError::Client {
        source: Box::new(err),
    })?;
    Ok(ApiClient {
        client,
        base: config.endpoint.clone(),
    })
}

/// Maps a millisecond timeout to reqwest's optional duration.
const fn timeout_from_ms(ms: u64) -> Option<Duration> {
    if ms == 0 { None } else { Some(Duration::from_millis(ms)) }
}

/// Validates the certificate directory and loads the bundle from it.
fn load_bundle(cert_dir: &str) -> Result<CertificateBundle, CertificateError> {
    if cert_dir.is_empty() {
        return Err(CertificateError::EmptyPath);
    }
    let dir = Path::new(cert_dir);
    let parent_exists = match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.exists(),
        _ => true,
    };
    if !parent_exists {
        return Err(CertificateError::InvalidPath(cert_dir.to_string()));
    }
    CertificateBundle::load(dir)
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Configured client bound to one engine endpoint.
///
/// # Invariants
/// - Dropping the client releases every pooled connection.
#[derive(Debug)]
pub struct ApiClient {
    /// Underlying blocking client.
    client: Client,
    /// Endpoint all request paths are resolved against.
    base: Url,
}

impl ApiClient {
    /// Returns the endpoint base URL.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Sends one request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns argument errors for unresolvable paths or unreadable payload
    /// files, and [`BridgeError::Connectivity`] for transport failures.
    pub fn send(&self, request: &ApiRequest) -> Result<ApiResponse, BridgeError> {
        let url = request.resolve_url(&self.base)?;
        let mut builder = self.client.request(request.verb().method(), url);
        if let Some(accept) = request.descriptor().accept {
            builder = builder.header(ACCEPT, accept);
        }
        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(text) => {
                builder.header(CONTENT_TYPE, APPLICATION_JSON).body(text.clone())
            }
            RequestBody::File {
                path,
                content_type,
            } => {
                let file = File::open(path)
                    .map_err(|_| ArgumentError::InvalidFile(path.display().to_string()))?;
                builder.header(CONTENT_TYPE, *content_type).body(Body::from(file))
            }
        };
        let response = builder.send().map_err(classify_transport)?;
        Ok(ApiResponse {
            status: response.status().as_u16(),
            inner: response,
        })
    }
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// Response owned by the controller for the rest of the invocation.
///
/// # Invariants
/// - The body is consumed at most once through [`Read`].
#[derive(Debug)]
pub struct ApiResponse {
    /// HTTP status code.
    status: u16,
    /// Underlying response, also the body stream.
    inner: Response,
}

impl ApiResponse {
    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for statuses in `[200, 300)`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Reads the remaining body as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Connectivity`] on a read timeout and
    /// [`BridgeError::OutputDecode`] for other read failures.
    pub fn into_text(mut self) -> Result<String, BridgeError> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes).map_err(|err| {
            classify_body_read(err, |err| {
                BridgeError::OutputDecode(format!("Unable to read docker response: {err}"))
            })
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Read for ApiResponse {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}
