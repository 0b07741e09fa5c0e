// crates/docker-bridge-core/src/certificates.rs
// ============================================================================
// Module: Certificate Bundle Loader
// Description: Loads CA, client certificate, and client key PEM material.
// Purpose: Produce the mutual-TLS trust and identity for the engine client.
// Dependencies: reqwest, rustls-pki-types
// ============================================================================

//! ## Overview
//! A certificate bundle is the fixed triple `ca.pem`, `cert.pem`, `key.pem`
//! inside one directory. [`CertificateBundle::load`] checks that all three
//! exist, parses each one, and builds the reqwest root certificate and client
//! identity from them.
//! Invariants:
//! - A bundle is returned only when every artifact parsed; nothing partial
//!   escapes a failed load.
//! - Private keys must be PKCS#1 or PKCS#8; SEC1 keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use reqwest::Certificate;
use reqwest::Identity;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::PrivateKeyDer;
use rustls_pki_types::pem::PemObject;

use crate::error::CertificateError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// CA certificate file name.
pub const CA_FILE: &str = "ca.pem";
/// Client certificate file name.
pub const CERT_FILE: &str = "cert.pem";
/// Client private key file name.
pub const KEY_FILE: &str = "key.pem";

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Parsed mutual-TLS material for one invocation.
///
/// # Invariants
/// - `root` and `identity` were both built from validated PEM input.
pub struct CertificateBundle {
    /// Trust anchor for the engine's server certificate.
    root: Certificate,
    /// Client certificate and key presented to the engine.
    identity: Identity,
}

impl CertificateBundle {
    /// Loads and parses the bundle from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::Missing`] when any file is absent,
    /// [`CertificateError::Parse`] when a file cannot be read or parsed, and
    /// [`CertificateError::Client`] when the TLS material is rejected.
    pub fn load(dir: &Path) -> Result<Self, CertificateError> {
        let absent: Vec<&'static str> = [CA_FILE, CERT_FILE, KEY_FILE]
            .into_iter()
            .filter(|name| !dir.join(name).is_file())
            .collect();
        if !absent.is_empty() {
            return Err(CertificateError::Missing {
                absent,
            });
        }

        let ca_pem = read_artifact(dir, CA_FILE)?;
        let cert_pem = read_artifact(dir, CERT_FILE)?;
        let key_pem = read_artifact(dir, KEY_FILE)?;

        parse_certificate(&ca_pem, CA_FILE)?;
        parse_certificate(&cert_pem, CERT_FILE)?;
        parse_private_key(&key_pem)?;

        let root = Certificate::from_pem(&ca_pem).map_err(|err| CertificateError::Client {
            source: Box::new(err),
        })?;
        let mut identity_pem = key_pem;
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(&cert_pem);
        let identity = Identity::from_pem(&identity_pem).map_err(|err| CertificateError::Client {
            source: Box::new(err),
        })?;

        Ok(Self {
            root,
            identity,
        })
    }

    /// Consumes the bundle into its root certificate and client identity.
    #[must_use]
    pub fn into_parts(self) -> (Certificate, Identity) {
        (self.root, self.identity)
    }
}

// ============================================================================
// SECTION: Parsing Helpers
// ============================================================================

/// Reads one artifact from the bundle directory.
fn read_artifact(dir: &Path, name: &'static str) -> Result<Vec<u8>, CertificateError> {
    fs::read(dir.join(name)).map_err(|err| CertificateError::Parse {
        artifact: name,
        source: Box::new(err),
    })
}

/// Requires the PEM text to contain an X.509 certificate.
fn parse_certificate(pem: &[u8], artifact: &'static str) -> Result<(), CertificateError> {
    CertificateDer::from_pem_slice(pem).map(|_| ()).map_err(|err| CertificateError::Parse {
        artifact,
        source: Box::new(err),
    })
}

/// Requires the PEM text to contain a PKCS#1 or PKCS#8 private key.
fn parse_private_key(pem: &[u8]) -> Result<(), CertificateError> {
    let key = PrivateKeyDer::from_pem_slice(pem).map_err(|err| CertificateError::Parse {
        artifact: KEY_FILE,
        source: Box::new(err),
    })?;
    match key {
        PrivateKeyDer::Pkcs1(_) | PrivateKeyDer::Pkcs8(_) => Ok(()),
        _ => Err(CertificateError::Parse {
            artifact: KEY_FILE,
            source: "unsupported private key encoding; expected PKCS#1 or PKCS#8".into(),
        }),
    }
}
