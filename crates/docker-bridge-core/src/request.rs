// crates/docker-bridge-core/src/request.rs
// ============================================================================
// Module: API Requests
// Description: Builds engine requests from an operation descriptor.
// Purpose: Expand path templates, append queries, and attach payloads.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! An [`ApiRequest`] starts from an [`ActionDescriptor`] and collects path
//! parameters, query pairs, and an optional body. [`ApiRequest::resolve_url`]
//! appends the expanded template to the endpoint without disturbing any path
//! prefix the endpoint already carries (for example `/v1.24`).
//! Invariants:
//! - Every `{name}` placeholder must have a bound parameter.
//! - Query pairs keep the order they were added in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use url::Url;

use crate::descriptor::APPLICATION_JSON;
use crate::descriptor::ActionDescriptor;
use crate::descriptor::HttpVerb;
use crate::descriptor::PayloadKind;
use crate::error::ArgumentError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request body to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// Inline JSON text.
    Json(String),
    /// File streamed from disk.
    File {
        /// Source file.
        path: PathBuf,
        /// Declared content type.
        content_type: &'static str,
    },
}

/// One request against the container engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Descriptor the request was built from.
    descriptor: &'static ActionDescriptor,
    /// Path template overriding the descriptor's, for compensating calls.
    path: &'static str,
    /// Verb overriding the descriptor's, for compensating calls.
    verb: HttpVerb,
    /// Bound path parameters.
    params: Vec<(&'static str, String)>,
    /// Query pairs in insertion order.
    query: Vec<(String, String)>,
    /// Request body.
    body: RequestBody,
}

impl ApiRequest {
    /// Starts a request shaped by `descriptor`.
    #[must_use]
    pub const fn new(descriptor: &'static ActionDescriptor) -> Self {
        Self {
            descriptor,
            path: descriptor.path,
            verb: descriptor.verb,
            params: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Replaces the verb and path template while keeping the descriptor.
    #[must_use]
    pub fn with_route(mut self, verb: HttpVerb, path: &'static str) -> Self {
        self.verb = verb;
        self.path = path;
        self
    }

    /// Binds a path parameter.
    #[must_use]
    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    /// Appends a query pair.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a query pair when `value` is present.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attaches inline JSON text.
    #[must_use]
    pub fn json(mut self, text: impl Into<String>) -> Self {
        self.body = RequestBody::Json(text.into());
        self
    }

    /// Attaches a file body using the descriptor's declared content type.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        let content_type = match self.descriptor.payload {
            PayloadKind::File(content_type) => content_type,
            PayloadKind::Empty | PayloadKind::Json => APPLICATION_JSON,
        };
        self.body = RequestBody::File {
            path: path.into(),
            content_type,
        };
        self
    }

    /// Returns the descriptor this request was built from.
    #[must_use]
    pub const fn descriptor(&self) -> &'static ActionDescriptor {
        self.descriptor
    }

    /// Returns the verb.
    #[must_use]
    pub const fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Expands the path template against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] for an unbound placeholder and
    /// [`ArgumentError::InvalidUrl`] when `base` cannot carry a path.
    pub fn resolve_url(&self, base: &Url) -> Result<Url, ArgumentError> {
        let mut url = base.clone();
        {
            let mut segments =
                url.path_segments_mut().map_err(|()| ArgumentError::InvalidUrl(base.to_string()))?;
            segments.pop_if_empty();
            for part in self.path.split('/').filter(|part| !part.is_empty()) {
                match placeholder(part) {
                    Some((name, multi)) => {
                        let value = self.param_value(name)?;
                        if multi {
                            segments.extend(value.split('/').filter(|piece| !piece.is_empty()));
                        } else {
                            segments.push(value);
                        }
                    }
                    None => {
                        segments.push(part);
                    }
                }
            }
        }
        url.set_query(None);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Looks up a bound path parameter.
    fn param_value(&self, name: &str) -> Result<&str, ArgumentError> {
        self.params
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }
}

/// Parses `{name}` or `{name*}` into the name and a multi-segment flag.
fn placeholder(part: &str) -> Option<(&str, bool)> {
    let inner = part.strip_prefix('{')?.strip_suffix('}')?;
    Some(inner.strip_suffix('*').map_or((inner, false), |name| (name, true)))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
