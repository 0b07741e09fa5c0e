// crates/docker-bridge-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for docker-bridge-core integration tests.
// Purpose: Provide console capture, invocation builders, and a scripted engine.
// Dependencies: docker-bridge-core, tiny_http
// ============================================================================

//! ## Overview
//! Provides an in-memory console, positional argument builders, and a
//! `tiny_http` mock engine that answers a fixed script of responses and
//! records every request it saw.

#![allow(
    dead_code,
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

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use docker_bridge_core::Console;
use docker_bridge_core::ExecutionController;
use docker_bridge_core::NoopLog;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Console Capture
// ============================================================================

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Returns everything written so far as text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    /// Returns everything written so far as raw bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }

    /// Returns the written lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(ToString::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Controller writing into captured buffers.
pub struct Harness {
    pub controller: ExecutionController,
    pub out: SharedBuffer,
    pub err: SharedBuffer,
}

/// Builds a controller with a silent log and captured console sinks.
pub fn harness() -> Harness {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let console = Console::new(Box::new(out.clone()), Box::new(err.clone()));
    Harness {
        controller: ExecutionController::new(Box::new(NoopLog), console),
        out,
        err,
    }
}

// ============================================================================
// SECTION: Invocation Builders
// ============================================================================

/// Builds raw process arguments with zero timeouts and no certificate directory.
pub fn invocation(operation: &str, endpoint: &str, specific: &[&str]) -> Vec<String> {
    let mut values = vec![operation, "0", "0", endpoint, ""];
    values.extend_from_slice(specific);
    values.into_iter().map(ToString::to_string).collect()
}

// ============================================================================
// SECTION: Mock Engine
// ============================================================================

/// One request observed by the mock engine.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Vec<u8>,
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Scripted engine answering replies in order.
pub struct MockEngine {
    pub endpoint: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockEngine {
    /// Starts the engine; it stops after the script or two idle seconds.
    pub fn start(script: Vec<Reply>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for reply in script {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(2)) else {
                    break;
                };
                let mut body = Vec::new();
                request.as_reader().read_to_end(&mut body).unwrap();
                seen.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });
                let response = Response::from_data(reply.body).with_status_code(reply.status);
                request.respond(response).unwrap();
            }
            seen
        });
        Self {
            endpoint: format!("http://{addr}"),
            handle,
        }
    }

    /// Waits for the engine thread and returns the recorded requests.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}

// ============================================================================
// SECTION: Frames
// ============================================================================

/// Encodes one multiplexed frame.
pub fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let length = u32::try_from(payload.len()).unwrap();
    let mut bytes = vec![tag, 0, 0, 0];
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}
