// crates/docker-bridge-core/src/log.rs
// ============================================================================
// Module: Bridge Logging
// Description: Injected logging sink for invocation diagnostics.
// Purpose: Decouple the execution pipeline from any global logger.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! The controller records diagnostics through a [`BridgeLog`] handed to it at
//! construction. [`TracingLog`] forwards to `tracing` events; [`NoopLog`]
//! discards everything and is the default for tests.

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Diagnostic sink for a single invocation.
pub trait BridgeLog: Send + Sync {
    /// Records an informational message.
    fn info(&self, message: &str);
    /// Records a warning.
    fn warn(&self, message: &str);
    /// Records an error.
    fn error(&self, message: &str);
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl BridgeLog for NoopLog {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Sink that emits `tracing` events under the `docker_bridge` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl BridgeLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "docker_bridge", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "docker_bridge", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "docker_bridge", "{message}");
    }
}
