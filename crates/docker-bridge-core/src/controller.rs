// crates/docker-bridge-core/src/controller.rs
// ============================================================================
// Module: Execution Controller
// Description: Fixed-order pipeline shared by every operation.
// Purpose: Run parse, validate, connect, dispatch, classify, and decode for one invocation.
// Dependencies: docker-bridge-core internals
// ============================================================================

//! ## Overview
//! [`ExecutionController::execute`] is generic over an [`Action`]. The states
//! run in a fixed order with no skipping and no loop-back:
//!
//! 1. log inputs
//! 2. check argument count
//! 3. trim
//! 4. parse common arguments
//! 5. initialize operation arguments ([`Action::from_args`])
//! 6. validate ([`Action::validate`])
//! 7. build client
//! 8. dispatch ([`Action::dispatch`])
//! 9. classify response
//! 10. decode output ([`Action::decode`])
//!
//! Invariants:
//! - No request is sent before states 1-7 succeed.
//! - The client and response are owned by the invocation scope and released
//!   on every exit path.
//! - Non-2xx responses print the composite diagnostic on the error sink and
//!   raise [`BridgeError::HttpResponse`] with the operation's mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use crate::args::InvocationArguments;
use crate::client::ApiClient;
use crate::client::ApiResponse;
use crate::client::build_client;
use crate::descriptor::ActionDescriptor;
use crate::endpoint::ConnectionConfig;
use crate::error::ArgumentError;
use crate::error::BridgeError;
use crate::log::BridgeLog;
use crate::output::Console;
use crate::output::decode_output;
use crate::request::ApiRequest;

// ============================================================================
// SECTION: Action Trait
// ============================================================================

/// One operation plugged into the pipeline.
pub trait Action: Sized {
    /// Static configuration for the operation.
    const DESCRIPTOR: &'static ActionDescriptor;

    /// Extracts operation-specific arguments from trimmed positions.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Argument`] when a required value is unusable.
    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError>;

    /// Performs semantic validation before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Argument`] for invalid inputs.
    fn validate(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Builds the request for this invocation.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] when the request cannot be assembled.
    fn request(&self) -> Result<ApiRequest, BridgeError>;

    /// Destination file for file-producing outputs.
    fn output_path(&self) -> Option<&Path> {
        None
    }

    /// Sends the request and classifies the response.
    ///
    /// Returns `None` when the operation finished without a body to decode.
    ///
    /// # Errors
    ///
    /// Returns transport errors and [`BridgeError::HttpResponse`] for non-2xx.
    fn dispatch(&self, ctx: &mut ActionContext<'_>) -> Result<Option<ApiResponse>, BridgeError> {
        let response = ctx.send(&self.request()?)?;
        ctx.classify(response).map(Some)
    }

    /// Decodes a classified response.
    ///
    /// # Errors
    ///
    /// Returns decode, stream, or remote execution errors.
    fn decode(&self, response: ApiResponse, ctx: &mut ActionContext<'_>) -> Result<(), BridgeError> {
        decode_output(ctx.descriptor.output, response, self.output_path(), ctx.console, ctx.log)
    }
}

// ============================================================================
// SECTION: Action Context
// ============================================================================

/// Per-invocation resources handed to action hooks.
pub struct ActionContext<'a> {
    /// Client bound to the engine endpoint.
    client: &'a ApiClient,
    /// Descriptor of the running operation.
    descriptor: &'static ActionDescriptor,
    /// Console sinks.
    pub console: &'a mut Console,
    /// Diagnostic sink.
    pub log: &'a dyn BridgeLog,
}

impl ActionContext<'_> {
    /// Returns the running operation's descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &'static ActionDescriptor {
        self.descriptor
    }

    /// Sends one request.
    ///
    /// # Errors
    ///
    /// Returns transport and request assembly errors.
    pub fn send(&self, request: &ApiRequest) -> Result<ApiResponse, BridgeError> {
        self.log.info(&format!(
            "Dispatching {} {}",
            request.verb().method(),
            request.resolve_url(self.client.base())?
        ));
        self.client.send(request)
    }

    /// Passes 2xx responses through and converts the rest into errors.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::HttpResponse`] for any status outside `[200, 300)`.
    pub fn classify(&mut self, response: ApiResponse) -> Result<ApiResponse, BridgeError> {
        if response.is_success() {
            return Ok(response);
        }
        let (status, upstream) = self.describe_failure(response)?;
        Err(self.fail(status, upstream))
    }

    /// Reports a failed response and builds its mapped error.
    pub fn fail(&mut self, status: u16, upstream: String) -> BridgeError {
        if let Err(err) = self.report_failure(status, &upstream) {
            return err;
        }
        BridgeError::HttpResponse {
            status,
            upstream,
            message: self.descriptor.error_message(status).to_string(),
        }
    }

    /// Reads a failed response's status and trimmed body text.
    ///
    /// # Errors
    ///
    /// Returns read failures of the body.
    pub fn describe_failure(&self, response: ApiResponse) -> Result<(u16, String), BridgeError> {
        let status = response.status();
        let upstream = response.into_text()?.trim().to_string();
        Ok((status, upstream))
    }

    /// Prints and logs the composite diagnostic for a failed response.
    ///
    /// # Errors
    ///
    /// Returns console write failures.
    pub fn report_failure(&mut self, status: u16, upstream: &str) -> Result<(), BridgeError> {
        let composite = composite_message(status, upstream);
        self.log.error(&composite);
        self.console.error_line(&composite)
    }
}

/// Builds `Docker Response: StatusCode: [n] Message: <body>`.
#[must_use]
pub fn composite_message(status: u16, upstream: &str) -> String {
    if upstream.is_empty() {
        format!("Docker Response: StatusCode: [{status}]")
    } else {
        format!("Docker Response: StatusCode: [{status}] Message: {upstream}")
    }
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Runs operations through the fixed pipeline.
pub struct ExecutionController {
    /// Diagnostic sink.
    log: Box<dyn BridgeLog>,
    /// Console sinks.
    console: Console,
}

impl ExecutionController {
    /// Creates a controller over the given sinks.
    #[must_use]
    pub fn new(log: Box<dyn BridgeLog>, console: Console) -> Self {
        Self {
            log,
            console,
        }
    }

    /// Executes operation `A` against `args`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any pipeline state.
    pub fn execute<A: Action>(&mut self, mut args: InvocationArguments) -> Result<(), BridgeError> {
        let descriptor = A::DESCRIPTOR;
        self.log_inputs(descriptor, &args);
        check_arg_count(descriptor, &args)?;
        args.trim();
        let connection = ConnectionConfig::from_args(&args)?;
        let action = A::from_args(&args)?;
        action.validate()?;
        let client = build_client(&connection)?;

        let mut ctx = ActionContext {
            client: &client,
            descriptor,
            console: &mut self.console,
            log: self.log.as_ref(),
        };
        if let Some(response) = action.dispatch(&mut ctx)? {
            action.decode(response, &mut ctx)?;
        }
        ctx.console.flush()
    }

    /// Records the operation name and every positional value.
    fn log_inputs(&self, descriptor: &ActionDescriptor, args: &InvocationArguments) {
        self.log.info(&format!("Operation: {}", descriptor.operation));
        for (index, value) in args.as_slice().iter().enumerate() {
            self.log.info(&format!("{} = {value}", descriptor.label(index)));
        }
    }
}

/// Fails when fewer positions were supplied than the operation requires.
fn check_arg_count(
    descriptor: &ActionDescriptor,
    args: &InvocationArguments,
) -> Result<(), ArgumentError> {
    if args.len() < descriptor.required_args {
        return Err(ArgumentError::InsufficientArguments {
            required: descriptor.required_args,
            supplied: args.len(),
        });
    }
    Ok(())
}
