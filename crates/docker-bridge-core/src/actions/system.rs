// crates/docker-bridge-core/src/actions/system.rs
// ============================================================================
// Module: System Operations
// Description: Engine-wide queries.
// Purpose: Report container engine version details.
// Dependencies: docker-bridge-core internals
// ============================================================================

//! Engine-wide queries that take only the shared positions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::args::InvocationArguments;
use crate::controller::Action;
use crate::descriptor::ActionDescriptor;
use crate::descriptor::HttpVerb;
use crate::descriptor::OutputKind;
use crate::descriptor::PayloadKind;
use crate::error::BridgeError;
use crate::request::ApiRequest;

// ============================================================================
// SECTION: Version
// ============================================================================

/// `GET_VERSION`: prints engine version details as `KEY = VALUE` lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetVersion;

impl Action for GetVersion {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "GET_VERSION",
        required_args: 3,
        arg_labels: &[],
        verb: HttpVerb::Get,
        path: "version",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::KeyValues,
        errors: &[],
    };

    fn from_args(_args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self)
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR))
    }
}
