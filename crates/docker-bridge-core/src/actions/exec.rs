// crates/docker-bridge-core/src/actions/exec.rs
// ============================================================================
// Module: Exec Operations
// Description: Creation and start of exec instances inside containers.
// Purpose: Run commands in containers and collect their multiplexed output.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`ExecCreate`] registers a command and prints the exec instance id;
//! [`StartExec`] runs it and demultiplexes stdout and stderr, optionally
//! saving stdout to a new file.
//! Invariants:
//! - The command list is never empty.
//! - A save destination must not exist before the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde_json::json;

use crate::args::InvocationArguments;
use crate::args::parse_flag;
use crate::controller::Action;
use crate::descriptor::ActionDescriptor;
use crate::descriptor::HttpVerb;
use crate::descriptor::OutputKind;
use crate::descriptor::PayloadKind;
use crate::descriptor::RAW_STREAM;
use crate::error::ArgumentError;
use crate::error::BridgeError;
use crate::request::ApiRequest;
use crate::validate;

// ============================================================================
// SECTION: Exec Create
// ============================================================================

/// `EXEC_CREATE`: registers a command to run inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCreate {
    /// Container id.
    id: String,
    /// Command and its arguments.
    command: Vec<String>,
}

/// Splits a comma-separated command into trimmed, non-empty parts.
fn command_parts(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|part| !part.is_empty()).map(ToString::to_string).collect()
}

impl Action for ExecCreate {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "EXEC_CREATE",
        required_args: 6,
        arg_labels: &["Container id", "Command"],
        verb: HttpVerb::Post,
        path: "containers/{id}/exec",
        accept: None,
        payload: PayloadKind::Json,
        output: OutputKind::ExecInstance,
        errors: &[(404, "no such container")],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let id = args.required(4, "Container id")?;
        let command = command_parts(args.get(5));
        if command.is_empty() {
            return Err(ArgumentError::Missing("Command".to_string()).into());
        }
        Ok(Self {
            id,
            command,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        let body = json!({
            "AttachStdin": false,
            "AttachStdout": true,
            "AttachStderr": true,
            "Cmd": self.command,
        });
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id).json(body.to_string()))
    }
}

// ============================================================================
// SECTION: Exec Start
// ============================================================================

/// Where stdout of a started exec instance goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExecDestination {
    /// Console primary sink.
    Console,
    /// New file inside an existing folder.
    File {
        /// Destination folder.
        folder: PathBuf,
        /// Destination file inside `folder`.
        target: PathBuf,
    },
}

/// `START_EXEC`: starts an exec instance and demultiplexes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartExec {
    /// Exec instance id.
    id: String,
    /// Detach from the command.
    detach: bool,
    /// Stdout destination.
    destination: ExecDestination,
}

impl Action for StartExec {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "START_EXEC",
        required_args: 7,
        arg_labels: &["Exec id", "Detach", "Save output", "Output folder", "Output file name"],
        verb: HttpVerb::Post,
        path: "exec/{id}/start",
        accept: Some(RAW_STREAM),
        payload: PayloadKind::Json,
        output: OutputKind::Multiplexed,
        errors: &[(404, "no such exec instance")],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let id = args.required(4, "Exec id")?;
        let detach = parse_flag(args.get(5));
        let destination = if parse_flag(args.get(6)) {
            let folder = PathBuf::from(args.required(7, "Output folder")?);
            let target = folder.join(args.required(8, "Output file name")?);
            ExecDestination::File {
                folder,
                target,
            }
        } else {
            ExecDestination::Console
        };
        Ok(Self {
            id,
            detach,
            destination,
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if let ExecDestination::File {
            folder,
            target,
        } = &self.destination
        {
            validate::existing_dir(folder)?;
            validate::absent_file(target)?;
        }
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        let body = json!({ "Detach": self.detach });
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id).json(body.to_string()))
    }

    fn output_path(&self) -> Option<&Path> {
        match &self.destination {
            ExecDestination::Console => None,
            ExecDestination::File {
                target, ..
            } => Some(target),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, reason = "Test assertions use unwrap and panic for clarity.")]

    use serde_json::Value;

    use super::ExecCreate;
    use super::command_parts;
    use crate::args::InvocationArguments;
    use crate::controller::Action;
    use crate::error::ArgumentError;
    use crate::error::BridgeError;
    use crate::request::RequestBody;

    fn invocation(specific: &[&str]) -> InvocationArguments {
        let mut values = vec!["0", "0", "http://localhost:2375", ""];
        values.extend_from_slice(specific);
        InvocationArguments::new(values.into_iter().map(ToString::to_string).collect())
    }

    #[test]
    fn command_parts_drop_blank_entries() {
        assert_eq!(command_parts(" ls , -la,, /tmp "), vec!["ls", "-la", "/tmp"]);
        assert!(command_parts(" , ").is_empty());
    }

    #[test]
    fn exec_create_requires_a_command() {
        let err = ExecCreate::from_args(&invocation(&["abc", " , "])).unwrap_err();
        assert!(matches!(err, BridgeError::Argument(ArgumentError::Missing(_))));
    }

    #[test]
    fn exec_create_body_attaches_output_streams() {
        let action = ExecCreate::from_args(&invocation(&["abc", "echo,hello"])).unwrap();
        let request = action.request().unwrap();
        let RequestBody::Json(text) = request.body() else {
            panic!("expected a JSON body");
        };
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["AttachStdin"], Value::Bool(false));
        assert_eq!(body["AttachStdout"], Value::Bool(true));
        assert_eq!(body["Cmd"], serde_json::json!(["echo", "hello"]));
    }
}
