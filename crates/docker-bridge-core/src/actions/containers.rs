// crates/docker-bridge-core/src/actions/containers.rs
// ============================================================================
// Module: Container Operations
// Description: Lifecycle, listing, inspection, and export of containers.
// Purpose: Bind container operations to their descriptors and argument layouts.
// Dependencies: docker-bridge-core internals
// ============================================================================

//! ## Overview
//! Each type here implements [`Action`] for one container operation. Position
//! 4 is the container id for every operation except create and list.
//! [`QuietRemoveContainer`] adds the bounded unpause-and-retry compensation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::args::InvocationArguments;
use crate::args::parse_flag;
use crate::args::parse_unsigned;
use crate::args::query_expression;
use crate::client::ApiResponse;
use crate::controller::Action;
use crate::controller::ActionContext;
use crate::controller::composite_message;
use crate::descriptor::APPLICATION_JSON;
use crate::descriptor::ActionDescriptor;
use crate::descriptor::HttpVerb;
use crate::descriptor::OutputKind;
use crate::descriptor::PayloadKind;
use crate::error::ArgumentError;
use crate::error::BridgeError;
use crate::output::format_message;
use crate::request::ApiRequest;
use crate::validate;

// ============================================================================
// SECTION: Shared Tables
// ============================================================================

/// Label of the container id position.
const CONTAINER_ID: &str = "Container id";

/// Errors shared by single-container operations.
const CONTAINER_ERRORS: &[(u16, &str)] = &[(404, "no such container"), (500, "server error")];

/// Errors for container removal.
const REMOVE_ERRORS: &[(u16, &str)] =
    &[(400, "bad parameter"), (404, "no such container"), (500, "server error")];

/// Upstream text identifying a delete refused because the container is paused.
pub const PAUSED_MARKER: &str = "Unpause the container before stopping";

/// Builds a descriptor for a `POST containers/{id}/<verb>` operation.
const fn lifecycle(
    operation: &'static str,
    path: &'static str,
    arg_labels: &'static [&'static str],
    output: OutputKind,
    errors: &'static [(u16, &'static str)],
) -> ActionDescriptor {
    ActionDescriptor {
        operation,
        required_args: 5,
        arg_labels,
        verb: HttpVerb::Post,
        path,
        accept: None,
        payload: PayloadKind::Empty,
        output,
        errors,
    }
}

/// Reads the container id at position 4.
fn container_id(args: &InvocationArguments) -> Result<String, ArgumentError> {
    args.required(4, CONTAINER_ID)
}

/// Extracts an optional unsigned `key = n` expression.
fn unsigned_expression(
    args: &InvocationArguments,
    index: usize,
    key: &str,
) -> Result<Option<String>, ArgumentError> {
    let Some(raw) = args.optional(index) else {
        return Ok(None);
    };
    let Some(value) = query_expression(raw, key) else {
        return Ok(None);
    };
    parse_unsigned(value).map(|parsed| Some(parsed.to_string())).ok_or_else(|| {
        ArgumentError::InvalidValue(format!("Invalid value [{value}]. Timeout should be positive value"))
    })
}

/// Renders a flag as the engine's boolean query value.
const fn flag_value(flag: bool) -> &'static str {
    if flag { "true" } else { "false" }
}

// ============================================================================
// SECTION: Create / Start
// ============================================================================

/// `CREATE_CONTAINER`: creates a container from a JSON configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContainer {
    /// Optional container name.
    name: Option<String>,
    /// JSON configuration sent as the body.
    config: PathBuf,
    /// XML output file.
    output: PathBuf,
}

impl Action for CreateContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "CREATE_CONTAINER",
        required_args: 7,
        arg_labels: &["Container name", "Container configuration file", "Output file"],
        verb: HttpVerb::Post,
        path: "containers/create",
        accept: None,
        payload: PayloadKind::File(APPLICATION_JSON),
        output: OutputKind::XmlDocument {
            root: "CREATE_CONTAINER",
        },
        errors: &[(404, "bad parameter"), (500, "server error")],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            name: args.optional(4).map(ToString::to_string),
            config: PathBuf::from(args.required(5, "Container configuration file")?),
            output: PathBuf::from(args.required(6, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if let Some(name) = &self.name {
            validate::container_name(name)?;
        }
        validate::existing_file(&self.config)?;
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).query_opt("name", self.name.as_deref()).file(&self.config))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// `START_CONTAINER`: starts a container, optionally with a host config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartContainer {
    /// Container id.
    id: String,
    /// Optional JSON host configuration body.
    config: Option<PathBuf>,
}

impl Action for StartContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "START_CONTAINER",
        required_args: 5,
        arg_labels: &[CONTAINER_ID, "Host configuration file"],
        verb: HttpVerb::Post,
        path: "containers/{id}/start",
        accept: None,
        payload: PayloadKind::File(APPLICATION_JSON),
        output: OutputKind::Discard,
        errors: &[
            (304, "container already started"),
            (404, "no such container"),
            (500, "server error"),
        ],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            config: args.optional(5).map(PathBuf::from),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if let Some(config) = &self.config {
            validate::existing_file(config)?;
        }
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        let request = ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id);
        Ok(match &self.config {
            Some(config) => request.file(config),
            None => request,
        })
    }
}

// ============================================================================
// SECTION: Lifecycle Signals
// ============================================================================

/// `STOP_CONTAINER`: stops a container with an optional `t = seconds` grace period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopContainer {
    /// Container id.
    id: String,
    /// Grace period in seconds.
    timeout: Option<String>,
}

impl Action for StopContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "STOP_CONTAINER",
        "containers/{id}/stop",
        &[CONTAINER_ID, "Timeout expression"],
        OutputKind::Discard,
        &[(304, "container already stopped"), (404, "no such container"), (500, "server error")],
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            timeout: unsigned_expression(args, 5, "t")?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .param("id", &self.id)
            .query_opt("t", self.timeout.as_deref()))
    }
}

/// `RESTART_CONTAINER`: restarts a container with an optional `t = seconds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartContainer {
    /// Container id.
    id: String,
    /// Grace period in seconds.
    timeout: Option<String>,
}

impl Action for RestartContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "RESTART_CONTAINER",
        "containers/{id}/restart",
        &[CONTAINER_ID, "Timeout expression"],
        OutputKind::Discard,
        CONTAINER_ERRORS,
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            timeout: unsigned_expression(args, 5, "t")?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .param("id", &self.id)
            .query_opt("t", self.timeout.as_deref()))
    }
}

/// `KILL_CONTAINER`: signals a container, optionally with `signal = NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillContainer {
    /// Container id.
    id: String,
    /// Signal name or number.
    signal: Option<String>,
}

impl Action for KillContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "KILL_CONTAINER",
        "containers/{id}/kill",
        &[CONTAINER_ID, "Signal expression"],
        OutputKind::Discard,
        CONTAINER_ERRORS,
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            signal: args
                .optional(5)
                .and_then(|raw| query_expression(raw, "signal"))
                .map(ToString::to_string),
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .param("id", &self.id)
            .query_opt("signal", self.signal.as_deref()))
    }
}

/// `PAUSE_CONTAINER`: freezes every process in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseContainer {
    /// Container id.
    id: String,
}

impl Action for PauseContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "PAUSE_CONTAINER",
        "containers/{id}/pause",
        &[CONTAINER_ID],
        OutputKind::Discard,
        CONTAINER_ERRORS,
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id))
    }
}

/// `UNPAUSE_CONTAINER`: resumes a paused container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpauseContainer {
    /// Container id.
    id: String,
}

impl Action for UnpauseContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "UNPAUSE_CONTAINER",
        "containers/{id}/unpause",
        &[CONTAINER_ID],
        OutputKind::Discard,
        CONTAINER_ERRORS,
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id))
    }
}

/// `WAIT_CONTAINER`: blocks until a container exits and prints its exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitContainer {
    /// Container id.
    id: String,
}

impl Action for WaitContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &lifecycle(
        "WAIT_CONTAINER",
        "containers/{id}/wait",
        &[CONTAINER_ID],
        OutputKind::ExitStatus,
        CONTAINER_ERRORS,
    );

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id))
    }
}

// ============================================================================
// SECTION: Removal
// ============================================================================

/// Container removal arguments shared by the plain and quiet variants.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Removal {
    /// Container id.
    id: String,
    /// Remove anonymous volumes too.
    volumes: bool,
    /// Kill a running container first.
    force: bool,
}

impl Removal {
    /// Reads positions 4-6.
    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            volumes: args.optional(5).is_some_and(parse_flag),
            force: args.optional(6).is_some_and(parse_flag),
        })
    }

    /// Builds the delete request.
    fn request(&self, descriptor: &'static ActionDescriptor) -> ApiRequest {
        ApiRequest::new(descriptor)
            .param("id", &self.id)
            .query("v", flag_value(self.volumes))
            .query("force", flag_value(self.force))
    }
}

/// Removal descriptor for both variants.
const fn removal(operation: &'static str) -> ActionDescriptor {
    ActionDescriptor {
        operation,
        required_args: 5,
        arg_labels: &[CONTAINER_ID, "Remove volumes", "Force removal"],
        verb: HttpVerb::Delete,
        path: "containers/{id}",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::Discard,
        errors: REMOVE_ERRORS,
    }
}

/// `REMOVE_CONTAINER`: deletes a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveContainer {
    /// Removal arguments.
    removal: Removal,
}

impl Action for RemoveContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &removal("REMOVE_CONTAINER");

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            removal: Removal::from_args(args)?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(self.removal.request(Self::DESCRIPTOR))
    }
}

/// Why the quiet removal moved on to the unpause step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UnpauseTrigger {
    /// The delete reported the container as absent.
    NotFound,
    /// The delete was refused because the container is paused.
    Paused {
        /// Status of the refused delete.
        status: u16,
        /// Body of the refused delete.
        upstream: String,
    },
}

/// Steps of the quiet removal.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RemovalStep {
    /// Issue the delete.
    AttemptDelete,
    /// Issue the unpause compensating call.
    Unpause(UnpauseTrigger),
    /// Re-issue the delete exactly once.
    RetryDeleteOnce,
}

/// `QUIET_REMOVE_CONTAINER`: deletes a container, tolerating absent and paused ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuietRemoveContainer {
    /// Removal arguments.
    removal: Removal,
}

impl QuietRemoveContainer {
    /// Builds the compensating unpause request.
    fn unpause_request(&self) -> ApiRequest {
        ApiRequest::new(Self::DESCRIPTOR)
            .with_route(HttpVerb::Post, "containers/{id}/unpause")
            .param("id", &self.removal.id)
    }
}

impl Action for QuietRemoveContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &removal("QUIET_REMOVE_CONTAINER");

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            removal: Removal::from_args(args)?,
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(self.removal.request(Self::DESCRIPTOR))
    }

    fn dispatch(&self, ctx: &mut ActionContext<'_>) -> Result<Option<ApiResponse>, BridgeError> {
        let delete = self.request()?;
        let mut step = RemovalStep::AttemptDelete;
        loop {
            step = match step {
                RemovalStep::AttemptDelete => {
                    let response = ctx.send(&delete)?;
                    if response.is_success() {
                        return Ok(Some(response));
                    }
                    let (status, upstream) = ctx.describe_failure(response)?;
                    if status == 404 {
                        ctx.console.line(&format_message("RESPONSE_ERROR", &upstream))?;
                        RemovalStep::Unpause(UnpauseTrigger::NotFound)
                    } else if status == 500 && upstream.contains(PAUSED_MARKER) {
                        ctx.console.line(&format_message("WARNING", &upstream))?;
                        ctx.console.line(&format_message(
                            "INFO",
                            "Try to unpause container first, then remove it again.",
                        ))?;
                        RemovalStep::Unpause(UnpauseTrigger::Paused {
                            status,
                            upstream,
                        })
                    } else {
                        return Err(ctx.fail(status, upstream));
                    }
                }
                RemovalStep::Unpause(trigger) => {
                    let response = ctx.send(&self.unpause_request())?;
                    if response.is_success() {
                        RemovalStep::RetryDeleteOnce
                    } else {
                        let (status, upstream) = ctx.describe_failure(response)?;
                        ctx.log.warn(&format!(
                            "Unpause failed: {}",
                            composite_message(status, &upstream)
                        ));
                        return match trigger {
                            UnpauseTrigger::NotFound => Ok(None),
                            UnpauseTrigger::Paused {
                                status,
                                upstream,
                            } => Err(ctx.fail(status, upstream)),
                        };
                    }
                }
                RemovalStep::RetryDeleteOnce => {
                    let response = ctx.send(&delete)?;
                    return ctx.classify(response).map(Some);
                }
            };
        }
    }
}

// ============================================================================
// SECTION: Listing / Inspection / Export
// ============================================================================

/// `LIST_CONTAINERS`: lists containers into an XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContainers {
    /// Restrict to running containers.
    running_only: bool,
    /// Maximum number of containers; `0` means no limit.
    limit: u64,
    /// Only containers created after this id.
    since: Option<String>,
    /// Only containers created before this id.
    before: Option<String>,
    /// Filter JSON file, deleted once read.
    filters: Option<PathBuf>,
    /// Include container sizes.
    size: bool,
    /// XML output file.
    output: PathBuf,
}

impl Action for ListContainers {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "LIST_CONTAINERS",
        required_args: 11,
        arg_labels: &[
            "Running only",
            "Limit",
            "Since",
            "Before",
            "Filter file",
            "Show size",
            "Output file",
        ],
        verb: HttpVerb::Get,
        path: "containers/json",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlCollection {
            root: "LIST_CONTAINERS",
            item: "CONTAINER",
        },
        errors: &[(400, "bad parameter"), (500, "server error")],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let raw_limit = args.get(5);
        let limit = parse_unsigned(raw_limit).ok_or_else(|| {
            ArgumentError::InvalidValue(format!(
                "Invalid value [{raw_limit}]. Limit should be positive value"
            ))
        })?;
        Ok(Self {
            running_only: parse_flag(args.get(4)),
            limit,
            since: args.optional(6).map(ToString::to_string),
            before: args.optional(7).map(ToString::to_string),
            filters: args.optional(8).map(PathBuf::from),
            size: parse_flag(args.get(9)),
            output: PathBuf::from(args.required(10, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if let Some(filters) = &self.filters {
            validate::existing_file(filters)?;
        }
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        let mut request = ApiRequest::new(Self::DESCRIPTOR)
            .query("all", if self.running_only { "0" } else { "1" });
        if self.limit > 0 {
            request = request.query("limit", self.limit.to_string());
        }
        Ok(request
            .query_opt("since", self.since.as_deref())
            .query_opt("before", self.before.as_deref())
            .query("size", if self.size { "1" } else { "0" }))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }

    fn dispatch(&self, ctx: &mut ActionContext<'_>) -> Result<Option<ApiResponse>, BridgeError> {
        let mut request = self.request()?;
        if let Some(path) = &self.filters {
            let filters = read_filter_file(path)?;
            if let Err(err) = fs::remove_file(path) {
                ctx.log.warn(&format!("Unable to delete filter file [{}]: {err}", path.display()));
            }
            if !filters.is_empty() {
                request = request.query("filters", filters);
            }
        }
        let response = ctx.send(&request)?;
        ctx.classify(response).map(Some)
    }
}

/// Reads a filter file, joining its trimmed lines.
fn read_filter_file(path: &Path) -> Result<String, ArgumentError> {
    let text = fs::read_to_string(path)
        .map_err(|_| ArgumentError::InvalidFile(path.display().to_string()))?;
    Ok(text.lines().map(str::trim).collect())
}

/// `INSPECT_CONTAINER`: writes a container's details to an XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectContainer {
    /// Container id.
    id: String,
    /// XML output file.
    output: PathBuf,
}

impl Action for InspectContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "INSPECT_CONTAINER",
        required_args: 6,
        arg_labels: &[CONTAINER_ID, "Output file"],
        verb: HttpVerb::Get,
        path: "containers/{id}/json",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlDocument {
            root: "INSPECT_CONTAINER",
        },
        errors: CONTAINER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            id: container_id(args)?,
            output: PathBuf::from(args.required(5, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// `EXPORT_CONTAINER`: saves a container filesystem tarball to a new file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContainer {
    /// Container id.
    id: String,
    /// Destination folder.
    folder: PathBuf,
    /// Destination file inside `folder`.
    target: PathBuf,
}

impl Action for ExportContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "EXPORT_CONTAINER",
        required_args: 7,
        arg_labels: &[CONTAINER_ID, "Export folder", "Export file name"],
        verb: HttpVerb::Get,
        path: "containers/{id}/export",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::RawFile,
        errors: CONTAINER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let id = container_id(args)?;
        let folder = PathBuf::from(args.required(5, "Export folder")?);
        let target = folder.join(args.required(6, "Export file name")?);
        Ok(Self {
            id,
            folder,
            target,
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::existing_dir(&self.folder)?;
        validate::absent_file(&self.target)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("id", &self.id))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.target)
    }
}
