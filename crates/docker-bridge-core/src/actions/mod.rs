// crates/docker-bridge-core/src/actions/mod.rs
// ============================================================================
// Module: Operations
// Description: Closed set of container engine operations and their dispatch.
// Purpose: Map an operation name to its action type and run it.
// Dependencies: docker-bridge-core internals
// ============================================================================

//! ## Overview
//! [`Operation`] enumerates every supported operation. [`run_invocation`]
//! resolves the name from the first process argument and hands the remaining
//! positions to [`ExecutionController::execute`] for the matching action.
//! Invariants:
//! - Operation names match case-insensitively after trimming.
//! - Every variant has exactly one action type and one descriptor.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod containers;
pub mod exec;
pub mod images;
pub mod system;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::args::InvocationArguments;
use crate::controller::Action;
use crate::controller::ExecutionController;
use crate::descriptor::ActionDescriptor;
use crate::error::ArgumentError;
use crate::error::BridgeError;

// ============================================================================
// SECTION: Operation Set
// ============================================================================

/// Supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Report engine version details.
    GetVersion,
    /// Search the registry for images.
    SearchImage,
    /// Inspect one image.
    InspectImage,
    /// List local images.
    ListImages,
    /// Pull an image.
    CreateImage,
    /// Remove an image.
    RemoveImage,
    /// Report an image's layer history.
    ImageHistory,
    /// Build an image from a tar context.
    BuildImage,
    /// Import a tar archive as an image.
    ImportContainer,
    /// Create a container.
    CreateContainer,
    /// Start a container.
    StartContainer,
    /// Stop a container.
    StopContainer,
    /// Restart a container.
    RestartContainer,
    /// Send a signal to a container.
    KillContainer,
    /// Pause a container.
    PauseContainer,
    /// Unpause a container.
    UnpauseContainer,
    /// Block until a container exits.
    WaitContainer,
    /// Remove a container.
    RemoveContainer,
    /// Remove a container, tolerating absent and paused containers.
    QuietRemoveContainer,
    /// List containers.
    ListContainers,
    /// Inspect one container.
    InspectContainer,
    /// Export a container filesystem as a tar archive.
    ExportContainer,
    /// Create an exec instance.
    ExecCreate,
    /// Start an exec instance and collect its output.
    StartExec,
}

impl Operation {
    /// Every operation, in catalogue order.
    pub const ALL: [Self; 24] = [
        Self::GetVersion,
        Self::SearchImage,
        Self::InspectImage,
        Self::ListImages,
        Self::CreateImage,
        Self::RemoveImage,
        Self::ImageHistory,
        Self::BuildImage,
        Self::ImportContainer,
        Self::CreateContainer,
        Self::StartContainer,
        Self::StopContainer,
        Self::RestartContainer,
        Self::KillContainer,
        Self::PauseContainer,
        Self::UnpauseContainer,
        Self::WaitContainer,
        Self::RemoveContainer,
        Self::QuietRemoveContainer,
        Self::ListContainers,
        Self::InspectContainer,
        Self::ExportContainer,
        Self::ExecCreate,
        Self::StartExec,
    ];

    /// Returns the operation's descriptor.
    #[must_use]
    pub const fn descriptor(self) -> &'static ActionDescriptor {
        match self {
            Self::GetVersion => system::GetVersion::DESCRIPTOR,
            Self::SearchImage => images::SearchImage::DESCRIPTOR,
            Self::InspectImage => images::InspectImage::DESCRIPTOR,
            Self::ListImages => images::ListImages::DESCRIPTOR,
            Self::CreateImage => images::CreateImage::DESCRIPTOR,
            Self::RemoveImage => images::RemoveImage::DESCRIPTOR,
            Self::ImageHistory => images::ImageHistory::DESCRIPTOR,
            Self::BuildImage => images::BuildImage::DESCRIPTOR,
            Self::ImportContainer => images::ImportContainer::DESCRIPTOR,
            Self::CreateContainer => containers::CreateContainer::DESCRIPTOR,
            Self::StartContainer => containers::StartContainer::DESCRIPTOR,
            Self::StopContainer => containers::StopContainer::DESCRIPTOR,
            Self::RestartContainer => containers::RestartContainer::DESCRIPTOR,
            Self::KillContainer => containers::KillContainer::DESCRIPTOR,
            Self::PauseContainer => containers::PauseContainer::DESCRIPTOR,
            Self::UnpauseContainer => containers::UnpauseContainer::DESCRIPTOR,
            Self::WaitContainer => containers::WaitContainer::DESCRIPTOR,
            Self::RemoveContainer => containers::RemoveContainer::DESCRIPTOR,
            Self::QuietRemoveContainer => containers::QuietRemoveContainer::DESCRIPTOR,
            Self::ListContainers => containers::ListContainers::DESCRIPTOR,
            Self::InspectContainer => containers::InspectContainer::DESCRIPTOR,
            Self::ExportContainer => containers::ExportContainer::DESCRIPTOR,
            Self::ExecCreate => exec::ExecCreate::DESCRIPTOR,
            Self::StartExec => exec::StartExec::DESCRIPTOR,
        }
    }

    /// Returns the upper-case operation name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.descriptor().operation
    }

    /// Runs the operation's action through `controller`.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline error.
    pub fn run(
        self,
        controller: &mut ExecutionController,
        args: InvocationArguments,
    ) -> Result<(), BridgeError> {
        match self {
            Self::GetVersion => controller.execute::<system::GetVersion>(args),
            Self::SearchImage => controller.execute::<images::SearchImage>(args),
            Self::InspectImage => controller.execute::<images::InspectImage>(args),
            Self::ListImages => controller.execute::<images::ListImages>(args),
            Self::CreateImage => controller.execute::<images::CreateImage>(args),
            Self::RemoveImage => controller.execute::<images::RemoveImage>(args),
            Self::ImageHistory => controller.execute::<images::ImageHistory>(args),
            Self::BuildImage => controller.execute::<images::BuildImage>(args),
            Self::ImportContainer => controller.execute::<images::ImportContainer>(args),
            Self::CreateContainer => controller.execute::<containers::CreateContainer>(args),
            Self::StartContainer => controller.execute::<containers::StartContainer>(args),
            Self::StopContainer => controller.execute::<containers::StopContainer>(args),
            Self::RestartContainer => controller.execute::<containers::RestartContainer>(args),
            Self::KillContainer => controller.execute::<containers::KillContainer>(args),
            Self::PauseContainer => controller.execute::<containers::PauseContainer>(args),
            Self::UnpauseContainer => controller.execute::<containers::UnpauseContainer>(args),
            Self::WaitContainer => controller.execute::<containers::WaitContainer>(args),
            Self::RemoveContainer => controller.execute::<containers::RemoveContainer>(args),
            Self::QuietRemoveContainer => {
                controller.execute::<containers::QuietRemoveContainer>(args)
            }
            Self::ListContainers => controller.execute::<containers::ListContainers>(args),
            Self::InspectContainer => controller.execute::<containers::InspectContainer>(args),
            Self::ExportContainer => controller.execute::<containers::ExportContainer>(args),
            Self::ExecCreate => controller.execute::<exec::ExecCreate>(args),
            Self::StartExec => controller.execute::<exec::StartExec>(args),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ArgumentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ArgumentError::EmptyOperation);
        }
        Self::ALL.into_iter().find(|operation| operation.name().eq_ignore_ascii_case(name)).ok_or_else(
            || ArgumentError::UnknownOperation {
                name: name.to_string(),
                valid: Self::ALL.map(Self::name).join(", "),
            },
        )
    }
}

// ============================================================================
// SECTION: Invocation Entry
// ============================================================================

/// Runs one invocation from raw process arguments (operation name first).
///
/// # Errors
///
/// Returns [`ArgumentError::NoArguments`] for an empty argument list, name
/// resolution errors, and any pipeline error.
pub fn run_invocation(
    controller: &mut ExecutionController,
    raw: Vec<String>,
) -> Result<Operation, BridgeError> {
    let mut raw = raw.into_iter();
    let Some(name) = raw.next() else {
        return Err(ArgumentError::NoArguments.into());
    };
    let operation: Operation = name.parse()?;
    operation.run(controller, InvocationArguments::new(raw.collect()))?;
    Ok(operation)
}
