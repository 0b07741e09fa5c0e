// crates/docker-bridge-core/src/actions/images.rs
// ============================================================================
// Module: Image Operations
// Description: Search, inspection, pull, removal, build, and import of images.
// Purpose: Bind image operations to their descriptors and argument layouts.
// Dependencies: docker-bridge-core internals
// ============================================================================

//! ## Overview
//! Each type here implements [`Action`] for one image operation. Image
//! references travel through `{name*}` placeholders so names such as
//! `library/ubuntu` keep their slash as a path separator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use crate::args::InvocationArguments;
use crate::args::option_pairs;
use crate::args::parse_flag;
use crate::client::ApiResponse;
use crate::controller::Action;
use crate::controller::ActionContext;
use crate::descriptor::APPLICATION_TAR;
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

/// Label of the image reference position.
const IMAGE_NAME: &str = "Image name";

/// Errors shared by single-image lookups.
const IMAGE_ERRORS: &[(u16, &str)] = &[(404, "no such image"), (500, "server error")];

/// Errors for operations that only fail on the engine side.
const SERVER_ERRORS: &[(u16, &str)] = &[(500, "server error")];

/// Build options forwarded as `0`/`1` flags.
const BUILD_FLAG_OPTIONS: &[&str] = &["q", "nocache", "pull", "rm", "forcerm"];

/// Build options forwarded verbatim.
const BUILD_VALUE_OPTIONS: &[&str] =
    &["dockerfile", "remote", "memory", "memswap", "cpushares", "cpusetcpus"];

/// Renders a flag as `1`/`0`.
const fn numeric_flag(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

// ============================================================================
// SECTION: Lookups
// ============================================================================

/// `SEARCH_IMAGE`: searches the registry and writes the hits as XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchImage {
    /// Search term.
    term: String,
    /// XML output file.
    output: PathBuf,
}

impl Action for SearchImage {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "SEARCH_IMAGE",
        required_args: 6,
        arg_labels: &["Search term", "Output file"],
        verb: HttpVerb::Get,
        path: "images/search",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlCollection {
            root: "SEARCH_IMAGES",
            item: "SEARCH_IMAGE",
        },
        errors: SERVER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            term: args.required(4, "Search term")?,
            output: PathBuf::from(args.required(5, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).query("term", self.term.as_str()))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// `INSPECT_IMAGE`: writes one image's details as XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectImage {
    /// Image reference.
    image: String,
    /// XML output file.
    output: PathBuf,
}

impl Action for InspectImage {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "INSPECT_IMAGE",
        required_args: 6,
        arg_labels: &[IMAGE_NAME, "Output file"],
        verb: HttpVerb::Get,
        path: "images/{name*}/json",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlDocument {
            root: "INSPECT_IMAGE",
        },
        errors: IMAGE_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            image: args.required(4, IMAGE_NAME)?,
            output: PathBuf::from(args.required(5, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("name", &self.image))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// `LIST_IMAGES`: writes the top-level local images as XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListImages {
    /// XML output file.
    output: PathBuf,
}

impl Action for ListImages {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "LIST_IMAGES",
        required_args: 5,
        arg_labels: &["Output file"],
        verb: HttpVerb::Get,
        path: "images/json",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlCollection {
            root: "LIST_IMAGES",
            item: "IMAGE",
        },
        errors: SERVER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            output: PathBuf::from(args.required(4, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).query("all", "0"))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// `IMAGE_HISTORY`: writes an image's layer history as XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHistory {
    /// Image reference.
    image: String,
    /// XML output file.
    output: PathBuf,
}

impl Action for ImageHistory {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "IMAGE_HISTORY",
        required_args: 6,
        arg_labels: &[IMAGE_NAME, "Output file"],
        verb: HttpVerb::Get,
        path: "images/{name*}/history",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::XmlCollection {
            root: "ImageHistory",
            item: "History",
        },
        errors: IMAGE_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            image: args.required(4, IMAGE_NAME)?,
            output: PathBuf::from(args.required(5, "Output file")?),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::writable_target(&self.output)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR).param("name", &self.image))
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

// ============================================================================
// SECTION: Pull / Remove
// ============================================================================

/// `CREATE_IMAGE`: pulls an image and prints the final status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateImage {
    /// Image reference.
    image: String,
    /// Optional tag.
    tag: Option<String>,
}

impl Action for CreateImage {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "CREATE_IMAGE",
        required_args: 5,
        arg_labels: &[IMAGE_NAME, "Tag"],
        verb: HttpVerb::Post,
        path: "images/create",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::ProgressStatus,
        errors: SERVER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            image: args.required(4, IMAGE_NAME)?,
            tag: args.optional(5).map(ToString::to_string),
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .query("fromImage", self.image.as_str())
            .query_opt("tag", self.tag.as_deref()))
    }
}

/// `REMOVE_IMAGE`: removes an image and prints each untag/delete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveImage {
    /// Image reference.
    image: String,
    /// Remove even when in use.
    force: bool,
    /// Keep untagged parents.
    noprune: bool,
}

impl Action for RemoveImage {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "REMOVE_IMAGE",
        required_args: 5,
        arg_labels: &[IMAGE_NAME, "Force removal", "Do not prune"],
        verb: HttpVerb::Delete,
        path: "images/{name*}",
        accept: None,
        payload: PayloadKind::Empty,
        output: OutputKind::JsonLines,
        errors: &[(404, "no such image"), (409, "conflict"), (500, "server error")],
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        Ok(Self {
            image: args.required(4, IMAGE_NAME)?,
            force: parse_flag(args.get(5)),
            noprune: parse_flag(args.get(6)),
        })
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .param("name", &self.image)
            .query("force", numeric_flag(self.force))
            .query("noprune", numeric_flag(self.noprune)))
    }
}

// ============================================================================
// SECTION: Build / Import
// ============================================================================

/// `BUILD_IMAGE`: builds an image from a tar build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildImage {
    /// Tar archive holding the build context.
    context: PathBuf,
    /// Repository name and optional tag for the result.
    image: String,
    /// Raw advanced options as supplied.
    options: Option<String>,
    /// Normalized advanced option pairs.
    query: Vec<(String, String)>,
}

impl BuildImage {
    /// Normalizes the advanced `k=v,k=v` option list.
    fn normalize_options(raw: &str) -> Result<Vec<(String, String)>, ArgumentError> {
        let mut normalized = Vec::new();
        for (key, value) in option_pairs(raw)? {
            let key = key.to_ascii_lowercase();
            if BUILD_FLAG_OPTIONS.contains(&key.as_str()) {
                normalized.push((key, numeric_flag(parse_flag(&value)).to_string()));
            } else if BUILD_VALUE_OPTIONS.contains(&key.as_str()) {
                normalized.push((key, value));
            } else {
                return Err(ArgumentError::InvalidValue(format!(
                    "Invalid build option [{key}]. Valid options are [{}, {}]",
                    BUILD_VALUE_OPTIONS.join(", "),
                    BUILD_FLAG_OPTIONS.join(", ")
                )));
            }
        }
        Ok(normalized)
    }
}

impl Action for BuildImage {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "BUILD_IMAGE",
        required_args: 6,
        arg_labels: &["Build context file", IMAGE_NAME, "Advanced options"],
        verb: HttpVerb::Post,
        path: "build",
        accept: None,
        payload: PayloadKind::File(APPLICATION_TAR),
        output: OutputKind::ProgressLog,
        errors: SERVER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let options = args.optional(6).map(ToString::to_string);
        let query = match &options {
            Some(raw) => Self::normalize_options(raw)?,
            None => Vec::new(),
        };
        Ok(Self {
            context: PathBuf::from(args.required(4, "Build context file")?),
            image: args.required(5, IMAGE_NAME)?,
            options,
            query,
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::existing_file(&self.context)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        let request = self
            .query
            .iter()
            .fold(ApiRequest::new(Self::DESCRIPTOR), |request, (key, value)| {
                request.query(key.as_str(), value.as_str())
            });
        Ok(request.query("t", self.image.as_str()).file(&self.context))
    }

    fn dispatch(&self, ctx: &mut ActionContext<'_>) -> Result<Option<ApiResponse>, BridgeError> {
        if let Some(options) = &self.options {
            ctx.console.line(&format_message("INFO", &format!("Using advanced options: {options}")))?;
        }
        let response = ctx.send(&self.request()?)?;
        ctx.classify(response).map(Some)
    }
}

/// `IMPORT_CONTAINER`: imports a filesystem tarball as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportContainer {
    /// Tar archive to import.
    archive: PathBuf,
    /// Target repository.
    repo: String,
    /// Optional target tag.
    tag: Option<String>,
}

/// Splits `repo[:tag]`, ignoring a colon that belongs to a registry port.
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') && !tag.is_empty() => (repo, Some(tag)),
        _ => (reference, None),
    }
}

impl Action for ImportContainer {
    const DESCRIPTOR: &'static ActionDescriptor = &ActionDescriptor {
        operation: "IMPORT_CONTAINER",
        required_args: 6,
        arg_labels: &["Archive file", "Repository"],
        verb: HttpVerb::Post,
        path: "images/create",
        accept: None,
        payload: PayloadKind::File(APPLICATION_TAR),
        output: OutputKind::ProgressStatus,
        errors: SERVER_ERRORS,
    };

    fn from_args(args: &InvocationArguments) -> Result<Self, BridgeError> {
        let archive = PathBuf::from(args.required(4, "Archive file")?);
        let (repo, tag) = split_reference(args.get(5));
        if repo.is_empty() {
            return Err(ArgumentError::InvalidValue("Repo must not be empty".to_string()).into());
        }
        Ok(Self {
            archive,
            repo: repo.to_string(),
            tag: tag.map(ToString::to_string),
        })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        validate::existing_file(&self.archive)?;
        Ok(())
    }

    fn request(&self) -> Result<ApiRequest, BridgeError> {
        Ok(ApiRequest::new(Self::DESCRIPTOR)
            .query("fromSrc", "-")
            .query("repo", self.repo.as_str())
            .query_opt("tag", self.tag.as_deref())
            .file(&self.archive))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use url::Url;

    use super::BuildImage;
    use super::ImportContainer;
    use super::split_reference;
    use crate::args::InvocationArguments;
    use crate::controller::Action;
    use crate::error::ArgumentError;
    use crate::error::BridgeError;

    fn invocation(specific: &[&str]) -> InvocationArguments {
        let mut values = vec!["0", "0", "http://localhost:2375", ""];
        values.extend_from_slice(specific);
        InvocationArguments::new(values.into_iter().map(ToString::to_string).collect())
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(split_reference("busybox:1.36"), ("busybox", Some("1.36")));
        assert_eq!(split_reference("registry:5000/team/app"), ("registry:5000/team/app", None));
        assert_eq!(split_reference("registry:5000/app:v2"), ("registry:5000/app", Some("v2")));
        assert_eq!(split_reference("plain"), ("plain", None));
    }

    #[test]
    fn import_rejects_empty_repository() {
        let err = ImportContainer::from_args(&invocation(&["/tmp/a.tar", ":latest"])).unwrap_err();
        assert!(matches!(err, BridgeError::Argument(ArgumentError::InvalidValue(_))));
    }

    #[test]
    fn build_options_are_normalized_before_the_tag() {
        let action =
            BuildImage::from_args(&invocation(&["/tmp/ctx.tar", "demo:1", "nocache=yes, dockerfile=Alt"]))
                .unwrap();
        let base = Url::parse("http://localhost:2375").unwrap();
        let url = action.request().unwrap().resolve_url(&base).unwrap();
        assert_eq!(url.query(), Some("nocache=1&dockerfile=Alt&t=demo%3A1"));
    }

    #[test]
    fn build_rejects_unknown_options() {
        let err = BuildImage::from_args(&invocation(&["/tmp/ctx.tar", "demo", "squash=1"])).unwrap_err();
        assert!(matches!(err, BridgeError::Argument(ArgumentError::InvalidValue(_))));
    }
}
