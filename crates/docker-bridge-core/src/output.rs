// crates/docker-bridge-core/src/output.rs
// ============================================================================
// Module: Output Decoding
// Description: Console sinks, atomic file writes, and response decoders.
// Purpose: Turn a successful engine response into the artifact the caller expects.
// Dependencies: serde, serde_json, tempfile
// ============================================================================

//! ## Overview
//! [`decode_output`] routes a 2xx response by [`OutputKind`]: XML files,
//! console sentinel lines, progress streams, raw exports, or the multiplexed
//! exec stream. Console lines follow the caller's grep contract
//! (`KEY = VALUE`, `TAG | message`, `NAME ::= value`).
//! Invariants:
//! - File outputs are staged in a temporary file beside the destination and
//!   persisted only once complete; a failed write leaves nothing behind.
//! - Remote stderr during exec fails the invocation after replaying any
//!   staged file content onto the error sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::client::ApiResponse;
use crate::descriptor::OutputKind;
use crate::error::BridgeError;
use crate::error::classify_body_read;
use crate::log::BridgeLog;
use crate::stream::StreamMultiplexDecoder;
use crate::stream::StreamTag;
use crate::xml::collection_to_xml;
use crate::xml::document_to_xml;
use crate::xml::sanitize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Line printed when an exec stream carried no frames.
pub const NO_STREAM_DATA: &str = "No Data found on stdout/stderr streams";

/// Message of the error raised when a remote command wrote to stderr.
pub const REMOTE_ERROR: &str = "Received error from Docker.";

/// Progress member that marks transient progress updates.
const PROGRESS_KEY: &str = "progress";
/// Progress member carrying the status text.
const STATUS_KEY: &str = "status";
/// Progress member carrying a failure.
const ERROR_KEY: &str = "error";

// ============================================================================
// SECTION: Console
// ============================================================================

/// Formats a `TAG | message` console line.
#[must_use]
pub fn format_message(tag: &str, message: &str) -> String {
    format!("{tag} | {message}")
}

/// Primary and error sinks for console output.
pub struct Console {
    /// Primary sink (stdout).
    out: Box<dyn Write + Send>,
    /// Error sink (stderr).
    err: Box<dyn Write + Send>,
}

impl Console {
    /// Builds a console over arbitrary writers.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            err,
        }
    }

    /// Builds a console over the process stdout and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Writes one line to the primary sink.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OutputDecode`] when the sink fails.
    pub fn line(&mut self, message: &str) -> Result<(), BridgeError> {
        writeln!(self.out, "{message}").map_err(console_error)
    }

    /// Writes one line to the error sink.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OutputDecode`] when the sink fails.
    pub fn error_line(&mut self, message: &str) -> Result<(), BridgeError> {
        writeln!(self.err, "{message}").map_err(console_error)
    }

    /// Returns the primary sink.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    /// Returns the error sink.
    pub fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }

    /// Flushes both sinks.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OutputDecode`] when a sink fails.
    pub fn flush(&mut self) -> Result<(), BridgeError> {
        self.out.flush().map_err(console_error)?;
        self.err.flush().map_err(console_error)
    }
}

/// Maps a console write failure.
fn console_error(err: io::Error) -> BridgeError {
    BridgeError::OutputDecode(format!("Error writing console output: {err}"))
}

// ============================================================================
// SECTION: Files
// ============================================================================

/// Stages a temporary file in the destination's directory.
fn stage_file(path: &Path) -> Result<NamedTempFile, BridgeError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).map_err(|_| file_error(path))
}

/// Persists a staged file, optionally refusing to replace an existing one.
fn persist_file(staged: NamedTempFile, path: &Path, clobber: bool) -> Result<(), BridgeError> {
    let result = if clobber { staged.persist(path) } else { staged.persist_noclobber(path) };
    result.map(|_| ()).map_err(|_| file_error(path))
}

/// Builds the "Error writing file" failure.
fn file_error(path: &Path) -> BridgeError {
    BridgeError::OutputDecode(format!("Error writing file [{}]", path.display()))
}

/// Writes `contents` to `path` atomically, replacing any existing file.
///
/// # Errors
///
/// Returns [`BridgeError::OutputDecode`] when staging, writing, or persisting fails.
pub fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<(), BridgeError> {
    let mut staged = stage_file(path)?;
    staged.write_all(contents).map_err(|_| file_error(path))?;
    staged.flush().map_err(|_| file_error(path))?;
    persist_file(staged, path, true)
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a successful response according to `kind`.
///
/// # Errors
///
/// Returns [`BridgeError::OutputDecode`] for malformed payloads or write
/// failures, [`BridgeError::StreamRead`] for truncated exec streams, and
/// [`BridgeError::RemoteExecution`] when the engine reports a remote failure.
pub fn decode_output(
    kind: OutputKind,
    response: ApiResponse,
    target: Option<&Path>,
    console: &mut Console,
    log: &dyn BridgeLog,
) -> Result<(), BridgeError> {
    match kind {
        OutputKind::Discard => {
            drop(response);
            Ok(())
        }
        OutputKind::XmlDocument {
            root,
        } => {
            let mut value = parse_json(response)?;
            sanitize(&mut value);
            let xml = document_to_xml(&value, root)?;
            write_file_atomic(require_target(target)?, xml.as_bytes())
        }
        OutputKind::XmlCollection {
            root,
            item,
        } => {
            let mut items = match parse_json(response)? {
                Value::Array(items) => items,
                other => vec![other],
            };
            items.iter_mut().for_each(sanitize);
            let xml = collection_to_xml(&items, root, item)?;
            write_file_atomic(require_target(target)?, xml.as_bytes())
        }
        OutputKind::KeyValues => decode_key_values(response, console),
        OutputKind::ExecInstance => decode_exec_instance(response, console),
        OutputKind::ProgressStatus => decode_progress(response, console, log, false),
        OutputKind::ProgressLog => decode_progress(response, console, log, true),
        OutputKind::JsonLines => decode_json_lines(response, console),
        OutputKind::ExitStatus => decode_exit_status(response, console),
        OutputKind::RawFile => decode_raw_file(response, require_target(target)?, console),
        OutputKind::Multiplexed => decode_multiplexed(response, target, console, log),
    }
}

/// Requires an output file for file-producing kinds.
fn require_target(target: Option<&Path>) -> Result<&Path, BridgeError> {
    target.ok_or_else(|| BridgeError::OutputDecode("Output file is missing".to_string()))
}

/// Reads and parses the whole body as one JSON value.
fn parse_json(response: ApiResponse) -> Result<Value, BridgeError> {
    let text = response.into_text()?;
    serde_json::from_str(&text)
        .map_err(|err| BridgeError::OutputDecode(format!("Unable to parse docker response: {err}")))
}

/// Renders a JSON value for a console line; strings are unquoted.
fn console_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Prints every member of a JSON object as `KEY = VALUE`.
fn decode_key_values(response: ApiResponse, console: &mut Console) -> Result<(), BridgeError> {
    let Value::Object(map) = parse_json(response)? else {
        return Err(BridgeError::OutputDecode("Expected a JSON object from docker".to_string()));
    };
    for (key, value) in &map {
        console.line(&format!("{key} = {}", console_value(value)))?;
    }
    Ok(())
}

/// Exec creation response body.
#[derive(Debug, Deserialize)]
struct ExecCreated {
    /// Exec instance identifier.
    #[serde(rename = "Id", default)]
    id: Option<String>,
    /// Engine warnings, if any.
    #[serde(rename = "Warnings", default)]
    warnings: Option<Value>,
}

/// Prints the exec instance sentinel line.
fn decode_exec_instance(response: ApiResponse, console: &mut Console) -> Result<(), BridgeError> {
    let created: ExecCreated = serde_json::from_value(parse_json(response)?)
        .map_err(|err| BridgeError::OutputDecode(format!("Unable to parse docker response: {err}")))?;
    let id = created
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BridgeError::OutputDecode("Exec instance id is missing".to_string()))?;
    console.line(&format!("EXEC_INSTANCE_ID::={id}"))?;
    if let Some(warnings) = created.warnings.filter(|warnings| !warnings.is_null()) {
        console.line(&format!("Warnings ::= {warnings}"))?;
    }
    Ok(())
}

/// Wait response body.
#[derive(Debug, Deserialize)]
struct WaitStatus {
    /// Container exit code.
    #[serde(rename = "StatusCode")]
    status_code: i64,
}

/// Prints the container exit code.
fn decode_exit_status(response: ApiResponse, console: &mut Console) -> Result<(), BridgeError> {
    let status: WaitStatus = serde_json::from_value(parse_json(response)?)
        .map_err(|err| BridgeError::OutputDecode(format!("Unable to parse docker response: {err}")))?;
    console.line(&format!("STATUS_CODE = {}", status.status_code))
}

/// Prints each entry of a JSON array as compact JSON.
fn decode_json_lines(response: ApiResponse, console: &mut Console) -> Result<(), BridgeError> {
    match parse_json(response)? {
        Value::Array(items) => {
            for item in &items {
                console.line(&item.to_string())?;
            }
            Ok(())
        }
        other => console.line(&other.to_string()),
    }
}

/// Consumes a stream of concatenated progress objects.
///
/// Progress updates are skipped. With `echo` every other object is printed;
/// without it only the last status is printed at the end.
fn decode_progress(
    response: ApiResponse,
    console: &mut Console,
    log: &dyn BridgeLog,
    echo: bool,
) -> Result<(), BridgeError> {
    let text = response.into_text()?;
    let mut status: Option<String> = None;
    let mut failure: Option<String> = None;
    for entry in serde_json::Deserializer::from_str(&text).into_iter::<Value>() {
        let entry = entry.map_err(|err| {
            BridgeError::OutputDecode(format!("Unable to parse docker progress: {err}"))
        })?;
        let Value::Object(map) = &entry else {
            continue;
        };
        if map.contains_key(PROGRESS_KEY) {
            continue;
        }
        log.info(&entry.to_string());
        if let Some(value) = map.get(STATUS_KEY) {
            status = Some(console_value(value));
        }
        if let Some(value) = map.get(ERROR_KEY) {
            failure = Some(console_value(value));
        } else if echo {
            console.line(&entry.to_string())?;
        }
    }
    if !echo && let Some(status) = status {
        console.line(&status)?;
    }
    if let Some(message) = failure {
        log.error(&message);
        console.error_line(&message)?;
        return Err(BridgeError::RemoteExecution(REMOTE_ERROR.to_string()));
    }
    Ok(())
}

/// Copies the body into a new file at `path`.
fn decode_raw_file(
    mut response: ApiResponse,
    path: &Path,
    console: &mut Console,
) -> Result<(), BridgeError> {
    let mut staged = stage_file(path)?;
    io::copy(&mut response, &mut staged).map_err(|err| {
        classify_body_read(err, |_| file_error(path))
    })?;
    staged.flush().map_err(|_| file_error(path))?;
    persist_file(staged, path, false)?;
    console.line(&format!("UC4RB_DKR_EXPORT_FILE ::= {}", path.display()))
}

/// Prefix written before each stdout payload.
const STDOUT_PREFIX: &[u8] = b"STDOUT -> ";

/// Prefix written before each stderr payload.
const STDERR_PREFIX: &[u8] = b"STDERR -> ";

/// Builds one demultiplexed line, keeping payload bytes untouched.
fn framed_line(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(prefix.len() + payload.len() + 1);
    line.extend_from_slice(prefix);
    line.extend_from_slice(payload);
    line.push(b'\n');
    line
}

/// Demultiplexes an exec stream into the primary and error sinks.
fn decode_multiplexed(
    response: ApiResponse,
    target: Option<&Path>,
    console: &mut Console,
    log: &dyn BridgeLog,
) -> Result<(), BridgeError> {
    let mut staged = target.map(stage_file).transpose()?;
    let mut frames = 0usize;
    let mut saw_stderr = false;

    for message in StreamMultiplexDecoder::new(response) {
        let message = message?;
        frames += 1;
        match message.tag {
            StreamTag::Stdout => {
                let line = framed_line(STDOUT_PREFIX, &message.payload);
                match (staged.as_mut(), target) {
                    (Some(file), Some(path)) => {
                        file.write_all(&line).map_err(|_| file_error(path))?;
                    }
                    _ => console.out().write_all(&line).map_err(console_error)?,
                }
            }
            StreamTag::Stderr => {
                saw_stderr = true;
                let line = framed_line(STDERR_PREFIX, &message.payload);
                console.err().write_all(&line).map_err(console_error)?;
            }
            StreamTag::Unknown(tag) => {
                log.warn(&format!("Ignoring frame with unknown stream tag {tag}"));
            }
        }
    }

    if frames == 0 {
        console.line(NO_STREAM_DATA)?;
    }

    if saw_stderr {
        if let Some(mut file) = staged {
            file.seek(SeekFrom::Start(0)).map_err(console_error)?;
            let mut partial = Vec::new();
            file.read_to_end(&mut partial).map_err(console_error)?;
            console.err().write_all(&partial).map_err(console_error)?;
        }
        log.error(REMOTE_ERROR);
        return Err(BridgeError::RemoteExecution(REMOTE_ERROR.to_string()));
    }

    if let (Some(file), Some(path)) = (staged, target) {
        file.as_file().sync_all().map_err(|_| file_error(path))?;
        persist_file(file, path, false)?;
        console.line(&format!("OUTPUT_FILE_PATH ::= {}", path.display()))?;
    }
    Ok(())
}
