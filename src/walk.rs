/// Directory walker: find `browsertime.json` result files under a root and
/// extract one measurement per (entry, browser-script-run) pair.
///
/// Only files whose path contains a `/replay/` segment are considered.
/// Any failure while processing one file (unreadable, bad JSON, missing
/// field, unknown vehicle or browser directory) is logged with the path
/// and skipped; the walk continues with the remaining files.
use crate::vehicle;
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

/// One page-load measurement extracted from a `browsertime.json` document.
///
/// Timing fields keep the source's textual form: numbers are rendered with
/// their JSON representation, strings are copied verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub site: String,
    pub engine: String,
    pub vehicle: String,
    pub timestamp: String,
    pub navigation_start_time: String,
    pub page_load_time: String,
}

/// Why a single result file could not be processed.
#[derive(Debug)]
pub enum FileError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The document is not a top-level array of entries.
    NotAnArray,
    /// A required field is absent or has the wrong type; the string is the
    /// JSON path that failed, e.g. `[0].browserScripts[1].browser.userAgent`.
    MissingField(String),
    /// No known package name appears in the file's path.
    VehicleNotFound,
    /// The top-level directory under the walk root is not `chrome`/`firefox`.
    UnknownBrowser(String),
}

impl FileError {
    fn missing(entry: usize, rest: impl std::fmt::Display) -> Self {
        FileError::MissingField(format!("[{entry}].{rest}"))
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "I/O error: {e}"),
            FileError::Json(e) => write!(f, "invalid JSON: {e}"),
            FileError::NotAnArray => write!(f, "expected a top-level array of entries"),
            FileError::MissingField(path) => write!(f, "missing field {path}"),
            FileError::VehicleNotFound => write!(f, "vehicle not found"),
            FileError::UnknownBrowser(dir) => write!(f, "unrecognized browser directory: {dir}"),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::Io(e) => Some(e),
            FileError::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// Collect all measurements under `root`.
///
/// Per-file failures are logged to stderr and skipped. Re-invocation
/// re-reads the filesystem; nothing is cached.
pub fn walk(root: &Path) -> Vec<Measurement> {
    let mut out = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || entry.file_name().to_str() != Some("browsertime.json") {
            continue;
        }

        let path = entry.path();
        let path_str = path.to_string_lossy();
        if !path_str.contains("/replay/") {
            continue;
        }

        tracing::info!(path = %path.display(), "processing result file");
        match process_file(root, path) {
            Ok(measurements) => {
                tracing::info!(
                    path = %path.display(),
                    count = measurements.len(),
                    "processing done"
                );
                out.extend(measurements);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping result file");
            }
        }
    }

    out
}

/// Extract all measurements from a single `browsertime.json` file.
///
/// Any error skips the whole file: no partial records are emitted.
fn process_file(root: &Path, path: &Path) -> Result<Vec<Measurement>, FileError> {
    let path_str = path.to_string_lossy();
    let vehicle = vehicle::resolve_vehicle(&path_str).ok_or(FileError::VehicleNotFound)?;
    let browser = browser_tag(root, path)?;
    tracing::debug!(vehicle, browser, "resolved tags");

    let contents = std::fs::read_to_string(path).map_err(FileError::Io)?;
    let doc: Value = serde_json::from_str(&contents).map_err(FileError::Json)?;
    let entries = doc.as_array().ok_or(FileError::NotAnArray)?;

    let mut measurements = Vec::new();
    for (n, entry) in entries.iter().enumerate() {
        let site = entry
            .get("info")
            .and_then(|i| i.get("url"))
            .and_then(Value::as_str)
            .ok_or_else(|| FileError::missing(n, "info.url"))?
            .to_lowercase();

        let scripts = entry
            .get("browserScripts")
            .and_then(Value::as_array)
            .ok_or_else(|| FileError::missing(n, "browserScripts"))?;

        for (i, run) in scripts.iter().enumerate() {
            let engine = run
                .get("browser")
                .and_then(|b| b.get("userAgent"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    FileError::missing(n, format!("browserScripts[{i}].browser.userAgent"))
                })?
                .to_string();

            let applink = run
                .get("timings")
                .and_then(|t| t.get("applinkTiming"))
                .ok_or_else(|| {
                    FileError::missing(n, format!("browserScripts[{i}].timings.applinkTiming"))
                })?;

            let navigation_start_time = applink
                .get("startTime")
                .and_then(scalar_string)
                .ok_or_else(|| {
                    FileError::missing(
                        n,
                        format!("browserScripts[{i}].timings.applinkTiming.startTime"),
                    )
                })?;

            let page_load_time = applink
                .get("loadEventStart")
                .and_then(scalar_string)
                .ok_or_else(|| {
                    FileError::missing(
                        n,
                        format!("browserScripts[{i}].timings.applinkTiming.loadEventStart"),
                    )
                })?;

            let timestamp = entry
                .get("timestamps")
                .and_then(|t| t.get(i))
                .and_then(scalar_string)
                .ok_or_else(|| FileError::missing(n, format!("timestamps[{i}]")))?;

            measurements.push(Measurement {
                site: site.clone(),
                engine,
                vehicle: vehicle.to_string(),
                timestamp,
                navigation_start_time,
                page_load_time,
            });
        }
    }

    Ok(measurements)
}

/// Validate the top-level directory segment under `root` against the known
/// browser names. The tag is not part of the output row; an unknown
/// directory still disqualifies the file.
fn browser_tag(root: &Path, path: &Path) -> Result<&'static str, FileError> {
    let segment = path
        .strip_prefix(root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default();

    vehicle::browser_engine(&segment).ok_or(FileError::UnknownBrowser(segment))
}

/// Render a JSON scalar as the string that should appear in the CSV cell.
pub(crate) fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
