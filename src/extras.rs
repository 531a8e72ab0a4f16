/// Run-level metadata: the `run.json` sidecar written next to each
/// top-level results directory.
///
/// Loaded once per input directory and merged into every record produced
/// from that directory's subtree. The `ro` key holds volatile device state
/// and is dropped before the merge. Unlike result files, a missing or
/// malformed `run.json` is fatal for the whole run.
use crate::walk::scalar_string;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Metadata fields merged into every record from one input directory.
///
/// Absent keys stay `None` and render as empty CSV cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunExtras {
    pub device: Option<String>,
    pub test_type: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug)]
pub enum ExtrasError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl std::fmt::Display for ExtrasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtrasError::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ExtrasError::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExtrasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtrasError::Read { source, .. } => Some(source),
            ExtrasError::Parse { source, .. } => Some(source),
        }
    }
}

/// Load `{dir}/run.json` and extract the merge fields, dropping `ro`.
pub fn load(dir: &Path) -> Result<RunExtras, ExtrasError> {
    let path = dir.join("run.json");
    let contents = std::fs::read_to_string(&path).map_err(|e| ExtrasError::Read {
        path: path.clone(),
        source: e,
    })?;
    let mut map: serde_json::Map<String, Value> =
        serde_json::from_str(&contents).map_err(|e| ExtrasError::Parse {
            path: path.clone(),
            source: e,
        })?;

    map.remove("ro");

    Ok(RunExtras {
        device: map.get("device").and_then(scalar_string),
        test_type: map.get("test_type").and_then(scalar_string),
        proxy: map.get("proxy").and_then(scalar_string),
    })
}
