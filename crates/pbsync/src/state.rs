//! State file persistence.
//!
//! The state file is a small JSON document recording the last known
//! `PersistedState` of the tracked collection. A missing file means
//! nothing is tracked yet.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pbsync_core::PersistedState;

use crate::error::CliError;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StateOut<'a> {
    version: u32,
    collection: Option<&'a PersistedState>,
}

#[derive(Deserialize)]
struct StateIn {
    version: u32,
    #[serde(default)]
    collection: Option<PersistedState>,
}

/// Read the tracked collection, if any.
pub fn load(path: &Path) -> Result<Option<PersistedState>, CliError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let state: StateIn = serde_json::from_str(&text).map_err(|e| CliError::State {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    if state.version != FORMAT_VERSION {
        return Err(CliError::State {
            path: path.display().to_string(),
            reason: format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                state.version
            ),
        });
    }
    Ok(state.collection)
}

/// Write `state`, replacing the file in one step.
pub fn save(path: &Path, state: Option<&PersistedState>) -> Result<(), CliError> {
    let doc = StateOut {
        version: FORMAT_VERSION,
        collection: state,
    };
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), tracked = state.is_some(), "state written");
    Ok(())
}
