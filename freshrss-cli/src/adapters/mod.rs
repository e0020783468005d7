//! Process- and file-backed implementations of the reconciler's collaborators.

pub mod hooks;
pub mod installer;
pub mod leadership;
pub mod relations;
pub mod site;
pub mod world;

use std::fs;
use std::path::Path;
use std::process::Command;

use serde::{de::DeserializeOwned, Serialize};

use freshrss_reactor::CollaboratorError;

/// Run `program` with `args`, failing on a non-zero exit.
///
/// Only the program and its first argument appear in errors and logs; later
/// arguments may carry credentials.
pub fn run_command<S: AsRef<str>>(program: &str, args: &[S]) -> Result<(), CollaboratorError> {
    let label = match args.first() {
        Some(first) => format!("{program} {}", first.as_ref()),
        None => program.to_string(),
    };
    tracing::debug!(command = %label, "running");

    let output = Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .output()
        .map_err(|source| CollaboratorError::Spawn {
            command: label.clone(),
            source,
        })?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CollaboratorError::Command {
        command: label,
        detail: format!("{}: {}", output.status, stderr.trim()),
    })
}

/// Read a JSON document, or `T::default()` when the file does not exist yet.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CollaboratorError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(CollaboratorError::Other(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };
    serde_json::from_str(&raw).map_err(|e| {
        CollaboratorError::Other(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a JSON document via `.tmp` + rename in the same directory.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CollaboratorError> {
    let fail = |e: &dyn std::fmt::Display| {
        CollaboratorError::Other(format!("failed to write {}: {e}", path.display()))
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| fail(&e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| fail(&e))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| fail(&e))?;
    fs::rename(&tmp, path).map_err(|e| fail(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn missing_json_loads_default() {
        let dir = TempDir::new().unwrap();
        let map: BTreeMap<String, String> = load_json(&dir.path().join("none.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn saved_json_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let map = BTreeMap::from([("k".to_string(), "v".to_string())]);

        save_json(&path, &map).unwrap();

        let back: BTreeMap<String, String> = load_json(&path).unwrap();
        assert_eq!(back, map);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run_command("freshrss-charm-no-such-tool", &["x"]).unwrap_err();
        assert!(matches!(err, CollaboratorError::Spawn { .. }), "{err}");
    }
}
