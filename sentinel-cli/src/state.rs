//! On-disk state of the developer registry.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr as _};
use sentinel_core::{AccountId, TransferInstruction, Vault};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Everything the CLI keeps between invocations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct State {
    /// Account allowed to call `agent-ping`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AccountId>,
    /// Vault records in owner order.
    #[serde(default)]
    pub vaults: Vec<Vault>,
    /// Transfers committed but not yet drained.
    #[serde(default)]
    pub outbox: Vec<TransferInstruction>,
}

impl State {
    /// Reads the state file, or returns an empty state if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .wrap_err_with(|| format!("failed to parse state file {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no state file yet, starting empty");
                Ok(Self::default())
            }
            Err(err) => {
                Err(err).wrap_err_with(|| format!("failed to read state file {}", path.display()))
            }
        }
    }

    /// Writes the state file atomically, creating parent directories.
    ///
    /// The body goes to a uniquely named temp file in the same directory,
    /// is synced, and then renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;

        let body = serde_json::to_vec_pretty(self)?;
        let mut tmp = NamedTempFile::new_in(dir)
            .wrap_err_with(|| format!("failed to create a temp file in {}", dir.display()))?;
        tmp.write_all(&body)
            .wrap_err("failed to write the temp state file")?;
        tmp.as_file()
            .sync_all()
            .wrap_err("failed to sync the temp state file")?;
        tmp.persist(path)
            .map_err(|err| err.error)
            .wrap_err_with(|| format!("failed to replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), vaults = self.vaults.len(), "state saved");
        Ok(())
    }
}

/// `<data_dir>/sentinel/state.json`, if the platform has a data directory.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sentinel").join("state.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("absent.json")).unwrap();
        assert!(state.agent.is_none());
        assert!(state.vaults.is_empty());
    }

    #[test]
    fn test_save_creates_parents_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let state = State {
            agent: Some(AccountId::new("agent.near").unwrap()),
            ..State::default()
        };
        state.save(&path).unwrap();

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded.agent, state.agent);
    }

    #[test]
    fn test_save_replaces_without_leaving_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        State::default().save(&path).unwrap();
        let state = State {
            agent: Some(AccountId::new("watcher.near").unwrap()),
            ..State::default()
        };
        state.save(&path).unwrap();

        assert_eq!(State::load(&path).unwrap().agent, state.agent);
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = State::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse state file"));
    }
}
