//! Persistence of the "local agent was installed before" fact.
//!
//! File persistence writes JSON to:
//! `~/.config/ipfs-gateway/agent-state.json` (or `$XDG_CONFIG_HOME/ipfs-gateway/agent-state.json`).

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dashmap::DashSet;
use tracing::{debug, warn};

const STATE_DIR_NAME: &str = "ipfs-gateway";
const STATE_FILE_NAME: &str = "agent-state.json";

/// Errors for persisted install state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Get/set/clear capability for the "previously installed" fact, keyed by agent id.
///
/// Writes are best-effort: a store that cannot persist must still answer
/// reads consistently for the current process.
pub trait InstallStore: Send + Sync {
    /// Returns true if `agent_id` was marked installed.
    fn was_installed(&self, agent_id: &str) -> bool;

    /// Records that `agent_id` became ready.
    fn mark_installed(&self, agent_id: &str);

    /// Clears the installed fact for `agent_id`.
    fn mark_uninstalled(&self, agent_id: &str);
}

/// Process-local install store.
#[derive(Debug, Default)]
pub struct MemoryInstallStore {
    installed: DashSet<String>,
}

impl MemoryInstallStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `agent_ids` already marked installed.
    #[must_use]
    pub fn with_installed<I, S>(agent_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for agent_id in agent_ids {
            store.installed.insert(agent_id.into());
        }
        store
    }
}

impl InstallStore for MemoryInstallStore {
    fn was_installed(&self, agent_id: &str) -> bool {
        self.installed.contains(agent_id)
    }

    fn mark_installed(&self, agent_id: &str) {
        self.installed.insert(agent_id.to_string());
    }

    fn mark_uninstalled(&self, agent_id: &str) {
        self.installed.remove(agent_id);
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StoredState {
    #[serde(default)]
    installed: BTreeSet<String>,
}

/// JSON-file-backed install store.
///
/// The file is read once on open; every mark rewrites it. Write failures are
/// logged and the in-memory answer stays authoritative.
#[derive(Debug)]
pub struct FileInstallStore {
    path: PathBuf,
    installed: Mutex<BTreeSet<String>>,
}

impl FileInstallStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let installed = if path.exists() {
            let raw = fs::read(&path)?;
            serde_json::from_slice::<StoredState>(&raw)?.installed
        } else {
            BTreeSet::new()
        };
        debug!(path = %path.display(), entries = installed.len(), "opened install store");

        Ok(Self {
            path,
            installed: Mutex::new(installed),
        })
    }

    /// Opens the store at [`default_state_path`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when no config directory is known or the file is unreadable.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_state_path()?)
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeSet<String>) -> bool) {
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        if !apply(&mut installed) {
            return;
        }
        let snapshot = StoredState {
            installed: installed.clone(),
        };

        // Lock held through the write so snapshots reach disk in mutation order.
        if let Err(error) = write_state(&self.path, &snapshot) {
            warn!(
                path = %self.path.display(),
                error = %error,
                "failed to persist local agent install state"
            );
        }
    }
}

impl InstallStore for FileInstallStore {
    fn was_installed(&self, agent_id: &str) -> bool {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(agent_id)
    }

    fn mark_installed(&self, agent_id: &str) {
        self.update(|installed| installed.insert(agent_id.to_string()));
    }

    fn mark_uninstalled(&self, agent_id: &str) {
        self.update(|installed| installed.remove(agent_id));
    }
}

fn write_state(path: &Path, state: &StoredState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Resolves the default install state file path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ipfs-gateway/agent-state.json`
/// 2. `$HOME/.config/ipfs-gateway/agent-state.json`
/// 3. `%APPDATA%/ipfs-gateway/agent-state.json`
///
/// # Errors
///
/// Returns [`StoreError::ConfigDirUnavailable`] when none of the variables is set.
pub fn default_state_path() -> Result<PathBuf, StoreError> {
    let dir = resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )?;
    Ok(dir.join(STATE_FILE_NAME))
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StoreError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(STATE_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(STATE_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(STATE_DIR_NAME));
    }

    Err(StoreError::ConfigDirUnavailable)
}
