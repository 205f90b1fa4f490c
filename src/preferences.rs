//! Persistent user preferences (auto-commit, auto-push).
//!
//! Stored as a flat JSON object of booleans. Missing or unreadable files read
//! as defaults so a broken preferences file never blocks a commit.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::PreferencesError;

pub const AUTO_COMMIT_KEY: &str = "auto_commit";
pub const AUTO_PUSH_KEY: &str = "auto_push";

const CONFIG_DIR_ENV: &str = "AI_COMMIT_CONFIG_DIR";
const APP_DIR: &str = "ai-commit";
const FILE_NAME: &str = "preferences.json";

/// Boolean key/value storage for preferences.
pub trait PreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError>;
    fn remove_all(&self) -> Result<(), PreferencesError>;
}

/// Preferences kept in a JSON file.
///
/// Every write replaces the whole file through a temp file in the same
/// directory. Concurrent writers race with last-write-wins.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store under `$AI_COMMIT_CONFIG_DIR`, or the platform config dir.
    pub fn open_default() -> Result<Self, PreferencesError> {
        let dir = match env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or(PreferencesError::NoConfigDir)?
                .join(APP_DIR),
        };
        debug!("Preferences directory: {}", dir.display());
        Ok(Self::new(dir.join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> BTreeMap<String, bool> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Could not read {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                "Ignoring corrupt preferences file {}: {}",
                self.path.display(),
                e
            );
            BTreeMap::new()
        })
    }

    fn write(&self, values: &BTreeMap<String, bool>) -> Result<(), PreferencesError> {
        let content =
            serde_json::to_string_pretty(values).map_err(PreferencesError::SerializeFailed)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(PreferencesError::WriteFailed)?;

        let mut file = NamedTempFile::new_in(dir).map_err(PreferencesError::WriteFailed)?;
        writeln!(file, "{content}").map_err(PreferencesError::WriteFailed)?;
        file.as_file()
            .sync_all()
            .map_err(PreferencesError::WriteFailed)?;
        file.persist(&self.path)
            .map_err(|e| PreferencesError::WriteFailed(e.error))?;

        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.read().get(key).copied().unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError> {
        let mut values = self.read();
        values.insert(key.to_string(), value);
        self.write(&values)
    }

    fn remove_all(&self) -> Result<(), PreferencesError> {
        let mut values = self.read();
        values.remove(AUTO_COMMIT_KEY);
        values.remove(AUTO_PUSH_KEY);
        self.write(&values)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, bool>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, bool>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values().get(key).copied().unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError> {
        self.values().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_all(&self) -> Result<(), PreferencesError> {
        let mut values = self.values();
        values.remove(AUTO_COMMIT_KEY);
        values.remove(AUTO_PUSH_KEY);
        Ok(())
    }
}

/// Snapshot of both flags, taken once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub auto_commit: bool,
    pub auto_push: bool,
}

impl Preferences {
    pub fn load(store: &dyn PreferenceStore) -> Self {
        Self {
            auto_commit: store.get_bool(AUTO_COMMIT_KEY, false),
            auto_push: store.get_bool(AUTO_PUSH_KEY, false),
        }
    }

    /// Settings summary printed by `config --show`.
    pub fn display(&self) -> String {
        format!(
            "Current Settings:\n  \
             Auto-commit: {}\n  \
             Auto-push:   {}\n\n\
             Note: When auto-commit is enabled, you won't be able to:\n  \
             - Regenerate the AI message\n  \
             - Edit the commit message\n  \
             - Cancel the commit\n",
            state_label(self.auto_commit),
            state_label(self.auto_push),
        )
    }
}

fn state_label(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// A single `ai-commit config` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    Usage,
    Show,
    /// `None` asks for the current value.
    AutoCommit(Option<bool>),
    AutoPush(Option<bool>),
    Reset,
}

/// Apply `action` to `store`, writing user-facing text to `out`.
pub fn apply_config_action<W: Write>(
    action: ConfigAction,
    store: &dyn PreferenceStore,
    out: &mut W,
) -> Result<(), PreferencesError> {
    let text = match action {
        ConfigAction::Usage => "Usage: ai-commit config [--show|--auto-commit|--auto-push|--reset]\n\
             Run 'ai-commit config --help' for more information"
            .to_string(),
        ConfigAction::Show => Preferences::load(store).display(),
        ConfigAction::AutoCommit(None) => format!(
            "Current: {}\nUsage: ai-commit config --auto-commit [on|off]",
            state_label(store.get_bool(AUTO_COMMIT_KEY, false))
        ),
        ConfigAction::AutoCommit(Some(enable)) => {
            store.set_bool(AUTO_COMMIT_KEY, enable)?;
            let mut text = format!("Auto-commit {}", state_label(enable));
            if enable {
                text.push_str(
                    "\n\nWarning: You won't be able to regenerate, edit, or cancel commits.",
                );
            }
            text
        }
        ConfigAction::AutoPush(None) => format!(
            "Current: {}\nUsage: ai-commit config --auto-push [on|off]",
            state_label(store.get_bool(AUTO_PUSH_KEY, false))
        ),
        ConfigAction::AutoPush(Some(enable)) => {
            store.set_bool(AUTO_PUSH_KEY, enable)?;
            let mut text = format!("Auto-push {}", state_label(enable));
            if enable {
                text.push_str("\n\nChanges will be pushed automatically after successful commits.");
                if !store.get_bool(AUTO_COMMIT_KEY, false) {
                    text.push_str("\nNote: You'll still see commit prompts (auto-commit is off).");
                }
            }
            text
        }
        ConfigAction::Reset => {
            store.remove_all()?;
            "All settings have been reset to the default (off)".to_string()
        }
    };

    writeln!(out, "{text}").map_err(PreferencesError::Output)
}
