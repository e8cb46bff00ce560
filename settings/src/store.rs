//! Durable key/value persistence for workflow settings.
//!
//! Settings live in a JSON file under the user's config directory, scoped
//! by the workflow bundle id. Every mutation is written through to disk
//! immediately; there is no buffering and no transactional rollback across
//! multi-key operations.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::settings::{Defaults, SettingKey, Snapshot, bundle_id};

/// File that exportable settings are rendered into for the surrounding
/// launcher shell to source.
const EXPORTS_FILE: &str = "exports.sh";

/// On-disk representation of the settings namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    /// Current value of every written setting.
    #[serde(default)]
    values: BTreeMap<String, String>,
    /// Keys visible to the surrounding shell environment.
    #[serde(default)]
    exportable: BTreeSet<String>,
}

/// Write-through store over the persisted settings namespace plus the
/// in-memory cache the controller reads from.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    exports_path: PathBuf,
    defaults: Defaults,
    data: StoreData,
}

impl ConfigStore {
    /// Opens the store for the running workflow under the user's config
    /// directory.
    ///
    /// # Errors
    /// Returns an error if the store file exists but cannot be read or
    /// parsed.
    pub fn open_default(defaults: Defaults) -> Result<Self, StoreError> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kpxflow");
        Self::open_at(&dir.join(format!("{}.json", bundle_id())), defaults)
    }

    /// Opens a store backed by an explicit file path. A first open seeds
    /// the namespace with the defaults so that every key has exactly one
    /// persisted entry from then on.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if seeding a fresh store cannot be written.
    pub fn open_at(path: &Path, defaults: Defaults) -> Result<Self, StoreError> {
        let (data, fresh) = match fs::read(path) {
            Ok(raw) => (serde_json::from_slice(&raw)?, false),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (StoreData::default(), true),
            Err(err) => return Err(StoreError::Read(err)),
        };

        let exports_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(EXPORTS_FILE);

        let mut store = Self {
            path: path.to_path_buf(),
            exports_path,
            defaults,
            data,
        };

        if fresh {
            store.reset_to_defaults(&[])?;
        }

        Ok(store)
    }

    /// Current value for `key`. Absence reads back as the empty string,
    /// never as "unset".
    pub fn get(&self, key: SettingKey) -> &str {
        self.data
            .values
            .get(key.as_str())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Persists `value` under `key` immediately.
    ///
    /// # Errors
    /// Returns an error if the store file cannot be written.
    pub fn set(&mut self, key: SettingKey, value: &str, exportable: bool) -> Result<(), StoreError> {
        self.data
            .values
            .insert(key.as_str().to_string(), value.to_string());

        if exportable {
            self.data.exportable.insert(key.as_str().to_string());
        } else {
            self.data.exportable.remove(key.as_str());
        }

        self.save()
    }

    /// Writes the default value for every key not in `exclude`, then
    /// refreshes the cache identically. Best-effort: a failure mid-write
    /// leaves the keys already applied in place.
    ///
    /// # Errors
    /// Returns an error if the store file cannot be written.
    pub fn reset_to_defaults(&mut self, exclude: &[SettingKey]) -> Result<(), StoreError> {
        for key in SettingKey::ALL {
            if exclude.contains(&key) {
                continue;
            }

            self.data
                .values
                .insert(key.as_str().to_string(), self.defaults.get(key).to_string());

            if key.is_exportable() {
                self.data.exportable.insert(key.as_str().to_string());
            } else {
                self.data.exportable.remove(key.as_str());
            }
        }

        self.save()
    }

    /// The full key→value mapping as currently cached.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            SettingKey::ALL
                .into_iter()
                .map(|key| (key, self.get(key).to_string()))
                .collect(),
        )
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Path of the rendered shell-exports file.
    pub fn exports_path(&self) -> &Path {
        &self.exports_path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::Write)?;
        }

        let serialized = serde_json::to_vec_pretty(&self.data)?;
        fs::write(&self.path, serialized).map_err(StoreError::Write)?;
        self.write_exports()
    }

    /// Renders `export key="value"` lines for every exportable key so the
    /// launcher shell can source them.
    fn write_exports(&self) -> Result<(), StoreError> {
        let mut file = fs::File::create(&self.exports_path).map_err(StoreError::Write)?;

        for key in &self.data.exportable {
            if let Some(value) = self.data.values.get(key) {
                writeln!(file, "export {key}=\"{}\"", shell_escape(value))
                    .map_err(StoreError::Write)?;
            }
        }

        Ok(())
    }
}

/// Escapes a value for inclusion inside a double-quoted shell string.
fn shell_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`")
}
