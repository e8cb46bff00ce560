//! The workflow settings model.
//!
//! A closed set of named string settings, their per-machine defaults, and
//! the snapshot classification that decides whether a destructive reset
//! needs an explicit confirmation.

use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;
use std::str::FromStr;

/// Placeholder stored in place of the real master password. Its presence
/// means "a secret exists in the OS keychain"; the real value never enters
/// the settings store.
pub const MASKED_PASSWORD: &str = "••••••••";

/// Environment variable overriding the workflow bundle identifier.
pub const BUNDLE_ID_ENV: &str = "KPXFLOW_BUNDLE_ID";

/// Bundle identifier used when the launcher does not provide one. Scopes
/// the settings store and doubles as the default keychain service name.
pub const DEFAULT_BUNDLE_ID: &str = "org.kpxflow.keepassxc";

// ---------------------------------------------------------------------------
// Setting keys
// ---------------------------------------------------------------------------

/// Every configurable setting of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    /// Launcher keyword that triggers the workflow.
    Keyword,
    /// Path to the KeepassXC database file.
    DbPath,
    /// Path to the keepassxc-cli executable.
    CliPath,
    /// Path to an optional database key file.
    KeyfilePath,
    /// Masked master-password placeholder (never the real secret).
    MasterPassword,
    /// Keychain account the master password is stored under.
    KeychainAccount,
    /// Keychain service the master password is stored under.
    KeychainService,
    /// Whether attribute values are shown in results.
    ShowAttributeValues,
    /// Whether attributes without a value are still listed.
    ShowUnfilledAttributes,
    /// Comma-joined list of entry attributes to display.
    DesiredAttributes,
    /// Whether entry passwords are shown in plain text.
    ShowPasswords,
    /// Delimiter between path segments of an entry.
    EntryDelimiter,
    /// Path to the Python interpreter used by the workflow scripts.
    PythonPath,
}

impl SettingKey {
    /// All keys, in display order.
    pub const ALL: [SettingKey; 13] = [
        SettingKey::Keyword,
        SettingKey::DbPath,
        SettingKey::CliPath,
        SettingKey::KeyfilePath,
        SettingKey::MasterPassword,
        SettingKey::KeychainAccount,
        SettingKey::KeychainService,
        SettingKey::ShowAttributeValues,
        SettingKey::ShowUnfilledAttributes,
        SettingKey::DesiredAttributes,
        SettingKey::ShowPasswords,
        SettingKey::EntryDelimiter,
        SettingKey::PythonPath,
    ];

    /// Stable identifier used in the persisted store and on the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::DbPath => "keepassxc_db_path",
            Self::CliPath => "keepassxc_cli_path",
            Self::KeyfilePath => "keepassxc_keyfile_path",
            Self::MasterPassword => "keepassxc_master_password",
            Self::KeychainAccount => "keychain_account",
            Self::KeychainService => "keychain_service",
            Self::ShowAttributeValues => "show_attribute_values",
            Self::ShowUnfilledAttributes => "show_unfilled_attributes",
            Self::DesiredAttributes => "desired_attributes",
            Self::ShowPasswords => "show_passwords",
            Self::EntryDelimiter => "entry_delimiter",
            Self::PythonPath => "python_path",
        }
    }

    /// Only the keyword is exported to the surrounding launcher shell.
    pub fn is_exportable(self) -> bool {
        matches!(self, Self::Keyword)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown setting key {s:?}"))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Fixed default values, computed once per invocation. The keychain
/// account and service defaults are machine-dependent (current OS user,
/// workflow bundle id); everything else is constant.
#[derive(Debug, Clone)]
pub struct Defaults {
    values: BTreeMap<SettingKey, String>,
}

impl Defaults {
    /// Defaults for the running machine.
    pub fn compute() -> Self {
        Self::with_machine(current_user(), bundle_id())
    }

    /// Defaults with explicit machine-dependent values.
    pub fn with_machine(user: impl Into<String>, service: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(SettingKey::Keyword, "kp".to_string());
        values.insert(SettingKey::DbPath, String::new());
        values.insert(
            SettingKey::CliPath,
            "/usr/local/bin/keepassxc-cli".to_string(),
        );
        values.insert(SettingKey::KeyfilePath, String::new());
        values.insert(SettingKey::MasterPassword, String::new());
        values.insert(SettingKey::KeychainAccount, user.into());
        values.insert(SettingKey::KeychainService, service.into());
        values.insert(SettingKey::ShowAttributeValues, "true".to_string());
        values.insert(SettingKey::ShowUnfilledAttributes, "false".to_string());
        values.insert(
            SettingKey::DesiredAttributes,
            "title,username,password,url,notes".to_string(),
        );
        values.insert(SettingKey::ShowPasswords, "false".to_string());
        values.insert(SettingKey::EntryDelimiter, " › ".to_string());
        values.insert(SettingKey::PythonPath, "/usr/bin/python3".to_string());
        Self { values }
    }

    pub fn get(&self, key: SettingKey) -> &str {
        self.values
            .get(&key)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Workflow bundle identifier, from the launcher environment if set.
pub fn bundle_id() -> String {
    std::env::var(BUNDLE_ID_ENV).unwrap_or_else(|_| DEFAULT_BUNDLE_ID.to_string())
}

/// Current OS user name via `id -un`, with the environment as fallback.
fn current_user() -> String {
    if let Ok(output) = Command::new("id").arg("-un").output()
        && output.status.success()
    {
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Snapshot classification
// ---------------------------------------------------------------------------

/// The full key→value mapping at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    values: BTreeMap<SettingKey, String>,
}

impl Snapshot {
    pub fn new(values: BTreeMap<SettingKey, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: SettingKey) -> &str {
        self.values
            .get(&key)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// True iff every key holds exactly its default value.
    pub fn is_all_default(&self, defaults: &Defaults) -> bool {
        SettingKey::ALL
            .into_iter()
            .all(|key| self.get(key) == defaults.get(key))
    }

    /// True iff everything is empty apart from the keyword and the
    /// interpreter path, which are compared against their defaults: the
    /// launcher never clears those two, so "untouched" for them means
    /// "still the default", not "empty".
    pub fn is_all_empty(&self, defaults: &Defaults) -> bool {
        SettingKey::ALL.into_iter().all(|key| match key {
            SettingKey::Keyword | SettingKey::PythonPath => self.get(key) == defaults.get(key),
            _ => self.get(key).is_empty(),
        })
    }
}

// ---------------------------------------------------------------------------
// Value parsing helpers
// ---------------------------------------------------------------------------

/// Parses a stored string as a boolean. "1", "true" and "yes" count as
/// true, case-insensitively; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Splits a comma-joined list value, stripping all whitespace first.
pub fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }

    value
        .replace(' ', "")
        .split(',')
        .map(str::to_string)
        .collect()
}

/// Joins list items back into the stored representation.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

/// Dialog-facing rendering of a boolean.
pub fn bool_to_yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}
