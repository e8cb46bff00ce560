//! External CLI dependency validation.
//!
//! A dependency binding names an executable, how to ask it for its
//! version, and the version range the workflow can work with: the major
//! version must match exactly while the minor version only has a floor,
//! because the probed tools break behaviour across majors but stay
//! forward-compatible within one.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{DependencyError, FlowResult};
use crate::prompt::Prompt;

/// A dependency to validate: probe arguments plus the accepted version
/// range. Constructed fresh per validation attempt; only the validated
/// path is persisted by the caller.
#[derive(Debug, Clone, Copy)]
pub struct DependencyBinding {
    pub name: &'static str,
    pub version_args: &'static [&'static str],
    pub required_major: u32,
    pub minor_floor: u32,
}

/// The Python interpreter running the workflow's query scripts.
pub const PYTHON: DependencyBinding = DependencyBinding {
    name: "Python",
    version_args: &["-V"],
    required_major: 3,
    minor_floor: 6,
};

/// The keepassxc-cli tool the workflow shells out to.
pub const KEEPASSXC_CLI: DependencyBinding = DependencyBinding {
    name: "KeepassXC CLI",
    version_args: &["-v"],
    required_major: 2,
    minor_floor: 6,
};

// ---------------------------------------------------------------------------
// Version parsing and comparison
// ---------------------------------------------------------------------------

/// A `major.minor` version. Trailing components are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Parses the leading `major.minor` of a version string.
    ///
    /// # Errors
    /// Returns [`DependencyError::InvalidVersion`] if either component is
    /// missing or not an integer.
    pub fn parse(raw: &str) -> Result<Self, DependencyError> {
        let invalid = || DependencyError::InvalidVersion(raw.to_string());
        let mut components = raw.split('.');

        let major = components
            .next()
            .and_then(|c| c.parse().ok())
            .ok_or_else(invalid)?;
        let minor = components
            .next()
            .and_then(|c| c.parse().ok())
            .ok_or_else(invalid)?;

        Ok(Self { major, minor })
    }

    /// Exact major match, minor at or above the floor.
    pub fn satisfies(self, binding: &DependencyBinding) -> bool {
        self.major == binding.required_major && self.minor >= binding.minor_floor
    }
}

/// Runs the binding's version probe against `path` and returns the raw
/// version string.
///
/// The probed tools print a line of the form `<name> <version>`; the
/// second whitespace-separated token is the version. Tools that print to
/// stderr instead of stdout are covered by falling back to stderr.
///
/// # Errors
/// [`DependencyError::NotFound`] if the path does not exist,
/// [`DependencyError::Unparsable`] if it cannot be executed or carries no
/// version token.
pub fn probe_version(binding: &DependencyBinding, path: &Path) -> Result<String, DependencyError> {
    let output = Command::new(path)
        .args(binding.version_args)
        .output()
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => DependencyError::NotFound(path.to_path_buf()),
            _ => DependencyError::Unparsable(path.to_path_buf()),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let line = if stdout.trim().is_empty() { stderr } else { stdout };

    let mut tokens = line.split_whitespace();
    let _name = tokens
        .next()
        .ok_or_else(|| DependencyError::Unparsable(path.to_path_buf()))?;

    tokens
        .next()
        .map(str::to_string)
        .ok_or_else(|| DependencyError::Unparsable(path.to_path_buf()))
}

/// Probes `path` and checks the reported version against the binding.
///
/// # Errors
/// Probe errors pass through; a parseable but unsupported version maps to
/// [`DependencyError::VersionMismatch`].
pub fn validate(binding: &DependencyBinding, path: &Path) -> Result<Version, DependencyError> {
    let raw = probe_version(binding, path)?;
    let version = Version::parse(&raw)?;

    if !version.satisfies(binding) {
        return Err(DependencyError::VersionMismatch {
            name: binding.name.to_string(),
            found: raw,
            required_major: binding.required_major,
            minor_floor: binding.minor_floor,
        });
    }

    Ok(version)
}

/// Validates `candidate`, asking the user for a replacement path on every
/// failure until validation passes or the user cancels. An empty
/// candidate falls back to `last_known_good` first.
///
/// # Errors
/// Returns [`FlowError::Cancelled`](crate::error::FlowError::Cancelled)
/// when the user gives up.
pub fn resolve(
    binding: &DependencyBinding,
    candidate: &str,
    last_known_good: &str,
    prompt: &dyn Prompt,
) -> FlowResult<PathBuf> {
    let mut candidate = if candidate.is_empty() {
        last_known_good.to_string()
    } else {
        candidate.to_string()
    };

    loop {
        let expanded = shellexpand::tilde(&candidate).into_owned();

        match validate(binding, Path::new(&expanded)) {
            Ok(version) => {
                tracing::debug!(
                    name = binding.name,
                    path = %expanded,
                    major = version.major,
                    minor = version.minor,
                    "dependency validated"
                );
                return Ok(PathBuf::from(expanded));
            }
            Err(err) => {
                let message = format!("{err}.\n\nSelect a correct path to {}.", binding.name);
                let picked = prompt.ask_file(&message, None)?;
                candidate = picked.to_string_lossy().into_owned();
            }
        }
    }
}
