//! Error taxonomy for settings actions.
//!
//! Every action bubbles its errors to the single dispatcher in `main`.
//! Cancellation is a distinguished variant, not a failure: the dispatcher
//! swallows it silently, while anything else is surfaced to the user as a
//! single dialog message.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the OS credential vault.
#[derive(Debug, Error)]
pub enum SecretError {
    /// A record already exists under the same (account, service) pair and
    /// the caller did not ask to overwrite it. Resolved interactively,
    /// never fatal on its own.
    #[error("the keychain already has an entry for this account and service")]
    AlreadyExists,
    /// Any vault failure other than "no such record".
    #[error("keychain error: {0}")]
    Backend(String),
}

/// Errors from probing an external CLI dependency.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The candidate path does not exist.
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    /// The file exists but could not be executed, or its output carried no
    /// version token.
    #[error("{} is not executable or does not report a version", .0.display())]
    Unparsable(PathBuf),
    /// The version token could not be parsed as `major.minor`.
    #[error("cannot read {0:?} as a version number")]
    InvalidVersion(String),
    /// The reported version does not satisfy the binding.
    #[error(
        "{name} {found} is not supported, \
         a {required_major}.{minor_floor} or newer {required_major}.x release is required"
    )]
    VersionMismatch {
        name: String,
        found: String,
        required_major: u32,
        minor_floor: u32,
    },
}

/// Errors from the durable settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read the settings store: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write the settings store: {0}")]
    Write(#[source] std::io::Error),
    #[error("the settings store is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Top-level result of one settings action.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The user dismissed a dialog. Ends the whole action; state already
    /// persisted before the cancellation point stays persisted.
    #[error("cancelled by user")]
    Cancelled,
    /// The current settings are unusable for the requested operation.
    #[error("{0}")]
    Config(String),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Failure of the dialog surface or another external collaborator.
    #[error("{0}")]
    External(String),
}

pub type FlowResult<T> = Result<T, FlowError>;
