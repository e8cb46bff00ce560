//! OS keychain abstraction for the master-password record.
//!
//! Uses the `keyring` crate to reach the platform credential store:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring / KWallet)
//! - Windows: Credential Manager
//!
//! The secret value is only ever written or deleted here; this system
//! never reads it back, it only probes for existence.

use crate::error::SecretError;

/// Seam over the OS credential store. One record per (account, service)
/// pair, holding a single opaque secret.
pub trait Vault {
    /// Stores `secret` under the pair.
    ///
    /// # Errors
    /// Returns [`SecretError::AlreadyExists`] if a record is present and
    /// `overwrite` is false.
    fn add(
        &self,
        account: &str,
        service: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<(), SecretError>;

    /// Whether a record exists under the pair.
    ///
    /// # Errors
    /// Propagates any backend failure other than "no such record".
    fn find(&self, account: &str, service: &str) -> Result<bool, SecretError>;

    /// Removes the record under the pair. Deleting a record that does not
    /// exist is a successful no-op.
    ///
    /// # Errors
    /// Propagates any backend failure other than "no such record".
    fn delete(&self, account: &str, service: &str) -> Result<(), SecretError>;
}

/// The real OS keychain.
#[derive(Debug, Default)]
pub struct OsVault;

impl OsVault {
    fn entry(account: &str, service: &str) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(service, account).map_err(|e| SecretError::Backend(e.to_string()))
    }
}

impl Vault for OsVault {
    fn add(
        &self,
        account: &str,
        service: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<(), SecretError> {
        // The keyring API overwrites unconditionally, so the "already
        // exists" contract is enforced with an explicit probe first.
        if !overwrite && self.find(account, service)? {
            return Err(SecretError::AlreadyExists);
        }

        Self::entry(account, service)?
            .set_password(secret)
            .map_err(|e| SecretError::Backend(e.to_string()))
    }

    fn find(&self, account: &str, service: &str) -> Result<bool, SecretError> {
        match Self::entry(account, service)?.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(SecretError::Backend(e.to_string())),
        }
    }

    fn delete(&self, account: &str, service: &str) -> Result<(), SecretError> {
        match Self::entry(account, service)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::Backend(e.to_string())),
        }
    }
}
