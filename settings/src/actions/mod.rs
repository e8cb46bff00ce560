//! Settings actions.
//!
//! The controller owns the canonical settings cache and orchestrates
//! prompting, validation, persistence and keychain synchronisation for
//! one action per invocation. All flows are written as explicit loops;
//! cancellation from any prompt unwinds the running action, leaving the
//! writes made before the cancellation point in place.

use std::str::FromStr;

use crate::dependency::{self, DependencyBinding};
use crate::error::{FlowError, FlowResult, SecretError};
use crate::prompt::{Prompt, TextOptions};
use crate::settings::{self, MASKED_PASSWORD, SettingKey};
use crate::store::ConfigStore;
use crate::vault::Vault;

/// One action entry point, dispatched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Full first-time setup flow.
    Init,
    /// Change one setting by key.
    Change(SettingKey),
    /// Restore all settings to defaults.
    Reset,
    /// Validate or repair the interpreter path.
    CheckPython,
    /// Validate or repair the keepassxc-cli path.
    CheckKeepassxc,
}

/// Orchestrates the settings flows over the store, the OS keychain and
/// the dialog surface.
pub struct SettingsController<'a> {
    store: ConfigStore,
    vault: &'a dyn Vault,
    prompt: &'a dyn Prompt,
}

impl<'a> SettingsController<'a> {
    pub fn new(store: ConfigStore, vault: &'a dyn Vault, prompt: &'a dyn Prompt) -> Self {
        Self {
            store,
            vault,
            prompt,
        }
    }

    /// Read access for assertions and for callers composing messages.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Runs one action to completion.
    ///
    /// # Errors
    /// [`FlowError::Cancelled`] when the user backs out; any other error
    /// is surfaced to the user by the caller.
    pub fn dispatch(&mut self, action: Action) -> FlowResult<()> {
        tracing::info!(?action, "running settings action");

        match action {
            Action::Init => self.init(),
            Action::Change(key) => self.change(key),
            Action::Reset => self.reset(),
            Action::CheckPython => self.check_dependency(&dependency::PYTHON, SettingKey::PythonPath),
            Action::CheckKeepassxc => {
                self.check_dependency(&dependency::KEEPASSXC_CLI, SettingKey::CliPath)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// First-time setup. Keeps the keyword and the interpreter path from a
    /// previous installation; everything else starts over.
    fn init(&mut self) -> FlowResult<()> {
        let snapshot = self.store.snapshot();
        let defaults = self.store.defaults();

        if !snapshot.is_all_default(defaults) && !snapshot.is_all_empty(defaults) {
            self.confirm_destructive_reset()?;
        }

        self.delete_secret_if_addressable()?;
        self.store
            .reset_to_defaults(&[SettingKey::Keyword, SettingKey::PythonPath])?;

        let db = self
            .prompt
            .ask_file("Select KeepassXC database file", Some("kdbx"))?
            .to_string_lossy()
            .into_owned();

        let keyfile = if self.prompt.ask_yes_no("Do you have a key file?", false)? {
            self.ask_keyfile_path()?
        } else {
            self.store.defaults().get(SettingKey::KeyfilePath).to_string()
        };

        let password = self.ask_master_password()?;

        self.store.set(SettingKey::DbPath, &db, false)?;
        self.store.set(SettingKey::KeyfilePath, &keyfile, false)?;
        self.store.set(SettingKey::MasterPassword, &password, false)?;
        self.prompt.show_message("The initialization was successful.");

        Ok(())
    }

    /// Changes a single setting through its prompt flow.
    fn change(&mut self, key: SettingKey) -> FlowResult<()> {
        let value = self.ask_value(key)?;

        if matches!(key, SettingKey::KeychainAccount | SettingKey::KeychainService) {
            self.forget_orphaned_secret(key, &value)?;
        }

        self.store.set(key, &value, key.is_exportable())?;
        self.prompt
            .show_message("The settings was changed successfully.");

        Ok(())
    }

    /// Restores every setting to its default, forgetting the stored secret.
    fn reset(&mut self) -> FlowResult<()> {
        self.confirm_destructive_reset()?;
        self.delete_secret_if_addressable()?;
        self.store.reset_to_defaults(&[])?;
        self.prompt
            .show_message("The settings were reset to defaults successfully.");

        Ok(())
    }

    /// Validates the dependency behind `key`, persisting a repaired path.
    fn check_dependency(
        &mut self,
        binding: &DependencyBinding,
        key: SettingKey,
    ) -> FlowResult<()> {
        let current = self.store.get(key).to_string();
        let fallback = self.store.defaults().get(key).to_string();
        let resolved = dependency::resolve(binding, &current, &fallback, self.prompt)?;
        let resolved = resolved.to_string_lossy().into_owned();

        if resolved != current {
            self.store.set(key, &resolved, false)?;
        }

        self.prompt
            .show_message(&format!("{} is configured correctly.", binding.name));

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Per-key prompt flows
    // -----------------------------------------------------------------------

    /// The one prompt procedure bound to `key`. Covers the whole closed
    /// key set, so an unhandled key cannot exist.
    fn ask_value(&mut self, key: SettingKey) -> FlowResult<String> {
        match key {
            SettingKey::Keyword => self.ask_required_text(
                "Enter the keyword that triggers the workflow in the launcher.",
                SettingKey::Keyword,
            ),
            SettingKey::DbPath => Ok(self
                .prompt
                .ask_file("Select KeepassXC database file", Some("kdbx"))?
                .to_string_lossy()
                .into_owned()),
            SettingKey::CliPath => Ok(self
                .prompt
                .ask_file("Select executable KeepassXC CLI file", None)?
                .to_string_lossy()
                .into_owned()),
            SettingKey::KeyfilePath => self.ask_keyfile_path(),
            SettingKey::MasterPassword => self.ask_master_password(),
            SettingKey::KeychainAccount => self.ask_required_text(
                "Enter the account name you want to use for the keychain.",
                SettingKey::KeychainAccount,
            ),
            SettingKey::KeychainService => self.ask_required_text(
                "Enter the service name you want to use for the keychain.",
                SettingKey::KeychainService,
            ),
            SettingKey::ShowAttributeValues => self.ask_bool("Show values for attributes?"),
            SettingKey::ShowUnfilledAttributes => self.ask_bool("Show unfilled attributes?"),
            SettingKey::DesiredAttributes => self.ask_desired_attributes(),
            SettingKey::ShowPasswords => self.ask_bool("Show entry passwords in the launcher?"),
            SettingKey::EntryDelimiter => self.ask_required_text(
                "Enter the delimiter for entries path.",
                SettingKey::EntryDelimiter,
            ),
            SettingKey::PythonPath => Ok(self
                .prompt
                .ask_file("Select the Python interpreter file", None)?
                .to_string_lossy()
                .into_owned()),
        }
    }

    fn ask_required_text(&self, message: &str, key: SettingKey) -> FlowResult<String> {
        self.prompt.ask_text(
            message,
            TextOptions {
                default_answer: self.store.get(key),
                require_text: true,
                hide_input: false,
            },
        )
    }

    fn ask_bool(&self, message: &str) -> FlowResult<String> {
        let answer = self.prompt.ask_yes_no(message, false)?;
        Ok(answer.to_string())
    }

    /// Subset chooser over the known entry attributes, pre-selecting the
    /// currently configured ones.
    fn ask_desired_attributes(&self) -> FlowResult<String> {
        let available = settings::split_list(
            self.store.defaults().get(SettingKey::DesiredAttributes),
        );
        let selected = settings::split_list(self.store.get(SettingKey::DesiredAttributes));

        let picked = self.prompt.ask_multi_select(
            "Select the attributes you need",
            &available,
            &selected,
        )?;

        Ok(settings::join_list(&picked))
    }

    /// Key-file flow: an already configured key file can be removed
    /// (returns empty) or replaced through the file chooser.
    fn ask_keyfile_path(&self) -> FlowResult<String> {
        if !self.store.get(SettingKey::KeyfilePath).is_empty() {
            let choice = self.prompt.ask_choice(
                "You have the key. You can remove it or define a different one.",
                &["Remove", "Change"],
            )?;

            if choice == 0 {
                return Ok(String::new());
            }
        }

        Ok(self
            .prompt
            .ask_file("Select KeepassXC key file", None)?
            .to_string_lossy()
            .into_owned())
    }

    // -----------------------------------------------------------------------
    // Master-password flow
    // -----------------------------------------------------------------------

    /// Runs the remove/change flow and returns the new value of the
    /// password field: the masked placeholder after a successful keychain
    /// write, or empty after a removal.
    fn ask_master_password(&mut self) -> FlowResult<String> {
        let (account, service) = self.require_keychain_identity()?;

        if self.store.get(SettingKey::MasterPassword) == MASKED_PASSWORD {
            let choice = self.prompt.ask_choice(
                "What would you like to do with your password?",
                &["Remove", "Change"],
            )?;

            if choice == 0 {
                self.prompt.ask_yes_no(
                    "The workflow will forget your password. Do you want to continue?",
                    true,
                )?;
                self.vault.delete(&account, &service)?;
                return Ok(String::new());
            }
        }

        let secret = self.prompt.ask_text(
            "Enter the password to use the KeepassXC database.\n\
             If you don't have the password then press continue.",
            TextOptions {
                default_answer: "",
                require_text: false,
                hide_input: true,
            },
        )?;

        self.store_secret(&account, &service, &secret)?;
        Ok(MASKED_PASSWORD.to_string())
    }

    /// Writes the secret, resolving an existing record interactively.
    fn store_secret(&self, account: &str, service: &str, secret: &str) -> FlowResult<()> {
        match self.vault.add(account, service, secret, false) {
            Ok(()) => Ok(()),
            Err(SecretError::AlreadyExists) => {
                let choice = self.prompt.ask_choice(
                    "Your keychain already has an entry with the same service name \
                     and account name. What do you want to do next?",
                    &["Update the existing entry", "Use the existing entry"],
                )?;

                if choice == 0 {
                    self.vault.add(account, service, secret, true)?;
                }

                // Keeping the existing entry counts as success.
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Keychain identity
    // -----------------------------------------------------------------------

    /// The record under the old (account, service) pair becomes
    /// permanently unreachable once either half changes, so it is deleted
    /// up front and the masked placeholder cleared with it.
    fn forget_orphaned_secret(&mut self, key: SettingKey, new_value: &str) -> FlowResult<()> {
        let old_value = self.store.get(key);

        if new_value.is_empty() || new_value == old_value {
            return Ok(());
        }

        let account = self.store.get(SettingKey::KeychainAccount).to_string();
        let service = self.store.get(SettingKey::KeychainService).to_string();

        if account.is_empty() || service.is_empty() {
            return Ok(());
        }

        if self.vault.find(&account, &service)? {
            tracing::info!(%account, %service, "forgetting keychain record under old identity");
            self.vault.delete(&account, &service)?;
            self.store.set(SettingKey::MasterPassword, "", false)?;
        }

        Ok(())
    }

    fn require_keychain_identity(&self) -> FlowResult<(String, String)> {
        let account = self.store.get(SettingKey::KeychainAccount).to_string();
        let service = self.store.get(SettingKey::KeychainService).to_string();

        if account.is_empty() || service.is_empty() {
            return Err(FlowError::Config(
                "The keychain account and service must be configured before \
                 the master password can be stored."
                    .to_string(),
            ));
        }

        Ok((account, service))
    }

    // -----------------------------------------------------------------------
    // Shared pieces
    // -----------------------------------------------------------------------

    fn confirm_destructive_reset(&self) -> FlowResult<()> {
        self.prompt.ask_yes_no(
            "This action resets all your current settings to default values. \
             Do you want to continue?",
            true,
        )?;

        Ok(())
    }

    /// Deletes the stored secret when the identity pair is usable; with an
    /// unconfigured pair there is nothing addressable to delete.
    fn delete_secret_if_addressable(&self) -> FlowResult<()> {
        let account = self.store.get(SettingKey::KeychainAccount);
        let service = self.store.get(SettingKey::KeychainService);

        if account.is_empty() || service.is_empty() {
            return Ok(());
        }

        self.vault.delete(account, service)?;
        Ok(())
    }
}

/// Parses a CLI `change` key argument into the closed key set.
///
/// # Errors
/// Returns the parse message for unknown keys.
pub fn parse_key(raw: &str) -> Result<SettingKey, String> {
    SettingKey::from_str(raw)
}
