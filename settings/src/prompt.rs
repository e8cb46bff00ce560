//! Modal prompt surface.
//!
//! The controller only talks to the [`Prompt`] trait; the interactive
//! implementation renders text and choice prompts in the terminal via
//! `inquire` and file pickers via the native `rfd` dialog. Dismissing any
//! prompt maps to [`FlowError::Cancelled`], which unwinds the whole
//! enclosing action.

use std::path::PathBuf;

use inquire::{Confirm, InquireError, MultiSelect, Password, PasswordDisplayMode, Select, Text};

use crate::error::{FlowError, FlowResult};

/// Options for a free-text prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions<'a> {
    /// Pre-filled answer shown to the user.
    pub default_answer: &'a str,
    /// Re-ask until the answer is non-empty.
    pub require_text: bool,
    /// Mask the input on screen.
    pub hide_input: bool,
}

/// The dialog shell the controller drives.
pub trait Prompt {
    /// Shows an informational message and returns once acknowledged.
    fn show_message(&self, message: &str);

    /// Asks a yes/no question. With `no_as_cancel`, answering "no" cancels
    /// the whole action instead of returning `false`.
    ///
    /// # Errors
    /// Returns [`FlowError::Cancelled`] if dismissed (or "no" with
    /// `no_as_cancel`).
    fn ask_yes_no(&self, message: &str, no_as_cancel: bool) -> FlowResult<bool>;

    /// Asks for a line of text.
    ///
    /// # Errors
    /// Returns [`FlowError::Cancelled`] if dismissed.
    fn ask_text(&self, message: &str, options: TextOptions<'_>) -> FlowResult<String>;

    /// Asks the user to pick an existing file, optionally filtered by
    /// extension.
    ///
    /// # Errors
    /// Returns [`FlowError::Cancelled`] if dismissed.
    fn ask_file(&self, message: &str, extension: Option<&str>) -> FlowResult<PathBuf>;

    /// Asks the user to pick one of `buttons`; a cancel choice is always
    /// available on top. Returns the index of the picked button.
    ///
    /// # Errors
    /// Returns [`FlowError::Cancelled`] if dismissed.
    fn ask_choice(&self, message: &str, buttons: &[&str]) -> FlowResult<usize>;

    /// Asks the user to pick a non-empty subset of `options`,
    /// pre-selecting `selected`.
    ///
    /// # Errors
    /// Returns [`FlowError::Cancelled`] if dismissed.
    fn ask_multi_select(
        &self,
        message: &str,
        options: &[String],
        selected: &[String],
    ) -> FlowResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Interactive implementation
// ---------------------------------------------------------------------------

/// Terminal prompts plus native file dialogs.
#[derive(Debug, Default)]
pub struct InteractivePrompt;

impl InteractivePrompt {
    pub fn new() -> Self {
        Self
    }
}

fn map_inquire(err: InquireError) -> FlowError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            FlowError::Cancelled
        }
        other => FlowError::External(other.to_string()),
    }
}

impl Prompt for InteractivePrompt {
    fn show_message(&self, message: &str) {
        println!("{message}");
    }

    fn ask_yes_no(&self, message: &str, no_as_cancel: bool) -> FlowResult<bool> {
        let answer = Confirm::new(message).prompt().map_err(map_inquire)?;

        if no_as_cancel && !answer {
            return Err(FlowError::Cancelled);
        }

        Ok(answer)
    }

    fn ask_text(&self, message: &str, options: TextOptions<'_>) -> FlowResult<String> {
        let mut message = message.to_string();

        loop {
            let answer = if options.hide_input {
                Password::new(&message)
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
            } else {
                Text::new(&message)
                    .with_initial_value(options.default_answer)
                    .prompt()
            }
            .map_err(map_inquire)?;

            if options.require_text && answer.is_empty() {
                message = format!("The value cannot be empty.\n\n{message}");
                continue;
            }

            return Ok(answer);
        }
    }

    fn ask_file(&self, message: &str, extension: Option<&str>) -> FlowResult<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(message);

        if let Some(ext) = extension {
            dialog = dialog.add_filter(ext, &[ext]);
        }

        dialog.pick_file().ok_or(FlowError::Cancelled)
    }

    fn ask_choice(&self, message: &str, buttons: &[&str]) -> FlowResult<usize> {
        let picked = Select::new(message, buttons.to_vec())
            .prompt()
            .map_err(map_inquire)?;

        // The picked value always comes from `buttons`.
        Ok(buttons
            .iter()
            .position(|b| *b == picked)
            .unwrap_or_default())
    }

    fn ask_multi_select(
        &self,
        message: &str,
        options: &[String],
        selected: &[String],
    ) -> FlowResult<Vec<String>> {
        let defaults: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, option)| selected.contains(option))
            .map(|(index, _)| index)
            .collect();

        loop {
            let picked = MultiSelect::new(message, options.to_vec())
                .with_default(&defaults)
                .prompt()
                .map_err(map_inquire)?;

            if picked.is_empty() {
                continue;
            }

            return Ok(picked);
        }
    }
}
