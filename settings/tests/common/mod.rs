//! Shared test doubles: a scripted prompt and an in-memory vault.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use kpxflow_settings::error::{FlowError, FlowResult, SecretError};
use kpxflow_settings::prompt::{Prompt, TextOptions};
use kpxflow_settings::vault::Vault;

/// One scripted answer for the next prompt the controller shows.
#[derive(Debug, Clone)]
pub enum Reply {
    YesNo(bool),
    Text(String),
    File(PathBuf),
    Choice(usize),
    MultiSelect(Vec<String>),
    Cancel,
}

/// Prompt double that replays a fixed script of replies and records every
/// informational message.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    replies: RefCell<VecDeque<Reply>>,
    pub messages: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            messages: RefCell::new(Vec::new()),
        }
    }

    pub fn shown_messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    fn next(&self) -> Reply {
        self.replies
            .borrow_mut()
            .pop_front()
            .expect("controller asked more prompts than the test scripted")
    }
}

impl Prompt for ScriptedPrompt {
    fn show_message(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn ask_yes_no(&self, _message: &str, no_as_cancel: bool) -> FlowResult<bool> {
        match self.next() {
            Reply::YesNo(answer) => {
                if no_as_cancel && !answer {
                    Err(FlowError::Cancelled)
                } else {
                    Ok(answer)
                }
            }
            Reply::Cancel => Err(FlowError::Cancelled),
            other => panic!("expected a yes/no reply, got {other:?}"),
        }
    }

    fn ask_text(&self, _message: &str, _options: TextOptions<'_>) -> FlowResult<String> {
        match self.next() {
            Reply::Text(text) => Ok(text),
            Reply::Cancel => Err(FlowError::Cancelled),
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    fn ask_file(&self, _message: &str, _extension: Option<&str>) -> FlowResult<PathBuf> {
        match self.next() {
            Reply::File(path) => Ok(path),
            Reply::Cancel => Err(FlowError::Cancelled),
            other => panic!("expected a file reply, got {other:?}"),
        }
    }

    fn ask_choice(&self, _message: &str, _buttons: &[&str]) -> FlowResult<usize> {
        match self.next() {
            Reply::Choice(index) => Ok(index),
            Reply::Cancel => Err(FlowError::Cancelled),
            other => panic!("expected a choice reply, got {other:?}"),
        }
    }

    fn ask_multi_select(
        &self,
        _message: &str,
        _options: &[String],
        _selected: &[String],
    ) -> FlowResult<Vec<String>> {
        match self.next() {
            Reply::MultiSelect(picked) => Ok(picked),
            Reply::Cancel => Err(FlowError::Cancelled),
            other => panic!("expected a multi-select reply, got {other:?}"),
        }
    }
}

/// In-memory vault with the same add/find/delete contract as the OS one.
#[derive(Debug, Default)]
pub struct MemoryVault {
    records: RefCell<HashMap<(String, String), String>>,
}

impl MemoryVault {
    pub fn with_record(account: &str, service: &str, secret: &str) -> Self {
        let vault = Self::default();
        vault.records.borrow_mut().insert(
            (account.to_string(), service.to_string()),
            secret.to_string(),
        );
        vault
    }

    pub fn contains(&self, account: &str, service: &str) -> bool {
        self.records
            .borrow()
            .contains_key(&(account.to_string(), service.to_string()))
    }

    pub fn secret(&self, account: &str, service: &str) -> Option<String> {
        self.records
            .borrow()
            .get(&(account.to_string(), service.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }
}

impl Vault for MemoryVault {
    fn add(
        &self,
        account: &str,
        service: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<(), SecretError> {
        let key = (account.to_string(), service.to_string());
        let mut records = self.records.borrow_mut();

        if !overwrite && records.contains_key(&key) {
            return Err(SecretError::AlreadyExists);
        }

        records.insert(key, secret.to_string());
        Ok(())
    }

    fn find(&self, account: &str, service: &str) -> Result<bool, SecretError> {
        Ok(self.contains(account, service))
    }

    fn delete(&self, account: &str, service: &str) -> Result<(), SecretError> {
        self.records
            .borrow_mut()
            .remove(&(account.to_string(), service.to_string()));
        Ok(())
    }
}
