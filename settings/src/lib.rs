//! kpxflow settings configurator.
//!
//! Mediates between the interactive dialog shell, the OS credential
//! store and the persisted per-workflow settings namespace. One action
//! runs per invocation; all state changes are written through
//! immediately and cancellation simply stops the flow where it is.

pub mod actions;
pub mod dependency;
pub mod error;
pub mod prompt;
pub mod settings;
pub mod store;
pub mod vault;
