//! Settings configurator binary.
//!
//! Dispatches exactly one action per invocation. Cancellation ends the
//! action silently; every other failure is surfaced to the user as a
//! single message.

use anyhow::Result;
use clap::{Parser, Subcommand};

use kpxflow_settings::actions::{Action, SettingsController, parse_key};
use kpxflow_settings::error::FlowError;
use kpxflow_settings::prompt::{InteractivePrompt, Prompt};
use kpxflow_settings::settings::{Defaults, SettingKey};
use kpxflow_settings::store::ConfigStore;
use kpxflow_settings::vault::OsVault;

#[derive(Parser)]
#[command(name = "kpxflow-settings", about = "Configure the KeepassXC launcher workflow")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full first-time setup flow
    Init,
    /// Change one setting by key
    Change {
        /// Setting key, e.g. "keyword" or "keepassxc_db_path"
        #[arg(value_parser = parse_key)]
        key: SettingKey,
    },
    /// Restore all settings to defaults
    Reset,
    /// Validate or repair the Python interpreter path
    CheckPython,
    /// Validate or repair the KeepassXC CLI path
    CheckKeepassxc,
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Init => Action::Init,
            Command::Change { key } => Action::Change(key),
            Command::Reset => Action::Reset,
            Command::CheckPython => Action::CheckPython,
            Command::CheckKeepassxc => Action::CheckKeepassxc,
        }
    }
}

/// Initialize structured logging with tracing
fn init_logging() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let prompt = InteractivePrompt::new();
    let vault = OsVault;
    let store = ConfigStore::open_default(Defaults::compute())?;
    let mut controller = SettingsController::new(store, &vault, &prompt);

    match controller.dispatch(cli.command.into()) {
        Ok(()) => {}
        Err(FlowError::Cancelled) => {
            tracing::debug!("action cancelled by user");
        }
        Err(err) => {
            prompt.show_message(&format!("An error has occurred.\n\n{err}"));
            std::process::exit(1);
        }
    }

    Ok(())
}
