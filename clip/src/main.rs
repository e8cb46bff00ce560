//! Clipboard helper binary.
//!
//! Places a value on the system clipboard. With a positive timeout it
//! polls once per second and clears the clipboard when the timeout
//! elapses, but only while the clipboard still holds exactly the value
//! it set: the moment someone else copies something, polling stops and
//! nothing is cleared. The timed clear is what keeps secrets from
//! lingering in clipboard-manager history.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use arboard::Clipboard;
use clap::Parser;

/// Longest supported auto-clear timeout, the same limit the KeepassXC UI
/// enforces.
const MAX_TIMEOUT_SECS: u64 = 999;

#[derive(Parser)]
#[command(name = "kpxflow-clip", about = "Copy a value and clear it after a timeout")]
struct Cli {
    /// Value to place on the clipboard
    value: String,
    /// Seconds until the clipboard is cleared; 0 or unparsable keeps the
    /// value indefinitely
    timeout: Option<String>,
}

/// Parses the raw timeout argument, treating anything unparsable as "no
/// timeout" and capping the rest.
fn parse_timeout(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
        .min(MAX_TIMEOUT_SECS)
}

/// Outcome of one polling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    /// The value is still ours and time remains.
    KeepPolling,
    /// Someone else owns the clipboard now; leave it alone.
    Stop,
    /// The timeout elapsed with our value still present.
    Clear,
}

fn tick(original: &str, current: &str, is_last: bool) -> Tick {
    if current != original {
        Tick::Stop
    } else if is_last {
        Tick::Clear
    } else {
        Tick::KeepPolling
    }
}

fn place_on_clipboard(clipboard: &mut Clipboard, value: &str) -> Result<()> {
    clipboard.set_text(value.to_string())?;
    Ok(())
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
    let timeout = parse_timeout(cli.timeout.as_deref());

    let mut clipboard = Clipboard::new()?;
    place_on_clipboard(&mut clipboard, &cli.value)?;

    if timeout == 0 {
        return Ok(());
    }

    tracing::debug!(timeout, "polling clipboard until timeout");

    for elapsed in 1..=timeout {
        thread::sleep(Duration::from_secs(1));

        let current = clipboard.get_text().unwrap_or_default();

        match tick(&cli.value, &current, elapsed == timeout) {
            Tick::KeepPolling => {}
            Tick::Stop => break,
            Tick::Clear => {
                clipboard.clear()?;
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_clamped_to_the_maximum() {
        assert_eq!(parse_timeout(Some("1500")), 999);
        assert_eq!(parse_timeout(Some("999")), 999);
        assert_eq!(parse_timeout(Some("5")), 5);
    }

    #[test]
    fn unparsable_timeout_means_no_timeout() {
        assert_eq!(parse_timeout(None), 0);
        assert_eq!(parse_timeout(Some("")), 0);
        assert_eq!(parse_timeout(Some("soon")), 0);
        assert_eq!(parse_timeout(Some("-3")), 0);
    }

    /// Replays the polling decisions for a clipboard that nobody touches:
    /// the value is cleared exactly when the timeout elapses.
    #[test]
    fn untouched_clipboard_is_cleared_at_timeout() {
        let timeout = 5;
        let mut decisions = Vec::new();

        for elapsed in 1..=timeout {
            decisions.push(tick("hunter2", "hunter2", elapsed == timeout));
        }

        assert_eq!(
            decisions,
            vec![
                Tick::KeepPolling,
                Tick::KeepPolling,
                Tick::KeepPolling,
                Tick::KeepPolling,
                Tick::Clear,
            ]
        );
    }

    /// Once another value appears, polling stops and no clear happens,
    /// even when the timeout would elapse later.
    #[test]
    fn overwritten_clipboard_stops_polling_without_clearing() {
        assert_eq!(tick("hunter2", "hunter2", false), Tick::KeepPolling);
        assert_eq!(tick("hunter2", "something else", false), Tick::Stop);
        // Even on the final tick an overwritten clipboard is left alone.
        assert_eq!(tick("hunter2", "something else", true), Tick::Stop);
    }
}
