//! Tracing setup for toolkit binaries and tests.
//!
//! Transform passes emit structured progress at info level and
//! per-window alignment detail at debug/trace, so long runs over big
//! documents can be followed and audited. `init_tracing` installs a
//! compact stdout subscriber filtered by `RUST_LOG` (default `info`).
//! File logging is opt-in: when [`crate::config::Config::log_file`] is
//! set (or `TEXTLOOM_LOG_FILE`, if no config has been installed), a
//! plain-text layer appends to that path through a non-blocking writer.
use std::fs::{File, OpenOptions};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::CONFIG;

// Keeps the non-blocking writer's worker alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber: a compact stdout layer, plus a
/// file layer when a log file is configured.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer);

    match open_log_file() {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = FILE_GUARD.set(guard);
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false).compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

// The log path comes from the loaded config; falling back to the env var
// lets init_tracing run before (or without) init_config. No path means
// no file logging: a library must not invent log locations on its own.
fn configured_log_path() -> Option<String> {
    match CONFIG.get() {
        Some(config) => config.log_file.clone(),
        None => std::env::var("TEXTLOOM_LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty()),
    }
}

fn open_log_file() -> Option<File> {
    let path = configured_log_path()?;
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Failed to open log file {path}: {err}");
            None
        }
    }
}
