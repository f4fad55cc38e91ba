//! rabbitmq-zabbix library
//!
//! This crate provides the core functionality for polling the RabbitMQ
//! management API and feeding Zabbix, either through low-level discovery
//! JSON or through `zabbix_sender` batches.

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod sender;
pub mod transformer;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::{Dispatch, Level};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter};

/// Build the logging handle
///
/// Log records are appended to `file` without ANSI colours. If the file
/// cannot be opened, records go to stderr instead; stdout is reserved for
/// check output. `RUST_LOG` takes precedence over `level` when set.
///
/// The returned handle is not installed globally; the dispatcher runs each
/// check with it as the scoped default.
///
/// # Arguments
/// * `file` - Log file path
/// * `level` - Maximum level when `RUST_LOG` is unset
pub fn init_logging(file: &Path, level: Level) -> Dispatch {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
        })
    };

    match OpenOptions::new().create(true).append(true).open(file) {
        Ok(log_file) => Dispatch::new(
            tracing_subscriber::registry().with(filter()).with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file)),
            ),
        ),
        Err(e) => {
            let dispatch = Dispatch::new(
                tracing_subscriber::registry()
                    .with(filter())
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            );
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::warn!(
                    path = %file.display(),
                    error = %e,
                    "Failed to open log file, logging to stderr"
                );
            });
            dispatch
        }
    }
}
