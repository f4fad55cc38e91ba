//! zabbix_sender adapter
//!
//! Writes metric lines to a temporary data file and hands it to the external
//! `zabbix_sender` executable. The data file is removed once the sender has
//! exited, whatever the outcome.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, error, instrument, warn};

use crate::config::SenderConfig;
use crate::error::SenderError;
use crate::transformer::{render, MetricLine};

/// Exit code reported when the sender was terminated by a signal
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// External sender invocation settings
#[derive(Debug, Clone)]
pub struct Sender {
    binary: String,
    agent_config: PathBuf,
    proxy: Option<String>,
    sender_hostname: Option<String>,
}

impl Sender {
    /// Create a sender using the given executable and agent config file
    pub fn new(binary: impl Into<String>, agent_config: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            agent_config: agent_config.into(),
            proxy: None,
            sender_hostname: None,
        }
    }

    /// Build from the `sender` config section
    pub fn from_config(config: &SenderConfig) -> Self {
        Self::new(config.binary.clone(), config.agent_config.clone())
            .with_proxy(config.proxy.clone())
            .with_sender_hostname(config.sender_hostname.clone())
    }

    /// Zabbix server/proxy override (`-z`); empty strings are ignored
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.is_empty());
        self
    }

    /// Reported host name override (`-s`); empty strings are ignored
    pub fn with_sender_hostname(mut self, hostname: Option<String>) -> Self {
        self.sender_hostname = hostname.filter(|h| !h.is_empty());
        self
    }

    /// Sender command line arguments for a given data file
    pub fn args(&self, data_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-vv".into(), "-c".into(), self.agent_config.clone().into()];

        if let Some(proxy) = &self.proxy {
            args.push("-z".into());
            args.push(proxy.into());
        }

        if let Some(hostname) = &self.sender_hostname {
            args.push("-s".into());
            args.push(hostname.into());
        }

        args.push("-i".into());
        args.push(data_file.into());
        args
    }

    /// Deliver lines through the sender and return its exit code
    ///
    /// A nonzero exit code is logged with the sender's output and returned
    /// unchanged.
    ///
    /// # Errors
    /// Returns `SenderError` if the data file cannot be written or the
    /// executable cannot be started
    #[instrument(skip_all, fields(binary = %self.binary, lines = lines.len()))]
    pub async fn send(&self, lines: &[MetricLine]) -> Result<i32, SenderError> {
        let data_file = write_data_file(lines)?;

        debug!(path = %data_file.display(), "Running sender");

        let output = Command::new(&self.binary)
            .args(self.args(&data_file))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SenderError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        debug!("Finished sending data");

        let return_code = output.status.code().unwrap_or(SIGNALED_EXIT_CODE);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        debug!(return_code, "Found sender return code");
        if output.status.success() {
            debug!(stdout = %stdout.trim_end(), stderr = %stderr.trim_end(), "Sender output");
        } else {
            error!(
                return_code,
                stdout = %stdout.trim_end(),
                stderr = %stderr.trim_end(),
                "Sender reported failure"
            );
        }

        if let Err(e) = data_file.close() {
            warn!(error = %e, "Failed to remove sender data file");
        }

        Ok(return_code)
    }
}

/// Write rendered lines to a fresh temporary file and close it
///
/// The returned path removes the file when dropped.
fn write_data_file(lines: &[MetricLine]) -> Result<TempPath, SenderError> {
    let mut file = tempfile::Builder::new()
        .prefix("rabbitmq-zabbix-")
        .suffix(".data")
        .tempfile()
        .map_err(SenderError::DataFile)?;

    file.write_all(render(lines).as_bytes())
        .map_err(SenderError::DataFile)?;
    file.flush().map_err(SenderError::DataFile)?;

    Ok(file.into_temp_path())
}
