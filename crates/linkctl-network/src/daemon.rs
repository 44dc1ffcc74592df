//! Restarting the network daemon.

use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use linkctl_common::{LinkError, LinkResult};
use tokio::process::Command;

/// Default systemd unit of the network daemon.
pub const NETWORKD_UNIT: &str = "systemd-networkd";

/// A daemon that must be restarted for configuration changes to apply.
#[async_trait]
pub trait NetworkDaemon: Send + Sync {
    /// Restart the daemon and wait for it to come back.
    async fn restart(&self) -> LinkResult<()>;
}

/// Restarts a systemd service with `systemctl`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    unit: String,
    timeout: Duration,
    progress: bool,
}

impl Systemctl {
    /// Manage the given service unit.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            timeout: Duration::from_secs(30),
            progress: true,
        }
    }

    /// Give up waiting after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Show or hide the progress spinner.
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// The managed service unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    fn spinner(&self) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Waiting on {} to restart", self.unit));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    fn failure(&self, message: impl Into<String>) -> LinkError {
        LinkError::DaemonReload {
            unit: self.unit.clone(),
            message: message.into(),
        }
    }
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new(NETWORKD_UNIT)
    }
}

#[async_trait]
impl NetworkDaemon for Systemctl {
    async fn restart(&self) -> LinkResult<()> {
        tracing::debug!(unit = %self.unit, "Restarting service");

        let pb = self.spinner();
        let result = tokio::time::timeout(
            self.timeout,
            Command::new("systemctl")
                .args(["restart", self.unit.as_str()])
                .output(),
        )
        .await;
        pb.finish_and_clear();

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.failure(format!("failed to execute systemctl: {e}"))),
            Err(_) => {
                return Err(self.failure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{} ({})", stderr.trim(), output.status)));
        }

        tracing::info!(unit = %self.unit, "Service restarted");
        Ok(())
    }
}
