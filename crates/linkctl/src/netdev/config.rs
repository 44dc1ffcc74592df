//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use linkctl_common::NetworkdPaths;
use linkctl_network::{NETWORKD_UNIT, Systemctl};

use super::host::Host;

/// Options for link operations.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Filesystem layout.
    pub paths: NetworkdPaths,
    /// Whether to restart the daemon after a transition.
    pub restart: bool,
    /// systemd unit of the network daemon.
    pub daemon_unit: String,
    /// Restart timeout (seconds).
    pub restart_timeout: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            paths: NetworkdPaths::new(),
            restart: true,
            daemon_unit: NETWORKD_UNIT.to_string(),
            restart_timeout: 30,
        }
    }
}

impl LinkConfig {
    /// Set the root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = NetworkdPaths::with_root(root);
        self
    }

    /// Leave the daemon running after a transition.
    #[must_use]
    pub fn without_restart(mut self) -> Self {
        self.restart = false;
        self
    }

    /// Set the daemon unit.
    #[must_use]
    pub fn with_daemon_unit(mut self, unit: impl Into<String>) -> Self {
        self.daemon_unit = unit.into();
        self
    }

    /// Set the restart timeout.
    #[must_use]
    pub fn with_restart_timeout(mut self, timeout: u64) -> Self {
        self.restart_timeout = timeout;
        self
    }

    /// The running system under the configured root.
    #[must_use]
    pub fn host(&self) -> Host {
        Host::system(self.paths.clone())
    }

    /// Daemon handle honouring the configured unit and timeout.
    #[must_use]
    pub fn daemon(&self) -> Systemctl {
        Systemctl::new(self.daemon_unit.as_str())
            .with_timeout(Duration::from_secs(self.restart_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LinkConfig::default();
        assert!(config.restart);
        assert_eq!(config.daemon_unit, "systemd-networkd");
        assert_eq!(config.restart_timeout, 30);
    }

    #[test]
    fn builder_pattern() {
        let config = LinkConfig::default()
            .with_root("/custom/root")
            .without_restart()
            .with_daemon_unit("networkd-test")
            .with_restart_timeout(5);

        assert!(!config.restart);
        assert_eq!(config.daemon().unit(), "networkd-test");
        assert_eq!(
            config.paths.config_dir,
            PathBuf::from("/custom/root/etc/systemd/network")
        );
    }
}
