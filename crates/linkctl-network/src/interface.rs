//! Kernel network interfaces.

use std::path::PathBuf;
use std::process::Command;

use linkctl_common::{LinkError, LinkResult, NetworkdPaths};

/// The kernel's table of network interfaces.
pub trait InterfaceTable: Send + Sync {
    /// Interface index, or `None` if no interface has this name.
    fn index(&self, name: &str) -> Option<u32>;

    /// Whether an interface with this name exists.
    fn exists(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    /// Delete an interface. Deleting an absent interface succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Interface`] if an existing interface could not be
    /// deleted.
    fn delete(&self, name: &str) -> LinkResult<()>;
}

/// Interface table backed by sysfs and the `ip` command.
#[derive(Debug, Clone)]
pub struct IpLink {
    sysfs_net_dir: PathBuf,
}

impl IpLink {
    /// Create an interface table reading from the sysfs directory in `paths`.
    #[must_use]
    pub fn new(paths: &NetworkdPaths) -> Self {
        Self {
            sysfs_net_dir: paths.sysfs_net_dir.clone(),
        }
    }
}

impl InterfaceTable for IpLink {
    fn index(&self, name: &str) -> Option<u32> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return None;
        }

        let path = self.sysfs_net_dir.join(name).join("ifindex");
        std::fs::read_to_string(path)
            .ok()
            .and_then(|index| index.trim().parse().ok())
    }

    fn delete(&self, name: &str) -> LinkResult<()> {
        if !self.exists(name) {
            tracing::debug!(name, "Interface already absent");
            return Ok(());
        }

        tracing::debug!(name, "Deleting interface");

        let output = Command::new("ip")
            .args(["link", "del", name])
            .output()
            .map_err(|e| LinkError::Interface {
                name: name.to_string(),
                action: "delete",
                message: format!("failed to execute ip link del: {e}"),
            })?;

        if !output.status.success() {
            return Err(LinkError::Interface {
                name: name.to_string(),
                action: "delete",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::info!(name, "Interface deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn index_reads_sysfs() {
        let temp = tempdir().unwrap();
        let paths = NetworkdPaths::with_root(temp.path());
        let eth0 = paths.sysfs_interface("eth0");
        fs::create_dir_all(&eth0).unwrap();
        fs::write(eth0.join("ifindex"), "2\n").unwrap();

        let table = IpLink::new(&paths);
        assert_eq!(table.index("eth0"), Some(2));
        assert!(table.exists("eth0"));
        assert!(!table.exists("eth1"));
    }

    #[test]
    fn index_rejects_path_like_names() {
        let temp = tempdir().unwrap();
        let table = IpLink::new(&NetworkdPaths::with_root(temp.path()));
        assert_eq!(table.index("../eth0"), None);
        assert_eq!(table.index(""), None);
    }

    #[test]
    fn deleting_absent_interface_succeeds() {
        let temp = tempdir().unwrap();
        let table = IpLink::new(&NetworkdPaths::with_root(temp.path()));
        assert!(table.delete("vlan404").is_ok());
    }
}
