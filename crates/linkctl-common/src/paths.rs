//! Standard filesystem paths for systemd-networkd and linkctl.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// Default filesystem root, overridable for chroots and tests.
pub static LINKCTL_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("LINKCTL_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
});

/// Extension of link definition units.
pub const NETDEV_SUFFIX: &str = ".netdev";

/// Suffix appended to a unit file name to form its drop-in directory.
pub const DROPIN_DIR_SUFFIX: &str = ".d";

/// Extension of drop-in files.
pub const DROPIN_SUFFIX: &str = ".conf";

/// Where a link definition was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    /// The directory networkd scans for active link definitions.
    Enabled,
    /// A directory holding link definitions that are not active.
    Available,
}

/// One directory searched during link discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    /// Directory to scan.
    pub dir: PathBuf,
    /// Origin tag given to units found there.
    pub origin: LinkOrigin,
}

impl SearchPath {
    /// Glob pattern matching link definitions in this directory.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!("{}/*{NETDEV_SUFFIX}", escape(&self.dir))
    }
}

/// Standard paths used by linkctl.
#[derive(Debug, Clone)]
pub struct NetworkdPaths {
    /// Filesystem root every other path is relative to.
    pub root: PathBuf,
    /// Canonical networkd configuration directory.
    pub config_dir: PathBuf,
    /// Directories holding available link definitions, highest priority first.
    pub available_dirs: Vec<PathBuf>,
    /// networkd per-interface runtime state records.
    pub netif_links_dir: PathBuf,
    /// Kernel network interface class directory.
    pub sysfs_net_dir: PathBuf,
}

impl NetworkdPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths below a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join("etc/systemd/network");
        Self {
            available_dirs: vec![
                root.join("etc/linkctl/user"),
                root.join("etc/linkctl/system"),
                config_dir.join("netdev.available"),
            ],
            config_dir,
            netif_links_dir: root.join("run/systemd/netif/links"),
            sysfs_net_dir: root.join("sys/class/net"),
            root,
        }
    }

    /// Directories scanned for link definitions, in priority order.
    #[must_use]
    pub fn search_paths(&self) -> Vec<SearchPath> {
        let enabled = SearchPath {
            dir: self.config_dir.clone(),
            origin: LinkOrigin::Enabled,
        };
        std::iter::once(enabled)
            .chain(self.available_dirs.iter().map(|dir| SearchPath {
                dir: dir.clone(),
                origin: LinkOrigin::Available,
            }))
            .collect()
    }

    /// Location of a unit file in the canonical directory.
    #[must_use]
    pub fn enabled_unit(&self, unit_name: &str) -> PathBuf {
        self.config_dir.join(unit_name)
    }

    /// Drop-in directory of a unit.
    #[must_use]
    pub fn dropin_dir(&self, unit_name: &str) -> PathBuf {
        self.config_dir
            .join(format!("{unit_name}{DROPIN_DIR_SUFFIX}"))
    }

    /// A named drop-in file of a unit.
    #[must_use]
    pub fn dropin(&self, unit_name: &str, dropin_name: &str) -> PathBuf {
        self.dropin_dir(unit_name)
            .join(format!("{dropin_name}{DROPIN_SUFFIX}"))
    }

    /// Glob pattern matching every drop-in of a unit.
    #[must_use]
    pub fn dropin_pattern(&self, unit_name: &str) -> String {
        format!("{}/*{DROPIN_SUFFIX}", escape(&self.dropin_dir(unit_name)))
    }

    /// Runtime state record of an interface.
    #[must_use]
    pub fn netif_link(&self, ifindex: u32) -> PathBuf {
        self.netif_links_dir.join(ifindex.to_string())
    }

    /// sysfs directory of an interface.
    #[must_use]
    pub fn sysfs_interface(&self, name: &str) -> PathBuf {
        self.sysfs_net_dir.join(name)
    }

    /// Map a path as seen inside the root, such as one recorded by networkd,
    /// to its location on this host.
    #[must_use]
    pub fn rerooted(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    /// Inverse of [`rerooted`](Self::rerooted): the absolute path of a host
    /// location as seen inside the root. Paths outside the root are kept.
    #[must_use]
    pub fn unrooted(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), |rest| Path::new("/").join(rest))
    }

    /// Whether a path lies in the canonical configuration directory.
    #[must_use]
    pub fn in_config_dir(&self, path: &Path) -> bool {
        path.parent() == Some(self.config_dir.as_path())
    }
}

/// A directory as a literal glob prefix.
fn escape(dir: &Path) -> String {
    glob::Pattern::escape(&dir.to_string_lossy())
}

impl Default for NetworkdPaths {
    fn default() -> Self {
        Self::with_root(LINKCTL_ROOT.clone())
    }
}
