//! Access to the host the links live on.

use std::fmt;
use std::sync::Arc;

use linkctl_common::NetworkdPaths;
use linkctl_network::{InterfaceTable, IpLink, NetifState, RuntimeState};

use super::network::NetworkResolver;

/// Filesystem layout plus the live system queried by link operations.
#[derive(Clone)]
pub struct Host {
    /// Filesystem layout.
    pub paths: NetworkdPaths,
    /// Kernel interface table.
    pub interfaces: Arc<dyn InterfaceTable>,
    /// networkd runtime state.
    pub runtime: Arc<dyn RuntimeState>,
}

impl Host {
    /// Assemble a host from its parts.
    pub fn new(
        paths: NetworkdPaths,
        interfaces: Arc<dyn InterfaceTable>,
        runtime: Arc<dyn RuntimeState>,
    ) -> Self {
        Self {
            paths,
            interfaces,
            runtime,
        }
    }

    /// The running system, seen through `paths`.
    #[must_use]
    pub fn system(paths: NetworkdPaths) -> Self {
        let interfaces = Arc::new(IpLink::new(&paths));
        let runtime = Arc::new(NetifState::new(&paths));
        Self::new(paths, interfaces, runtime)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

/// What a link transition needs besides the link itself.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The host.
    pub host: &'a Host,
    /// Resolved parent networks.
    pub networks: &'a NetworkResolver,
}

impl<'a> Context<'a> {
    /// Bundle a host with its resolved networks.
    #[must_use]
    pub const fn new(host: &'a Host, networks: &'a NetworkResolver) -> Self {
        Self { host, networks }
    }

    /// Filesystem layout.
    #[must_use]
    pub const fn paths(&self) -> &'a NetworkdPaths {
        &self.host.paths
    }
}
