//! systemd-networkd runtime state.
//!
//! networkd records the state of every interface it manages in
//! `/run/systemd/netif/links/<ifindex>` as `KEY=VALUE` lines. The
//! `NETWORK_FILE` entry names the network unit currently applied.

use std::io::ErrorKind;
use std::path::PathBuf;

use linkctl_common::{LinkError, LinkResult, NetworkdPaths};

const NETWORK_FILE_KEY: &str = "NETWORK_FILE";

/// Lookup of the network unit governing a live interface.
pub trait RuntimeState: Send + Sync {
    /// Path of the network unit applied to the interface with this index.
    ///
    /// # Errors
    ///
    /// Returns an error if the state record exists but cannot be read or
    /// parsed.
    fn network_file(&self, ifindex: u32) -> LinkResult<Option<PathBuf>>;
}

/// Runtime state read from networkd's netif link records.
#[derive(Debug, Clone)]
pub struct NetifState {
    paths: NetworkdPaths,
}

impl NetifState {
    /// Create a reader for the runtime directory in `paths`.
    #[must_use]
    pub fn new(paths: &NetworkdPaths) -> Self {
        Self {
            paths: paths.clone(),
        }
    }
}

impl RuntimeState for NetifState {
    fn network_file(&self, ifindex: u32) -> LinkResult<Option<PathBuf>> {
        let path = self.paths.netif_link(ifindex);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LinkError::io(&path, e)),
        };

        let mut network_file = None;
        for line in content.lines() {
            if !line.starts_with(NETWORK_FILE_KEY) {
                continue;
            }
            let Some((_, value)) = line.split_once('=') else {
                return Err(LinkError::parse(
                    &path,
                    format!("unable to parse state file for {ifindex}"),
                ));
            };
            let value = value.trim();
            network_file = (!value.is_empty()).then(|| PathBuf::from(value));
        }

        tracing::debug!(ifindex, network_file = ?network_file, "Read interface runtime state");
        Ok(network_file)
    }
}
