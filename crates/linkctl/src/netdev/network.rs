//! Parent network association.
//!
//! A link is layered on a parent interface, and the network unit governing
//! that interface must list the link (e.g. `[Network] VLAN=vlan1`) for
//! networkd to create it. linkctl records that membership in a drop-in of the
//! parent network unit named after the link's unit.

use std::collections::HashMap;

use linkctl_common::{LinkError, LinkResult, NetworkdPaths, ParentNetworkGap};
use linkctl_unit::{Unit, load_dropins};

use super::definition::NetDev;
use super::host::Host;

/// Section of a `.network` unit listing stacked links.
pub const NETWORK_SECTION: &str = "Network";

/// Section of a `.network` unit selecting interfaces.
pub const MATCH_SECTION: &str = "Match";

/// `[Match]` key listing interface names.
pub const MATCH_NAME: &str = "Name";

/// `[Network]` key that attaches a link of a given kind to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKey {
    /// `VLAN=`
    Vlan,
    /// `MACVLAN=`
    MacVlan,
    /// `MACVTAP=`
    MacVtap,
    /// `IPVLAN=`
    IpVlan,
    /// `IPVTAP=`
    IpVtap,
    /// `VXLAN=`
    Vxlan,
    /// `Tunnel=`
    Tunnel,
    /// `MACsec=`
    MacSec,
    /// `Xfrm=`
    Xfrm,
}

impl MemberKey {
    /// Key for a `[NetDev] Kind=`. Unknown kinds attach as VLANs.
    #[must_use]
    pub fn for_kind(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "macvlan" => Self::MacVlan,
            "macvtap" => Self::MacVtap,
            "ipvlan" => Self::IpVlan,
            "ipvtap" => Self::IpVtap,
            "vxlan" => Self::Vxlan,
            "gre" | "gretap" | "ip6gre" | "ip6gretap" | "ipip" | "ip6tnl" | "sit" | "vti"
            | "vti6" | "erspan" | "fou" => Self::Tunnel,
            "macsec" => Self::MacSec,
            "xfrm" => Self::Xfrm,
            _ => Self::Vlan,
        }
    }

    /// Key as written in the unit file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vlan => "VLAN",
            Self::MacVlan => "MACVLAN",
            Self::MacVtap => "MACVTAP",
            Self::IpVlan => "IPVLAN",
            Self::IpVtap => "IPVTAP",
            Self::Vxlan => "VXLAN",
            Self::Tunnel => "Tunnel",
            Self::MacSec => "MACsec",
            Self::Xfrm => "Xfrm",
        }
    }
}

/// A live interface and the network unit governing it.
#[derive(Debug, Clone)]
pub struct Network {
    interface: String,
    index: Option<u32>,
    unit: Option<Unit>,
}

impl Network {
    /// Interface name.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Kernel interface index, if the interface exists.
    #[must_use]
    pub const fn index(&self) -> Option<u32> {
        self.index
    }

    /// The network unit applied to the interface, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    fn lookup(host: &Host, interface: &str) -> Self {
        let index = host.interfaces.index(interface);
        let unit = index.and_then(|index| {
            let path = match host.runtime.network_file(index) {
                Ok(path) => host.paths.rerooted(&path?),
                Err(e) => {
                    tracing::warn!(interface, error = %e, "Failed to read interface state");
                    return None;
                }
            };
            match Unit::load(&path) {
                Ok(unit) => Some(unit),
                Err(e) => {
                    tracing::warn!(interface, path = %path.display(), error = %e, "Failed to load network unit");
                    None
                }
            }
        });

        tracing::debug!(
            interface,
            index = ?index,
            unit = ?unit.as_ref().map(Unit::path),
            "Resolved network"
        );

        Self {
            interface: interface.to_string(),
            index,
            unit,
        }
    }
}

/// One-shot resolution of interfaces to their governing network.
///
/// Each interface name is looked up at most once; a lookup that finds nothing
/// is remembered like any other.
#[derive(Debug, Default)]
pub struct NetworkResolver {
    networks: HashMap<String, Network>,
}

impl NetworkResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an interface, consulting the host only on first use.
    pub fn resolve(&mut self, host: &Host, interface: &str) -> Option<&Network> {
        if interface.is_empty() {
            return None;
        }

        Some(
            self.networks
                .entry(interface.to_string())
                .or_insert_with(|| Network::lookup(host, interface)),
        )
    }

    /// A previously resolved interface.
    #[must_use]
    pub fn get(&self, interface: &str) -> Option<&Network> {
        self.networks.get(interface)
    }

    /// Number of interfaces resolved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Load the drop-in registering `link` with its parent network.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::UnresolvedParentNetwork`] if the parent interface
    /// or its network unit is unknown, or an error if the drop-in cannot be
    /// read.
    pub fn dropin_for_netdev(&self, paths: &NetworkdPaths, link: &NetDev) -> LinkResult<Unit> {
        let unresolved = |gap| LinkError::UnresolvedParentNetwork {
            link: link.name().to_string(),
            unit: link.unit().name().to_string(),
            gap,
        };

        let Some(interface) = link.parent_interface() else {
            return Err(unresolved(ParentNetworkGap::UnknownInterface));
        };
        let network = self
            .get(interface)
            .filter(|network| network.index.is_some())
            .ok_or_else(|| unresolved(ParentNetworkGap::MissingInterface(interface.to_string())))?;
        let Some(network_unit) = network.unit() else {
            return Err(unresolved(ParentNetworkGap::NoNetworkUnit(
                interface.to_string(),
            )));
        };

        Unit::load(paths.dropin(network_unit.name(), link.unit().stem()))
    }
}

/// Find the drop-in of `network`'s unit whose `[Match] Name=` lists `name`.
///
/// # Errors
///
/// Returns an error if the drop-in pattern is invalid.
pub fn find_match_dropin(
    network: Option<&Network>,
    name: &str,
    paths: &NetworkdPaths,
) -> LinkResult<Option<Unit>> {
    let Some(unit) = network.and_then(Network::unit) else {
        return Ok(None);
    };

    Ok(load_dropins(&paths.dropin_pattern(unit.name()))?
        .into_iter()
        .filter(|dropin| dropin.contains_value(MATCH_SECTION, MATCH_NAME, name))
        .last())
}
