//! Resolving a link's attributes from its unit and drop-ins.
//!
//! The base unit is applied first, then each drop-in in file name order; the
//! last assignment of a key wins.

use linkctl_common::{LinkResult, NetworkdPaths};
use linkctl_unit::{Unit, load_dropins};

/// Section of a `.netdev` unit holding the link attributes.
pub const NETDEV_SECTION: &str = "NetDev";

/// `[NetDev]` keys that shape a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetDevKey {
    /// Interface name.
    Name,
    /// Device type.
    Kind,
    /// Free-form description.
    Description,
}

impl NetDevKey {
    /// Every key, in application order.
    pub const ALL: [Self; 3] = [Self::Name, Self::Kind, Self::Description];

    /// Key as written in the unit file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Kind => "Kind",
            Self::Description => "Description",
        }
    }
}

/// Effective attributes of a link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Interface name.
    pub name: String,
    /// Device type tag (`vlan`, `macvlan`, ...).
    pub kind: String,
    /// Description, if any unit sets one.
    pub description: Option<String>,
}

impl Attributes {
    /// Apply the keys a unit assigns.
    pub fn apply(&mut self, unit: &Unit) {
        for key in NetDevKey::ALL {
            let Some(value) = unit.get(NETDEV_SECTION, key.as_str()) else {
                continue;
            };
            match key {
                NetDevKey::Name => self.name = value.to_string(),
                NetDevKey::Kind => self.kind = value.to_string(),
                NetDevKey::Description => self.description = Some(value.to_string()),
            }
        }
    }
}

/// Result of resolving a unit with its drop-ins.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Effective attributes.
    pub attributes: Attributes,
    /// The last drop-in that changed the name.
    pub rename_overlay: Option<Unit>,
}

/// Load the drop-ins of a unit, in file name order.
///
/// # Errors
///
/// Returns an error if the drop-in pattern is invalid.
pub fn dropins_for(base: &Unit, paths: &NetworkdPaths) -> LinkResult<Vec<Unit>> {
    load_dropins(&paths.dropin_pattern(base.name()))
}

/// Apply `base` then `dropins` in order.
#[must_use]
pub fn resolve(base: &Unit, dropins: Vec<Unit>) -> Resolved {
    let mut attributes = Attributes::default();
    attributes.apply(base);

    let mut rename_overlay = None;
    for dropin in dropins {
        let before = attributes.name.clone();
        attributes.apply(&dropin);
        if attributes.name != before {
            rename_overlay = Some(dropin);
        }
    }

    Resolved {
        attributes,
        rename_overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, text: &str) -> Unit {
        Unit::parse(format!("/etc/systemd/network/{name}"), text).unwrap()
    }

    #[test]
    fn base_only() {
        let base = unit(
            "10-eth0.netdev",
            "[NetDev]\nName=vlan1\nKind=vlan\nDescription=Office\n",
        );
        let resolved = resolve(&base, Vec::new());
        assert_eq!(resolved.attributes.name, "vlan1");
        assert_eq!(resolved.attributes.kind, "vlan");
        assert_eq!(resolved.attributes.description.as_deref(), Some("Office"));
        assert!(resolved.rename_overlay.is_none());
    }

    #[test]
    fn last_override_wins() {
        let base = unit("10-eth0.netdev", "[NetDev]\nName=vlan1\nKind=vlan\n");
        let dropins = vec![
            unit("10-eth0.netdev.d/a.conf", "[NetDev]\nName=guest\n"),
            unit("10-eth0.netdev.d/b.conf", "[NetDev]\nDescription=Guests\n"),
            unit("10-eth0.netdev.d/name.conf", "[NetDev]\nName=lab\n"),
        ];
        let resolved = resolve(&base, dropins);
        assert_eq!(resolved.attributes.name, "lab");
        assert_eq!(resolved.attributes.description.as_deref(), Some("Guests"));
        assert_eq!(
            resolved.rename_overlay.as_ref().map(Unit::name),
            Some("name.conf")
        );
    }

    #[test]
    fn dropin_repeating_the_name_is_not_a_rename() {
        let base = unit("10-eth0.netdev", "[NetDev]\nName=vlan1\nKind=vlan\n");
        let dropins = vec![unit("10-eth0.netdev.d/name.conf", "[NetDev]\nName=vlan1\n")];
        assert!(resolve(&base, dropins).rename_overlay.is_none());
    }
}
