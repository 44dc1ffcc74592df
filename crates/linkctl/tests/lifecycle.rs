//! Link discovery and state transitions against a temporary root.

mod common;

use std::fs;
use std::path::Path;

use common::{Fixture, vlan_unit};
use linkctl::netdev::{LinkStatus, RENAME_DROPIN};
use linkctl_common::{LinkError, ParentNetworkGap};

fn names(registry: &linkctl::LinkRegistry, include_disabled: bool) -> Vec<(String, LinkStatus)> {
    registry
        .list(include_disabled)
        .into_iter()
        .map(|link| (link.name().to_string(), link.status()))
        .collect()
}

#[test_log::test]
fn list_separates_user_defined_and_disabled() {
    let fixture = Fixture::scenario();
    let registry = fixture.registry();

    assert_eq!(
        names(&registry, false),
        [("vlan0".to_string(), LinkStatus::UserDefined)]
    );
    assert_eq!(
        names(&registry, true),
        [
            ("vlan0".to_string(), LinkStatus::UserDefined),
            ("vlan1".to_string(), LinkStatus::Disabled),
        ]
    );
}

#[test_log::test]
fn get_is_exact() {
    let fixture = Fixture::scenario();
    let registry = fixture.registry();

    let link = registry.get("vlan1").unwrap();
    assert_eq!(link.kind(), "vlan");
    assert_eq!(link.parent_interface(), Some("eth0"));
    assert!(registry.get("vlan").is_none());
    assert!(registry.get("VLAN1").is_none());
}

#[test_log::test]
fn enable_links_unit_and_registers_membership() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();

    registry.enable("vlan1").unwrap();

    let link = fixture.paths.config_dir.join("10-eth0.vlan1.netdev");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(
        fs::read_link(&link).unwrap(),
        Path::new("/etc/linkctl/user/10-eth0.vlan1.netdev")
    );

    let membership = fixture
        .paths
        .dropin("20-eth0.network", "10-eth0.vlan1");
    assert_eq!(
        fs::read_to_string(membership).unwrap(),
        "[Network]\nVLAN=vlan1\n"
    );
    assert_eq!(registry.get("vlan1").unwrap().status(), LinkStatus::Enabled);
}

#[test_log::test]
fn enabled_link_is_discovered_as_enabled() {
    let fixture = Fixture::scenario();
    fixture.registry().enable("vlan1").unwrap();

    let registry = fixture.registry();
    let link = registry.get("vlan1").unwrap();
    assert_eq!(link.status(), LinkStatus::Enabled);
    assert_eq!(
        link.source(),
        fixture.available_dir().join("10-eth0.vlan1.netdev")
    );
}

#[test_log::test]
fn enable_then_disable_restores_disk() {
    let fixture = Fixture::scenario();
    let before = fixture.snapshot();
    let mut registry = fixture.registry();

    registry.enable("vlan1").unwrap();
    assert_ne!(fixture.snapshot(), before);
    registry.disable("vlan1").unwrap();

    assert_eq!(fixture.snapshot(), before);
    assert!(
        fs::symlink_metadata(fixture.paths.config_dir.join("10-eth0.vlan1.netdev")).is_err()
    );
    assert_eq!(registry.get("vlan1").unwrap().status(), LinkStatus::Disabled);
}

#[test_log::test]
fn disable_deletes_live_interface() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    registry.enable("vlan1").unwrap();
    fixture.interfaces.add("vlan1", 7);

    registry.disable("vlan1").unwrap();

    assert_eq!(fixture.interfaces.deleted(), ["vlan1"]);
}

#[test_log::test]
fn enable_twice_fails_without_touching_disk() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    registry.enable("vlan1").unwrap();
    let before = fixture.snapshot();

    let err = registry.enable("vlan1").unwrap_err();

    assert!(matches!(err, LinkError::AlreadyEnabled { .. }));
    assert_eq!(fixture.snapshot(), before);
}

#[test_log::test]
fn disable_of_disabled_link_fails() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    let before = fixture.snapshot();

    let err = registry.disable("vlan1").unwrap_err();

    assert!(matches!(err, LinkError::AlreadyDisabled { .. }));
    assert_eq!(fixture.snapshot(), before);
}

#[test_log::test]
fn user_defined_link_is_immutable() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    let before = fixture.snapshot();

    let results = [
        registry.enable("vlan0"),
        registry.disable("vlan0"),
        registry.rename("vlan0", "lab"),
        registry.reset_name("vlan0"),
    ];

    for result in results {
        assert!(matches!(result, Err(LinkError::Immutable { .. })), "{result:?}");
    }
    assert_eq!(fixture.snapshot(), before);
    assert_eq!(
        registry.get("vlan0").unwrap().status(),
        LinkStatus::UserDefined
    );
}

#[test_log::test]
fn rename_then_reset_restores_name() {
    let fixture = Fixture::scenario();
    let before = fixture.snapshot();
    let mut registry = fixture.registry();

    registry.rename("vlan1", "guest").unwrap();

    let overlay = fixture
        .paths
        .dropin("10-eth0.vlan1.netdev", RENAME_DROPIN);
    assert_eq!(
        fs::read_to_string(&overlay).unwrap(),
        "[NetDev]\nName=guest\n"
    );
    assert!(registry.get("vlan1").is_none());
    let link = registry.get("guest").unwrap();
    assert_eq!(link.rename_unit().map(|u| u.path()), Some(overlay.as_path()));

    registry.reset_name("guest").unwrap();

    assert!(!overlay.exists());
    assert_eq!(registry.get("vlan1").unwrap().name(), "vlan1");
    assert!(registry.get("vlan1").unwrap().rename_unit().is_none());
    assert_eq!(fixture.snapshot(), before);
}

#[test_log::test]
fn rename_is_picked_up_by_discovery() {
    let fixture = Fixture::scenario();
    fixture.registry().rename("vlan1", "guest").unwrap();

    let registry = fixture.registry();
    assert!(registry.get("vlan1").is_none());
    assert_eq!(registry.get("guest").unwrap().status(), LinkStatus::Disabled);
}

#[test_log::test]
fn reset_keeps_other_overrides() {
    let fixture = Fixture::scenario();
    let overlay = fixture
        .paths
        .dropin("10-eth0.vlan1.netdev", RENAME_DROPIN);
    fs::create_dir_all(overlay.parent().unwrap()).unwrap();
    fs::write(&overlay, "[NetDev]\nName=guest\nDescription=Guests\n").unwrap();
    let mut registry = fixture.registry();
    assert_eq!(registry.get("guest").unwrap().description(), Some("Guests"));

    registry.reset_name("guest").unwrap();

    assert_eq!(
        fs::read_to_string(&overlay).unwrap(),
        "[NetDev]\nDescription=Guests\n"
    );
    let link = registry.get("vlan1").unwrap();
    assert_eq!(link.description(), Some("Guests"));
}

#[test_log::test]
fn rename_of_enabled_link_moves_membership() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    registry.enable("vlan1").unwrap();

    registry.rename("vlan1", "guest").unwrap();

    let membership = fixture
        .paths
        .dropin("20-eth0.network", "10-eth0.vlan1");
    assert_eq!(
        fs::read_to_string(&membership).unwrap(),
        "[Network]\nVLAN=guest\n"
    );

    registry.reset_name("guest").unwrap();
    assert_eq!(
        fs::read_to_string(&membership).unwrap(),
        "[Network]\nVLAN=vlan1\n"
    );
}

#[test_log::test]
fn rename_patches_network_matching_old_name() {
    let fixture = Fixture::scenario();
    fixture.add_network("vlan1", 5, "30-vlan1.network");
    let mut registry = fixture.registry();

    registry.rename("vlan1", "guest").unwrap();

    let network_overlay = fixture.paths.dropin("30-vlan1.network", RENAME_DROPIN);
    assert_eq!(
        fs::read_to_string(&network_overlay).unwrap(),
        "[Match]\nName=guest\n"
    );
    let link = registry.get("guest").unwrap();
    assert_eq!(
        link.rename_network_unit().map(|u| u.path()),
        Some(network_overlay.as_path())
    );
    assert_eq!(fixture.interfaces.deleted(), ["vlan1"]);

    registry.reset_name("guest").unwrap();

    assert!(!network_overlay.exists());
    assert!(registry.get("vlan1").unwrap().rename_network_unit().is_none());
}

#[test_log::test]
fn rename_leaves_unrelated_network_alone() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();

    registry.rename("vlan1", "guest").unwrap();

    assert!(!fixture.paths.dropin_dir("20-eth0.network").exists());
    assert!(registry.get("guest").unwrap().rename_network_unit().is_none());
}

#[test_log::test]
fn second_rename_to_same_name_conflicts() {
    let fixture = Fixture::scenario();
    let vlan2 = fixture.write_available("10-eth0.vlan2.netdev", &vlan_unit("vlan2", 30));
    let mut registry = fixture.registry();

    registry.rename("vlan1", "lab").unwrap();
    let err = registry.rename("vlan2", "lab").unwrap_err();

    assert!(matches!(err, LinkError::NameConflict { ref name } if name == "lab"));
    assert_eq!(fs::read_to_string(vlan2).unwrap(), vlan_unit("vlan2", 30));
    assert!(!fixture.paths.dropin_dir("10-eth0.vlan2.netdev").exists());
    assert_eq!(registry.get("vlan2").unwrap().name(), "vlan2");
}

#[test_log::test]
fn rename_to_live_interface_conflicts() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    let before = fixture.snapshot();

    let err = registry.rename("vlan1", "eth0").unwrap_err();

    assert!(matches!(err, LinkError::NameConflict { .. }));
    assert_eq!(fixture.snapshot(), before);
}

#[test_log::test]
fn rename_rejects_invalid_names() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();

    for name in ["", "has space", "a/b", "name-that-is-too-long"] {
        let err = registry.rename("vlan1", name).unwrap_err();
        assert!(matches!(err, LinkError::Parse { .. }), "{name}");
    }
}

#[test_log::test]
fn reset_without_rename_fails() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();

    let err = registry.reset_name("vlan1").unwrap_err();

    assert!(matches!(err, LinkError::NotRenamed { .. }));
}

#[test_log::test]
fn unknown_link_is_not_found() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();

    let err = registry.enable("vlan9").unwrap_err();

    assert!(matches!(err, LinkError::LinkNotFound { ref name } if name == "vlan9"));
}

#[test_log::test]
fn enable_without_parent_interface_in_name() {
    let fixture = Fixture::scenario();
    fixture.write_available("vlan3.netdev", &vlan_unit("vlan3", 40));
    let mut registry = fixture.registry();
    let before = fixture.snapshot();

    let err = registry.enable("vlan3").unwrap_err();

    assert!(matches!(
        err,
        LinkError::UnresolvedParentNetwork {
            gap: ParentNetworkGap::UnknownInterface,
            ..
        }
    ));
    assert_eq!(fixture.snapshot(), before);
    assert_eq!(registry.get("vlan3").unwrap().status(), LinkStatus::Disabled);
}

#[test_log::test]
fn enable_with_missing_parent_interface() {
    let fixture = Fixture::scenario();
    fixture.write_available("10-eth1.vlan4.netdev", &vlan_unit("vlan4", 50));
    let mut registry = fixture.registry();

    let err = registry.enable("vlan4").unwrap_err();

    assert!(matches!(
        err,
        LinkError::UnresolvedParentNetwork {
            gap: ParentNetworkGap::MissingInterface(ref name),
            ..
        } if name == "eth1"
    ));
}

#[test_log::test]
fn enable_with_unmanaged_parent_interface() {
    let fixture = Fixture::scenario();
    fixture.interfaces.add("eth1", 3);
    fixture.write_available("10-eth1.vlan4.netdev", &vlan_unit("vlan4", 50));
    let mut registry = fixture.registry();

    let err = registry.enable("vlan4").unwrap_err();

    assert!(matches!(
        err,
        LinkError::UnresolvedParentNetwork {
            gap: ParentNetworkGap::NoNetworkUnit(_),
            ..
        }
    ));
}

#[test_log::test]
fn enable_reports_partial_application() {
    let fixture = Fixture::scenario();
    // A dangling symlink in the way of the link to create.
    std::os::unix::fs::symlink(
        fixture.temp.path().join("missing"),
        fixture.paths.config_dir.join("10-eth0.vlan1.netdev"),
    )
    .unwrap();
    let mut registry = fixture.registry();

    let err = registry.enable("vlan1").unwrap_err();

    match err {
        LinkError::PartiallyApplied {
            operation,
            completed,
            source,
            ..
        } => {
            assert_eq!(operation, "enable");
            assert_eq!(completed, ["register membership"]);
            assert!(matches!(*source, LinkError::Io { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.get("vlan1").unwrap().status(), LinkStatus::Disabled);
}

#[test_log::test]
fn disable_surfaces_interface_deletion_failure() {
    let fixture = Fixture::scenario();
    let mut registry = fixture.registry();
    registry.enable("vlan1").unwrap();
    fixture.interfaces.add("vlan1", 7);
    fixture.interfaces.refuse_delete("vlan1");

    let err = registry.disable("vlan1").unwrap_err();

    match err {
        LinkError::PartiallyApplied {
            completed, source, ..
        } => {
            assert_eq!(completed, ["deregister membership", "unlink unit"]);
            assert!(matches!(*source, LinkError::Interface { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.get("vlan1").unwrap().status(), LinkStatus::Enabled);
}
