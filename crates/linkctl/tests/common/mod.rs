//! Shared fixture for link engine tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use linkctl::netdev::{Host, LinkRegistry};
use linkctl_common::{LinkError, LinkResult, NetworkdPaths};
use linkctl_network::{InterfaceTable, RuntimeState};
use parking_lot::Mutex;
use tempfile::TempDir;

/// The networkd directory as seen from inside a root.
pub const CONFIG_DIR_IN_ROOT: &str = "/etc/systemd/network";

/// In-memory kernel interface table.
#[derive(Debug, Default)]
pub struct FakeInterfaces {
    interfaces: Mutex<BTreeMap<String, u32>>,
    lookups: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    undeletable: Mutex<Vec<String>>,
}

impl FakeInterfaces {
    pub fn add(&self, name: &str, index: u32) {
        self.interfaces.lock().insert(name.to_string(), index);
    }

    pub fn refuse_delete(&self, name: &str) {
        self.undeletable.lock().push(name.to_string());
    }

    pub fn lookups_of(&self, name: &str) -> usize {
        self.lookups.lock().iter().filter(|n| *n == name).count()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

impl InterfaceTable for FakeInterfaces {
    fn index(&self, name: &str) -> Option<u32> {
        self.lookups.lock().push(name.to_string());
        self.interfaces.lock().get(name).copied()
    }

    fn delete(&self, name: &str) -> LinkResult<()> {
        if self.interfaces.lock().get(name).is_none() {
            return Ok(());
        }
        if self.undeletable.lock().iter().any(|n| n == name) {
            return Err(LinkError::Interface {
                name: name.to_string(),
                action: "delete",
                message: "Operation not permitted".to_string(),
            });
        }
        self.interfaces.lock().remove(name);
        self.deleted.lock().push(name.to_string());
        Ok(())
    }
}

/// In-memory networkd runtime state.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    network_files: Mutex<HashMap<u32, PathBuf>>,
    lookups: Mutex<Vec<u32>>,
}

impl FakeRuntime {
    pub fn manage(&self, index: u32, network_file: PathBuf) {
        self.network_files.lock().insert(index, network_file);
    }

    pub fn lookups_of(&self, index: u32) -> usize {
        self.lookups.lock().iter().filter(|i| **i == index).count()
    }
}

impl RuntimeState for FakeRuntime {
    fn network_file(&self, ifindex: u32) -> LinkResult<Option<PathBuf>> {
        self.lookups.lock().push(ifindex);
        Ok(self.network_files.lock().get(&ifindex).cloned())
    }
}

/// A throwaway host rooted in a temporary directory.
pub struct Fixture {
    pub temp: TempDir,
    pub paths: NetworkdPaths,
    pub interfaces: Arc<FakeInterfaces>,
    pub runtime: Arc<FakeRuntime>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let paths = NetworkdPaths::with_root(temp.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        Self {
            temp,
            paths,
            interfaces: Arc::new(FakeInterfaces::default()),
            runtime: Arc::new(FakeRuntime::default()),
        }
    }

    /// The canonical directory holds `vlan0` as a plain file, `vlan1` is only
    /// available, and `eth0` is up and governed by `20-eth0.network`.
    pub fn scenario() -> Self {
        let fixture = Self::new();
        fixture.write_enabled("vlan0.netdev", &vlan_unit("vlan0", 10));
        fixture.write_available("10-eth0.vlan1.netdev", &vlan_unit("vlan1", 20));
        fixture.add_network("eth0", 2, "20-eth0.network");
        fixture
    }

    pub fn available_dir(&self) -> &Path {
        &self.paths.available_dirs[0]
    }

    pub fn write_enabled(&self, name: &str, content: &str) -> PathBuf {
        write(&self.paths.config_dir.join(name), content)
    }

    pub fn write_available(&self, name: &str, content: &str) -> PathBuf {
        write(&self.available_dir().join(name), content)
    }

    /// Bring up `interface` governed by a network unit matching it by name.
    ///
    /// networkd records the unit as seen from inside the root.
    pub fn add_network(&self, interface: &str, index: u32, unit: &str) -> PathBuf {
        let path = self.write_enabled(
            unit,
            &format!("[Match]\nName={interface}\n\n[Network]\nDHCP=yes\n"),
        );
        self.interfaces.add(interface, index);
        self.runtime.manage(index, Path::new(CONFIG_DIR_IN_ROOT).join(unit));
        path
    }

    pub fn host(&self) -> Host {
        Host::new(
            self.paths.clone(),
            self.interfaces.clone(),
            self.runtime.clone(),
        )
    }

    pub fn registry(&self) -> LinkRegistry {
        LinkRegistry::load(self.host()).unwrap()
    }

    /// Every file below the root, with symlinks recorded by target.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        let mut entries = BTreeMap::new();
        walk(self.temp.path(), &mut entries);
        entries
    }
}

pub fn vlan_unit(name: &str, id: u16) -> String {
    format!("[NetDev]\nName={name}\nKind=vlan\n\n[VLAN]\nId={id}\n")
}

fn write(path: &Path, content: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

fn walk(dir: &Path, entries: &mut BTreeMap<PathBuf, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let meta = fs::symlink_metadata(&path).unwrap();
        if meta.file_type().is_symlink() {
            let target = fs::read_link(&path).unwrap();
            entries.insert(path, format!("-> {}", target.display()));
        } else if meta.is_dir() {
            entries.insert(path.clone(), "<dir>".to_string());
            walk(&path, entries);
        } else {
            entries.insert(path.clone(), fs::read_to_string(&path).unwrap());
        }
    }
}
