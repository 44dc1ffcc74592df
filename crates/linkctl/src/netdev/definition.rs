//! A single link definition and its state transitions.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use linkctl_common::{LinkError, LinkOrigin, LinkResult, NetworkdPaths};
use linkctl_unit::Unit;
use serde::Serialize;

use super::host::{Context, Host};
use super::network::{
    MATCH_NAME, MATCH_SECTION, MemberKey, NETWORK_SECTION, NetworkResolver, find_match_dropin,
};
use super::overlay::{self, Attributes, NETDEV_SECTION, NetDevKey};
use super::steps::Steps;

/// Name of the drop-in holding a link's name override.
pub const RENAME_DROPIN: &str = "name";

/// Longest interface name the kernel accepts.
const MAX_IFNAME_LEN: usize = 15;

/// Lifecycle state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStatus {
    /// Symlinked into the networkd directory by linkctl.
    Enabled,
    /// Only present in an available directory.
    Disabled,
    /// A regular file in the networkd directory; never modified.
    UserDefined,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::UserDefined => write!(f, "user-defined"),
        }
    }
}

/// A virtual network link defined by a `.netdev` unit.
#[derive(Debug, Clone)]
pub struct NetDev {
    attributes: Attributes,
    status: LinkStatus,
    unit: Unit,
    source: PathBuf,
    rename_unit: Option<Unit>,
    rename_network_unit: Option<Unit>,
    network_interface: String,
    parent_interface: Option<String>,
}

impl NetDev {
    /// Load the link defined by the unit at `path`.
    ///
    /// Resolves the link's own network and its parent network through
    /// `networks`, consulting the host for interfaces not seen before.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be read or parsed, or names no link.
    pub fn load(
        path: &Path,
        origin: LinkOrigin,
        host: &Host,
        networks: &mut NetworkResolver,
    ) -> LinkResult<Self> {
        let (status, source) = classify(path, origin, &host.paths)?;
        let unit = read_unit(path, &source)?;
        let dropins = overlay::dropins_for(&unit, &host.paths)?;
        let resolved = overlay::resolve(&unit, dropins);
        if resolved.attributes.name.is_empty() {
            return Err(LinkError::parse(
                path,
                format!(
                    "no {}= in [{NETDEV_SECTION}]",
                    NetDevKey::Name.as_str()
                ),
            ));
        }

        let parent_interface = match parse_unit_name(&unit) {
            Ok(interface) => Some(interface),
            Err(e) => {
                tracing::debug!(error = %e, "Link has no parent interface");
                None
            }
        };

        let network_interface = resolved.attributes.name.clone();
        networks.resolve(host, &network_interface);
        if let Some(parent) = &parent_interface {
            networks.resolve(host, parent);
        }

        let rename_network_unit = find_match_dropin(
            networks.get(&network_interface),
            &resolved.attributes.name,
            &host.paths,
        )?;

        tracing::debug!(
            name = %resolved.attributes.name,
            path = %path.display(),
            %status,
            "Loaded link"
        );

        Ok(Self {
            attributes: resolved.attributes,
            status,
            unit,
            source,
            rename_unit: resolved.rename_overlay,
            rename_network_unit,
            network_interface,
            parent_interface,
        })
    }

    /// Effective interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    /// Device type tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.attributes.kind
    }

    /// Description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.attributes.description.as_deref()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> LinkStatus {
        self.status
    }

    /// Base unit.
    #[must_use]
    pub const fn unit(&self) -> &Unit {
        &self.unit
    }

    /// File the networkd directory links to when the link is enabled.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Drop-in overriding the link name, if any.
    #[must_use]
    pub const fn rename_unit(&self) -> Option<&Unit> {
        self.rename_unit.as_ref()
    }

    /// Drop-in of the link's own network that matches it by its new name.
    #[must_use]
    pub const fn rename_network_unit(&self) -> Option<&Unit> {
        self.rename_network_unit.as_ref()
    }

    /// Interface the link is stacked on, parsed from the unit file name.
    #[must_use]
    pub fn parent_interface(&self) -> Option<&str> {
        self.parent_interface.as_deref()
    }

    /// Register the link with its parent network and link its unit into the
    /// networkd directory.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::AlreadyEnabled`], [`LinkError::Immutable`],
    /// [`LinkError::UnresolvedParentNetwork`], or the failing step's error.
    pub fn enable(&mut self, ctx: &Context<'_>) -> LinkResult<()> {
        match self.status {
            LinkStatus::Enabled => {
                return Err(LinkError::AlreadyEnabled {
                    link: self.name().to_string(),
                });
            }
            LinkStatus::UserDefined => return Err(self.immutable("enabled")),
            LinkStatus::Disabled => {}
        }

        let mut dropin = ctx.networks.dropin_for_netdev(ctx.paths(), self)?;
        let key = MemberKey::for_kind(self.kind());
        let mut steps = Steps::new("enable", self.name());

        steps.run("register membership", || {
            dropin.set(NETWORK_SECTION, key.as_str(), self.name())
        })?;
        steps.run("link unit", || self.link_unit(ctx.paths()))?;

        self.status = LinkStatus::Enabled;
        tracing::info!(name = %self.name(), "Link enabled");
        Ok(())
    }

    /// Deregister the link from its parent network, unlink its unit and
    /// delete the live interface.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::AlreadyDisabled`], [`LinkError::Immutable`],
    /// [`LinkError::UnresolvedParentNetwork`], or the failing step's error.
    pub fn disable(&mut self, ctx: &Context<'_>) -> LinkResult<()> {
        match self.status {
            LinkStatus::Disabled => {
                return Err(LinkError::AlreadyDisabled {
                    link: self.name().to_string(),
                });
            }
            LinkStatus::UserDefined => return Err(self.immutable("disabled")),
            LinkStatus::Enabled => {}
        }

        let dropin = ctx.networks.dropin_for_netdev(ctx.paths(), self)?;
        let mut steps = Steps::new("disable", self.name());

        steps.run("deregister membership", || dropin.delete())?;
        steps.run("unlink unit", || self.unlink_unit(ctx.paths()))?;
        steps.run("delete interface", || {
            ctx.host.interfaces.delete(self.name())
        })?;

        self.status = LinkStatus::Disabled;
        tracing::info!(name = %self.name(), "Link disabled");
        Ok(())
    }

    /// Give the link a new name through a drop-in.
    ///
    /// If the link's own network unit matches it by name, a drop-in of that
    /// network is updated to match the new name too.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Immutable`], [`LinkError::NameConflict`] if a live
    /// interface already has the name, [`LinkError::Parse`] for an invalid
    /// name, or the failing step's error.
    pub fn rename(&mut self, ctx: &Context<'_>, new_name: &str) -> LinkResult<()> {
        if self.status == LinkStatus::UserDefined {
            return Err(self.immutable("renamed"));
        }
        if new_name == self.name() {
            return Ok(());
        }
        self.validate_name(new_name)?;
        if ctx.host.interfaces.exists(new_name) {
            return Err(LinkError::NameConflict {
                name: new_name.to_string(),
            });
        }

        let paths = ctx.paths();
        let old_name = self.name().to_string();

        if self.rename_unit.is_none() {
            self.rename_unit = Some(Unit::load(paths.dropin(self.unit.name(), RENAME_DROPIN))?);
        }
        if self.rename_network_unit.is_none() {
            let network_unit = ctx
                .networks
                .get(&self.network_interface)
                .and_then(|network| network.unit())
                .filter(|unit| unit.contains_value(MATCH_SECTION, MATCH_NAME, &old_name));
            if let Some(network_unit) = network_unit {
                self.rename_network_unit =
                    Some(Unit::load(paths.dropin(network_unit.name(), RENAME_DROPIN))?);
            }
        }

        let mut steps = Steps::new("rename", &old_name);

        if let Some(rename_unit) = self.rename_unit.as_mut() {
            steps.run("write name overlay", || {
                rename_unit.set(NETDEV_SECTION, NetDevKey::Name.as_str(), new_name)
            })?;
        }
        if let Some(network_unit) = self.rename_network_unit.as_mut() {
            steps.run("update network match", || {
                network_unit.replace(MATCH_SECTION, MATCH_NAME, &old_name, new_name)
            })?;
        }

        delete_stale_interface(ctx.host, &old_name);
        steps.run("reload", || self.reload(ctx))?;
        steps.run("update membership", || self.update_membership(ctx))?;

        tracing::info!(old = %old_name, new = %self.name(), "Link renamed");
        Ok(())
    }

    /// Drop the name override and return to the name of the base unit.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Immutable`], [`LinkError::NotRenamed`], or the
    /// failing step's error.
    pub fn reset_name(&mut self, ctx: &Context<'_>) -> LinkResult<()> {
        if self.status == LinkStatus::UserDefined {
            return Err(self.immutable("renamed"));
        }
        let current = self.name().to_string();
        let Some(rename_unit) = self.rename_unit.as_mut() else {
            return Err(LinkError::NotRenamed { link: current });
        };

        let mut steps = Steps::new("reset name", &current);

        steps.run("clear name overlay", || {
            rename_unit.remove(NETDEV_SECTION, NetDevKey::Name.as_str())
        })?;
        if let Some(network_unit) = self.rename_network_unit.as_mut() {
            steps.run("update network match", || {
                network_unit.exclude(MATCH_SECTION, MATCH_NAME, &current)
            })?;
        }

        delete_stale_interface(ctx.host, &current);
        steps.run("reload", || self.reload(ctx))?;
        steps.run("update membership", || self.update_membership(ctx))?;

        tracing::info!(old = %current, new = %self.name(), "Link name reset");
        Ok(())
    }

    /// Re-resolve the link's attributes and overlays from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a drop-in directory cannot be scanned.
    pub fn reload(&mut self, ctx: &Context<'_>) -> LinkResult<()> {
        let dropins = overlay::dropins_for(&self.unit, ctx.paths())?;
        let resolved = overlay::resolve(&self.unit, dropins);
        self.attributes = resolved.attributes;
        self.rename_unit = resolved.rename_overlay;
        self.rename_network_unit = find_match_dropin(
            ctx.networks.get(&self.network_interface),
            self.name(),
            ctx.paths(),
        )?;
        Ok(())
    }

    /// Make the parent network's drop-in agree with the current name and state.
    fn update_membership(&self, ctx: &Context<'_>) -> LinkResult<()> {
        match self.status {
            LinkStatus::Enabled => {
                let mut dropin = ctx.networks.dropin_for_netdev(ctx.paths(), self)?;
                let key = MemberKey::for_kind(self.kind());
                dropin.set(NETWORK_SECTION, key.as_str(), self.name())
            }
            LinkStatus::Disabled => match ctx.networks.dropin_for_netdev(ctx.paths(), self) {
                Ok(dropin) => dropin.delete(),
                Err(LinkError::UnresolvedParentNetwork { gap, .. }) => {
                    tracing::debug!(name = %self.name(), %gap, "No parent network to update");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            LinkStatus::UserDefined => Ok(()),
        }
    }

    fn link_unit(&self, paths: &NetworkdPaths) -> LinkResult<()> {
        let target = paths.enabled_unit(self.unit.name());
        let source = paths.unrooted(&self.source);
        fs::create_dir_all(&paths.config_dir).map_err(|e| LinkError::io(&paths.config_dir, e))?;
        std::os::unix::fs::symlink(&source, &target).map_err(|e| LinkError::io(&target, e))?;

        tracing::debug!(link = %target.display(), source = %source.display(), "Linked unit");
        Ok(())
    }

    fn unlink_unit(&self, paths: &NetworkdPaths) -> LinkResult<()> {
        let target = paths.enabled_unit(self.unit.name());
        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::remove_file(&target).map_err(|e| LinkError::io(&target, e))?;
                tracing::debug!(link = %target.display(), "Unlinked unit");
                Ok(())
            }
            Ok(_) => Err(LinkError::io(
                &target,
                std::io::Error::new(ErrorKind::InvalidInput, "not a symlink"),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LinkError::io(&target, e)),
        }
    }

    fn validate_name(&self, name: &str) -> LinkResult<()> {
        let valid = !name.is_empty()
            && name.len() <= MAX_IFNAME_LEN
            && name != "."
            && name != ".."
            && !name.chars().any(|c| c.is_whitespace() || c == '/' || c == ':');
        if valid {
            Ok(())
        } else {
            Err(LinkError::parse(
                self.unit.path(),
                format!("invalid link name \"{name}\""),
            ))
        }
    }

    fn immutable(&self, action: &'static str) -> LinkError {
        LinkError::Immutable {
            link: self.name().to_string(),
            action,
        }
    }
}

/// Parent interface encoded in a unit file name: `<prefix>-<interface>.<rest>`.
///
/// # Errors
///
/// Returns [`LinkError::Parse`] for names that do not follow the convention.
pub fn parse_unit_name(unit: &Unit) -> LinkResult<String> {
    let non_conforming =
        || LinkError::parse(unit.path(), "does not have a conforming unit name");

    let (_, rest) = unit.name().split_once('-').ok_or_else(non_conforming)?;
    let (interface, _) = rest.split_once('.').ok_or_else(non_conforming)?;
    if interface.is_empty() {
        return Err(non_conforming());
    }
    Ok(interface.to_string())
}

fn delete_stale_interface(host: &Host, name: &str) {
    if let Err(e) = host.interfaces.delete(name) {
        tracing::warn!(name, error = %e, "Failed to delete stale interface");
    }
}

/// Status and symlink source of a unit found at `path`.
///
/// Absolute symlink targets are read relative to the root of `paths`.
fn classify(
    path: &Path,
    origin: LinkOrigin,
    paths: &NetworkdPaths,
) -> LinkResult<(LinkStatus, PathBuf)> {
    if origin == LinkOrigin::Available {
        return Ok((LinkStatus::Disabled, path.to_path_buf()));
    }

    let meta = fs::symlink_metadata(path).map_err(|e| LinkError::io(path, e))?;
    if !meta.file_type().is_symlink() {
        return Ok((LinkStatus::UserDefined, path.to_path_buf()));
    }

    let target = fs::read_link(path).map_err(|e| LinkError::io(path, e))?;
    let source = match path.parent() {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => paths.rerooted(&target),
    };
    Ok((LinkStatus::Enabled, source))
}

/// The unit at `path`, read through its symlink source.
fn read_unit(path: &Path, source: &Path) -> LinkResult<Unit> {
    if source == path {
        return Unit::load(path);
    }
    let text = fs::read_to_string(source).map_err(|e| LinkError::io(source, e))?;
    Unit::parse(path, &text)
}
