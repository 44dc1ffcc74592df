//! Discovery and lookup of link definitions.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use linkctl_common::{LinkError, LinkResult};
use linkctl_unit::matching_paths;

use super::definition::{LinkStatus, NetDev};
use super::host::{Context, Host};
use super::network::NetworkResolver;

/// Every link definition on a host, keyed by effective name.
///
/// Discovery runs once; later calls reuse the collection. The registry is not
/// synchronised and is meant to be owned by a single caller.
#[derive(Debug)]
pub struct LinkRegistry {
    host: Host,
    networks: NetworkResolver,
    links: BTreeMap<String, NetDev>,
    discovered: bool,
}

impl LinkRegistry {
    /// Create an empty registry for `host`.
    #[must_use]
    pub fn new(host: Host) -> Self {
        Self {
            host,
            networks: NetworkResolver::new(),
            links: BTreeMap::new(),
            discovered: false,
        }
    }

    /// Create a registry for `host` and discover its links.
    ///
    /// # Errors
    ///
    /// Returns an error if a search path pattern is invalid.
    pub fn load(host: Host) -> LinkResult<Self> {
        let mut registry = Self::new(host);
        registry.discover()?;
        Ok(registry)
    }

    /// Scan the search paths in priority order.
    ///
    /// The first definition of a name wins. Units that fail to load are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a search path pattern is invalid.
    pub fn discover(&mut self) -> LinkResult<()> {
        if self.discovered {
            return Ok(());
        }

        for search_path in self.host.paths.search_paths() {
            for path in matching_paths(&search_path.pattern())? {
                let link =
                    match NetDev::load(&path, search_path.origin, &self.host, &mut self.networks) {
                        Ok(link) => link,
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Skipping link definition");
                            continue;
                        }
                    };

                match self.links.entry(link.name().to_string()) {
                    Entry::Vacant(entry) => {
                        entry.insert(link);
                    }
                    Entry::Occupied(entry) => {
                        tracing::debug!(
                            name = %entry.key(),
                            path = %path.display(),
                            kept = %entry.get().unit().path().display(),
                            "Shadowed link definition"
                        );
                    }
                }
            }
        }

        self.discovered = true;
        tracing::debug!(count = self.links.len(), "Discovered links");
        Ok(())
    }

    /// The host the links live on.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Networks resolved during discovery.
    #[must_use]
    pub const fn networks(&self) -> &NetworkResolver {
        &self.networks
    }

    /// Links sorted by name, optionally leaving out disabled ones.
    #[must_use]
    pub fn list(&self, include_disabled: bool) -> Vec<&NetDev> {
        self.links
            .values()
            .filter(|link| include_disabled || link.status() != LinkStatus::Disabled)
            .collect()
    }

    /// Look up a link by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NetDev> {
        self.links.get(name)
    }

    /// Enable the named link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] or the transition's error.
    pub fn enable(&mut self, name: &str) -> LinkResult<()> {
        self.with_link(name, |link, ctx| link.enable(ctx))
    }

    /// Disable the named link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] or the transition's error.
    pub fn disable(&mut self, name: &str) -> LinkResult<()> {
        self.with_link(name, |link, ctx| link.disable(ctx))
    }

    /// Rename the named link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`], [`LinkError::NameConflict`] if
    /// another link already uses `new_name`, or the transition's error.
    pub fn rename(&mut self, name: &str, new_name: &str) -> LinkResult<()> {
        if name != new_name && self.links.contains_key(new_name) {
            return Err(LinkError::NameConflict {
                name: new_name.to_string(),
            });
        }
        self.with_link(name, |link, ctx| link.rename(ctx, new_name))
    }

    /// Restore the base name of the named link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] or the transition's error.
    pub fn reset_name(&mut self, name: &str) -> LinkResult<()> {
        self.with_link(name, |link, ctx| link.reset_name(ctx))
    }

    /// Run a transition on a link and re-key it under its resulting name.
    fn with_link<F>(&mut self, name: &str, transition: F) -> LinkResult<()>
    where
        F: FnOnce(&mut NetDev, &Context<'_>) -> LinkResult<()>,
    {
        let Some(mut link) = self.links.remove(name) else {
            return Err(LinkError::LinkNotFound {
                name: name.to_string(),
            });
        };

        let ctx = Context::new(&self.host, &self.networks);
        let result = transition(&mut link, &ctx);

        let key = if self.links.contains_key(link.name()) {
            tracing::warn!(name, new = %link.name(), "Another link already uses the new name");
            name.to_string()
        } else {
            link.name().to_string()
        };
        self.links.insert(key, link);
        result
    }
}
