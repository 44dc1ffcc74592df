//! # linkctl
//!
//! Enable, disable and rename the virtual links systemd-networkd creates.
//!
//! Links are `.netdev` units. A link is enabled by symlinking its unit into
//! the networkd directory and registering it with the network of its parent
//! interface; it is renamed through drop-ins so the unit itself never
//! changes.
//!
//! ## Usage
//!
//! ```no_run
//! use linkctl::netdev::{LinkConfig, LinkRegistry};
//!
//! # fn example() -> linkctl_common::LinkResult<()> {
//! let config = LinkConfig::default();
//! let mut registry = LinkRegistry::load(config.host())?;
//!
//! for link in registry.list(true) {
//!     println!("{} {}", link.name(), link.status());
//! }
//! registry.enable("vlan1")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod netdev;

pub use netdev::{LinkRegistry, LinkStatus, NetDev};
