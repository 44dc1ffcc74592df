//! Link definitions and their lifecycle.
//!
//! A link is a `.netdev` unit plus the drop-ins that override it. Links found
//! as regular files in the networkd directory are user-defined and never
//! touched; links found in an available directory are disabled until a
//! symlink to them is placed in the networkd directory.

mod config;
mod definition;
mod host;
pub mod network;
pub mod overlay;
mod registry;
mod steps;

pub use config::LinkConfig;
pub use definition::{LinkStatus, NetDev, RENAME_DROPIN};
pub use host::{Context, Host};
pub use network::{MemberKey, Network, NetworkResolver};
pub use overlay::{Attributes, NetDevKey};
pub use registry::LinkRegistry;
