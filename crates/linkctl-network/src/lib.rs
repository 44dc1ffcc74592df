//! # linkctl-network
//!
//! Access to the live system for linkctl.
//!
//! This crate provides the boundaries between the link engine and the host:
//! the kernel interface table, the per-interface runtime state written by
//! systemd-networkd, and restarting the daemon.

#![warn(missing_docs)]

pub mod daemon;
pub mod interface;
pub mod netif;

pub use daemon::{NETWORKD_UNIT, NetworkDaemon, Systemctl};
pub use interface::{InterfaceTable, IpLink};
pub use netif::{NetifState, RuntimeState};
