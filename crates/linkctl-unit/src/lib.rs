//! # linkctl-unit
//!
//! In-memory model of systemd unit files as used by systemd-networkd.
//!
//! This crate provides:
//! - Parsing and serialising `.netdev`, `.network` and drop-in `.conf` files
//! - Section/key access with list-valued helpers
//! - Drop-in discovery for a unit

#![warn(missing_docs)]

pub mod dropin;
mod parser;
pub mod tokens;
pub mod unit;

pub use dropin::{load_dropins, matching_paths};
pub use unit::{Section, Unit};
