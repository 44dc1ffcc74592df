//! # linkctl-common
//!
//! Shared utilities and types for the linkctl crates.
//!
//! This crate provides functionality used across all linkctl crates:
//! - The common error type and result alias
//! - The filesystem layout of systemd-networkd and linkctl

#![warn(missing_docs)]

pub mod error;
pub mod paths;

pub use error::{LinkError, LinkResult, ParentNetworkGap};
pub use paths::{LinkOrigin, NetworkdPaths, SearchPath};
