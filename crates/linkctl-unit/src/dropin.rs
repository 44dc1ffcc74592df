//! Drop-in discovery.

use std::path::PathBuf;

use linkctl_common::{LinkError, LinkResult};

use crate::Unit;

/// Paths matching a glob, in lexicographic order.
///
/// # Errors
///
/// Returns [`LinkError::Parse`] if the pattern is invalid.
pub fn matching_paths(pattern: &str) -> LinkResult<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| LinkError::parse(pattern, format!("invalid pattern: {e}")))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load every drop-in matching `pattern`, in lexicographic order.
///
/// Drop-ins that fail to parse are logged and skipped.
///
/// # Errors
///
/// Returns [`LinkError::Parse`] if the pattern is invalid.
pub fn load_dropins(pattern: &str) -> LinkResult<Vec<Unit>> {
    let mut units = Vec::new();
    for path in matching_paths(pattern)? {
        match Unit::load(&path) {
            Ok(unit) => units.push(unit),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse networkd unit");
            }
        }
    }
    Ok(units)
}
