//! Common error types for linkctl.

use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`LinkError`].
pub type LinkResult<T> = Result<T, LinkError>;

/// Why the parent network of a link could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentNetworkGap {
    /// The unit file name does not name a parent interface.
    UnknownInterface,
    /// The parent interface is not present in the kernel.
    MissingInterface(String),
    /// The interface exists but no network unit governs it.
    NoNetworkUnit(String),
}

impl fmt::Display for ParentNetworkGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownInterface => write!(f, "unable to determine the parent interface"),
            Self::MissingInterface(name) => write!(f, "there is no interface \"{name}\""),
            Self::NoNetworkUnit(name) => {
                write!(f, "unable to determine network unit for interface {name}")
            }
        }
    }
}

/// Errors raised while managing links.
#[derive(Error, Diagnostic, Debug)]
pub enum LinkError {
    /// Enable requested on an enabled link.
    #[error("The link {link} is already enabled")]
    #[diagnostic(code(linkctl::link::already_enabled))]
    AlreadyEnabled {
        /// Link name.
        link: String,
    },

    /// Disable requested on a disabled link.
    #[error("The link {link} is already disabled")]
    #[diagnostic(code(linkctl::link::already_disabled))]
    AlreadyDisabled {
        /// Link name.
        link: String,
    },

    /// The link is defined directly in the network configuration directory.
    #[error("The link {link} is user-defined and cannot be {action}")]
    #[diagnostic(
        code(linkctl::link::immutable),
        help("Links defined as regular files in the network directory are managed by hand")
    )]
    Immutable {
        /// Link name.
        link: String,
        /// Past participle of the refused operation.
        action: &'static str,
    },

    /// Another link or a live interface already uses the name.
    #[error("A link with the name {name} already exists")]
    #[diagnostic(code(linkctl::link::name_conflict))]
    NameConflict {
        /// Conflicting name.
        name: String,
    },

    /// Reset requested on a link that carries no rename overlay.
    #[error("The link {link} has not been renamed")]
    #[diagnostic(code(linkctl::link::not_renamed))]
    NotRenamed {
        /// Link name.
        link: String,
    },

    /// No link is known under the name.
    #[error("No link with the name {name}")]
    #[diagnostic(code(linkctl::link::not_found), help("Run `linkctl list -a` to see all links"))]
    LinkNotFound {
        /// Requested name.
        name: String,
    },

    /// The parent network of a link could not be resolved.
    #[error("Cannot update the parent network of link {link} ({unit}): {gap}")]
    #[diagnostic(
        code(linkctl::network::unresolved),
        help("The parent interface must be up and managed by systemd-networkd")
    )]
    UnresolvedParentNetwork {
        /// Link name.
        link: String,
        /// Base unit file name.
        unit: String,
        /// What is missing.
        gap: ParentNetworkGap,
    },

    /// I/O error on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(linkctl::io))]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed unit file name or content.
    #[error("Failed to parse {}: {message}", .path.display())]
    #[diagnostic(code(linkctl::parse))]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A kernel interface command failed.
    #[error("Unable to {action} interface {name}: {message}")]
    #[diagnostic(code(linkctl::interface))]
    Interface {
        /// Interface name.
        name: String,
        /// Attempted action.
        action: &'static str,
        /// Failure detail.
        message: String,
    },

    /// The network daemon could not be restarted.
    #[error("Failed to restart {unit}: {message}")]
    #[diagnostic(
        code(linkctl::daemon::reload),
        help("The configuration was written; restart the daemon manually to apply it")
    )]
    DaemonReload {
        /// Service unit name.
        unit: String,
        /// Failure detail.
        message: String,
    },

    /// A transition failed after some of its side effects were applied.
    #[error("{operation} of link {link} was partially applied (completed: {}): {source}", .completed.join(", "))]
    #[diagnostic(
        code(linkctl::link::partially_applied),
        help("Inspect the link with `linkctl show` before retrying")
    )]
    PartiallyApplied {
        /// Transition name.
        operation: &'static str,
        /// Link name.
        link: String,
        /// Steps that completed before the failure.
        completed: Vec<&'static str>,
        /// The failing step's error.
        #[source]
        source: Box<LinkError>,
    },
}

impl LinkError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a parse error for a path.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// The error at the root of a partially applied transition.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::PartiallyApplied { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
