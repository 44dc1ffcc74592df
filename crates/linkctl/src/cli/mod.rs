//! CLI command definitions and handlers.

use std::io;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use color_eyre::eyre::Result;
use console::{Term, style};
use linkctl_common::{LinkError, LinkResult};
use linkctl_network::NetworkDaemon;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::netdev::{LinkConfig, LinkRegistry, LinkStatus, NetDev};

/// linkctl - Manage systemd-networkd virtual links
#[derive(Parser)]
#[command(name = "linkctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Filesystem root holding the networkd configuration
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Do not restart systemd-networkd after a change
    #[arg(long, global = true)]
    pub no_restart: bool,

    /// The subcommand to execute. Lists enabled links when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// linkctl commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List links
    List {
        /// Include disabled links
        #[arg(short, long)]
        all: bool,

        /// Only display link names
        #[arg(short, long)]
        quiet: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Enable a link
    Enable {
        /// Link name
        link: String,
    },

    /// Disable a link
    Disable {
        /// Link name
        link: String,
    },

    /// Rename a link, or restore its original name
    Rename {
        /// Link name
        link: String,

        /// New name; the original name is restored when omitted
        new_name: Option<String>,
    },

    /// Show a link and the units backing it
    Show {
        /// Link name
        link: String,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Output format of `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    Table,
    /// JSON array
    Json,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    kind: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Serialize)]
struct LinkSummary<'a> {
    name: &'a str,
    kind: &'a str,
    status: LinkStatus,
    description: Option<&'a str>,
    unit: &'a Path,
    parent: Option<&'a str>,
}

impl<'a> From<&'a NetDev> for LinkSummary<'a> {
    fn from(link: &'a NetDev) -> Self {
        Self {
            name: link.name(),
            kind: link.kind(),
            status: link.status(),
            description: link.description(),
            unit: link.unit().path(),
            parent: link.parent_interface(),
        }
    }
}

impl Cli {
    /// Engine configuration selected by the global flags.
    #[must_use]
    pub fn config(&self) -> LinkConfig {
        let mut config = LinkConfig::default();
        if let Some(root) = &self.root {
            config = config.with_root(root);
        }
        if self.no_restart {
            config = config.without_restart();
        }
        config
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn execute(self) -> Result<()> {
        let config = self.config();
        let command = self.command.unwrap_or(Commands::List {
            all: false,
            quiet: false,
            format: OutputFormat::Table,
        });

        if let Commands::Completions { shell } = command {
            clap_complete::generate(shell, &mut Self::command(), "linkctl", &mut io::stdout());
            return Ok(());
        }

        let mut registry = LinkRegistry::load(config.host())?;

        match command {
            Commands::List { all, quiet, format } => {
                let links = registry.list(all);
                if quiet {
                    for link in links {
                        println!("{}", link.name());
                    }
                } else if format == OutputFormat::Json {
                    let summaries: Vec<LinkSummary<'_>> =
                        links.into_iter().map(LinkSummary::from).collect();
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                } else if links.is_empty() {
                    println!("No links found");
                } else {
                    let rows: Vec<LinkRow> = links
                        .into_iter()
                        .map(|link| LinkRow {
                            name: link.name().to_string(),
                            kind: link.kind().to_string(),
                            status: styled_status(link.status()),
                        })
                        .collect();
                    println!("{}", Table::new(rows));
                }
                Ok(())
            }

            Commands::Enable { link } => {
                registry.enable(&link)?;
                println!("Link {link} enabled");
                restart(&config).await
            }

            Commands::Disable { link } => {
                registry.disable(&link)?;
                println!("Link {link} disabled");
                restart(&config).await
            }

            Commands::Rename {
                link,
                new_name: Some(new_name),
            } => {
                registry.rename(&link, &new_name)?;
                println!("Link {link} renamed to {new_name}");
                restart(&config).await
            }

            Commands::Rename {
                link,
                new_name: None,
            } => {
                let unit = registry.get(&link).map(|l| l.unit().path().to_path_buf());
                registry.reset_name(&link)?;
                let name = registry
                    .list(true)
                    .into_iter()
                    .find(|l| Some(l.unit().path()) == unit.as_deref())
                    .map_or_else(|| link.clone(), |l| l.name().to_string());
                println!("Link {link} renamed to {name}");
                restart(&config).await
            }

            Commands::Show { link } => {
                let link = registry
                    .get(&link)
                    .ok_or(LinkError::LinkNotFound { name: link.clone() })?;
                show(link);
                Ok(())
            }

            Commands::Completions { .. } => Ok(()),
        }
    }
}

fn styled_status(status: LinkStatus) -> String {
    let text = status.to_string();
    match status {
        LinkStatus::Enabled => style(text).green().to_string(),
        LinkStatus::Disabled => style(text).dim().to_string(),
        LinkStatus::UserDefined => style(text).cyan().to_string(),
    }
}

fn show(link: &NetDev) {
    let path = |unit: Option<&linkctl_unit::Unit>| {
        unit.map_or_else(|| "-".to_string(), |u| u.path().display().to_string())
    };

    println!("{}", style(link.name()).bold());
    println!("  Kind:        {}", link.kind());
    if let Some(description) = link.description() {
        println!("  Description: {description}");
    }
    println!("  Status:      {}", styled_status(link.status()));
    println!("  Unit:        {}", link.unit().path().display());
    if link.status() == LinkStatus::Enabled {
        println!("  Source:      {}", link.source().display());
    }
    println!("  Rename:      {}", path(link.rename_unit()));
    println!("  Network:     {}", path(link.rename_network_unit()));
    println!("  Parent:      {}", link.parent_interface().unwrap_or("-"));
}

async fn restart(config: &LinkConfig) -> Result<()> {
    if !config.restart {
        return Ok(());
    }

    let daemon = config.daemon().with_progress(Term::stderr().is_term());
    apply(&daemon).await?;
    Ok(())
}

/// Restart the daemon so saved changes take effect. Saved changes are kept
/// when the restart fails.
async fn apply(daemon: &dyn NetworkDaemon) -> LinkResult<()> {
    daemon.restart().await.inspect_err(|e| {
        tracing::warn!(error = %e, "Changes saved but not applied");
    })
}
