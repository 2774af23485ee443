//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resolve IPFS URLs through the fastest public gateway.
///
/// A locally running IPFS node is preferred when it answers; otherwise every
/// configured gateway is raced and the first to answer 200 wins. When the race
/// fails the first configured gateway is used.
#[derive(Parser, Debug)]
#[command(name = "ipfs-gateway")]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Gateway template with {cid} and {pathToResource} placeholders (repeatable; replaces the configured list)
    #[arg(long = "gateway", value_name = "TEMPLATE", global = true)]
    pub gateways: Vec<String>,

    /// Race timeout in milliseconds (1-600000); races are unbounded when unset
    #[arg(long, value_name = "MS", global = true, value_parser = clap::value_parser!(u64).range(1..=600_000))]
    pub timeout_ms: Option<u64>,

    /// Disable the local IPFS node path
    #[arg(long, global = true)]
    pub no_local_agent: bool,

    /// URL prefix of the local IPFS node gateway
    #[arg(long, value_name = "PREFIX", global = true)]
    pub local_prefix: Option<String>,

    /// Identifier of the local agent in the install state file
    #[arg(long, value_name = "ID", global = true)]
    pub agent_id: Option<String>,

    /// Install state file (defaults to the user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub state_file: Option<PathBuf>,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/ipfs-gateway/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve through the local node, the fastest gateway, or the fallback
    Resolve {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
    /// Race every gateway and print the winner's URL
    Fastest {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
    /// Print the fallback gateway URL without any network request
    Fallback {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
    /// Print the local node gateway URL without any network request
    LocalUrl {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
    /// Convert a local node gateway URL back to an IPFS URL
    Convert {
        /// URL to convert
        url: String,
    },
    /// Open the resolved URL in the system browser
    Open {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
    /// List the candidate URL for every configured gateway
    Candidates {
        /// IPFS URL (ipfs://<cid>/<path>)
        input: String,
    },
}

impl Command {
    /// Returns true for commands that never touch the network.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            Self::Fallback { .. } | Self::LocalUrl { .. } | Self::Convert { .. } | Self::Candidates { .. }
        )
    }
}
