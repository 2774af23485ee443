//! CLI entry point for the IPFS gateway resolver.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ipfs_gateway::agent::{FileInstallStore, InstallStore, MemoryInstallStore};
use ipfs_gateway::fetch::{HttpTimeouts, RaceFetcher};
use ipfs_gateway::gateway::{GatewayOptions, GatewayResolver, LocalAgentSetting};
use ipfs_gateway::ipfs::ipfs_to_web2_info_list;
use tracing::{debug, info, warn};

mod app_config;
mod browser;
mod cli;

use app_config::{FileConfig, VerbositySetting};
use browser::SystemBrowser;
use cli::{Args, Command};

/// Process outcome of a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = app_config::load_config(args.config.as_deref())?;
    let file = loaded.file_config();

    init_tracing(default_log_level(&args, file.verbosity));
    debug!(?args, "CLI arguments parsed");
    if loaded.config.is_some() {
        debug!(path = ?loaded.path, "configuration file loaded");
    }

    let exit = run(&args, &file).await?;
    Ok(exit.into())
}

/// Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info.
fn default_log_level(args: &Args, configured: Option<VerbositySetting>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => configured.map_or("info", VerbositySetting::level),
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(args: &Args, file: &FileConfig) -> Result<ProcessExit> {
    let options = gateway_options(args, file);
    let fetcher = RaceFetcher::with_timeouts(http_timeouts(file))
        .context("Failed to build gateway HTTP client")?;

    let mut builder = GatewayResolver::builder(options)
        .fetcher(fetcher)
        .race_timeout(race_timeout(args, file));
    if args.command.is_offline() {
        builder = builder.without_agent_capability();
    } else {
        builder = builder.install_store(install_store(args, file));
    }
    let resolver = builder
        .build()
        .context("Failed to build gateway resolver")?;

    let output = match &args.command {
        Command::Resolve { input } => resolver.resolve(input).await,
        Command::Fastest { input } => resolver.resolve_fastest(input).await,
        Command::Fallback { input } => resolver.resolve_fallback(input),
        Command::LocalUrl { input } => resolver.resolve_local_url(input),
        Command::Convert { url } => resolver.to_ipfs_url(url),
        Command::Open { input } => {
            let opened = resolver
                .open_ipfs_url(&SystemBrowser, input, Some("_blank"), None)
                .await;
            if opened.is_none() {
                warn!(input = %input, "browser refused to open");
                return Ok(ProcessExit::Failure);
            }
            return Ok(if ipfs_gateway::is_ipfs_url(input) {
                ProcessExit::Success
            } else {
                warn!(input = %input, "not an IPFS URL");
                ProcessExit::Failure
            });
        }
        Command::Candidates { input } => {
            let candidates = ipfs_to_web2_info_list(input, resolver.config().gateways());
            if candidates.is_empty() {
                warn!(input = %input, "not an IPFS URL");
                return Ok(ProcessExit::Failure);
            }
            for candidate in candidates {
                println!("{}", candidate.url);
            }
            return Ok(ProcessExit::Success);
        }
    };

    match output {
        Some(url) => {
            println!("{url}");
            Ok(ProcessExit::Success)
        }
        None => {
            info!("no URL produced for input");
            Ok(ProcessExit::Failure)
        }
    }
}

/// CLI values override file values.
fn gateway_options(args: &Args, file: &FileConfig) -> GatewayOptions {
    let mut options = GatewayOptions::default();
    if !args.gateways.is_empty() {
        options = options.with_gateways(args.gateways.iter().cloned());
    } else if let Some(gateways) = &file.gateways {
        options = options.with_gateways(gateways.iter().cloned());
    }

    let local_enabled = !args.no_local_agent && file.local_agent.unwrap_or(true);
    let local_agent = if local_enabled {
        LocalAgentSetting::Custom {
            agent_id: args.agent_id.clone().or_else(|| file.agent_id.clone()),
            gateway_prefix: args
                .local_prefix
                .clone()
                .or_else(|| file.local_prefix.clone()),
        }
    } else {
        LocalAgentSetting::Disabled
    };
    options.with_local_agent(local_agent)
}

fn race_timeout(args: &Args, file: &FileConfig) -> Option<Duration> {
    args.timeout_ms
        .or(file.timeout_ms)
        .map(Duration::from_millis)
}

fn http_timeouts(file: &FileConfig) -> HttpTimeouts {
    let defaults = HttpTimeouts::default();
    HttpTimeouts {
        connect: file
            .connect_timeout_secs
            .map_or(defaults.connect, Duration::from_secs),
        read: file
            .read_timeout_secs
            .map_or(defaults.read, Duration::from_secs),
    }
}

/// Falls back to an in-memory store when no state file can be opened.
fn install_store(args: &Args, file: &FileConfig) -> Arc<dyn InstallStore> {
    let explicit: Option<PathBuf> = args.state_file.clone().or_else(|| file.state_file.clone());
    let opened = match explicit {
        Some(path) => FileInstallStore::open(path),
        None => FileInstallStore::open_default(),
    };
    match opened {
        Ok(store) => {
            debug!(path = %store.path().display(), "using install state file");
            Arc::new(store)
        }
        Err(error) => {
            warn!(error = %error, "install state unavailable; not persisting local agent state");
            Arc::new(MemoryInstallStore::new())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ipfs-gateway"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["fallback", "ipfs://Qm1"]);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_log_level_priority() {
        assert_eq!(default_log_level(&args(&[]), None), "info");
        assert_eq!(
            default_log_level(&args(&[]), Some(VerbositySetting::Quiet)),
            "error"
        );
        assert_eq!(
            default_log_level(&args(&["-v"]), Some(VerbositySetting::Quiet)),
            "debug"
        );
        assert_eq!(default_log_level(&args(&["-vv"]), None), "trace");
        assert_eq!(default_log_level(&args(&["-q", "-v"]), None), "error");
    }

    #[test]
    fn test_gateway_options_cli_overrides_file() {
        let file = FileConfig {
            gateways: Some(vec!["https://file/{cid}".to_string()]),
            local_prefix: Some("/file-prefix/".to_string()),
            agent_id: Some("file-agent".to_string()),
            ..FileConfig::default()
        };

        let options = gateway_options(&args(&["--gateway", "https://cli/{cid}"]), &file);
        assert_eq!(options.gateways.unwrap(), ["https://cli/{cid}"]);
        assert_eq!(
            options.local_agent,
            LocalAgentSetting::Custom {
                agent_id: Some("file-agent".to_string()),
                gateway_prefix: Some("/file-prefix/".to_string()),
            }
        );

        let options = gateway_options(&args(&[]), &file);
        assert_eq!(options.gateways.unwrap(), ["https://file/{cid}"]);
    }

    #[test]
    fn test_gateway_options_local_agent_disabled() {
        let options = gateway_options(&args(&["--no-local-agent"]), &FileConfig::default());
        assert_eq!(options.local_agent, LocalAgentSetting::Disabled);

        let file = FileConfig {
            local_agent: Some(false),
            ..FileConfig::default()
        };
        let options = gateway_options(&args(&[]), &file);
        assert_eq!(options.local_agent, LocalAgentSetting::Disabled);
    }

    #[test]
    fn test_race_timeout_and_http_timeouts() {
        let file = FileConfig {
            timeout_ms: Some(900),
            connect_timeout_secs: Some(2),
            ..FileConfig::default()
        };
        assert_eq!(
            race_timeout(&args(&[]), &file),
            Some(Duration::from_millis(900))
        );
        assert_eq!(
            race_timeout(&args(&["--timeout-ms", "50"]), &file),
            Some(Duration::from_millis(50))
        );
        assert_eq!(race_timeout(&args(&[]), &FileConfig::default()), None);

        let timeouts = http_timeouts(&file);
        assert_eq!(timeouts.connect, Duration::from_secs(2));
        assert_eq!(timeouts.read, HttpTimeouts::default().read);
    }

    #[test]
    fn test_install_store_uses_explicit_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let path_arg = path.to_str().unwrap();
        let store = install_store(&args(&["--state-file", path_arg]), &FileConfig::default());
        store.mark_installed("node");
        assert!(store.was_installed("node"));
        assert!(path.exists());
    }
}
