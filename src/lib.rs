//! IPFS Gateway Resolver Library
//!
//! Resolves `ipfs://` URLs to HTTP URLs by racing public gateways, with a
//! fast path through a local interception agent and a deterministic
//! fallback when the race fails.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`ipfs`] - IPFS URL recognition and gateway template substitution
//! - [`fetch`] - concurrent race-with-timeout-and-cancellation HTTP primitive
//! - [`agent`] - local agent readiness, install persistence, local node agent
//! - [`gateway`] - the resolver composing all of the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod fetch;
pub mod gateway;
pub mod ipfs;

pub(crate) mod user_agent;

// Re-export commonly used types
pub use agent::{AgentReadiness, InstallStore, LocalAgent};
pub use fetch::{RaceError, RaceFetcher, RaceOptions, cancel_pair};
pub use gateway::{GatewayOptions, GatewayResolver, LocalAgentSetting};
pub use ipfs::{DEFAULT_IPFS_GATEWAYS, IpfsInfo, is_ipfs_url, parse_ipfs_info};
