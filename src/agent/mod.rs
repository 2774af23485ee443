//! Local interception agent: readiness state machine, install persistence,
//! and the local IPFS node implementation.
//!
//! # Architecture
//!
//! - [`LocalAgent`] - async trait for an installable agent that answers IPFS requests locally
//! - [`AgentState`] - one-shot install attempt and its readiness
//! - [`InstallStore`] - injected get/set/clear capability for the "installed before" fact
//! - [`LocalNodeAgent`] - agent backed by a local IPFS node's path gateway
//!
//! # Lifecycle
//!
//! ```text
//! Disabled ─────────────────────────────────────────────── (terminal)
//! FirstTimeInstall ─┐
//!                   ├─ install attempt ─┬─ true  ─> Ready    (terminal)
//! PendingResponse ──┘                   └─ false ─> Disabled (terminal)
//! ```

mod local_node;
mod state;
mod store;

pub use local_node::{EMPTY_DIRECTORY_CID, LocalNodeAgent};
pub use state::AgentState;
pub use store::{
    FileInstallStore, InstallStore, MemoryInstallStore, StoreError, default_state_path,
};

use std::fmt;

use async_trait::async_trait;

/// Readiness of the local agent as observed by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentReadiness {
    /// No local agent path: unavailable, explicitly disabled, or install failed.
    Disabled,
    /// Install in progress and the agent was never installed before.
    FirstTimeInstall,
    /// Install in progress and the agent was installed in an earlier run.
    PendingResponse,
    /// The agent answered the install attempt and serves requests.
    Ready,
}

impl AgentReadiness {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::FirstTimeInstall => "first-time-install",
            Self::PendingResponse => "pending-response",
            Self::Ready => "ready",
        }
    }

    /// Returns true for states that never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disabled | Self::Ready)
    }
}

impl fmt::Display for AgentReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an agent needs to install itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInstallConfig {
    /// Remote gateway templates, for agents that proxy to them.
    pub gateways: Vec<String>,
    /// Identifier of the agent in the install store.
    pub agent_id: String,
    /// URL prefix under which the agent answers IPFS requests.
    pub gateway_prefix: String,
}

/// An installable component that answers IPFS requests locally.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn LocalAgent>`.
#[async_trait]
pub trait LocalAgent: Send + Sync {
    /// Returns the agent's name for logging.
    fn name(&self) -> &str;

    /// Returns true if the host environment can run this agent at all.
    fn is_supported(&self) -> bool;

    /// Installs the agent. Resolves to true once it is ready to serve.
    async fn install(&self, config: &AgentInstallConfig) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_labels() {
        assert_eq!(AgentReadiness::Disabled.to_string(), "disabled");
        assert_eq!(AgentReadiness::FirstTimeInstall.as_str(), "first-time-install");
        assert_eq!(AgentReadiness::PendingResponse.as_str(), "pending-response");
        assert_eq!(AgentReadiness::Ready.as_str(), "ready");
    }

    #[test]
    fn test_readiness_terminal_states() {
        assert!(AgentReadiness::Disabled.is_terminal());
        assert!(AgentReadiness::Ready.is_terminal());
        assert!(!AgentReadiness::FirstTimeInstall.is_terminal());
        assert!(!AgentReadiness::PendingResponse.is_terminal());
    }
}
