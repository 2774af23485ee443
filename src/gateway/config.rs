//! Resolver configuration: gateway templates and local agent settings.

use tracing::warn;

use crate::ipfs::{DEFAULT_AGENT_ID, DEFAULT_GATEWAY_PREFIX, DEFAULT_IPFS_GATEWAYS};

/// Local agent identity and interception prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAgentConfig {
    /// Identifier of the agent in the install store.
    pub agent_id: String,
    /// URL prefix under which the agent answers IPFS requests.
    pub gateway_prefix: String,
}

impl Default for LocalAgentConfig {
    fn default() -> Self {
        Self {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            gateway_prefix: DEFAULT_GATEWAY_PREFIX.to_string(),
        }
    }
}

/// How the caller configures the local agent path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocalAgentSetting {
    /// Use [`LocalAgentConfig::default`].
    #[default]
    Default,
    /// Permanently disable the local agent path for this resolver.
    Disabled,
    /// Override individual fields; missing fields take defaults.
    Custom {
        /// Agent id override.
        agent_id: Option<String>,
        /// Gateway prefix override.
        gateway_prefix: Option<String>,
    },
}

/// Caller-facing options; every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Gateway templates. `None` or an empty list selects [`DEFAULT_IPFS_GATEWAYS`].
    pub gateways: Option<Vec<String>>,
    /// Local agent setting.
    pub local_agent: LocalAgentSetting,
}

impl GatewayOptions {
    /// Sets the gateway templates.
    #[must_use]
    pub fn with_gateways<I, S>(mut self, gateways: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gateways = Some(gateways.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the local agent setting.
    #[must_use]
    pub fn with_local_agent(mut self, local_agent: LocalAgentSetting) -> Self {
        self.local_agent = local_agent;
        self
    }

    /// Disables the local agent path.
    #[must_use]
    pub fn without_local_agent(self) -> Self {
        self.with_local_agent(LocalAgentSetting::Disabled)
    }
}

/// Immutable resolver configuration with defaults applied.
///
/// The gateway list is never empty; index 0 is the fallback-of-last-resort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    gateways: Vec<String>,
    local_agent: Option<LocalAgentConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::prepare(GatewayOptions::default())
    }
}

impl GatewayConfig {
    /// Applies defaults to `options`.
    #[must_use]
    pub fn prepare(options: GatewayOptions) -> Self {
        let gateways = match options.gateways {
            Some(gateways) if !gateways.is_empty() => gateways,
            Some(_) => {
                warn!("empty gateway list configured; using default gateways");
                default_gateways()
            }
            None => default_gateways(),
        };

        let local_agent = match options.local_agent {
            LocalAgentSetting::Default => Some(LocalAgentConfig::default()),
            LocalAgentSetting::Disabled => None,
            LocalAgentSetting::Custom {
                agent_id,
                gateway_prefix,
            } => Some(LocalAgentConfig {
                agent_id: agent_id.unwrap_or_else(|| DEFAULT_AGENT_ID.to_string()),
                gateway_prefix: gateway_prefix
                    .unwrap_or_else(|| DEFAULT_GATEWAY_PREFIX.to_string()),
            }),
        };

        Self {
            gateways,
            local_agent,
        }
    }

    /// Gateway templates in configured order.
    #[must_use]
    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    /// The fallback-of-last-resort template (index 0).
    #[must_use]
    pub fn fallback_gateway(&self) -> &str {
        self.gateways
            .first()
            .map_or(DEFAULT_IPFS_GATEWAYS[0], String::as_str)
    }

    /// Local agent settings, or `None` when the local path is disabled.
    #[must_use]
    pub fn local_agent(&self) -> Option<&LocalAgentConfig> {
        self.local_agent.as_ref()
    }
}

fn default_gateways() -> Vec<String> {
    DEFAULT_IPFS_GATEWAYS.iter().map(ToString::to_string).collect()
}
