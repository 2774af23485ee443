//! Local agent backed by a local IPFS node's path gateway.
//!
//! "Installing" the agent means confirming the node answers under the
//! configured prefix. The probe requests the empty UnixFS directory, which
//! every node can serve without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{AgentInstallConfig, LocalAgent};
use crate::ipfs::{IpfsInfo, fill_gateway_template, local_gateway_template};

/// CID of the empty UnixFS directory.
pub const EMPTY_DIRECTORY_CID: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Agent that routes IPFS URLs to a locally running IPFS node.
#[derive(Debug, Clone)]
pub struct LocalNodeAgent {
    client: Client,
    probe_timeout: Duration,
}

impl LocalNodeAgent {
    /// Creates an agent probing with `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Returns the probe URL for `gateway_prefix`, or `None` when the prefix
    /// is not an absolute http(s) URL.
    #[must_use]
    pub fn probe_url(gateway_prefix: &str) -> Option<String> {
        let parsed = Url::parse(gateway_prefix).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        Some(fill_gateway_template(
            &local_gateway_template(gateway_prefix),
            &IpfsInfo::new(EMPTY_DIRECTORY_CID, ""),
        ))
    }
}

#[async_trait]
impl LocalAgent for LocalNodeAgent {
    fn name(&self) -> &'static str {
        "local-node"
    }

    fn is_supported(&self) -> bool {
        true
    }

    #[instrument(skip(self, config), fields(agent = "local-node", prefix = %config.gateway_prefix))]
    async fn install(&self, config: &AgentInstallConfig) -> bool {
        let Some(probe) = Self::probe_url(&config.gateway_prefix) else {
            warn!("local gateway prefix is not an absolute http(s) URL; local node path disabled");
            return false;
        };

        match self
            .client
            .head(probe.as_str())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => {
                info!(probe = %probe, "local IPFS node gateway is ready");
                true
            }
            Ok(response) => {
                info!(
                    probe = %probe,
                    status = response.status().as_u16(),
                    "local IPFS node answered without success"
                );
                false
            }
            Err(error) => {
                debug!(probe = %probe, error = %error, "local IPFS node unreachable");
                false
            }
        }
    }
}
