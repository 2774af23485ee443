//! Resolver that layers the local agent path, the gateway race, and the
//! deterministic fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::config::{GatewayConfig, GatewayOptions};
use super::open::{ContextHost, NavigationContext};
use crate::agent::{
    AgentInstallConfig, AgentReadiness, AgentState, InstallStore, LocalAgent, LocalNodeAgent,
    MemoryInstallStore,
};
use crate::fetch::{ClientBuildError, RaceFetcher, RaceOptions};
use crate::ipfs::{
    DEFAULT_GATEWAY_PREFIX, fill_gateway_template, is_ipfs_url, local_gateway_template,
    local_gateway_url_to_ipfs_url, parse_ipfs_info,
};

enum AgentSource {
    LocalNode,
    Custom(Arc<dyn LocalAgent>),
    Unavailable,
}

/// Builder for [`GatewayResolver`].
///
/// Defaults: a fresh [`RaceFetcher`], a [`LocalNodeAgent`] sharing its HTTP
/// client, an in-memory install store and no race timeout.
pub struct GatewayResolverBuilder {
    options: GatewayOptions,
    fetcher: Option<RaceFetcher>,
    agent: AgentSource,
    store: Option<Arc<dyn InstallStore>>,
    race_timeout: Option<Duration>,
}

impl GatewayResolverBuilder {
    fn new(options: GatewayOptions) -> Self {
        Self {
            options,
            fetcher: None,
            agent: AgentSource::LocalNode,
            store: None,
            race_timeout: None,
        }
    }

    /// Uses `fetcher` for gateway races and the default local node probe.
    #[must_use]
    pub fn fetcher(mut self, fetcher: RaceFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Uses `agent` as the local agent capability.
    #[must_use]
    pub fn local_agent(mut self, agent: Arc<dyn LocalAgent>) -> Self {
        self.agent = AgentSource::Custom(agent);
        self
    }

    /// Declares that no local agent capability exists in this environment.
    #[must_use]
    pub fn without_agent_capability(mut self) -> Self {
        self.agent = AgentSource::Unavailable;
        self
    }

    /// Persists the "installed before" fact in `store`.
    #[must_use]
    pub fn install_store(mut self, store: Arc<dyn InstallStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Bounds every gateway race started by the resolver.
    #[must_use]
    pub fn race_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.race_timeout = timeout;
        self
    }

    /// Prepares the configuration and starts the local agent install.
    ///
    /// Built outside a Tokio runtime, the local agent path is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when no fetcher was supplied and the
    /// default HTTP client cannot be built.
    pub fn build(self) -> Result<GatewayResolver, ClientBuildError> {
        let config = GatewayConfig::prepare(self.options);
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => RaceFetcher::new()?,
        };

        let agent: Option<Arc<dyn LocalAgent>> = match self.agent {
            AgentSource::LocalNode => Some(Arc::new(LocalNodeAgent::new(fetcher.client().clone()))),
            AgentSource::Custom(agent) => Some(agent),
            AgentSource::Unavailable => None,
        };

        let agent_state = match (config.local_agent(), agent) {
            (Some(local), Some(agent)) => {
                let store = self
                    .store
                    .unwrap_or_else(|| Arc::new(MemoryInstallStore::new()));
                AgentState::start(
                    agent,
                    store,
                    AgentInstallConfig {
                        gateways: config.gateways().to_vec(),
                        agent_id: local.agent_id.clone(),
                        gateway_prefix: local.gateway_prefix.clone(),
                    },
                )
            }
            (Some(_), None) => {
                info!("no local agent capability; local path disabled");
                AgentState::disabled()
            }
            (None, _) => {
                debug!("local agent disabled by configuration");
                AgentState::disabled()
            }
        };

        Ok(GatewayResolver {
            config: Arc::new(config),
            fetcher,
            agent: agent_state,
            race_timeout: self.race_timeout,
        })
    }
}

/// Resolves IPFS URLs to HTTP URLs.
///
/// Cloning is cheap; clones share configuration and agent state.
///
/// # Example
///
/// ```no_run
/// use ipfs_gateway::gateway::{GatewayOptions, GatewayResolver};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = GatewayResolver::new(GatewayOptions::default().without_local_agent())?;
/// if let Some(url) = resolver.resolve("ipfs://QmExample/readme.txt").await {
///     println!("{url}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GatewayResolver {
    config: Arc<GatewayConfig>,
    fetcher: RaceFetcher,
    agent: AgentState,
    race_timeout: Option<Duration>,
}

impl GatewayResolver {
    /// Builds a resolver with default collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be built.
    pub fn new(options: GatewayOptions) -> Result<Self, ClientBuildError> {
        Self::builder(options).build()
    }

    /// Starts a builder for `options`.
    #[must_use]
    pub fn builder(options: GatewayOptions) -> GatewayResolverBuilder {
        GatewayResolverBuilder::new(options)
    }

    /// Prepared configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fallback-of-last-resort gateway template.
    #[must_use]
    pub fn fallback_gateway(&self) -> &str {
        self.config.fallback_gateway()
    }

    /// Current local agent readiness.
    #[must_use]
    pub fn agent_readiness(&self) -> AgentReadiness {
        self.agent.readiness()
    }

    /// Waits for the local agent install; true iff it is ready.
    pub async fn registration(&self) -> bool {
        self.agent.registration().await
    }

    /// Resolves `input` to an HTTP URL.
    ///
    /// A ready local agent answers without any network request. Otherwise the
    /// fastest gateway wins, and the fallback gateway is used when the race
    /// fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, input: &str) -> Option<String> {
        if !is_ipfs_url(input) {
            return None;
        }

        if self.config.local_agent().is_some() && self.agent.registration().await {
            debug!("resolving through local agent");
            return self.resolve_local_url(input);
        }

        match self.resolve_fastest(input).await {
            Some(url) => Some(url),
            None => self.resolve_fallback(input),
        }
    }

    /// HEAD race across every configured gateway, bounded by the resolver's
    /// race timeout if one was set.
    pub async fn resolve_fastest(&self, input: &str) -> Option<String> {
        let mut options = RaceOptions::head();
        if let Some(timeout) = self.race_timeout {
            options = options.with_timeout(timeout);
        }
        self.resolve_fastest_with(input, options).await
    }

    /// Races every configured gateway with caller-supplied options and
    /// returns the winner's final URL. Failures are logged and become `None`.
    #[instrument(skip(self, options))]
    pub async fn resolve_fastest_with(&self, input: &str, options: RaceOptions) -> Option<String> {
        if !is_ipfs_url(input) {
            return None;
        }

        match self
            .fetcher
            .fetch_ipfs(input, self.config.gateways(), options)
            .await
        {
            Ok(response) => Some(response.url().to_string()),
            Err(error) => {
                warn!(error = %error, "fastest gateway resolution failed");
                None
            }
        }
    }

    /// Substitutes `input` into the local agent prefix, or the default
    /// prefix when the local path is disabled.
    #[must_use]
    pub fn resolve_local_url(&self, input: &str) -> Option<String> {
        let prefix = self
            .config
            .local_agent()
            .map_or(DEFAULT_GATEWAY_PREFIX, |local| local.gateway_prefix.as_str());
        let info = parse_ipfs_info(input)?;
        Some(fill_gateway_template(&local_gateway_template(prefix), &info))
    }

    /// Substitutes `input` into the fallback gateway template.
    #[must_use]
    pub fn resolve_fallback(&self, input: &str) -> Option<String> {
        let info = parse_ipfs_info(input)?;
        Some(fill_gateway_template(self.fallback_gateway(), &info))
    }

    /// Converts `url` back to an IPFS URL.
    ///
    /// IPFS URLs pass through. Local agent URLs are inverted when a local
    /// prefix is configured. Anything else yields `None`.
    #[must_use]
    pub fn to_ipfs_url(&self, url: &str) -> Option<String> {
        if is_ipfs_url(url) {
            return Some(url.to_string());
        }
        let local = self.config.local_agent()?;
        local_gateway_url_to_ipfs_url(&local.gateway_prefix, url)
    }

    /// Opens a blank context on `host`, then navigates it to the resolved
    /// URL for `input`.
    ///
    /// The context is opened before any await. Returns `None` when the host
    /// refuses; the context stays blank when `input` is not an IPFS URL.
    #[instrument(skip(self, host))]
    pub async fn open_ipfs_url<H: ContextHost>(
        &self,
        host: &H,
        input: &str,
        target: Option<&str>,
        features: Option<&str>,
    ) -> Option<H::Context> {
        let Some(context) = host.open_blank(target, features) else {
            warn!("host refused to open a new context");
            return None;
        };

        let resolved = match self.resolve_fastest(input).await {
            Some(url) => Some(url),
            None => self.resolve_fallback(input),
        };
        match resolved {
            Some(url) => {
                debug!(url = %url, "navigating opened context");
                context.navigate(&url);
            }
            None => warn!("input is not an IPFS URL; context left blank"),
        }
        Some(context)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use reqwest::Client;

    use super::*;
    use crate::gateway::LocalAgentSetting;

    struct FixedAgent(bool);

    #[async_trait]
    impl LocalAgent for FixedAgent {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_supported(&self) -> bool {
            true
        }

        async fn install(&self, _config: &AgentInstallConfig) -> bool {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct RecordingContext(Rc<RefCell<Vec<String>>>);

    impl NavigationContext for RecordingContext {
        fn navigate(&self, url: &str) {
            self.0.borrow_mut().push(url.to_string());
        }
    }

    struct RecordingHost {
        allow: bool,
        context: RecordingContext,
    }

    impl ContextHost for RecordingHost {
        type Context = RecordingContext;

        fn open_blank(&self, _target: Option<&str>, _features: Option<&str>) -> Option<Self::Context> {
            self.allow.then(|| self.context.clone())
        }
    }

    fn resolver(options: GatewayOptions, agent: Option<bool>) -> GatewayResolver {
        let builder = GatewayResolver::builder(options)
            .fetcher(RaceFetcher::with_client(Client::new()))
            .race_timeout(Some(Duration::from_millis(50)));
        let builder = match agent {
            Some(ready) => builder.local_agent(Arc::new(FixedAgent(ready))),
            None => builder.without_agent_capability(),
        };
        builder.build().unwrap()
    }

    fn local_options(prefix: &str) -> GatewayOptions {
        GatewayOptions::default()
            .with_gateways(["https://g0.invalid/ipfs/{cid}{pathToResource}"])
            .with_local_agent(LocalAgentSetting::Custom {
                agent_id: None,
                gateway_prefix: Some(prefix.to_string()),
            })
    }

    #[test]
    fn test_build_outside_runtime_disables_local_agent() {
        let resolver = resolver(local_options("/ipfs-gw/"), Some(true));
        assert_eq!(resolver.agent_readiness(), AgentReadiness::Disabled);
        assert_eq!(
            resolver.resolve_fallback("ipfs://Qm123").as_deref(),
            Some("https://g0.invalid/ipfs/Qm123")
        );
    }

    #[tokio::test]
    async fn test_resolve_through_ready_agent() {
        let resolver = resolver(local_options("/ipfs-gw/"), Some(true));
        assert_eq!(
            resolver.resolve("ipfs://Qm123/a.txt").await.as_deref(),
            Some("/ipfs-gw/Qm123/a.txt")
        );
        assert_eq!(resolver.agent_readiness(), AgentReadiness::Ready);
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_ipfs_input() {
        let resolver = resolver(local_options("/ipfs-gw/"), Some(true));
        assert!(resolver.resolve("https://example.com/x").await.is_none());
        assert!(resolver.resolve_fastest("https://example.com/x").await.is_none());
        assert!(resolver.resolve_fallback("https://example.com/x").is_none());
        assert!(resolver.resolve_local_url("https://example.com/x").is_none());
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_race_times_out() {
        let resolver = resolver(local_options("/ipfs-gw/"), Some(false));
        assert_eq!(
            resolver.resolve("ipfs://Qm123").await.as_deref(),
            Some("https://g0.invalid/ipfs/Qm123")
        );
        assert_eq!(resolver.agent_readiness(), AgentReadiness::Disabled);
    }

    #[tokio::test]
    async fn test_missing_capability_disables_agent() {
        let resolver = resolver(local_options("/ipfs-gw/"), None);
        assert_eq!(resolver.agent_readiness(), AgentReadiness::Disabled);
        assert!(!resolver.registration().await);
    }

    #[tokio::test]
    async fn test_resolve_local_url_uses_default_prefix_when_disabled() {
        let resolver = resolver(GatewayOptions::default().without_local_agent(), Some(true));
        assert_eq!(
            resolver.resolve_local_url("ipfs://Qm123").as_deref(),
            Some("http://127.0.0.1:8080/ipfs/Qm123")
        );
        assert_eq!(resolver.agent_readiness(), AgentReadiness::Disabled);
    }

    #[tokio::test]
    async fn test_to_ipfs_url_inverts_local_url() {
        let resolver = resolver(local_options("/ipfs-gw/"), Some(false));
        let local = resolver.resolve_local_url("ipfs://Qm123/dir/file?x=1").unwrap();
        assert_eq!(
            resolver.to_ipfs_url(&local).as_deref(),
            Some("ipfs://Qm123/dir/file?x=1")
        );
        assert_eq!(
            resolver.to_ipfs_url("ipfs://Qm9").as_deref(),
            Some("ipfs://Qm9")
        );
        assert!(resolver.to_ipfs_url("https://example.com/x").is_none());
    }

    #[tokio::test]
    async fn test_to_ipfs_url_without_local_agent() {
        let resolver = resolver(GatewayOptions::default().without_local_agent(), None);
        assert!(resolver.to_ipfs_url("/ipfs-gw/Qm123").is_none());
    }

    #[tokio::test]
    async fn test_open_ipfs_url_navigates_to_fallback() {
        let resolver = resolver(local_options("/ipfs-gw/"), None);
        let host = RecordingHost {
            allow: true,
            context: RecordingContext::default(),
        };
        let context = resolver
            .open_ipfs_url(&host, "ipfs://Qm123", Some("_blank"), None)
            .await
            .unwrap();
        assert_eq!(*context.0.borrow(), ["https://g0.invalid/ipfs/Qm123"]);
    }

    #[tokio::test]
    async fn test_open_ipfs_url_refused_by_host() {
        let resolver = resolver(local_options("/ipfs-gw/"), None);
        let host = RecordingHost {
            allow: false,
            context: RecordingContext::default(),
        };
        assert!(resolver.open_ipfs_url(&host, "ipfs://Qm123", None, None).await.is_none());
        assert!(host.context.0.borrow().is_empty());
    }
}
