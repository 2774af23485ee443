//! One-shot install attempt and the readiness it settles.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{info, warn};

use super::{AgentInstallConfig, AgentReadiness, InstallStore, LocalAgent};

/// Readiness of a local agent plus its memoized install outcome.
///
/// The initial readiness is decided synchronously. The terminal readiness is
/// written once, by the install task, into a single-assignment cell; readers
/// before that write observe the initial readiness.
#[derive(Clone)]
pub struct AgentState {
    initial: AgentReadiness,
    settled: Arc<OnceLock<AgentReadiness>>,
    registration: Shared<BoxFuture<'static, bool>>,
}

impl fmt::Debug for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentState")
            .field("initial", &self.initial)
            .field("settled", &self.settled.get())
            .finish_non_exhaustive()
    }
}

impl AgentState {
    /// A permanently disabled agent whose registration resolves to false.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            initial: AgentReadiness::Disabled,
            settled: Arc::new(OnceLock::new()),
            registration: futures_util::future::ready(false).boxed().shared(),
        }
    }

    /// Decides the initial readiness and spawns the single install attempt.
    ///
    /// Outside a Tokio runtime nothing can be spawned and the agent is
    /// [`AgentState::disabled`].
    pub fn start(
        agent: Arc<dyn LocalAgent>,
        store: Arc<dyn InstallStore>,
        config: AgentInstallConfig,
    ) -> Self {
        if !agent.is_supported() {
            info!(agent = agent.name(), "local agent unsupported in this environment");
            return Self::disabled();
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(agent = agent.name(), "no Tokio runtime to run the install; local agent disabled");
            return Self::disabled();
        };

        let initial = if store.was_installed(&config.agent_id) {
            AgentReadiness::PendingResponse
        } else {
            AgentReadiness::FirstTimeInstall
        };
        info!(agent = agent.name(), agent_id = %config.agent_id, readiness = %initial, "starting local agent install");

        let settled = Arc::new(OnceLock::new());
        let task = runtime.spawn({
            let settled = Arc::clone(&settled);
            async move {
                let ready = AssertUnwindSafe(agent.install(&config))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        warn!(agent = agent.name(), "local agent install panicked");
                        false
                    });

                let terminal = if ready {
                    store.mark_installed(&config.agent_id);
                    AgentReadiness::Ready
                } else {
                    store.mark_uninstalled(&config.agent_id);
                    AgentReadiness::Disabled
                };
                if settled.set(terminal).is_err() {
                    warn!(agent_id = %config.agent_id, "local agent readiness already settled");
                }
                info!(agent = agent.name(), agent_id = %config.agent_id, readiness = %terminal, "local agent install settled");
                ready
            }
        });

        let registration = async move {
            task.await.unwrap_or_else(|error| {
                warn!(error = %error, "local agent install task did not complete");
                false
            })
        }
        .boxed()
        .shared();

        Self {
            initial,
            settled,
            registration,
        }
    }

    /// Readiness decided at construction.
    #[must_use]
    pub fn initial(&self) -> AgentReadiness {
        self.initial
    }

    /// Current readiness: the terminal state once settled, else the initial state.
    #[must_use]
    pub fn readiness(&self) -> AgentReadiness {
        self.settled.get().copied().unwrap_or(self.initial)
    }

    /// Waits for the install attempt. Every call observes the same outcome.
    pub async fn registration(&self) -> bool {
        self.registration.clone().await
    }
}
