//! Concurrent first-success race across candidate gateway URLs.

use std::collections::HashMap;
use std::future::pending;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, instrument, trace};

use super::{CancelSignal, ClientBuildError, HttpTimeouts, RaceError, build_gateway_http_client};
use crate::ipfs::ipfs_to_web2_info_list;

/// Per-call race options.
///
/// No timeout is applied unless one is set: a race without a timeout and
/// without a cancel signal waits until some candidate answers 200, which may
/// be never.
#[derive(Debug, Clone)]
pub struct RaceOptions {
    /// HTTP method sent to every candidate.
    pub method: Method,
    /// Headers sent to every candidate.
    pub headers: HeaderMap,
    /// Optional request body, cloned per candidate.
    pub body: Option<Vec<u8>>,
    /// Optional deadline for the whole race.
    pub timeout: Option<Duration>,
    /// Optional external cancellation signal.
    pub cancel: Option<CancelSignal>,
}

impl Default for RaceOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            cancel: None,
        }
    }
}

impl RaceOptions {
    /// Options for a HEAD race with no timeout.
    #[must_use]
    pub fn head() -> Self {
        Self {
            method: Method::HEAD,
            ..Self::default()
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the race deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches an external cancellation signal.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Abort handles of the in-flight candidate requests of one race.
///
/// [`LiveRequests::finalize`] is the single cleanup path for every exit
/// (win, timeout, cancel, caller dropping the race future).
#[derive(Debug, Default)]
pub(crate) struct LiveRequests {
    handles: HashMap<usize, AbortHandle>,
    finalized: bool,
}

impl LiveRequests {
    fn track(&mut self, index: usize, handle: AbortHandle) {
        self.handles.insert(index, handle);
    }

    /// Removes a handle so finalization does not abort it.
    fn release(&mut self, index: usize) -> bool {
        self.handles.remove(&index).is_some()
    }

    /// Aborts every still-tracked request. Returns how many were aborted;
    /// zero on every call after the first.
    pub(crate) fn finalize(&mut self) -> usize {
        if self.finalized {
            return 0;
        }
        self.finalized = true;

        let aborted = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        aborted
    }
}

impl Drop for LiveRequests {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Races HTTP requests across candidate URLs and settles on the first 200.
///
/// The fetcher holds only a pooled HTTP client; every race owns its own set
/// of in-flight requests.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ipfs_gateway::fetch::{RaceFetcher, RaceOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = RaceFetcher::new()?;
/// let candidates = ["https://ipfs.io/ipfs/QmHash", "https://dweb.link/ipfs/QmHash"];
/// let response = fetcher
///     .race(&candidates, RaceOptions::head().with_timeout(Duration::from_secs(5)))
///     .await?;
/// println!("fastest: {}", response.url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RaceFetcher {
    client: Client,
}

impl RaceFetcher {
    /// Creates a fetcher with the default per-request HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::with_timeouts(HttpTimeouts::default())
    }

    /// Creates a fetcher with explicit per-request HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be built.
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_gateway_http_client(timeouts)?,
        })
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Issues one request per candidate concurrently and returns the first
    /// response with status exactly 200.
    ///
    /// Non-200 responses and network errors are ignored. Once a winner is
    /// found every other in-flight request is aborted.
    ///
    /// An empty candidate list with neither timeout nor cancel signal never
    /// settles.
    ///
    /// # Errors
    ///
    /// - [`RaceError::Timeout`] when `options.timeout` elapses first
    /// - [`RaceError::Cancelled`] when `options.cancel` fires first
    #[instrument(skip(self, candidates, options), fields(candidates = candidates.len(), method = %options.method))]
    pub async fn race<S: AsRef<str>>(
        &self,
        candidates: &[S],
        options: RaceOptions,
    ) -> Result<Response, RaceError> {
        let candidate_count = candidates.len();
        let RaceOptions {
            method,
            headers,
            body,
            timeout,
            cancel,
        } = options;

        if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            debug!("race cancelled before any request was issued");
            return Err(RaceError::Cancelled {
                candidates: candidate_count,
            });
        }

        let (winner_tx, mut winner_rx) = mpsc::unbounded_channel::<(usize, Response)>();
        let mut live = LiveRequests::default();

        for (index, candidate) in candidates.iter().enumerate() {
            let url = candidate.as_ref().to_string();
            let mut request = self
                .client
                .request(method.clone(), url.as_str())
                .headers(headers.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            let winner_tx = winner_tx.clone();
            let task = tokio::spawn(async move {
                match request.send().await {
                    Ok(response) if response.status() == StatusCode::OK => {
                        let _ = winner_tx.send((index, response));
                    }
                    Ok(response) => trace!(
                        url = %url,
                        status = response.status().as_u16(),
                        "candidate answered without success"
                    ),
                    Err(error) => trace!(url = %url, error = %error, "candidate request failed"),
                }
            });
            live.track(index, task.abort_handle());
        }

        // A held sender keeps `recv` pending after every candidate has failed.
        let _keep_open = winner_tx;

        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => pending::<()>().await,
            }
        };
        let cancelled = async move {
            match cancel {
                Some(mut signal) => signal.cancelled().await,
                None => pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            Some((index, response)) = winner_rx.recv() => {
                live.release(index);
                debug!(winner = index, url = %response.url(), "gateway race won");
                Ok(response)
            }
            () = deadline => Err(RaceError::Timeout {
                timeout: timeout.unwrap_or_default(),
                candidates: candidate_count,
            }),
            () = cancelled => Err(RaceError::Cancelled {
                candidates: candidate_count,
            }),
        };

        let aborted = live.finalize();
        debug!(aborted, success = outcome.is_ok(), "gateway race finalized");
        outcome
    }

    /// Builds candidates for `ipfs_url` from `gateways` and races them.
    ///
    /// Unrecognized input produces no candidates, so the outcome is decided
    /// by the timeout or cancel signal alone.
    ///
    /// # Errors
    ///
    /// Same as [`RaceFetcher::race`].
    #[instrument(skip(self, gateways, options), fields(gateways = gateways.len()))]
    pub async fn fetch_ipfs<S: AsRef<str>>(
        &self,
        ipfs_url: &str,
        gateways: &[S],
        options: RaceOptions,
    ) -> Result<Response, RaceError> {
        let candidates: Vec<String> = ipfs_to_web2_info_list(ipfs_url, gateways)
            .into_iter()
            .map(|info| info.url)
            .collect();
        self.race(&candidates, options).await
    }
}
