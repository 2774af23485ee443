//! Error types for racing gateway requests.

use std::time::Duration;

use thiserror::Error;

/// Failure classification for a race that produced no winner.
///
/// Individual candidate failures (non-200 status, network errors) are never
/// surfaced; they only remove that candidate from consideration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// The configured timeout elapsed before any candidate answered 200.
    #[error("gateway race timed out after {timeout:?} across {candidates} candidate(s)")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
        /// Number of candidates that were raced.
        candidates: usize,
    },

    /// The external cancel signal fired before any candidate answered 200.
    #[error("gateway race cancelled across {candidates} candidate(s)")]
    Cancelled {
        /// Number of candidates that were raced.
        candidates: usize,
    },
}

impl RaceError {
    /// Returns true for [`RaceError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for [`RaceError::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors constructing the shared gateway HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// reqwest rejected the builder configuration.
    #[error("HTTP client construction failed: {0}")]
    Build(#[from] reqwest::Error),

    /// Building panicked twice (system proxy lookup, then env-proxy fallback).
    #[error(
        "HTTP client construction panicked while initializing gateway networking\n  Suggestion: Set HTTPS_PROXY/HTTP_PROXY explicitly or unset broken proxy settings"
    )]
    Panicked,
}
