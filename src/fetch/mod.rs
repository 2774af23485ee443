//! Racing HTTP fetches across IPFS gateways.
//!
//! # Architecture
//!
//! - [`RaceFetcher`] - issues one request per candidate and settles on the first 200
//! - [`RaceOptions`] - method/headers/body passthrough plus optional timeout and cancel signal
//! - [`RaceError`] - `Timeout` or `Cancelled`; candidate failures are never surfaced
//! - [`cancel_pair`] - external cancellation handle/signal
//! - [`build_gateway_http_client`] - shared client construction policy

mod cancel;
mod error;
mod http_client;
mod race;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use error::{ClientBuildError, RaceError};
pub use http_client::{HttpTimeouts, build_gateway_http_client};
pub use race::{RaceFetcher, RaceOptions};
