//! IPFS URL resolution in front of the gateway race.
//!
//! # Architecture
//!
//! - [`GatewayResolver`] - local agent fast path, fastest gateway, deterministic fallback
//! - [`GatewayConfig`] - prepared gateway list and local agent settings
//! - [`ContextHost`] / [`NavigationContext`] - open-then-navigate presentation seam
//!
//! # Resolution order
//!
//! ```text
//! input ─ not ipfs:// ──────────────────────────────> None
//!       ─ local agent ready ────────────────────────> {prefix}{cid}{path}
//!       ─ HEAD race over gateways ─ 200 ────────────> winner's final URL
//!                                 └ timeout/cancel ─> gateways[0] substitution
//! ```

mod config;
mod open;
mod resolver;

pub use config::{GatewayConfig, GatewayOptions, LocalAgentConfig, LocalAgentSetting};
pub use open::{ContextHost, NavigationContext};
pub use resolver::{GatewayResolver, GatewayResolverBuilder};
