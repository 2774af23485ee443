//! Shared User-Agent string for gateway and local node requests.

/// Product comment identifying the request purpose to gateway operators.
const UA_COMMENT: &str = "gateway-resolver";

/// Default User-Agent for every request the crate issues.
#[must_use]
pub(crate) fn default_gateway_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ipfs-gateway/{version} ({UA_COMMENT})")
}
