#![allow(dead_code)]

pub mod holding_gateway;
pub mod socket_guard;

use wiremock::MockServer;

/// Gateway template served by `server` under `/{label}/ipfs/`.
#[must_use]
pub fn gateway_template(server: &MockServer, label: &str) -> String {
    format!("{}/{label}/ipfs/{{cid}}{{pathToResource}}", server.uri())
}

/// Local node gateway prefix served by `server`.
#[must_use]
pub fn local_prefix(server: &MockServer) -> String {
    format!("{}/ipfs/", server.uri())
}
