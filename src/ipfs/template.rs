//! Gateway template substitution and candidate list construction.

use tracing::trace;

use super::{CID_PLACEHOLDER, IpfsInfo, PATH_PLACEHOLDER, parse_ipfs_info};

/// One candidate HTTP location for an IPFS URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Web2Info {
    /// The content identifier.
    pub cid: String,
    /// Path, query and fragment after the cid.
    pub path_to_resource: String,
    /// The template this candidate was filled from.
    pub gateway: String,
    /// The fully substituted HTTP(S) URL.
    pub url: String,
}

/// Substitutes `{cid}` and `{pathToResource}` in `template`.
///
/// Templates that omit `{pathToResource}` drop the path.
#[must_use]
pub fn fill_gateway_template(template: &str, info: &IpfsInfo) -> String {
    template
        .replace(CID_PLACEHOLDER, &info.cid)
        .replace(PATH_PLACEHOLDER, &info.path_to_resource)
}

/// Builds one candidate per gateway template, preserving template order.
///
/// Unrecognized input yields an empty list.
#[must_use]
pub fn ipfs_to_web2_info_list<S: AsRef<str>>(ipfs_url: &str, gateways: &[S]) -> Vec<Web2Info> {
    let Some(info) = parse_ipfs_info(ipfs_url) else {
        trace!(input = ipfs_url, "not an IPFS URL; no candidates");
        return Vec::new();
    };

    gateways
        .iter()
        .map(|gateway| {
            let gateway = gateway.as_ref();
            Web2Info {
                cid: info.cid.clone(),
                path_to_resource: info.path_to_resource.clone(),
                gateway: gateway.to_string(),
                url: fill_gateway_template(gateway, &info),
            }
        })
        .collect()
}
