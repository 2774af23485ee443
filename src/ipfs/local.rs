//! Forward and inverse templating for the local agent prefix.
//!
//! The forward direction fills `{prefix}{cid}{pathToResource}`; the inverse
//! strips the prefix and splits the remainder at the first non-alphanumeric
//! character. Both must stay in lock-step with [`super::parse_ipfs_info`].

use url::Url;

use super::{CID_PLACEHOLDER, IpfsInfo, PATH_PLACEHOLDER};

/// Builds the gateway template served by the local agent under `prefix`.
#[must_use]
pub fn local_gateway_template(prefix: &str) -> String {
    format!("{prefix}{CID_PLACEHOLDER}{PATH_PLACEHOLDER}")
}

/// Converts a URL produced from the local gateway `prefix` back into an IPFS URL.
///
/// Accepts the URL exactly as produced by [`local_gateway_template`]. When the
/// prefix is a bare path (e.g. `/ipfs-gw/`), absolute URLs whose path starts
/// with the prefix are accepted too.
///
/// Returns `None` when the URL does not carry the prefix or no cid follows it.
#[must_use]
pub fn local_gateway_url_to_ipfs_url(prefix: &str, url: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }

    let remainder = match url.strip_prefix(prefix) {
        Some(remainder) => remainder.to_string(),
        None => strip_path_prefix(prefix, url)?,
    };

    let cid_len = remainder
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(remainder.len());
    if cid_len == 0 {
        return None;
    }

    let (cid, path) = remainder.split_at(cid_len);
    if !(path.is_empty() || path.starts_with(['/', '?', '#'])) {
        return None;
    }

    Some(IpfsInfo::new(cid, path).to_ipfs_url())
}

fn strip_path_prefix(prefix: &str, url: &str) -> Option<String> {
    if !prefix.starts_with('/') {
        return None;
    }

    let parsed = Url::parse(url).ok()?;
    let mut tail = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        tail.push('?');
        tail.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        tail.push('#');
        tail.push_str(fragment);
    }

    tail.strip_prefix(prefix).map(str::to_string)
}
