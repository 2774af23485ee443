//! IPFS URL recognition and gateway template substitution.
//!
//! This module turns an `ipfs://<cid><pathToResource>` URL into concrete
//! HTTP(S) candidate URLs by filling gateway templates, and provides the
//! inverse parse for URLs produced from a local gateway prefix.
//!
//! # Template syntax
//!
//! Templates use two placeholders:
//! - `{cid}` - the content identifier
//! - `{pathToResource}` - everything after the cid (path, query, fragment),
//!   possibly empty
//!
//! # Example
//!
//! ```
//! use ipfs_gateway::ipfs::{fill_gateway_template, parse_ipfs_info};
//!
//! let info = parse_ipfs_info("ipfs://QmHash/image.png").unwrap();
//! let url = fill_gateway_template("https://ipfs.io/ipfs/{cid}{pathToResource}", &info);
//! assert_eq!(url, "https://ipfs.io/ipfs/QmHash/image.png");
//! ```

mod local;
mod template;

pub use local::{local_gateway_template, local_gateway_url_to_ipfs_url};
pub use template::{Web2Info, fill_gateway_template, ipfs_to_web2_info_list};

use std::sync::LazyLock;

use regex::Regex;

/// Scheme prefix every IPFS URL starts with.
pub const IPFS_SCHEME_PREFIX: &str = "ipfs://";

/// Placeholder replaced by the content identifier.
pub const CID_PLACEHOLDER: &str = "{cid}";

/// Placeholder replaced by the path, query and fragment following the cid.
pub const PATH_PLACEHOLDER: &str = "{pathToResource}";

/// Public gateways raced when no gateway list is configured.
///
/// Index 0 doubles as the fallback-of-last-resort.
pub const DEFAULT_IPFS_GATEWAYS: [&str; 6] = [
    "https://ipfs.4everland.xyz/ipfs/{cid}{pathToResource}",
    "https://ipfs.io/ipfs/{cid}{pathToResource}",
    "https://dweb.link/ipfs/{cid}{pathToResource}",
    "https://gateway.pinata.cloud/ipfs/{cid}{pathToResource}",
    "https://cloudflare-ipfs.com/ipfs/{cid}{pathToResource}",
    "https://w3s.link/ipfs/{cid}{pathToResource}",
];

/// Default prefix under which the local agent answers IPFS requests.
///
/// This is the path gateway of a local IPFS node on its standard port.
pub const DEFAULT_GATEWAY_PREFIX: &str = "http://127.0.0.1:8080/ipfs/";

/// Default identifier for the local agent in the install store.
pub const DEFAULT_AGENT_ID: &str = "ipfs-gateway-local-node";

#[allow(clippy::expect_used)]
static IPFS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ipfs://(?P<cid>[A-Za-z0-9]+)(?P<path>[/?#].*)?$")
        .expect("IPFS URL regex is valid") // Static pattern, safe to panic
});

/// Content identifier and trailing resource path parsed from an IPFS URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpfsInfo {
    /// The content identifier (e.g. `QmHash` or `bafy...`).
    pub cid: String,
    /// Path, query and fragment after the cid. Empty, or starts with `/`, `?` or `#`.
    pub path_to_resource: String,
}

impl IpfsInfo {
    /// Creates info from its parts.
    #[must_use]
    pub fn new(cid: impl Into<String>, path_to_resource: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            path_to_resource: path_to_resource.into(),
        }
    }

    /// Formats the info back into its canonical `ipfs://` form.
    #[must_use]
    pub fn to_ipfs_url(&self) -> String {
        format!("{IPFS_SCHEME_PREFIX}{}{}", self.cid, self.path_to_resource)
    }
}

/// Returns true if `input` is an `ipfs://` URL with a non-empty cid.
#[must_use]
pub fn is_ipfs_url(input: &str) -> bool {
    IPFS_URL_PATTERN.is_match(input)
}

/// Parses an IPFS URL into its cid and path.
///
/// Returns `None` when the input is not recognized by [`is_ipfs_url`].
#[must_use]
pub fn parse_ipfs_info(input: &str) -> Option<IpfsInfo> {
    let captures = IPFS_URL_PATTERN.captures(input)?;
    let cid = captures.name("cid")?.as_str();
    let path = captures.name("path").map_or("", |m| m.as_str());
    Some(IpfsInfo::new(cid, path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ipfs_url_accepts_bare_cid() {
        assert!(is_ipfs_url("ipfs://Qm123"));
        assert!(is_ipfs_url(
            "ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"
        ));
    }

    #[test]
    fn test_is_ipfs_url_accepts_path_query_fragment() {
        assert!(is_ipfs_url("ipfs://Qm123/dir/file.png"));
        assert!(is_ipfs_url("ipfs://Qm123?filename=a.png"));
        assert!(is_ipfs_url("ipfs://Qm123#section"));
    }

    #[test]
    fn test_is_ipfs_url_rejects_other_inputs() {
        assert!(!is_ipfs_url("https://example.com/x"));
        assert!(!is_ipfs_url("ipfs://"));
        assert!(!is_ipfs_url("ipfs:/Qm123"));
        assert!(!is_ipfs_url("Qm123"));
        assert!(!is_ipfs_url(" ipfs://Qm123"));
        assert!(!is_ipfs_url("ipfs://Qm-123"));
    }

    #[test]
    fn test_parse_ipfs_info_splits_cid_and_path() {
        let info = parse_ipfs_info("ipfs://Qm123/dir/file.png?x=1").unwrap();
        assert_eq!(info.cid, "Qm123");
        assert_eq!(info.path_to_resource, "/dir/file.png?x=1");
    }

    #[test]
    fn test_parse_ipfs_info_empty_path() {
        let info = parse_ipfs_info("ipfs://Qm123").unwrap();
        assert_eq!(info.cid, "Qm123");
        assert!(info.path_to_resource.is_empty());
    }

    #[test]
    fn test_parse_ipfs_info_rejects_web2_url() {
        assert!(parse_ipfs_info("https://ipfs.io/ipfs/Qm123").is_none());
    }

    #[test]
    fn test_ipfs_info_to_ipfs_url_roundtrip() {
        for input in ["ipfs://Qm123", "ipfs://Qm123/a/b.json", "ipfs://Qm123#frag"] {
            assert_eq!(parse_ipfs_info(input).unwrap().to_ipfs_url(), input);
        }
    }

    #[test]
    fn test_default_gateways_carry_both_placeholders() {
        for gateway in DEFAULT_IPFS_GATEWAYS {
            assert!(gateway.contains(CID_PLACEHOLDER), "{gateway}");
            assert!(gateway.contains(PATH_PLACEHOLDER), "{gateway}");
        }
    }
}
