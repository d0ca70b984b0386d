//! Proxy transforms and the ordered proxy chain.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use podhunter_settings::{ProxyEndpoint, ProxyStyle, default_proxies};

/// Characters escaped when a target URL is embedded in a query string.
///
/// Leaves the same unreserved marks untouched as `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Rewrites a target URL into a URL routed through one relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyTransform {
    /// `prefix` + percent-encoded target.
    Query {
        /// Relay label.
        name: String,
        /// Relay URL prefix.
        prefix: String,
    },
    /// `prefix` + raw target.
    Path {
        /// Relay label.
        name: String,
        /// Relay URL prefix.
        prefix: String,
    },
}

impl ProxyTransform {
    /// Build the proxied URL for `target`.
    pub fn apply(&self, target: &str) -> String {
        match self {
            Self::Query { prefix, .. } => {
                format!("{prefix}{}", utf8_percent_encode(target, COMPONENT))
            }
            Self::Path { prefix, .. } => format!("{prefix}{target}"),
        }
    }

    /// Relay label.
    pub fn name(&self) -> &str {
        match self {
            Self::Query { name, .. } | Self::Path { name, .. } => name,
        }
    }
}

impl From<&ProxyEndpoint> for ProxyTransform {
    fn from(endpoint: &ProxyEndpoint) -> Self {
        let name = endpoint.name.clone();
        let prefix = endpoint.prefix.clone();
        match endpoint.style {
            ProxyStyle::EncodedQuery => Self::Query { name, prefix },
            ProxyStyle::RawPath => Self::Path { name, prefix },
        }
    }
}

/// Ordered list of proxy transforms, most preferred first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyChain {
    transforms: Vec<ProxyTransform>,
}

impl ProxyChain {
    /// Chain from explicit transforms.
    pub fn new(transforms: Vec<ProxyTransform>) -> Self {
        Self { transforms }
    }

    /// Chain from configured endpoints, preserving order.
    pub fn from_endpoints(endpoints: &[ProxyEndpoint]) -> Self {
        Self::new(endpoints.iter().map(ProxyTransform::from).collect())
    }

    /// Transforms in order.
    pub fn iter(&self) -> impl Iterator<Item = &ProxyTransform> {
        self.transforms.iter()
    }

    /// Number of relays.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the chain has no relays.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for ProxyChain {
    fn default() -> Self {
        Self::from_endpoints(&default_proxies())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_transform_encodes_target() {
        let t = ProxyTransform::Query {
            name: "allorigins".into(),
            prefix: "https://api.allorigins.win/raw?url=".into(),
        };
        assert_eq!(
            t.apply("https://site.com/ep?id=1&x=a b"),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fsite.com%2Fep%3Fid%3D1%26x%3Da%20b"
        );
    }

    #[test]
    fn query_transform_keeps_unreserved_marks() {
        let t = ProxyTransform::Query {
            name: "q".into(),
            prefix: "p=".into(),
        };
        assert_eq!(t.apply("a-b_c.d~e*f'g(h)!"), "p=a-b_c.d~e*f'g(h)!");
    }

    #[test]
    fn path_transform_appends_raw_target() {
        let t = ProxyTransform::Path {
            name: "thingproxy".into(),
            prefix: "https://thingproxy.freeboard.io/fetch/".into(),
        };
        assert_eq!(
            t.apply("https://site.com/a?b=c"),
            "https://thingproxy.freeboard.io/fetch/https://site.com/a?b=c"
        );
    }

    #[test]
    fn default_chain_order_and_styles() {
        let chain = ProxyChain::default();
        let names: Vec<_> = chain.iter().map(ProxyTransform::name).collect();
        assert_eq!(names, ["allorigins", "corsproxy", "codetabs", "thingproxy"]);
        assert!(matches!(chain.iter().last(), Some(ProxyTransform::Path { .. })));
        assert_eq!(
            chain.iter().nth(1).unwrap().apply("https://a.b/"),
            "https://corsproxy.io/?https%3A%2F%2Fa.b%2F"
        );
    }
}
