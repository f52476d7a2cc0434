//! Target origin for outbound delivery.

use std::fmt;

use url::Url;

/// Origin a message may be delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOrigin {
    /// Deliver only if the frame is at this `scheme://host[:port]`.
    Exact(String),
    /// Deliver regardless of the frame's origin (`*`).
    Any,
}

impl TargetOrigin {
    /// Compute the origin for a widget URL.
    ///
    /// Only absolute `http`/`https` URLs with a host yield an exact origin;
    /// relative paths and other schemes fall back to [`TargetOrigin::Any`].
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        let Ok(parsed) = Url::parse(url) else {
            return Self::Any;
        };

        match (parsed.scheme(), parsed.host_str()) {
            (scheme @ ("http" | "https"), Some(host)) => {
                let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
                Self::Exact(format!("{scheme}://{host}{port}"))
            }
            _ => Self::Any,
        }
    }

    /// Whether delivery is unrestricted.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// String form passed to `postMessage`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(origin) => origin,
            Self::Any => "*",
        }
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls_keep_scheme_host_and_port() {
        assert_eq!(
            TargetOrigin::for_url("https://w.example.com/x?y=1#z"),
            TargetOrigin::Exact("https://w.example.com".to_string())
        );
        assert_eq!(
            TargetOrigin::for_url("http://localhost:8080/md/abc"),
            TargetOrigin::Exact("http://localhost:8080".to_string())
        );
        assert_eq!(
            TargetOrigin::for_url("HTTPS://W.Example.com/x").as_str(),
            "https://w.example.com"
        );
    }

    #[test]
    fn test_default_port_is_elided() {
        assert_eq!(
            TargetOrigin::for_url("https://w.example.com:443/x").as_str(),
            "https://w.example.com"
        );
    }

    #[test]
    fn test_non_http_urls_fall_back_to_wildcard() {
        for url in ["/relative/path", "", "widget.html", "ftp://files.example.com/x", "data:text/html,hi"] {
            let origin = TargetOrigin::for_url(url);
            assert!(origin.is_wildcard(), "{url}");
            assert_eq!(origin.to_string(), "*");
        }
    }
}
