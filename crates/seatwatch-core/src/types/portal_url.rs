//! Base URL type for the portal and the downstream service.

use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL.
///
/// Two instances configure the system: the SSO portal base and the
/// academic-service base. The type ensures the URL is absolute, uses HTTPS
/// (or HTTP for loopback hosts, used by tests), and is normalized for
/// endpoint construction.
///
/// # Example
///
/// ```
/// use seatwatch_core::PortalUrl;
///
/// let portal = PortalUrl::new("https://passport.ustc.edu.cn").unwrap();
/// assert_eq!(
///     portal.join("login"),
///     "https://passport.ustc.edu.cn/login"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortalUrl(Url);

impl PortalUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute, has no host, or uses a
    /// scheme other than HTTPS (HTTP is allowed for loopback hosts only).
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the endpoint URL for a path (which may carry a query).
    pub fn join(&self, path: &str) -> String {
        // Url renders a bare authority with a trailing slash
        format!(
            "{}/{}",
            self.0.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the origin (scheme, host, port) of this base.
    ///
    /// Landing-URL comparisons go through origins: the same host behind
    /// the portal means "still unauthenticated", anything else means the
    /// service accepted the ticket.
    pub fn origin(&self) -> url::Origin {
        self.0.origin()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let host = url.host_str().ok_or_else(|| InvalidInputError::BaseUrl {
            value: original.to_string(),
            reason: "must have a host".to_string(),
        })?;

        match url.scheme() {
            "https" => {}
            "http" => {
                let loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]");
                if !loopback {
                    return Err(InvalidInputError::BaseUrl {
                        value: original.to_string(),
                        reason: "http is only allowed for loopback hosts".to_string(),
                    }
                    .into());
                }
            }
            other => {
                return Err(InvalidInputError::BaseUrl {
                    value: original.to_string(),
                    reason: format!("unsupported scheme '{other}'"),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl fmt::Display for PortalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortalUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_trailing_slash() {
        let base = PortalUrl::new("https://passport.ustc.edu.cn").unwrap();
        assert_eq!(base.join("login"), "https://passport.ustc.edu.cn/login");
        assert_eq!(base.join("/login"), "https://passport.ustc.edu.cn/login");
    }

    #[test]
    fn join_preserves_query() {
        let base = PortalUrl::new("https://passport.ustc.edu.cn").unwrap();
        assert_eq!(
            base.join("validatecode.jsp?type=login"),
            "https://passport.ustc.edu.cn/validatecode.jsp?type=login"
        );
    }

    #[test]
    fn http_allowed_for_loopback_only() {
        assert!(PortalUrl::new("http://127.0.0.1:8080").is_ok());
        assert!(PortalUrl::new("http://localhost:8080").is_ok());
        assert!(PortalUrl::new("http://example.com").is_err());
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(PortalUrl::new("ftp://example.com").is_err());
        assert!(PortalUrl::new("not a url").is_err());
    }

    #[test]
    fn origins_distinguish_ports() {
        let a = PortalUrl::new("http://127.0.0.1:1234").unwrap();
        let b = PortalUrl::new("http://127.0.0.1:5678").unwrap();
        assert_ne!(a.origin(), b.origin());
    }
}
