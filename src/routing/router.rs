//! Domain extraction from the request path.
//!
//! `/{domain}/{rest...}` maps to `https://{domain}/{rest...}`.

use crate::error::ProxyError;

/// Upstream target decoded from an inbound request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Upstream host, taken verbatim from the first path segment.
    pub domain: String,
    /// Path forwarded upstream. Always starts with `/`.
    pub remaining_path: String,
}

impl ProxyTarget {
    /// Path and query for the outbound request.
    pub fn path_and_query(&self, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("{}?{}", self.remaining_path, q),
            None => self.remaining_path.clone(),
        }
    }
}

/// Split a raw request path into target domain and remaining path.
///
/// Fails with [`ProxyError::InvalidPath`] when the first segment is empty
/// (`""`, `"/"`, `"//host"`).
pub fn route_path(raw_path: &str) -> Result<ProxyTarget, ProxyError> {
    let trimmed = raw_path.strip_prefix('/').unwrap_or(raw_path);
    let mut segments = trimmed.split('/');

    let domain = match segments.next() {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ProxyError::InvalidPath(raw_path.to_string())),
    };

    let rest: Vec<&str> = segments.collect();
    Ok(ProxyTarget {
        domain: domain.to_string(),
        remaining_path: format!("/{}", rest.join("/")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_and_path() {
        let target = route_path("/example.com/about/team").unwrap();
        assert_eq!(target.domain, "example.com");
        assert_eq!(target.remaining_path, "/about/team");
    }

    #[test]
    fn test_domain_only() {
        let target = route_path("/example.com").unwrap();
        assert_eq!(target.domain, "example.com");
        assert_eq!(target.remaining_path, "/");
    }

    #[test]
    fn test_trailing_slashes_preserved() {
        assert_eq!(route_path("/example.com/").unwrap().remaining_path, "/");
        assert_eq!(route_path("/example.com/docs/").unwrap().remaining_path, "/docs/");
        assert_eq!(route_path("/example.com/a//b").unwrap().remaining_path, "/a//b");
    }

    #[test]
    fn test_empty_paths_rejected() {
        for raw in ["", "/", "//cdn.example.com/lib.js"] {
            assert!(
                matches!(route_path(raw), Err(ProxyError::InvalidPath(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_domain_passed_through_verbatim() {
        let target = route_path("/localhost:8443/%7Euser").unwrap();
        assert_eq!(target.domain, "localhost:8443");
        assert_eq!(target.remaining_path, "/%7Euser");
    }

    #[test]
    fn test_path_and_query() {
        let target = route_path("/example.com/search").unwrap();
        assert_eq!(target.path_and_query(Some("q=rust&page=2")), "/search?q=rust&page=2");
        assert_eq!(target.path_and_query(None), "/search");
    }
}
