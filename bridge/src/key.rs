//! Metric name prefixes scoped to a virtual host and a backend.
//!
//! Collector namespaces are dot separated, so dots inside identifiers are
//! replaced to keep every identifier in a single segment.

/// Builds `"{virtual_host}.{backend}"` from sanitized identifiers.
///
/// An empty virtual host id yields a prefix starting with an empty segment.
pub fn derive_prefix(virtual_host_id: &str, backend_id: &str) -> String {
    format!(
        "{}.{}",
        sanitize_virtual_host_id(virtual_host_id),
        sanitize_backend_id(backend_id)
    )
}

pub fn sanitize_virtual_host_id(virtual_host_id: &str) -> String {
    virtual_host_id.replace('.', "_")
}

/// Strips a leading `scheme://` and replaces `.` and `:` with `_`.
pub fn sanitize_backend_id(backend_id: &str) -> String {
    strip_scheme(backend_id).replace(['.', ':'], "_")
}

fn strip_scheme(id: &str) -> &str {
    match id.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        _ => id,
    }
}

fn is_scheme(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ids_are_joined() {
        for (vh, backend) in [("vh1", "b1"), ("www_example_com", "backend-01"), ("a", "")] {
            assert_eq!(derive_prefix(vh, backend), format!("{vh}.{backend}"));
        }
    }

    #[test]
    fn test_backend_scheme_is_stripped() {
        assert_eq!(sanitize_backend_id("http://10.0.0.1:8080"), "10_0_0_1_8080");
        assert_eq!(sanitize_backend_id("https://10.0.0.1:8443"), "10_0_0_1_8443");
        assert_eq!(sanitize_backend_id("10.0.0.1:8080"), "10_0_0_1_8080");
    }

    #[test]
    fn test_only_leading_scheme_is_stripped() {
        // Not a scheme: starts with a digit.
        assert_eq!(sanitize_backend_id("1http://x"), "1http_//x");
        assert_eq!(sanitize_backend_id("http://a/http://b"), "a/http_//b");
    }

    #[test]
    fn test_virtual_host_dots_replaced() {
        assert_eq!(
            derive_prefix("www.example.com", "http://10.0.0.1:8080"),
            "www_example_com.10_0_0_1_8080"
        );
        // Colons are only rewritten in the backend segment.
        assert_eq!(derive_prefix("vh:1", "b1"), "vh:1.b1");
    }

    #[test]
    fn test_empty_virtual_host() {
        assert_eq!(derive_prefix("", "http://10.0.0.1:80"), ".10_0_0_1_80");
    }
}
