//! Outbound header sanitization.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::warn;

/// Keeps visible ASCII, space and horizontal tab; trims the result.
#[must_use]
pub fn sanitize_header_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c == '\t' || (' '..='~').contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Builds a header map from caller headers.
///
/// Values are sanitized first. Headers whose value ends up empty, or whose
/// name is not a valid token, are left out. `User-Agent` is never taken from
/// the caller.
pub fn build_header_map<'a>(
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> HeaderMap {
    let mut map = HeaderMap::new();

    for (name, value) in headers {
        let Ok(header_name) = HeaderName::from_bytes(name.trim().as_bytes()) else {
            warn!(header = %name, "Skipping header with invalid name");
            continue;
        };

        if header_name == USER_AGENT {
            continue;
        }

        let clean = sanitize_header_value(value);
        if clean.is_empty() {
            warn!(header = %header_name, "Skipping header with empty value after sanitizing");
            continue;
        }

        match HeaderValue::from_str(&clean) {
            Ok(header_value) => {
                map.insert(header_name, header_value);
            }
            Err(e) => warn!(header = %header_name, error = %e, "Skipping invalid header value"),
        }
    }

    map
}

/// Sanitizes a cookie name or value for the `Cookie` header.
#[must_use]
pub fn sanitize_cookie_part(raw: &str) -> String {
    sanitize_header_value(raw)
        .chars()
        .filter(|c| !matches!(c, ';' | ',' | '\t'))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_strips_non_ascii() {
        assert_eq!(sanitize_header_value("café au lait"), "caf au lait");
        assert_eq!(sanitize_header_value("a\r\nb"), "ab");
        assert_eq!(sanitize_header_value("  padded  "), "padded");
    }

    #[test]
    fn test_empty_after_sanitizing_is_omitted() {
        let headers = HashMap::from([
            ("X-Title".to_string(), "日本語".to_string()),
            ("Accept".to_string(), "text/html".to_string()),
        ]);

        let map = build_header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn test_user_agent_is_not_overridden() {
        let headers = HashMap::from([("user-agent".to_string(), "curl/8".to_string())]);
        assert!(build_header_map(&headers).is_empty());
    }

    #[test]
    fn test_invalid_name_is_skipped() {
        let headers = HashMap::from([("bad header".to_string(), "x".to_string())]);
        assert!(build_header_map(&headers).is_empty());
    }

    #[test]
    fn test_cookie_part() {
        assert_eq!(sanitize_cookie_part("a;b,c"), "abc");
    }
}
