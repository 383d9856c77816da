use std::collections::HashMap;
use crate::grammar::{self, Parsed};

/// Path prefix the delivery network forwards under; origin storage keys have no prefix.
pub const DEFAULT_PREFIX: &str = "/blobs";

/// The viewer request as the edge sees it. Header names are lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeRequest {
    pub uri: String,
    pub headers: HashMap<String, String>,
}

/// What the rewrite did to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// The prefix did not match; nothing changed.
    Untouched,
    /// The prefix was stripped and the trailing segment left as it was.
    Stripped,
    /// The prefix was stripped, the trailing segment reduced to its base id and a
    /// range header set.
    Ranged { start: i64, end: i64 },
}

impl EdgeRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: HashMap::new(),
        }
    }
}

/// Rewrites a forwarded blob request in place.
///
/// `/blobs/acct/abc,0,999` becomes `/acct/abc` with `range: bytes=0-999`. A
/// trailing segment that is not a valid composite is kept verbatim; the storage
/// origin rejects keys it does not know.
pub fn rewrite(request: &mut EdgeRequest, prefix: &str) -> Rewrite {
    let (path, query) = match request.uri.find('?') {
        Some(i) => request.uri.split_at(i),
        None => (request.uri.as_str(), ""),
    };

    let rest = match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => return Rewrite::Untouched,
    };

    let (dir, segment) = match rest.rfind('/') {
        Some(i) => rest.split_at(i + 1),
        None => ("", rest),
    };

    let (new_path, outcome) = match grammar::parse(segment) {
        Parsed::Composite { base, start, end } => {
            (format!("{}{}", dir, base), Rewrite::Ranged { start, end })
        }
        Parsed::Simple | Parsed::Invalid => (rest.to_string(), Rewrite::Stripped),
    };

    request.uri = format!("{}{}", new_path, query);
    if let Rewrite::Ranged { start, end } = outcome {
        request
            .headers
            .insert("range".to_string(), format!("bytes={}-{}", start, end));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_is_rewritten_with_range() {
        let mut req = EdgeRequest::new("/blobs/acct-1/abc123,0,999");
        let outcome = rewrite(&mut req, DEFAULT_PREFIX);

        assert_eq!(outcome, Rewrite::Ranged { start: 0, end: 999 });
        assert_eq!(req.uri, "/acct-1/abc123");
        assert_eq!(req.headers.get("range").map(String::as_str), Some("bytes=0-999"));
    }

    #[test]
    fn test_simple_id_only_strips_prefix() {
        let mut req = EdgeRequest::new("/blobs/acct-1/abc123");
        assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Stripped);
        assert_eq!(req.uri, "/acct-1/abc123");
        assert!(req.headers.get("range").is_none());
    }

    #[test]
    fn test_invalid_composite_keeps_segment() {
        for segment in ["abc123,500,100", "abc123,-1,5", "a,b,c,d", "abc,x,9"] {
            let mut req = EdgeRequest::new(format!("/blobs/acct-1/{}", segment));
            assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Stripped);
            assert_eq!(req.uri, format!("/acct-1/{}", segment));
            assert!(req.headers.is_empty());
        }
    }

    #[test]
    fn test_unprefixed_uri_is_untouched() {
        let mut req = EdgeRequest::new("/other/acct-1/abc123,0,9");
        assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Untouched);
        assert_eq!(req.uri, "/other/acct-1/abc123,0,9");

        let mut req = EdgeRequest::new("/blobsy/acct-1/abc123,0,9");
        assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Untouched);
        assert_eq!(req.uri, "/blobsy/acct-1/abc123,0,9");
    }

    #[test]
    fn test_bare_prefix_becomes_root() {
        let mut req = EdgeRequest::new("/blobs");
        assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Stripped);
        assert_eq!(req.uri, "/");

        let mut req = EdgeRequest::new("/blobs?Expires=1");
        assert_eq!(rewrite(&mut req, DEFAULT_PREFIX), Rewrite::Stripped);
        assert_eq!(req.uri, "/?Expires=1");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_query_string_is_preserved() {
        let mut req = EdgeRequest::new("/blobs/acct-1/abc123,10,20?Expires=1&Key-Pair-Id=K");
        rewrite(&mut req, DEFAULT_PREFIX);
        assert_eq!(req.uri, "/acct-1/abc123?Expires=1&Key-Pair-Id=K");
        assert_eq!(req.headers["range"], "bytes=10-20");
    }

    #[test]
    fn test_existing_range_header_is_replaced() {
        let mut req = EdgeRequest::new("/blobs/acct-1/abc123,10,20");
        req.headers.insert("range".to_string(), "bytes=0-".to_string());
        rewrite(&mut req, DEFAULT_PREFIX);
        assert_eq!(req.headers["range"], "bytes=10-20");
    }
}
