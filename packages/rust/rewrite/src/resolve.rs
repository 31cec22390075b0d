//! Fetch URL construction: a configured root plus a stored remote path.
//!
//! The remote path is always resolved against the root, never treated as an
//! absolute URL of its own. No `.`/`..` normalization happens here; that is
//! only done when rewriting references inside fetched markup.

use std::sync::LazyLock;

use regex::Regex;
use url::form_urlencoded;

/// Query keys that toggle editing in the embedding CMS. They are stripped from
/// passthrough parameters and never reach the remote origin.
pub const RESERVED_QUERY_KEYS: &[&str] = &["edit", "toolbar_on", "toolbar_off", "structure", "preview"];

/// Components of a URI reference. Absent components are `None`; an empty
/// path is `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UrlParts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

/// Split any string into URI components (RFC 3986, appendix B).
fn split_url(input: &str) -> UrlParts<'_> {
    static URI_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
            .expect("valid regex")
    });

    match URI_RE.captures(input) {
        Some(caps) => UrlParts {
            scheme: caps.get(1).map(|m| m.as_str()),
            authority: caps.get(2).map(|m| m.as_str()),
            path: caps.get(3).map_or("", |m| m.as_str()),
            query: caps.get(4).map(|m| m.as_str()),
            fragment: caps.get(5).map(|m| m.as_str()),
        },
        // Every string matches the pattern above; keep the whole input as a
        // path rather than panic if that ever changes.
        None => UrlParts {
            scheme: None,
            authority: None,
            path: input,
            query: None,
            fragment: None,
        },
    }
}

/// Build the absolute fetch URL for `remote_path` under `root`.
///
/// Scheme and authority come from `root`. The paths are joined with exactly
/// one `/`. Query and fragment come from `remote_path`; `passthrough` pairs
/// (from an inbound request) are appended after the path's own query with
/// [`RESERVED_QUERY_KEYS`] removed.
///
/// Never fails: malformed input degrades to best-effort concatenation.
pub fn resolve_fetch_url(
    root: &str,
    remote_path: &str,
    passthrough: Option<&[(String, String)]>,
) -> String {
    let root = split_url(root);
    let page = split_url(remote_path);

    let mut url = String::with_capacity(root.path.len() + remote_path.len() + 16);

    if let Some(scheme) = root.scheme {
        url.push_str(scheme);
        url.push(':');
    }
    if let Some(authority) = root.authority {
        url.push_str("//");
        url.push_str(authority);
    }

    let root_path = root.path.strip_suffix('/').unwrap_or(root.path);
    let page_path = page.path.strip_prefix('/').unwrap_or(page.path);
    url.push_str(root_path);
    url.push('/');
    url.push_str(page_path);

    let query = merge_query(page.query, passthrough);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    if let Some(fragment) = page.fragment.filter(|f| !f.is_empty()) {
        url.push('#');
        url.push_str(fragment);
    }

    url
}

/// Append filtered passthrough pairs after the path's own query.
fn merge_query(own: Option<&str>, passthrough: Option<&[(String, String)]>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(own) = own.filter(|q| !q.is_empty()) {
        parts.push(own.to_string());
    }

    if let Some(pairs) = passthrough {
        let extra = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().filter(|(key, _)| !is_reserved_key(key)))
            .finish();
        if !extra.is_empty() {
            parts.push(extra);
        }
    }

    parts.join("&")
}

/// Whether `key` is a CMS control parameter (exact, case-sensitive match).
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_QUERY_KEYS.contains(&key)
}
