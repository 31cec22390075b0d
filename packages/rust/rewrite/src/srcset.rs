//! `srcset` rewriting and single-reference resolution.

use tracing::debug;
use url::Url;

use crate::classify::is_relative;

/// Resolve `reference` against `base` with standard relative-reference rules
/// (`.`/`..` collapsing, same-directory and parent-directory semantics).
///
/// A reference the `url` crate refuses to join is returned unchanged.
pub fn resolve_reference(base: &Url, reference: &str) -> String {
    match base.join(reference) {
        Ok(resolved) => resolved.into(),
        Err(e) => {
            debug!(%base, reference, error = %e, "could not resolve reference, leaving as-is");
            reference.to_string()
        }
    }
}

/// Rewrite every relative candidate URL in a `srcset` value.
///
/// Entries are split on `,`, trimmed, and empty entries dropped. Each entry is
/// a URL optionally followed by a descriptor (`576w`, `2x`); only the URL is
/// touched, and only when [`is_relative`] says so. Entries are rejoined with
/// `", "`.
///
/// Returns `None` when the value holds no entries at all.
pub fn rewrite_srcset(value: &str, base: &Url) -> Option<String> {
    let entries: Vec<String> = candidates(value)
        .map(|(url, descriptor)| rewrite_candidate(url, descriptor, base))
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}

/// Whether any candidate URL in a `srcset` value is relative.
pub fn has_relative_candidate(value: &str) -> bool {
    candidates(value).any(|(url, _)| is_relative(url))
}

/// Non-empty `(url, descriptor)` pairs of a `srcset` value.
fn candidates(value: &str) -> impl Iterator<Item = (&str, &str)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(char::is_whitespace) {
            Some((url, descriptor)) => (url, descriptor.trim()),
            None => (entry, ""),
        })
}

fn rewrite_candidate(url: &str, descriptor: &str, base: &Url) -> String {
    let url = if is_relative(url) {
        resolve_reference(base, url)
    } else {
        url.to_string()
    };

    if descriptor.is_empty() {
        url
    } else {
        format!("{url} {descriptor}")
    }
}
