//! Decides which attribute values need resolving against the fetch URL.

/// Whether `url` is a relative reference that must be resolved against the
/// fetch URL before it can be used from the host page.
///
/// Rules, first match wins:
/// - empty: not relative
/// - `//host/...` (protocol-relative): not relative
/// - contains `://` anywhere: absolute
/// - `#fragment` only: not relative
/// - everything else (`/x`, `./x`, `../x`, `x/y`, `?page=2`): relative
pub fn is_relative(url: &str) -> bool {
    if url.is_empty() || url.starts_with("//") || url.contains("://") || url.starts_with('#') {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_and_fragment_forms_are_not_relative() {
        for url in [
            "",
            "//cdn.example.com/a.js",
            "https://example.com/a.jpg",
            "http://example.com",
            "ftp://files.example.com/x",
            "/redirect?to=https://example.com",
            "#section",
            "#",
        ] {
            assert!(!is_relative(url), "{url:?} should not be relative");
        }
    }

    #[test]
    fn path_forms_are_relative() {
        for url in [
            "/about/staff",
            "./page.html",
            "../page.html",
            "images/x.jpg",
            "?page=2",
            "page.html#top",
            "/",
        ] {
            assert!(is_relative(url), "{url:?} should be relative");
        }
    }
}
