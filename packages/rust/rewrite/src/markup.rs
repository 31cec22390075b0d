//! Rewrites resource and reference URLs in fetched markup so it can be
//! embedded in a page served from a different origin.

use ego_tree::NodeId;
use tracing::{debug, instrument};
use url::Url;

use crate::classify::is_relative;
use crate::dom::{DomNode, MarkupDocument};
use crate::policy::KeepRelativePolicy;
use crate::srcset::{has_relative_candidate, resolve_reference, rewrite_srcset};

/// Attribute that lets the host page load a resource without credentials.
pub const CROSS_ORIGIN_ATTR: &str = "crossorigin";
pub const CROSS_ORIGIN_VALUE: &str = "anonymous";

/// Attribute that sends rewritten links to a new browsing context.
pub const TARGET_ATTR: &str = "target";
pub const TARGET_VALUE: &str = "_blank";

/// Counters reported after a rewrite, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub src: usize,
    pub srcset: usize,
    pub href: usize,
    pub kept_relative: usize,
}

/// Rewrite `src`, `srcset` and `href` attributes against `base_url`.
///
/// Returns `None` only when `html` is empty or whitespace, so "no content"
/// propagates instead of becoming empty markup. Malformed markup is never an
/// error; the parser recovers and the repaired tree is serialized.
pub fn rewrite_markup(html: &str, base_url: &Url, policy: &KeepRelativePolicy) -> Option<String> {
    rewrite_markup_with_stats(html, base_url, policy).map(|(markup, _)| markup)
}

/// [`rewrite_markup`], also returning what was changed.
#[instrument(skip_all, fields(base = %base_url, len = html.len()))]
pub fn rewrite_markup_with_stats(
    html: &str,
    base_url: &Url,
    policy: &KeepRelativePolicy,
) -> Option<(String, RewriteStats)> {
    if html.trim().is_empty() {
        return None;
    }

    let mut doc = MarkupDocument::parse(html);
    let exempt = policy.exemptions(&doc.root());
    // Writes are collected first and applied after the walk.
    let mut writes: Vec<(NodeId, &'static str, String)> = Vec::new();
    let mut stats = RewriteStats::default();

    for node in doc.elements() {
        let id = node.id();
        let keep = exempt.contains(&id);

        if let Some(src) = node.attr("src").filter(|v| is_relative(v)) {
            if keep {
                stats.kept_relative += 1;
            } else {
                writes.push((id, "src", resolve_reference(base_url, src)));
                writes.push((id, CROSS_ORIGIN_ATTR, CROSS_ORIGIN_VALUE.into()));
                stats.src += 1;
            }
        }

        // Independent of `src`: either attribute may be relative without the other.
        if let Some(srcset) = node.attr("srcset") {
            if keep {
                if has_relative_candidate(srcset) {
                    stats.kept_relative += 1;
                }
            } else if let Some(rewritten) = rewrite_srcset(srcset, base_url) {
                if rewritten != srcset {
                    writes.push((id, "srcset", rewritten));
                    stats.srcset += 1;
                }
            }
        }

        if let Some(href) = node.attr("href").filter(|v| is_relative(v)) {
            if keep {
                stats.kept_relative += 1;
            } else {
                writes.push((id, "href", resolve_reference(base_url, href)));
                writes.push((id, CROSS_ORIGIN_ATTR, CROSS_ORIGIN_VALUE.into()));
                writes.push((id, TARGET_ATTR, TARGET_VALUE.into()));
                stats.href += 1;
            }
        }
    }

    debug!(
        src = stats.src,
        srcset = stats.srcset,
        href = stats.href,
        kept_relative = stats.kept_relative,
        "markup rewrite complete"
    );

    for (id, name, value) in &writes {
        doc.set_attr(*id, name, value);
    }

    Some((doc.into_html(), stats))
}
