//! URL rewriting engine for embedding remote markup in a host page.
//!
//! This crate provides:
//! - [`resolve`] — builds the fetch URL from a root and a remote path
//! - [`classify`] — decides which URLs are relative
//! - [`policy`] — the keep-relative exemption policy
//! - [`srcset`] — `srcset` rewriting and single-reference resolution
//! - [`markup`] — rewrites every `src`/`srcset`/`href` in a document
//! - [`dom`] — the node abstraction the policy is evaluated against

pub mod classify;
pub mod dom;
pub mod markup;
pub mod policy;
pub mod resolve;
pub mod srcset;

pub use classify::is_relative;
pub use dom::{DomNode, MarkupDocument, ScraperNode};
pub use markup::{RewriteStats, rewrite_markup, rewrite_markup_with_stats};
pub use policy::{Exemptions, KeepRelativePolicy, RelativeSelector};
pub use resolve::{RESERVED_QUERY_KEYS, is_reserved_key, resolve_fetch_url};
pub use srcset::{has_relative_candidate, resolve_reference, rewrite_srcset};
