//! Keep-relative policy: which elements keep their URLs untouched.

use std::collections::HashSet;

use remotecontent_shared::RelativePathSetting;
use scraper::Selector;
use tracing::warn;

use crate::dom::DomNode;

/// A `use_relative_paths` setting compiled once at configuration load.
#[derive(Debug, Clone)]
pub enum KeepRelativePolicy {
    /// `true` keeps every URL relative, `false` rewrites every URL.
    Always(bool),
    /// Elements matched by any selector keep their URLs relative.
    Selectors(Vec<RelativeSelector>),
}

/// A parsed selector alongside the string it came from.
#[derive(Debug, Clone)]
pub struct RelativeSelector {
    pub source: String,
    pub selector: Selector,
}

impl Default for KeepRelativePolicy {
    fn default() -> Self {
        Self::Always(false)
    }
}

impl KeepRelativePolicy {
    /// Compile a configuration value. Selectors that fail to parse are
    /// dropped with a warning; they could never match anything.
    pub fn compile(setting: &RelativePathSetting) -> Self {
        match setting {
            RelativePathSetting::Flag(flag) => Self::Always(*flag),
            RelativePathSetting::Selectors(sources) => Self::Selectors(
                sources
                    .iter()
                    .filter_map(|source| match Selector::parse(source) {
                        Ok(selector) => Some(RelativeSelector {
                            source: source.clone(),
                            selector,
                        }),
                        Err(e) => {
                            warn!(selector = %source, error = %e, "ignoring invalid keep-relative selector");
                            None
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Whether `node` is exempt from rewriting.
    ///
    /// Selectors are evaluated over the whole document, starting from the
    /// node's top-level root; the node is exempt if any selector's match set
    /// contains it.
    pub fn should_keep_relative<N: DomNode>(&self, node: &N) -> bool {
        match self {
            Self::Always(flag) => *flag,
            Self::Selectors(selectors) => {
                let root = node.root();
                let id = node.id();
                selectors
                    .iter()
                    .any(|rule| root.select(&rule.selector).contains(&id))
            }
        }
    }

    /// Evaluate the policy for a whole document at once.
    pub fn exemptions<N: DomNode>(&self, root: &N) -> Exemptions<N::Id> {
        match self {
            Self::Always(true) => Exemptions::All,
            Self::Always(false) => Exemptions::Nodes(HashSet::new()),
            Self::Selectors(selectors) => Exemptions::Nodes(
                selectors
                    .iter()
                    .flat_map(|rule| root.root().select(&rule.selector))
                    .collect(),
            ),
        }
    }
}

/// The set of exempt nodes in one document.
#[derive(Debug, Clone)]
pub enum Exemptions<Id> {
    All,
    Nodes(HashSet<Id>),
}

impl<Id: Eq + std::hash::Hash> Exemptions<Id> {
    pub fn contains(&self, id: &Id) -> bool {
        match self {
            Self::All => true,
            Self::Nodes(ids) => ids.contains(id),
        }
    }
}
