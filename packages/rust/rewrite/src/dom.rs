//! DOM access for the rewriter.
//!
//! [`DomNode`] is the capability set the keep-relative policy needs: tag name,
//! attribute lookup, a parent back-link, and selector matching over a subtree.
//! [`MarkupDocument`] implements it on top of a `scraper` parse tree, takes
//! attribute writes in place, and serializes through html5ever.

use std::hash::Hash;
use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use html5ever::{LocalName, Namespace, QualName};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector, StrTendril};

// ---------------------------------------------------------------------------
// DomNode
// ---------------------------------------------------------------------------

/// Read-only view of a node in a parsed document.
pub trait DomNode: Clone {
    /// Stable identity of a node within its document.
    type Id: Copy + Eq + Hash;

    fn id(&self) -> Self::Id;

    /// Element tag name; `None` for documents, text, comments.
    fn tag_name(&self) -> Option<&str>;

    fn attr(&self, name: &str) -> Option<&str>;

    fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Parent link; `None` only for the document root.
    fn parent(&self) -> Option<Self>;

    /// Ids of every element in this node's subtree (itself included) that
    /// `selector` matches.
    fn select(&self, selector: &Selector) -> Vec<Self::Id>;

    /// Walk parent links up to the top-level root.
    fn root(&self) -> Self {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }
}

/// [`DomNode`] over a `scraper` tree node.
#[derive(Debug, Clone, Copy)]
pub struct ScraperNode<'a>(NodeRef<'a, Node>);

impl<'a> ScraperNode<'a> {
    pub fn new(node: NodeRef<'a, Node>) -> Self {
        Self(node)
    }
}

impl DomNode for ScraperNode<'_> {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.0.id()
    }

    fn tag_name(&self) -> Option<&str> {
        self.0.value().as_element().map(|el| el.name())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.0.value().as_element().and_then(|el| el.attr(name))
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().map(ScraperNode)
    }

    fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.0
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| el.id())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MarkupDocument
// ---------------------------------------------------------------------------

/// Elements whose first newline is dropped by the parser.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// A request-scoped parse of fetched markup.
pub struct MarkupDocument {
    html: Html,
    fragment: bool,
}

impl MarkupDocument {
    /// Parse markup, recovering from malformed input the way browsers do.
    ///
    /// Input that carries a doctype or an `<html>` tag is parsed as a full
    /// document; anything else as a body fragment, so fragments are not
    /// wrapped in synthetic `<html>`/`<head>`/`<body>` elements on output.
    pub fn parse(markup: &str) -> Self {
        static FULL_DOCUMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)<!doctype|<html[\s>/]").expect("valid regex")
        });

        if FULL_DOCUMENT_RE.is_match(markup) {
            Self {
                html: Html::parse_document(markup),
                fragment: false,
            }
        } else {
            Self {
                html: Html::parse_fragment(markup),
                fragment: true,
            }
        }
    }

    /// The top-level root node of the tree.
    pub fn root(&self) -> ScraperNode<'_> {
        ScraperNode(self.html.tree.root())
    }

    /// Every element, in document order.
    pub fn elements(&self) -> impl Iterator<Item = ScraperNode<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_element())
            .map(ScraperNode)
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    /// Set a plain (no namespace) attribute on element `id`.
    ///
    /// An existing attribute keeps its position; a new one is appended.
    /// Namespaced attributes such as `xlink:href` are separate keys and are
    /// never touched.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        if let Node::Element(element) = node.value() {
            let key = QualName::new(None, Namespace::from(""), LocalName::from(name));
            element.attrs.insert(key, StrTendril::from(value));
        }
    }

    /// Serialize the tree back to markup.
    ///
    /// Fragments are written without the parser's synthetic `<html>`
    /// context element.
    pub fn into_html(mut self) -> String {
        self.restore_leading_newlines();
        if self.fragment {
            self.html.root_element().inner_html()
        } else {
            self.html.html()
        }
    }

    /// The parser drops one newline right after `<pre>`, `<textarea>` and
    /// `<listing>`; write it back so content starting with a newline
    /// survives a re-parse.
    fn restore_leading_newlines(&mut self) {
        let targets: Vec<NodeId> = self
            .elements()
            .filter(|node| {
                node.tag_name()
                    .is_some_and(|tag| LEADING_NEWLINE_ELEMENTS.contains(&tag))
            })
            .filter_map(|node| node.0.first_child())
            .filter(|child| {
                child
                    .value()
                    .as_text()
                    .is_some_and(|text| text.starts_with('\n'))
            })
            .map(|child| child.id())
            .collect();

        for id in targets {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                if let Node::Text(text) = node.value() {
                    let mut restored = StrTendril::from("\n");
                    restored.push_tendril(&text.text);
                    text.text = restored;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(doc: &'a MarkupDocument, tag: &str) -> ScraperNode<'a> {
        doc.elements()
            .find(|n| n.tag_name() == Some(tag))
            .unwrap_or_else(|| panic!("no <{tag}> element"))
    }

    #[test]
    fn fragment_detection() {
        assert!(MarkupDocument::parse("<div>Test Content</div>").is_fragment());
        assert!(!MarkupDocument::parse("<!DOCTYPE html><p>x</p>").is_fragment());
        assert!(!MarkupDocument::parse("<html lang=\"en\"><body></body></html>").is_fragment());
        assert!(MarkupDocument::parse("<p>see the html docs</p>").is_fragment());
    }

    #[test]
    fn node_accessors() {
        let doc = MarkupDocument::parse(r#"<section><img class="hero" src="/a.jpg"></section>"#);
        let img = find(&doc, "img");

        assert_eq!(img.attr("src"), Some("/a.jpg"));
        assert!(img.has_attr("class"));
        assert!(!img.has_attr("srcset"));
        assert_eq!(img.parent().and_then(|p| p.tag_name().map(str::to_owned)), Some("section".into()));
    }

    #[test]
    fn root_walks_to_top() {
        let doc = MarkupDocument::parse("<div><p><a href=\"x\">x</a></p></div>");
        let a = find(&doc, "a");
        let root = a.root();

        assert!(root.parent().is_none());
        assert_eq!(root.id(), doc.root().id());
        assert!(root.tag_name().is_none());
    }

    #[test]
    fn select_from_root_sees_ancestor_context() {
        let doc = MarkupDocument::parse(
            r#"<div class="docs"><img id="in" src="a"></div><img id="out" src="b">"#,
        );
        let selector = Selector::parse(".docs img").unwrap();
        let matched = doc.root().select(&selector);

        let inside = doc.elements().find(|n| n.attr("id") == Some("in")).unwrap();
        let outside = doc.elements().find(|n| n.attr("id") == Some("out")).unwrap();
        assert!(matched.contains(&inside.id()));
        assert!(!matched.contains(&outside.id()));
    }

    fn roundtrip(markup: &str) -> String {
        MarkupDocument::parse(markup).into_html()
    }

    #[test]
    fn set_attr_replaces_in_place_and_appends() {
        let mut doc = MarkupDocument::parse(r#"<img src="/a.jpg" alt="A">"#);
        let id = find(&doc, "img").id();

        doc.set_attr(id, "src", "first");
        doc.set_attr(id, "crossorigin", "anonymous");
        doc.set_attr(id, "src", "https://x.com/a.jpg");

        assert_eq!(find(&doc, "img").attr("src"), Some("https://x.com/a.jpg"));
        assert_eq!(
            doc.into_html(),
            r#"<img src="https://x.com/a.jpg" alt="A" crossorigin="anonymous">"#
        );
    }

    #[test]
    fn fragment_is_not_wrapped() {
        assert_eq!(roundtrip("<div>Test Content</div>"), "<div>Test Content</div>");
    }

    #[test]
    fn full_document_keeps_structure() {
        let markup =
            "<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>";
        assert_eq!(roundtrip(markup), markup);
    }

    #[test]
    fn attribute_order_is_preserved() {
        let markup = r#"<a title="t" href="/x" class="c" data-z="1">x</a>"#;
        assert_eq!(roundtrip(markup), markup);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        assert_eq!(
            roundtrip(r#"<p>a<br>b<img src="x.png" alt=""></p>"#),
            r#"<p>a<br>b<img src="x.png" alt=""></p>"#
        );
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        assert_eq!(
            roundtrip(r#"<a title="say &quot;hi&quot;" href="?a=1&amp;b=2">1 &lt; 2 &amp; 3</a>"#),
            r#"<a title="say &quot;hi&quot;" href="?a=1&amp;b=2">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn script_and_style_are_raw() {
        let markup = "<script>if (a < b && c) {}</script><style>a > b { }</style>";
        assert_eq!(roundtrip(markup), markup);
    }

    #[test]
    fn comments_survive() {
        assert_eq!(roundtrip("<!-- keep --><p>x</p>"), "<!-- keep --><p>x</p>");
    }

    #[test]
    fn malformed_markup_is_recovered() {
        assert_eq!(
            roundtrip("<div><p>open<span>tags"),
            "<div><p>open<span>tags</span></p></div>"
        );
    }

    #[test]
    fn namespaced_attributes_keep_their_prefix() {
        let markup = r##"<svg><use xlink:href="/sprite.svg#icon"></use></svg>"##;
        assert_eq!(roundtrip(markup), markup);
    }

    #[test]
    fn set_attr_leaves_namespaced_twin_alone() {
        let mut doc =
            MarkupDocument::parse(r##"<svg><use href="/a.svg#i" xlink:href="/b.svg#i"></use></svg>"##);
        let id = find(&doc, "use").id();
        doc.set_attr(id, "href", "https://x.com/a.svg#i");

        assert_eq!(
            doc.into_html(),
            r##"<svg><use href="https://x.com/a.svg#i" xlink:href="/b.svg#i"></use></svg>"##
        );
    }

    #[test]
    fn leading_newline_in_pre_survives_reparse() {
        let once = roundtrip("<pre>\n\nx</pre>");
        assert_eq!(once, "<pre>\n\nx</pre>");
        assert_eq!(roundtrip(&once), once);

        assert_eq!(roundtrip("<pre>x</pre>"), "<pre>x</pre>");
        assert_eq!(roundtrip("<textarea>\n\nbody</textarea>"), "<textarea>\n\nbody</textarea>");
    }
}
