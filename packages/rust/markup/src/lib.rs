//! Markup query layer for rendered mind-map pages.
//!
//! Thin adapter over `scraper` that exposes exactly the lookups the tree
//! reconstructor needs:
//! - [`Markup`] — an owned, parsed document or fragment
//! - [`AddressedTag`] — elements of one tag addressed through one attribute,
//!   matched by prefix ([`AddressedTag::find_all`]) or exactly
//!   ([`AddressedTag::find_exact`])
//! - [`first_text`] / [`inner_markup`] — text and child serialization
//!
//! Lookups never fail: a miss is an empty `Vec`, `None`, or `""`.

pub mod vocabulary;

use scraper::{ElementRef, Html, Selector};

use topictree_shared::{Result, TopicTreeError};

pub use scraper::ElementRef as Element;
pub use vocabulary::DiagramVocabulary;

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

/// A parsed markup tree.
pub struct Markup {
    html: Html,
}

impl Markup {
    /// Parse a complete document (`<html>` wrapper optional).
    pub fn parse_document(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Parse a fragment such as the inner markup of a single element.
    pub fn parse_fragment(source: &str) -> Self {
        Self {
            html: Html::parse_fragment(source),
        }
    }

    /// The outermost element; every other element is a descendant of it.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Parser diagnostics collected by html5ever (quirks, stray tags).
    pub fn parse_errors(&self) -> usize {
        self.html.errors.len()
    }
}

impl std::fmt::Debug for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Markup")
            .field("root", &self.root().value().name())
            .field("parse_errors", &self.parse_errors())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AddressedTag
// ---------------------------------------------------------------------------

/// Elements of a single tag that carry an address in a single attribute.
///
/// Attribute values are compared in Rust instead of being spliced into a CSS
/// selector, so addresses containing quotes or brackets match verbatim.
#[derive(Debug)]
pub struct AddressedTag {
    selector: Selector,
    attr: String,
}

impl AddressedTag {
    /// Build a query for `<tag attr="...">`.
    pub fn new(tag: &str, attr: &str) -> Result<Self> {
        let selector = Selector::parse(tag)
            .map_err(|e| TopicTreeError::parse(format!("invalid tag selector {tag:?}: {e}")))?;
        Ok(Self {
            selector,
            attr: attr.to_string(),
        })
    }

    /// The address carried by `element`, if it has the attribute.
    pub fn address<'a>(&self, element: ElementRef<'a>) -> Option<&'a str> {
        element.value().attr(&self.attr)
    }

    /// Descendants of `scope` whose address starts with `prefix`, in document order.
    pub fn find_all<'a>(&self, scope: ElementRef<'a>, prefix: &str) -> Vec<ElementRef<'a>> {
        scope
            .select(&self.selector)
            .filter(|el| self.address(*el).is_some_and(|a| a.starts_with(prefix)))
            .collect()
    }

    /// First descendant of `scope` whose address starts with `prefix`.
    pub fn find_first<'a>(&self, scope: ElementRef<'a>, prefix: &str) -> Option<ElementRef<'a>> {
        scope
            .select(&self.selector)
            .find(|el| self.address(*el).is_some_and(|a| a.starts_with(prefix)))
    }

    /// First descendant of `scope` whose address is exactly `value`.
    pub fn find_exact<'a>(&self, scope: ElementRef<'a>, value: &str) -> Option<ElementRef<'a>> {
        scope
            .select(&self.selector)
            .find(|el| self.address(*el) == Some(value))
    }
}

// ---------------------------------------------------------------------------
// Text and serialization
// ---------------------------------------------------------------------------

/// Trimmed text of the first descendant of `element` matching `descendant`.
pub fn first_text(element: ElementRef<'_>, descendant: &Selector) -> String {
    element
        .select(descendant)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// The children of `element` serialized back into markup.
pub fn inner_markup(element: ElementRef<'_>) -> String {
    element.inner_html()
}

/// Same as `!inner_markup(element).is_empty()`, without serializing.
pub fn has_inner_markup(element: ElementRef<'_>) -> bool {
    element.has_children()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<html><body>
        <svg>
            <g data-view-id="group:one"><path data-view-id="edge:one:two"></path></g>
            <g data-view-id="group:two"></g>
            <g data-view-id="group:two">second copy</g>
            <g data-view-id='label:"quoted"'>
                <foreignObject><div><span>  First label  </span><span>Second</span></div></foreignObject>
            </g>
            <g>no address</g>
        </svg>
    </body></html>"#;

    fn group_tag() -> AddressedTag {
        AddressedTag::new("g", "data-view-id").expect("valid tag")
    }

    #[test]
    fn find_all_matches_prefix_in_order() {
        let doc = Markup::parse_document(DOC);
        let groups = group_tag().find_all(doc.root(), "group:");
        let addresses: Vec<&str> = groups
            .iter()
            .filter_map(|el| el.value().attr("data-view-id"))
            .collect();
        assert_eq!(addresses, vec!["group:one", "group:two", "group:two"]);
    }

    #[test]
    fn find_all_without_match_is_empty() {
        let doc = Markup::parse_document(DOC);
        assert!(group_tag().find_all(doc.root(), "nothing:").is_empty());
    }

    #[test]
    fn find_exact_takes_first_in_document_order() {
        let doc = Markup::parse_document(DOC);
        let group = group_tag().find_exact(doc.root(), "group:two").expect("found");
        assert_eq!(inner_markup(group), "");
        assert!(group_tag().find_exact(doc.root(), "group:t").is_none());
    }

    #[test]
    fn find_exact_handles_quotes_verbatim() {
        let doc = Markup::parse_document(DOC);
        let label = group_tag()
            .find_exact(doc.root(), r#"label:"quoted""#)
            .expect("found");
        let span = Selector::parse("span").unwrap();
        assert_eq!(first_text(label, &span), "First label");
    }

    #[test]
    fn first_text_missing_descendant_is_empty() {
        let doc = Markup::parse_document(DOC);
        let group = group_tag().find_exact(doc.root(), "group:one").expect("found");
        let span = Selector::parse("span").unwrap();
        assert_eq!(first_text(group, &span), "");
    }

    #[test]
    fn inner_markup_reparses_to_same_children() {
        let doc = Markup::parse_document(DOC);
        let group = group_tag().find_exact(doc.root(), "group:one").expect("found");
        let inner = inner_markup(group);
        assert!(inner.contains("edge:one:two"));

        let fragment = Markup::parse_fragment(&inner);
        let path = AddressedTag::new("path", "data-view-id").unwrap();
        assert_eq!(path.find_all(fragment.root(), "edge:").len(), 1);
    }

    #[test]
    fn find_first_matches_prefix() {
        let doc = Markup::parse_document(DOC);
        let first = group_tag().find_first(doc.root(), "group:").expect("found");
        assert_eq!(first.value().attr("data-view-id"), Some("group:one"));
        assert!(group_tag().find_first(doc.root(), "missing:").is_none());
    }

    #[test]
    fn has_inner_markup_agrees_with_serialization() {
        let doc = Markup::parse_document(DOC);
        for group in group_tag().find_all(doc.root(), "") {
            assert_eq!(has_inner_markup(group), !inner_markup(group).is_empty());
        }
    }

    #[test]
    fn invalid_tag_is_parse_error() {
        let err = AddressedTag::new("g[", "data-view-id").unwrap_err();
        assert!(err.to_string().starts_with("parse error"));
    }
}
