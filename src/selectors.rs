//! Ordered selector fallbacks for pulling one field out of a page.
//!
//! A field is described by a list of [`FieldSelector`] candidates. The
//! chain tries them in order and the first candidate producing non-empty
//! text wins; when every candidate misses the caller substitutes the
//! field's sentinel.

use scraper::{ElementRef, Selector};

use crate::error::SelectorError;

/// Where the value of a matched element comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// The element's collected text.
    Text,
    /// A named attribute; a missing attribute means no match.
    Attr(&'static str),
    /// A named attribute, falling back to the element's text.
    AttrOrText(&'static str),
}

/// One candidate selector for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    pub css: &'static str,
    pub source: TextSource,
    /// Only elements whose text contains this marker qualify.
    pub text_contains: Option<&'static str>,
}

impl FieldSelector {
    pub const fn text(css: &'static str) -> Self {
        Self {
            css,
            source: TextSource::Text,
            text_contains: None,
        }
    }

    pub const fn attr(css: &'static str, name: &'static str) -> Self {
        Self {
            css,
            source: TextSource::Attr(name),
            text_contains: None,
        }
    }

    pub const fn attr_or_text(css: &'static str, name: &'static str) -> Self {
        Self {
            css,
            source: TextSource::AttrOrText(name),
            text_contains: None,
        }
    }

    #[must_use]
    pub const fn containing(mut self, marker: &'static str) -> Self {
        self.text_contains = Some(marker);
        self
    }
}

/// Compiles a single CSS selector, keeping the literal for error messages.
///
/// # Errors
///
/// Returns [`SelectorError`] if `scraper` rejects the selector.
pub fn compile(css: &str) -> Result<Selector, SelectorError> {
    Selector::parse(css).map_err(|e| SelectorError {
        css: css.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Collected, whitespace-trimmed text of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[derive(Debug, Clone)]
struct Candidate {
    selector: Selector,
    field: FieldSelector,
}

impl Candidate {
    fn value_of(&self, element: ElementRef<'_>) -> Option<String> {
        let text = || Some(element_text(element));
        let value = match self.field.source {
            TextSource::Text => text(),
            TextSource::Attr(name) => element.value().attr(name).map(|v| v.trim().to_string()),
            TextSource::AttrOrText(name) => element
                .value()
                .attr(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(text),
        };
        value.filter(|v| !v.is_empty())
    }

    fn qualifies(&self, element: ElementRef<'_>) -> bool {
        self.field
            .text_contains
            .is_none_or(|marker| element.text().collect::<String>().contains(marker))
    }
}

/// A compiled, ordered list of candidates for one field
#[derive(Debug, Clone)]
pub struct SelectorChain {
    candidates: Vec<Candidate>,
}

impl SelectorChain {
    /// # Errors
    ///
    /// Returns [`SelectorError`] for the first candidate that fails to compile.
    pub fn parse(fields: &[FieldSelector]) -> Result<Self, SelectorError> {
        let candidates = fields
            .iter()
            .map(|field| {
                Ok(Candidate {
                    selector: compile(field.css)?,
                    field: *field,
                })
            })
            .collect::<Result<Vec<_>, SelectorError>>()?;
        Ok(Self { candidates })
    }

    /// Value of the first candidate that yields non-empty text within `scope`.
    pub fn first_match(&self, scope: ElementRef<'_>) -> Option<String> {
        self.candidates.iter().find_map(|candidate| {
            scope
                .select(&candidate.selector)
                .filter(|el| candidate.qualifies(*el))
                .find_map(|el| candidate.value_of(el))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const NAME_CHAIN: &[FieldSelector] = &[
        FieldSelector::attr_or_text("a.primary", "title"),
        FieldSelector::text("div.secondary"),
    ];

    fn chain(fields: &[FieldSelector]) -> SelectorChain {
        SelectorChain::parse(fields).unwrap()
    }

    #[test]
    fn first_candidate_wins_when_present() {
        let doc = Html::parse_fragment(
            r#"<div><a class="primary" title="Full Name">Short</a><div class="secondary">Other</div></div>"#,
        );
        assert_eq!(
            chain(NAME_CHAIN).first_match(doc.root_element()).as_deref(),
            Some("Full Name")
        );
    }

    #[test]
    fn falls_back_to_text_when_attribute_missing() {
        let doc = Html::parse_fragment(r#"<div><a class="primary"> Short </a></div>"#);
        assert_eq!(
            chain(NAME_CHAIN).first_match(doc.root_element()).as_deref(),
            Some("Short")
        );
    }

    #[test]
    fn empty_primary_falls_through_to_secondary() {
        let doc = Html::parse_fragment(
            r#"<div><a class="primary">  </a><div class="secondary">Backup</div></div>"#,
        );
        assert_eq!(
            chain(NAME_CHAIN).first_match(doc.root_element()).as_deref(),
            Some("Backup")
        );
    }

    #[test]
    fn no_candidate_matches() {
        let doc = Html::parse_fragment("<div><span>nothing here</span></div>");
        assert_eq!(chain(NAME_CHAIN).first_match(doc.root_element()), None);
    }

    #[test]
    fn attribute_source_requires_the_attribute() {
        let fields = [FieldSelector::attr("a.next", "href")];
        let doc = Html::parse_fragment(r#"<a class="next">Next</a>"#);
        assert_eq!(chain(&fields).first_match(doc.root_element()), None);
    }

    #[test]
    fn text_marker_filters_candidates() {
        let fields = [FieldSelector::attr("a.nav", "href").containing("Next")];
        let doc = Html::parse_fragment(
            r#"<nav><a class="nav" href="/p1">Previous</a><a class="nav" href="/p3">Next</a></nav>"#,
        );
        assert_eq!(chain(&fields).first_match(doc.root_element()).as_deref(), Some("/p3"));
    }

    #[test]
    fn invalid_selector_is_reported() {
        let err = SelectorChain::parse(&[FieldSelector::text("div[")]).unwrap_err();
        assert_eq!(err.css, "div[");
    }
}
