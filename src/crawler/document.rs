//! Typed lookups over parsed HTML
//!
//! Pages are queried through structural [`Marker`]s (tag plus optional
//! class or attribute) instead of free-form selectors.

use scraper::{ElementRef, Html};
use serde::Deserialize;

/// Structural predicate matching an element by tag, class and attribute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Marker {
    pub tag: String,

    #[serde(default)]
    pub class: Option<String>,

    /// `(name, value)`; the value matches any whitespace-separated token
    #[serde(default)]
    pub attr: Option<(String, String)>,
}

impl Marker {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: None,
            attr: None,
        }
    }

    pub fn with_class(tag: &str, class: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            ..Self::tag(tag)
        }
    }

    pub fn with_attr(tag: &str, name: &str, value: &str) -> Self {
        Self {
            attr: Some((name.to_string(), value.to_string())),
            ..Self::tag(tag)
        }
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        let value = element.value();
        if !value.name().eq_ignore_ascii_case(&self.tag) {
            return false;
        }

        if let Some(class) = &self.class {
            if !value.classes().any(|c| c == class) {
                return false;
            }
        }

        if let Some((name, expected)) = &self.attr {
            match value.attr(name) {
                Some(actual) => actual.split_whitespace().any(|token| token == expected),
                None => false,
            }
        } else {
            true
        }
    }
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    /// Parses a fragment, e.g. the markup of a single listing
    pub fn parse_fragment(content: &str) -> Self {
        Self {
            html: Html::parse_fragment(content),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            element: self.html.root_element(),
        }
    }

    pub fn find_first(&self, marker: &Marker) -> Option<Node<'_>> {
        self.root().find_first(marker)
    }

    pub fn find_all(&self, marker: &Marker) -> Vec<Node<'_>> {
        self.root().find_all(marker)
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.find_first(marker).is_some()
    }
}

/// An element inside a [`Document`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    /// Element descendants, excluding this node itself
    fn descendant_elements(&self) -> impl Iterator<Item = ElementRef<'a>> {
        self.element.descendants().skip(1).filter_map(ElementRef::wrap)
    }

    pub fn find_first(&self, marker: &Marker) -> Option<Node<'a>> {
        self.descendant_elements()
            .find(|e| marker.matches(e))
            .map(|element| Node { element })
    }

    pub fn find_all(&self, marker: &Marker) -> Vec<Node<'a>> {
        self.descendant_elements()
            .filter(|e| marker.matches(e))
            .map(|element| Node { element })
            .collect()
    }

    /// First text node below this element containing `needle`
    pub fn find_text(&self, needle: &str) -> Option<&'a str> {
        self.element
            .descendants()
            .filter_map(|node| node.value().as_text())
            .map(|text| &**text)
            .find(|text| text.contains(needle))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }
}
