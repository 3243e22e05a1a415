//! Anchor matching and relative navigation over a parsed document.
//!
//! A [`Locator`] finds an anchor element with a [`Matcher`] then follows a
//! fixed path of [`Step`]s to the element holding the wanted text.

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html};

#[derive(Debug, Clone)]
pub struct Matcher {
    tags: Vec<&'static str>,
    class: Option<&'static str>,
    id: Option<&'static str>,
    text: Option<Regex>,
}

impl Matcher {
    pub fn tag(name: &'static str) -> Self {
        Self {
            tags: vec![name],
            class: None,
            id: None,
            text: None,
        }
    }

    /// Any of the given tag names.
    pub fn tags(names: &[&'static str]) -> Self {
        Self {
            tags: names.to_vec(),
            ..Self::any()
        }
    }

    /// Any element, usually narrowed with [`Matcher::id`].
    pub fn any() -> Self {
        Self {
            tags: Vec::new(),
            class: None,
            id: None,
            text: None,
        }
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }

    /// Case-insensitive pattern searched in the element's own string, the
    /// text of an element whose only child chain ends in one text node.
    pub fn string(mut self, pattern: &str) -> Self {
        // Patterns are literals written in this crate, a bad one is a bug
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("Invalid anchor pattern {pattern:?}: {e}"));
        self.text = Some(re);
        self
    }

    pub fn matches(&self, elem: &ElementRef) -> bool {
        let value = elem.value();
        let tag_ok =
            self.tags.is_empty() || self.tags.iter().any(|t| value.name().eq_ignore_ascii_case(t));
        if !tag_ok {
            return false;
        }
        if let Some(class) = self.class {
            if !value.classes().any(|c| c == class) {
                return false;
            }
        }
        if let Some(id) = self.id {
            if value.id() != Some(id) {
                return false;
            }
        }
        match &self.text {
            None => true,
            Some(re) => own_string(elem).map_or(false, |s| re.is_match(&s)),
        }
    }

    /// First matching element below `scope`, in document order.
    pub fn find<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(scope).find(|e| self.matches(e))
    }

    pub fn find_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        descendants(scope).filter(|e| self.matches(e)).collect()
    }

    /// Matching elements among the children of `scope`.
    pub fn find_children<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        children(scope).filter(|e| self.matches(e)).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    /// Nearest ancestor with this tag name.
    Parent(&'static str),
    /// First following sibling element that matches.
    NextSibling(Matcher),
    /// First matching element after the current one in document order,
    /// the current element's own descendants included.
    FindNext(Matcher),
    /// First matching descendant.
    Descendant(Matcher),
}

impl Step {
    pub fn apply<'a>(&self, elem: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            Step::Parent(tag) => parent(elem, tag),
            Step::NextSibling(m) => next_siblings(elem).find(|e| m.matches(e)),
            Step::FindNext(m) => find_next(elem, m),
            Step::Descendant(m) => m.find(elem),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Locator {
    anchor: Matcher,
    path: Vec<Step>,
}

impl Locator {
    pub fn new(anchor: Matcher) -> Self {
        Self {
            anchor,
            path: Vec::new(),
        }
    }

    pub fn then(mut self, step: Step) -> Self {
        self.path.push(step);
        self
    }

    /// Follows the path from the first anchor found under `scope`.
    pub fn locate<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let anchor = self.anchor.find(scope)?;
        self.follow(anchor)
    }

    /// Follows the path from every anchor, keeping the ones that resolve.
    pub fn locate_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.anchor
            .find_all(scope)
            .into_iter()
            .filter_map(|anchor| self.follow(anchor))
            .collect()
    }

    fn follow<'a>(&self, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.path
            .iter()
            .try_fold(anchor, |elem, step| step.apply(elem))
    }
}

/// Document root element, `<html>`.
pub fn root(html: &Html) -> ElementRef<'_> {
    html.root_element()
}

/// Text fragments trimmed and concatenated without separator.
pub fn stripped_text(elem: &ElementRef) -> String {
    elem.text().map(str::trim).collect()
}

/// Text of an element whose only child chain ends in a single text node.
pub fn own_string(elem: &ElementRef) -> Option<String> {
    let mut node = **elem;
    loop {
        let mut children = node.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        if let Some(text) = only.value().as_text() {
            return Some(String::from(&**text));
        }
        if !only.value().is_element() {
            return None;
        }
        node = only;
    }
}

pub fn parent<'a>(elem: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    elem.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name().eq_ignore_ascii_case(tag))
}

pub fn next_siblings(elem: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    elem.next_siblings().filter_map(ElementRef::wrap)
}

pub fn children(elem: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    elem.children().filter_map(ElementRef::wrap)
}

fn descendants(elem: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    // `descendants` yields the node itself first
    elem.descendants().skip(1).filter_map(ElementRef::wrap)
}

fn find_next<'a>(elem: ElementRef<'a>, matcher: &Matcher) -> Option<ElementRef<'a>> {
    let top = elem
        .ancestors()
        .filter_map(ElementRef::wrap)
        .last()
        .unwrap_or(elem);
    descendants(top)
        .skip_while(|e| e.id() != elem.id())
        .skip(1)
        .find(|e| matcher.matches(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="govuk-heading-l">Title</h1>
          <div>
            <ul class="govuk-list"><li> First </li><li>Second</li></ul>
          </div>
          <h4><span>V.2.1) Date of conclusion of the contract</span></h4>
          <div>ignored</div>
          <p>1 May 2023</p>
          <p>Two <b>parts</b></p>
          <p><strong> Nested </strong></p>
        </body></html>
    "#;

    #[test]
    fn own_string_follows_single_child_chain() {
        let html = Html::parse_document(PAGE);
        let ps = Matcher::tag("p").find_all(root(&html));
        assert_eq!(own_string(&ps[0]).as_deref(), Some("1 May 2023"));
        assert_eq!(own_string(&ps[1]), None);
        assert_eq!(own_string(&ps[2]).as_deref(), Some(" Nested "));
    }

    #[test]
    fn locator_walks_parent_then_sibling() {
        let html = Html::parse_document(PAGE);
        let date = Locator::new(Matcher::tag("span").string(r"V\.2\.1\)\s+Date of conclusion"))
            .then(Step::Parent("h4"))
            .then(Step::NextSibling(Matcher::tag("p")))
            .locate(root(&html))
            .unwrap();
        assert_eq!(stripped_text(&date), "1 May 2023");
    }

    #[test]
    fn find_next_leaves_the_anchor_subtree() {
        let html = Html::parse_document(PAGE);
        let li = Locator::new(Matcher::tag("h1").class("govuk-heading-l"))
            .then(Step::FindNext(Matcher::tag("ul").class("govuk-list")))
            .then(Step::Descendant(Matcher::tag("li")))
            .locate(root(&html))
            .unwrap();
        assert_eq!(stripped_text(&li), "First");
    }

    #[test]
    fn text_patterns_are_case_insensitive() {
        let html = Html::parse_document(PAGE);
        let m = Matcher::tag("p").string("1 MAY");
        assert!(m.find(root(&html)).is_some());
        // Mixed content has no own string
        let m = Matcher::tag("p").string("two");
        assert!(m.find(root(&html)).is_none());
    }

    #[test]
    fn missing_anchor_resolves_to_none() {
        let html = Html::parse_document("");
        let found = Locator::new(Matcher::tag("h1"))
            .then(Step::Parent("div"))
            .locate(root(&html));
        assert!(found.is_none());
    }
}
