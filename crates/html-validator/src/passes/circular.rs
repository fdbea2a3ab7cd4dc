//! Nested full-viewport sizing
//!
//! A `w-full` element whose first child is also `w-full` (or the same for
//! `h-screen`) is a common source of layouts that size against themselves.
//! Only the immediate next start tag is considered, with nothing but text in
//! between, so siblings and deeper descendants are never flagged.

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::class_tokens;
use crate::patterns::FULL_VIEWPORT_CLASSES;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").unwrap();
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

struct StartTag<'a> {
    name: String,
    classes: Vec<&'a str>,
}

impl StartTag<'_> {
    fn can_have_children(&self) -> bool {
        !VOID_ELEMENTS.contains(&self.name.as_str()) && !self.name.is_empty()
    }
}

/// Report nested `w-full`/`h-screen` pairs. Never rewrites.
pub fn check_circular_dependencies(html: &str, _fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();
    let mut parent: Option<StartTag<'_>> = None;

    for caps in TAG.captures_iter(html) {
        let is_close = !caps[1].is_empty();
        let attrs = caps.get(3).map_or("", |m| m.as_str());

        if is_close || attrs.trim_end().ends_with('/') {
            parent = None;
            continue;
        }

        let current = StartTag {
            name: caps[2].to_ascii_lowercase(),
            classes: class_tokens(attrs),
        };

        if let Some(outer) = parent.as_ref().filter(|p| p.can_have_children()) {
            for class in FULL_VIEWPORT_CLASSES {
                if outer.classes.contains(class) && current.classes.contains(class) {
                    ledger.push(
                        Issue::unfixed(
                            IssueKind::CircularDependency,
                            format!(
                                "Possible circular sizing dependency detected (nested {})",
                                class
                            ),
                        )
                        .at(format!("<{}>", current.name)),
                    );
                }
            }
        }

        parent = Some(current);
    }

    PassOutput::unchanged(html, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_w_full() {
        let html = r#"<div class="w-full p-4">
  <section class="w-full flex">x</section>
</div>"#;
        let output = check_circular_dependencies(html, true);

        assert_eq!(output.ledger.issues().len(), 1);
        let issue = &output.ledger.issues()[0];
        assert!(!issue.fixed);
        assert_eq!(
            issue.description,
            "Possible circular sizing dependency detected (nested w-full)"
        );
        assert_eq!(issue.location.as_deref(), Some("<section>"));
        assert!(!output.is_modified());
    }

    #[test]
    fn test_nested_h_screen() {
        let html = r#"<main class='h-screen'><div class="h-screen"></div></main>"#;
        let output = check_circular_dependencies(html, false);
        assert_eq!(output.ledger.issues().len(), 1);
    }

    #[test]
    fn test_siblings_are_not_nested() {
        let html = r#"<div class="w-full"></div><div class="w-full"></div>"#;
        assert!(check_circular_dependencies(html, true).ledger.is_empty());
    }

    #[test]
    fn test_void_element_is_not_a_parent() {
        let html = r#"<img class="w-full" src="a.png"><div class="w-full"></div>"#;
        assert!(check_circular_dependencies(html, true).ledger.is_empty());
    }

    #[test]
    fn test_similar_class_names_do_not_match() {
        let html = r#"<div class="max-w-full"><div class="w-full-bleed"></div></div>"#;
        assert!(check_circular_dependencies(html, true).ledger.is_empty());
    }

    #[test]
    fn test_intervening_child_breaks_the_pair() {
        let html = r#"<div class="w-full"><span>a</span><div class="w-full"></div></div>"#;
        assert!(check_circular_dependencies(html, true).ledger.is_empty());
    }
}
