//! Attribute escaping
//!
//! Attributes are only looked at inside start tags outside `<script>`
//! content, so `var src = "a&b"` in code is never touched.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::script_blocks;

lazy_static! {
    static ref START_TAG: Regex =
        Regex::new(r#"<[a-zA-Z][a-zA-Z0-9-]*(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap();
    static ref URL_ATTR: Regex =
        Regex::new(r#"(?i)\s(href|src|action)\s*=\s*"([^"]*)""#).unwrap();
    static ref HANDLER_ATTR: Regex =
        Regex::new(r#"(?i)\s(on[a-z]+)\s*=\s*"([^"]*[<>][^"]*)""#).unwrap();
    static ref ENTITY: Regex =
        Regex::new(r"^&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]{0,31});").unwrap();
}

/// Replace every `&` that does not start a character reference
fn escape_ampersands(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        if c == '&' && !ENTITY.is_match(&value[i..]) {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape bare `&` in `href`/`src`/`action` values and flag `on*` handlers
/// containing `<` or `>`
pub fn fix_html_escaping(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();
    let scripts: Vec<Range<usize>> = script_blocks(html).map(|b| b.content_range).collect();

    let mut out = String::new();
    let mut last = 0;

    for tag in START_TAG.find_iter(html) {
        if scripts.iter().any(|r| r.contains(&tag.start())) {
            continue;
        }

        for caps in URL_ATTR.captures_iter(tag.as_str()) {
            let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if !value.as_str().contains('&') {
                continue;
            }
            let escaped = escape_ampersands(value.as_str());
            if escaped == value.as_str() {
                continue;
            }

            let attr = name.as_str().to_ascii_lowercase();
            if fix {
                let start = tag.start() + value.start();
                out.push_str(&html[last..start]);
                out.push_str(&escaped);
                last = tag.start() + value.end();
                ledger.push(Issue::fixed(
                    IssueKind::HtmlEscaping,
                    format!("Fixed unescaped ampersand in {} attribute", attr),
                ));
            } else {
                ledger.push(Issue::unfixed(
                    IssueKind::HtmlEscaping,
                    format!("Unescaped ampersand in {} attribute", attr),
                ));
            }
        }

        for caps in HANDLER_ATTR.captures_iter(tag.as_str()) {
            ledger.push(Issue::unfixed(
                IssueKind::HtmlEscaping,
                format!(
                    "Event handler {} contains < or > characters that may cause issues",
                    caps[1].to_ascii_lowercase()
                ),
            ));
        }
    }

    let rewritten = (last > 0).then(|| {
        out.push_str(&html[last..]);
        out
    });
    PassOutput::with_rewrite(html, rewritten, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escapes_bare_ampersand_in_href() {
        let html = r#"<a href="x?a=1&b=2">link</a>"#;
        let output = fix_html_escaping(html, true);

        assert_eq!(output.html, r#"<a href="x?a=1&amp;b=2">link</a>"#);
        assert_eq!(output.ledger.issues().len(), 1);
        assert_eq!(
            output.ledger.issues()[0].description,
            "Fixed unescaped ampersand in href attribute"
        );
    }

    #[test]
    fn test_existing_references_untouched() {
        let html = r#"<a href="x?a=1&amp;b=2&#38;c=3&#x26;d">x</a><img src="a&lt;b.png">"#;
        let output = fix_html_escaping(html, true);
        assert!(!output.is_modified());
        assert!(output.ledger.is_empty());
    }

    #[test]
    fn test_mixed_value_escapes_only_bare_ampersands() {
        let html = r#"<form action="/s?q=1&amp;r=2&t=3"></form>"#;
        let output = fix_html_escaping(html, true);
        assert_eq!(output.html, r#"<form action="/s?q=1&amp;r=2&amp;t=3"></form>"#);
    }

    #[test]
    fn test_multiple_attributes_fixed_in_order() {
        let html = r#"<img src="i?a&b"><a href="h?c&d">x</a>"#;
        let output = fix_html_escaping(html, true);

        assert_eq!(output.html, r#"<img src="i?a&amp;b"><a href="h?c&amp;d">x</a>"#);
        let names: Vec<_> = output
            .ledger
            .issues()
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Fixed unescaped ampersand in src attribute",
                "Fixed unescaped ampersand in href attribute"
            ]
        );
    }

    #[test]
    fn test_script_content_untouched() {
        let html = r#"<script>const img = '<img src="a?x=1&y=2">';</script>"#;
        let output = fix_html_escaping(html, true);
        assert!(!output.is_modified());
        assert!(output.ledger.is_empty());
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let html = r#"<a href="x?a=1&b=2&c">link</a>"#;
        let first = fix_html_escaping(html, true);
        let second = fix_html_escaping(&first.html, true);
        assert!(!second.is_modified());
        assert!(second.ledger.is_empty());
    }

    #[test]
    fn test_detect_only_reports() {
        let html = r#"<a href="x?a=1&b=2">link</a>"#;
        let output = fix_html_escaping(html, false);
        assert!(!output.is_modified());
        assert_eq!(
            output.ledger.issues()[0].description,
            "Unescaped ampersand in href attribute"
        );
    }

    #[test]
    fn test_event_handler_with_angle_brackets() {
        let html = r#"<button onclick="if (a > b) go()">Go</button>"#;
        let output = fix_html_escaping(html, true);
        assert!(!output.is_modified());
        assert_eq!(
            output.ledger.issues()[0].description,
            "Event handler onclick contains < or > characters that may cause issues"
        );
        assert!(!output.ledger.issues()[0].fixed);
    }
}
