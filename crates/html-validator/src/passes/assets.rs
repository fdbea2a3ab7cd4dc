//! Fabricated asset URLs and icon fonts

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::{class_tokens, insert_after_head_open};
use crate::patterns::{
    contains_any, preview, FONT_AWESOME_MARKERS, FONT_AWESOME_STYLESHEET, ICON_LIBRARY_MARKERS,
};

lazy_static! {
    /// `src` values that point at paths a standalone page cannot have, or at
    /// the reserved example domains
    static ref FABRICATED_SRC: Regex = Regex::new(
        r#"(?i)\bsrc\s*=\s*"((?:\./icons/|/icons/|\./images/|images/)[^"]*|https?://(?:[\w-]+\.)*example\.(?:com|org|net)[^"]*)""#
    )
    .unwrap();
}

const FONT_AWESOME_STYLE_CLASSES: &[&str] = &[
    "fa", "fas", "far", "fab", "fal", "fad", "fa-solid", "fa-regular", "fa-brands",
];

fn uses_font_awesome(html: &str) -> bool {
    class_tokens(html)
        .into_iter()
        .any(|t| FONT_AWESOME_STYLE_CLASSES.contains(&t) || t.starts_with("fa-"))
}

/// Flag fabricated asset URLs and add the Font Awesome stylesheet when its
/// classes are used without it
pub fn fix_hallucinated_assets(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();
    let mut rewritten = None;

    for caps in FABRICATED_SRC.captures_iter(html) {
        ledger.push(Issue::unfixed(
            IssueKind::HallucinatedAsset,
            format!(
                "Possibly hallucinated asset URL: src=\"{}\"",
                preview(&caps[1], 120)
            ),
        ));
    }

    if html.contains("/icons/") && !contains_any(html, ICON_LIBRARY_MARKERS) {
        ledger.push(Issue::unfixed(
            IssueKind::HallucinatedAsset,
            "Consider using Heroicons or Font Awesome for icons instead of custom paths",
        ));
    }

    if uses_font_awesome(html) && !contains_any(html, FONT_AWESOME_MARKERS) {
        if !fix {
            ledger.push(Issue::unfixed(
                IssueKind::HallucinatedAsset,
                "Font Awesome classes used but stylesheet not included",
            ));
        } else {
            match insert_after_head_open(html, FONT_AWESOME_STYLESHEET) {
                Some(text) => {
                    ledger.push(
                        Issue::fixed(
                            IssueKind::HallucinatedAsset,
                            "Added Font Awesome CDN for fa- icon classes",
                        )
                        .at("<head>"),
                    );
                    rewritten = Some(text);
                }
                None => ledger.push(Issue::unfixed(
                    IssueKind::HallucinatedAsset,
                    "Font Awesome classes used but stylesheet not included (no <head> to add it to)",
                )),
            }
        }
    }

    PassOutput::with_rewrite(html, rewritten, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fabricated_sources_reported() {
        let html = r#"<img src="/icons/home.svg"><img src="./images/hero.jpg">
<img src="https://cdn.example.com/logo.png"><img src="https://upload.wikimedia.org/a.png">
<img src="assets/images/ok.png">"#;
        let output = fix_hallucinated_assets(html, true);

        let descriptions: Vec<_> = output
            .ledger
            .issues()
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Possibly hallucinated asset URL: src=\"/icons/home.svg\"",
                "Possibly hallucinated asset URL: src=\"./images/hero.jpg\"",
                "Possibly hallucinated asset URL: src=\"https://cdn.example.com/logo.png\"",
                "Consider using Heroicons or Font Awesome for icons instead of custom paths",
            ]
        );
        assert!(!output.is_modified());
    }

    #[test]
    fn test_icon_library_suppresses_suggestion() {
        let html = r#"<script src="https://unpkg.com/lucide@latest"></script><img src="/icons/x.svg">"#;
        let output = fix_hallucinated_assets(html, true);
        assert_eq!(output.ledger.issues().len(), 1);
    }

    #[test]
    fn test_adds_font_awesome_after_head_open() {
        let html = r#"<html><head></head><body><i class="fa-solid fa-house"></i></body></html>"#;
        let output = fix_hallucinated_assets(html, true);

        assert_eq!(
            output.html,
            format!(
                "<html><head>\n{}</head><body><i class=\"fa-solid fa-house\"></i></body></html>",
                FONT_AWESOME_STYLESHEET
            )
        );
        assert!(output.ledger.issues()[0].fixed);

        let second = fix_hallucinated_assets(&output.html, true);
        assert!(!second.is_modified());
        assert!(second.ledger.is_empty());
    }

    #[test]
    fn test_font_awesome_detection_uses_class_tokens() {
        let html = r#"<head></head><p>sofa-bed</p><div class="sofa"></div>"#;
        assert!(fix_hallucinated_assets(html, true).ledger.is_empty());
    }

    #[test]
    fn test_font_awesome_detect_only_and_no_head() {
        let html = r#"<i class="fa fa-star"></i>"#;

        let detect = fix_hallucinated_assets(html, false);
        assert!(!detect.is_modified());
        assert_eq!(
            detect.ledger.issues()[0].description,
            "Font Awesome classes used but stylesheet not included"
        );

        let headless = fix_hallucinated_assets(html, true);
        assert!(!headless.is_modified());
        assert!(!headless.ledger.issues()[0].fixed);
    }
}
