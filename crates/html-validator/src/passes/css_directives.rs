//! Tailwind usage without the framework loaded

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::{class_tokens, insert_after_head_open};
use crate::patterns::{contains_any, CSS_FRAMEWORK_MARKERS, TAILWIND_CDN_SCRIPT, TAILWIND_UTILITY};

lazy_static! {
    static ref UTILITY: Regex = Regex::new(TAILWIND_UTILITY).unwrap();
}

/// Strip variant prefixes (`md:`, `hover:`) and the important/negative
/// markers from a class token
fn base_class(token: &str) -> &str {
    let base = token.rsplit(':').next().unwrap_or(token);
    base.trim_start_matches(['!', '-'])
}

fn uses_tailwind_utilities(html: &str) -> bool {
    class_tokens(html)
        .into_iter()
        .any(|token| UTILITY.is_match(base_class(token)))
}

/// Add the Tailwind CDN when utility classes are used without any CSS
/// framework, and flag `@apply` that the CDN build cannot honour
pub fn fix_css_directives(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();
    let mut rewritten = None;

    if !contains_any(html, CSS_FRAMEWORK_MARKERS) && uses_tailwind_utilities(html) {
        if !fix {
            ledger.push(Issue::unfixed(
                IssueKind::CssDirective,
                "Tailwind classes used but CDN not included",
            ));
        } else {
            match insert_after_head_open(html, TAILWIND_CDN_SCRIPT) {
                Some(text) => {
                    ledger.push(
                        Issue::fixed(IssueKind::CssDirective, "Added missing Tailwind CSS CDN")
                            .at("<head>"),
                    );
                    rewritten = Some(text);
                }
                None => ledger.push(Issue::unfixed(
                    IssueKind::CssDirective,
                    "Tailwind classes used but CDN not included (no <head> to add it to)",
                )),
            }
        }
    }

    if html.contains("@apply") && !html.contains("tailwind.config") {
        ledger.push(Issue::unfixed(
            IssueKind::CssDirective,
            "@apply directive used - may not work with CDN-only Tailwind",
        ));
    }

    PassOutput::with_rewrite(html, rewritten, ledger)
}
