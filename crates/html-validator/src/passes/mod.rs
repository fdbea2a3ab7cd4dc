//! Analyzer/fixer passes
//!
//! Each pass is a plain function `(html, fix) -> PassOutput`. Passes share no
//! state; the only thing flowing between them is the document text. Dispatch
//! is a `match` over [`IssueKind`], one arm per pass.

pub mod api_issues;
pub mod api_keys;
pub mod assets;
pub mod circular;
pub mod citations;
pub mod css_directives;
pub mod error_detection;
pub mod escaping;
pub mod js_parsing;

use std::borrow::Cow;

use crate::issue::{IssueKind, IssueLedger};

/// Passes in the order the pipeline runs them
pub const PIPELINE: [IssueKind; 9] = IssueKind::ALL;

/// Text and findings produced by one pass
#[derive(Debug)]
pub struct PassOutput<'a> {
    /// Document text after the pass; borrowed when nothing changed
    pub html: Cow<'a, str>,
    /// Issues and warnings found by the pass
    pub ledger: IssueLedger,
}

impl<'a> PassOutput<'a> {
    /// Output that leaves the document as it was
    pub fn unchanged(html: &'a str, ledger: IssueLedger) -> Self {
        Self {
            html: Cow::Borrowed(html),
            ledger,
        }
    }

    /// Output carrying `rewritten` when present, the original text otherwise
    pub fn with_rewrite(html: &'a str, rewritten: Option<String>, ledger: IssueLedger) -> Self {
        match rewritten {
            Some(text) => Self {
                html: Cow::Owned(text),
                ledger,
            },
            None => Self::unchanged(html, ledger),
        }
    }

    /// Whether the pass rewrote the document
    pub fn is_modified(&self) -> bool {
        matches!(self.html, Cow::Owned(_))
    }
}

/// Run the pass for `kind` over `html`
pub fn run_pass(kind: IssueKind, html: &str, fix: bool) -> PassOutput<'_> {
    match kind {
        IssueKind::ApiKeyPlaceholder => api_keys::check_api_key_placeholders(html, fix),
        IssueKind::ErrorDetection => error_detection::inject_error_detection(html, fix),
        IssueKind::JsParsing => js_parsing::fix_javascript_errors(html, fix),
        IssueKind::CssDirective => css_directives::fix_css_directives(html, fix),
        IssueKind::CircularDependency => circular::check_circular_dependencies(html, fix),
        IssueKind::HtmlEscaping => escaping::fix_html_escaping(html, fix),
        IssueKind::CitationRemoval => citations::remove_citations_from_js(html, fix),
        IssueKind::ApiIssue => api_issues::check_api_issues(html, fix),
        IssueKind::HallucinatedAsset => assets::fix_hallucinated_assets(html, fix),
    }
}
