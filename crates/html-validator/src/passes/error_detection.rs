//! Global error reporting hook

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::insert_into_head_or_body;
use crate::patterns::{ERROR_HANDLER_MARKERS, ERROR_HANDLER_SNIPPET};

lazy_static! {
    static ref HANDLER: Regex = Regex::new(ERROR_HANDLER_MARKERS).unwrap();
}

/// Ensure the page logs uncaught exceptions and unhandled rejections.
///
/// The snippet goes right before `</head>`, or right after the `<body>` open
/// tag when there is no head. Documents with an existing `window.onerror`
/// or `error` listener are left alone.
pub fn inject_error_detection(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();

    if html.is_empty() || HANDLER.is_match(html) {
        return PassOutput::unchanged(html, ledger);
    }

    if !fix {
        ledger.push(Issue::unfixed(
            IssueKind::ErrorDetection,
            "No global error handler found",
        ));
        return PassOutput::unchanged(html, ledger);
    }

    match insert_into_head_or_body(html, ERROR_HANDLER_SNIPPET) {
        Some((rewritten, point)) => {
            ledger.push(
                Issue::fixed(IssueKind::ErrorDetection, "Injected error detection script")
                    .at(point.location()),
            );
            PassOutput::with_rewrite(html, Some(rewritten), ledger)
        }
        None => {
            ledger.push(Issue::unfixed(
                IssueKind::ErrorDetection,
                "No global error handler found and no <head> or <body> to inject into",
            ));
            PassOutput::unchanged(html, ledger)
        }
    }
}
