//! Pipeline orchestrator
//!
//! Runs the passes in [`PIPELINE`] order, threading the document text from
//! one to the next. A pass that panics is contained: its output is dropped,
//! the previous text carries on, and the failure becomes an unfixed issue of
//! that pass's kind.

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::passes::{run_pass, PassOutput, PIPELINE};
use crate::result::ValidationResult;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one pass, converting a panic into an unfixed issue
fn run_isolated<'a, F>(pass: &F, kind: IssueKind, html: &'a str, fix: bool) -> PassOutput<'a>
where
    F: Fn(IssueKind, &'a str, bool) -> PassOutput<'a>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| pass(kind, html, fix))) {
        Ok(output) => output,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(pass = %kind, error = %message, "validation pass failed");

            let mut ledger = IssueLedger::new();
            ledger.push(Issue::unfixed(
                kind,
                format!("{} pass failed: {}", kind, message),
            ));
            PassOutput::unchanged(html, ledger)
        }
    }
}

/// Run every pass over `html`. Never fails.
pub fn run(html: &str, fix: bool) -> ValidationResult {
    run_with(html, fix, run_pass)
}

fn run_with<F>(html: &str, fix: bool, pass: F) -> ValidationResult
where
    F: for<'a> Fn(IssueKind, &'a str, bool) -> PassOutput<'a>,
{
    let mut current = html.to_string();
    let mut ledger = IssueLedger::new();

    for kind in PIPELINE {
        let output = run_isolated(&pass, kind, &current, fix);
        debug!(
            pass = %kind,
            issues = output.ledger.issues().len(),
            warnings = output.ledger.warnings().len(),
            modified = output.is_modified(),
            "pass complete"
        );

        ledger.append(output.ledger);
        let rewritten = match output.html {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        if let Some(text) = rewritten {
            current = text;
        }
    }

    let (issues, warnings) = ledger.into_parts();
    ValidationResult {
        html: current,
        issues,
        warnings,
    }
}
