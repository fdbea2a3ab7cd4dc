//! Citation markers leaked into script code
//!
//! Models trained on cited prose sometimes carry `[1]` or `[citation needed]`
//! into generated JavaScript, where it either breaks parsing or silently
//! indexes into something. Markers are stripped only from inline script
//! content and only where they cannot be code: `items[1]`, `f()[0]`,
//! `= [1]` and `return [ref]` are all left alone.

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::{inline_scripts, rewrite_scripts};

lazy_static! {
    static ref CITATION: Regex =
        Regex::new(r"(?i)\[(?:\d{1,3}|citation[^\]\n]{0,40}|ref[^\]\n]{0,40})\]").unwrap();
}

/// Characters after which `[` opens an array literal or destructuring pattern
const EXPRESSION_PRECEDERS: &str = "=([,:{?!&|+-*/%<>;}";

/// Keywords after which `[` starts an expression
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "yield", "await", "typeof", "in", "of", "case", "const", "let", "var", "new", "void",
    "delete", "throw", "else", "do",
];

const LOCATION: &str = "<script>";

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// The end of the cleaned text, kept up to date as it grows
#[derive(Debug, Default)]
struct Tail {
    last: Option<char>,
    last_visible: Option<char>,
    /// Identifier run ending at `last_visible`, empty when that is punctuation
    word: String,
}

impl Tail {
    fn extend(&mut self, text: &str) {
        for c in text.chars() {
            if is_ident_char(c) {
                if !self.last.map_or(false, is_ident_char) {
                    self.word.clear();
                }
                self.word.push(c);
                self.last_visible = Some(c);
            } else if !c.is_whitespace() {
                self.word.clear();
                self.last_visible = Some(c);
            }
            self.last = Some(c);
        }
    }

    /// Whether a `[` here would be code rather than a citation
    fn is_code_position(&self) -> bool {
        let Some(prev) = self.last else {
            return true;
        };
        if is_ident_char(prev) || matches!(prev, ')' | ']' | '"' | '\'' | '`') {
            return true;
        }
        let Some(prev_visible) = self.last_visible else {
            return true;
        };
        EXPRESSION_PRECEDERS.contains(prev_visible)
            || EXPRESSION_KEYWORDS.contains(&self.word.as_str())
    }
}

/// Remove citation markers from one script, returning the cleaned text and
/// how many were removed. The position check runs against the cleaned text
/// so `[1][2]` loses both markers in a single run.
fn strip_citations(script: &str) -> (String, usize) {
    let mut out = String::with_capacity(script.len());
    let mut tail = Tail::default();
    let mut last = 0;
    let mut removed = 0;

    for m in CITATION.find_iter(script) {
        let between = &script[last..m.start()];
        out.push_str(between);
        tail.extend(between);
        if tail.is_code_position() {
            out.push_str(m.as_str());
            tail.extend(m.as_str());
        } else {
            removed += 1;
        }
        last = m.end();
    }
    out.push_str(&script[last..]);
    (out, removed)
}

/// Strip citation markers from inline JavaScript
pub fn remove_citations_from_js(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();

    if !fix {
        for block in inline_scripts(html) {
            let (_, found) = strip_citations(block.content);
            if found > 0 {
                ledger.push(
                    Issue::unfixed(
                        IssueKind::CitationRemoval,
                        format!("Found {} citation marker(s) in JavaScript code", found),
                    )
                    .at(LOCATION),
                );
            }
        }
        return PassOutput::unchanged(html, ledger);
    }

    let rewritten = rewrite_scripts(html, |block| {
        let (cleaned, removed) = strip_citations(block.content);
        if removed == 0 {
            return None;
        }
        ledger.push(
            Issue::fixed(
                IssueKind::CitationRemoval,
                format!("Removed {} citation marker(s) from JavaScript code", removed),
            )
            .at(LOCATION),
        );
        Some(cleaned)
    });

    PassOutput::with_rewrite(html, rewritten, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    #[test]
    fn test_strips_markers_from_script_only() {
        let html = "<p>Paris is large [1].</p>\n<script>// Population figure [1]\nconst pop = 2100000; [citation needed]\n</script>";
        let output = remove_citations_from_js(html, true);

        assert_eq!(
            output.html,
            "<p>Paris is large [1].</p>\n<script>// Population figure \nconst pop = 2100000; [citation needed]\n</script>"
        );
        assert_eq!(output.ledger.issues().len(), 1);
        assert_eq!(
            output.ledger.issues()[0].description,
            "Removed 1 citation marker(s) from JavaScript code"
        );
    }

    #[test]
    fn test_code_positions_are_kept() {
        let script = "const a = items[1]; const b = f()[2]; const c = [3];\n\
                      let [ref] = pair; return [1]; x = m[ref]; y = \"s\"[0];";
        let (cleaned, removed) = strip_citations(script);
        assert_eq!(cleaned, script);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_prose_positions_are_removed() {
        let (cleaned, removed) =
            strip_citations("// Tokyo is the largest city [1][2] [ref: census]\nrun();");
        assert_eq!(cleaned, "// Tokyo is the largest city  \nrun();");
        assert_eq!(removed, 3);
    }

    #[test]
    fn test_long_marker_runs_stay_linear() {
        let n = 100_000;
        let script = format!("// x{}{}", " ".repeat(n), "[1]".repeat(n));

        let started = Instant::now();
        let (cleaned, removed) = strip_citations(&script);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(removed, n);
        assert_eq!(cleaned, format!("// x{}", " ".repeat(n)));
    }

    #[test]
    fn test_keyword_before_whitespace_run() {
        let (cleaned, removed) = strip_citations("return   [1]; // done   [2]");
        assert_eq!(cleaned, "return   [1]; // done   ");
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let html = "<script>const note = \"largest [1] [2]\";</script>";
        let first = remove_citations_from_js(html, true);
        let second = remove_citations_from_js(&first.html, true);

        assert!(first.is_modified());
        assert!(!second.is_modified());
        assert!(second.ledger.is_empty());
    }

    #[test]
    fn test_data_blocks_untouched() {
        let html = r#"<script type="application/json">{"note": "see [1]"}</script>"#;
        assert!(!remove_citations_from_js(html, true).is_modified());
    }

    #[test]
    fn test_detect_only_counts_per_block() {
        let html = "<script>// a [1]\n</script><script>// b [2] [3]\n</script>";
        let output = remove_citations_from_js(html, false);

        assert!(!output.is_modified());
        let descriptions: Vec<_> = output
            .ledger
            .issues()
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Found 1 citation marker(s) in JavaScript code",
                "Found 2 citation marker(s) in JavaScript code"
            ]
        );
    }
}
