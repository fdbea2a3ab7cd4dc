//! Detection and repair of common defects in LLM-generated HTML
//!
//! Nine passes run in a fixed order over the raw document text. Each one
//! recognizes a single family of defects with conservative regular
//! expressions and, when fixing is enabled, applies a targeted rewrite.
//! There is no DOM: a `<head>` inside a comment or `</script>` inside a
//! string will mislead the passes, and they are written to miss a defect
//! rather than damage a working page.
//!
//! ```
//! use html_validator::{validate_html, IssueKind};
//!
//! let result = validate_html(r#"<a href="x?a=1&b=2">x</a>"#, true);
//! assert_eq!(result.html, r#"<a href="x?a=1&amp;b=2">x</a>"#);
//! assert!(result.issues.iter().any(|i| i.kind == IssueKind::HtmlEscaping && i.fixed));
//! ```

pub mod issue;
pub mod markup;
pub mod passes;
pub mod patterns;
pub mod pipeline;
pub mod report;
pub mod result;

pub use issue::{Issue, IssueKind, IssueLedger};
pub use result::ValidationResult;

/// HtmlValidator entry point
#[derive(Debug, Clone, Copy)]
pub struct HtmlValidator {
    fix: bool,
}

impl HtmlValidator {
    /// A validator that applies fixes
    pub fn new() -> Self {
        Self { fix: true }
    }

    /// A validator that only reports and never rewrites the document
    pub fn detect_only() -> Self {
        Self { fix: false }
    }

    pub fn fixes(&self) -> bool {
        self.fix
    }

    pub fn validate(&self, html: &str) -> ValidationResult {
        pipeline::run(html, self.fix)
    }
}

impl Default for HtmlValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `html`, applying fixes when `fix` is set
pub fn validate_html(html: &str, fix: bool) -> ValidationResult {
    pipeline::run(html, fix)
}
