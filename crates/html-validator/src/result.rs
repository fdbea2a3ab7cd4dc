use serde::{Deserialize, Serialize};

use crate::issue::Issue;
use crate::report;

/// Outcome of one validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Document after all passes (identical to the input when not fixing)
    pub html: String,
    /// Issues in pass order, then occurrence order
    pub issues: Vec<Issue>,
    /// Advisory warnings in the order they were raised
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn fixed_count(&self) -> usize {
        self.issues.iter().filter(|i| i.fixed).count()
    }

    pub fn needs_attention_count(&self) -> usize {
        self.issues.iter().filter(|i| !i.fixed).count()
    }

    /// Markdown summary of the issues and warnings
    pub fn to_text(&self) -> String {
        report::render_summary(self)
    }

    /// The validated document wrapped in a fenced code block
    pub fn html_section(&self) -> String {
        report::render_html_section(&self.html)
    }
}
