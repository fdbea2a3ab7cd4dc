//! Issue ledger types
//!
//! Every pass reports what it found as [`Issue`]s (structured findings) and
//! free-text warnings, collected into an [`IssueLedger`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed catalogue of defect kinds, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Template API keys left in the document
    ApiKeyPlaceholder,
    /// No global error handler installed
    ErrorDetection,
    /// JavaScript syntax hazards
    JsParsing,
    /// Tailwind classes or directives without the framework
    CssDirective,
    /// Nested full-viewport sizing
    CircularDependency,
    /// Unescaped characters in attribute values
    HtmlEscaping,
    /// Citation markers inside script code
    CitationRemoval,
    /// Third-party API misconfiguration
    ApiIssue,
    /// Fabricated asset URLs and missing icon fonts
    HallucinatedAsset,
}

impl IssueKind {
    /// All kinds, in the order the pipeline runs their passes
    pub const ALL: [IssueKind; 9] = [
        IssueKind::ApiKeyPlaceholder,
        IssueKind::ErrorDetection,
        IssueKind::JsParsing,
        IssueKind::CssDirective,
        IssueKind::CircularDependency,
        IssueKind::HtmlEscaping,
        IssueKind::CitationRemoval,
        IssueKind::ApiIssue,
        IssueKind::HallucinatedAsset,
    ];

    /// Wire name of the kind (e.g. `api_key_placeholder`)
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ApiKeyPlaceholder => "api_key_placeholder",
            IssueKind::ErrorDetection => "error_detection",
            IssueKind::JsParsing => "js_parsing",
            IssueKind::CssDirective => "css_directive",
            IssueKind::CircularDependency => "circular_dependency",
            IssueKind::HtmlEscaping => "html_escaping",
            IssueKind::CitationRemoval => "citation_removal",
            IssueKind::ApiIssue => "api_issue",
            IssueKind::HallucinatedAsset => "hallucinated_asset",
        }
    }

    /// One-line summary of what the pass for this kind does
    pub fn summary(&self) -> &'static str {
        match self {
            IssueKind::ApiKeyPlaceholder => "Warns about placeholder API keys",
            IssueKind::ErrorDetection => "Injects error reporting JavaScript",
            IssueKind::JsParsing => "Fixes common JS parsing issues",
            IssueKind::CssDirective => "Ensures Tailwind CDN is included",
            IssueKind::CircularDependency => "Detects problematic sizing patterns",
            IssueKind::HtmlEscaping => "Fixes unescaped characters in attributes",
            IssueKind::CitationRemoval => "Removes citation markers from JS code",
            IssueKind::ApiIssue => "Warns about API configuration issues",
            IssueKind::HallucinatedAsset => "Detects hallucinated asset URLs, adds icon CDNs",
        }
    }

    /// Position of this kind's pass in the pipeline (0-based)
    pub fn position(&self) -> usize {
        IssueKind::ALL
            .iter()
            .position(|k| k == self)
            .unwrap_or(IssueKind::ALL.len())
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Kind of defect
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Human-readable explanation
    pub description: String,
    /// Whether the document was rewritten to remedy this occurrence
    pub fixed: bool,
    /// Where in the document the issue lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Issue {
    /// An issue the pass remedied
    pub fn fixed(kind: IssueKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            fixed: true,
            location: None,
        }
    }

    /// An issue left for manual attention
    pub fn unfixed(kind: IssueKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            fixed: false,
            location: None,
        }
    }

    /// Set the location hint
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Ordered collection of issues and warnings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueLedger {
    issues: Vec<Issue>,
    warnings: Vec<String>,
}

impl IssueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Record a warning
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Move everything from `other` to the end of this ledger
    pub fn append(&mut self, other: IssueLedger) {
        self.issues.extend(other.issues);
        self.warnings.extend(other.warnings);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Issue>, Vec<String>) {
        (self.issues, self.warnings)
    }
}
