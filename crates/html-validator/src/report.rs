//! Result formatter

use std::fmt::Write;

use crate::result::ValidationResult;

/// Render the validation summary.
///
/// ```text
/// ## Validation Complete
///
/// - **Issues found:** 2
/// - **Auto-fixed:** 1
/// - **Needs attention:** 1
///
/// ### Issues
/// - [FIXED] css_directive: Added missing Tailwind CSS CDN (<head>)
/// - [NEEDS ATTENTION] api_issue: Google Maps API used without API key
/// ```
pub fn render_summary(result: &ValidationResult) -> String {
    let mut out = String::from("## Validation Complete\n\n");
    // Writing to a String cannot fail
    let _ = writeln!(out, "- **Issues found:** {}", result.issues.len());
    let _ = writeln!(out, "- **Auto-fixed:** {}", result.fixed_count());
    let _ = writeln!(out, "- **Needs attention:** {}", result.needs_attention_count());

    if !result.warnings.is_empty() {
        out.push_str("\n### Warnings\n");
        for warning in &result.warnings {
            let _ = writeln!(out, "- {}", warning);
        }
    }

    if !result.issues.is_empty() {
        out.push_str("\n### Issues\n");
        for issue in &result.issues {
            let status = if issue.fixed { "FIXED" } else { "NEEDS ATTENTION" };
            let _ = write!(out, "- [{}] {}: {}", status, issue.kind, issue.description);
            if let Some(location) = &issue.location {
                let _ = write!(out, " ({})", location);
            }
            out.push('\n');
        }
    }

    out
}

/// Render the validated document as a fenced `html` block
pub fn render_html_section(html: &str) -> String {
    format!("\n---\n\n### Validated HTML\n\n```html\n{}\n```", html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssueKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_result() {
        let result = ValidationResult {
            html: String::new(),
            issues: vec![],
            warnings: vec![],
        };
        assert_eq!(
            render_summary(&result),
            "## Validation Complete\n\n- **Issues found:** 0\n- **Auto-fixed:** 0\n- **Needs attention:** 0\n"
        );
    }

    #[test]
    fn test_full_report() {
        let result = ValidationResult {
            html: "<p>x</p>".to_string(),
            issues: vec![
                Issue::unfixed(IssueKind::ApiKeyPlaceholder, "Found API key placeholder: \"YOUR_API_KEY\"")
                    .at("Script or attribute"),
                Issue::fixed(IssueKind::CssDirective, "Added missing Tailwind CSS CDN").at("<head>"),
                Issue::unfixed(IssueKind::ApiIssue, "Google Maps API used without API key"),
            ],
            warnings: vec!["Check the key".to_string()],
        };

        let expected = "## Validation Complete\n\n\
- **Issues found:** 3\n\
- **Auto-fixed:** 1\n\
- **Needs attention:** 2\n\
\n### Warnings\n\
- Check the key\n\
\n### Issues\n\
- [NEEDS ATTENTION] api_key_placeholder: Found API key placeholder: \"YOUR_API_KEY\" (Script or attribute)\n\
- [FIXED] css_directive: Added missing Tailwind CSS CDN (<head>)\n\
- [NEEDS ATTENTION] api_issue: Google Maps API used without API key\n";
        assert_eq!(render_summary(&result), expected);
    }

    #[test]
    fn test_html_section() {
        assert_eq!(
            render_html_section("<p>x</p>"),
            "\n---\n\n### Validated HTML\n\n```html\n<p>x</p>\n```"
        );
    }
}
