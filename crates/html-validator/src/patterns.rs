//! Pattern catalogue: the fixed recognizers and the snippets passes inject
//!
//! Recognizers are deliberately conservative. A missed defect costs less
//! than a rewrite that breaks a working page.

/// API key placeholder recognizers (case-insensitive)
pub const API_KEY_PLACEHOLDERS: &[&str] = &[
    r"(?i)YOUR[-_]?API[-_]?KEY",
    r"(?i)API[-_]?KEY[-_]?HERE",
    r"(?i)REPLACE[-_]?WITH[-_]?YOUR[-_]?KEY",
    r"(?i)INSERT[-_]?API[-_]?KEY",
    r"(?i)\[API[-_]?KEY\]",
    r"(?i)<API[-_]?KEY>",
];

/// Shape of a Google API key, flagged because generated pages only ever
/// contain copied example values
pub const GOOGLE_API_KEY_SHAPE: &str = r"AIza[A-Za-z0-9_-]{35}";

/// Markers of an existing global error handler
pub const ERROR_HANDLER_MARKERS: &str = r#"window\.onerror|addEventListener\(\s*['"`]error['"`]"#;

/// Error reporting snippet injected when no handler exists
pub const ERROR_HANDLER_SNIPPET: &str = r#"
<script>
  // Error reporting added by html-validator
  window.onerror = function(msg, url, lineNo, columnNo, error) {
    console.error('Page Error:', { msg, url, lineNo, columnNo, error });
    return false;
  };
  window.addEventListener('unhandledrejection', function(event) {
    console.error('Unhandled Promise Rejection:', event.reason);
  });
</script>
"#;

/// Hosted Tailwind build
pub const TAILWIND_CDN_SCRIPT: &str = r#"<script src="https://cdn.tailwindcss.com"></script>"#;

/// Substrings that show Tailwind (or another utility framework) is already loaded
pub const CSS_FRAMEWORK_MARKERS: &[&str] = &["tailwindcss", "tailwind.min.css", "bootstrap", "bulma"];

/// Tailwind utility class shapes, matched against a single class token with
/// variant prefixes (`md:`, `hover:`) and the important/negative markers removed
pub const TAILWIND_UTILITY: &str = r"^(?:flex|grid|[pm][xytrbl]?-(?:\d+(?:\.5)?|px|auto|\[[^\]]+\])|(?:flex|grid|bg|text|font|w|h|min-w|min-h|max-w|max-h|gap|space-[xy]|rounded|shadow|items|justify)-[A-Za-z0-9./\[\]#%_-]+)$";

/// Classes that claim the full viewport along one axis
pub const FULL_VIEWPORT_CLASSES: &[&str] = &["w-full", "h-screen"];

/// Hosted Font Awesome stylesheet
pub const FONT_AWESOME_STYLESHEET: &str = r#"<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">"#;

/// Substrings that show an icon library is already referenced
pub const ICON_LIBRARY_MARKERS: &[&str] = &["heroicons", "fontawesome", "font-awesome", "lucide"];

/// Substrings that show Font Awesome specifically is already referenced
pub const FONT_AWESOME_MARKERS: &[&str] = &["fontawesome", "font-awesome"];

/// Map libraries that need no API key
pub const KEYLESS_MAP_LIBRARIES: &[&str] = &["leaflet", "openlayers"];

/// Case-insensitive substring test against a list of markers
pub fn contains_any(html: &str, markers: &[&str]) -> bool {
    let lower = html.to_lowercase();
    markers.iter().any(|m| lower.contains(&m.to_lowercase()))
}

/// Truncate a matched snippet for embedding in an issue description
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_all_catalogue_patterns_compile() {
        for pattern in API_KEY_PLACEHOLDERS {
            assert!(Regex::new(pattern).is_ok(), "bad pattern {}", pattern);
        }
        assert!(Regex::new(GOOGLE_API_KEY_SHAPE).is_ok());
        assert!(Regex::new(ERROR_HANDLER_MARKERS).is_ok());
        assert!(Regex::new(TAILWIND_UTILITY).is_ok());
    }

    #[test]
    fn test_tailwind_utility_shapes() {
        let re = Regex::new(TAILWIND_UTILITY).unwrap();
        for token in ["flex", "grid", "bg-blue-500", "text-xl", "px-4", "mb-2.5", "w-1/2", "gap-2", "justify-between"] {
            assert!(re.is_match(token), "{} should be a utility", token);
        }
        for token in ["card", "navbar", "header-title", "btn", "my-widget"] {
            assert!(!re.is_match(token), "{} should not be a utility", token);
        }
    }

    #[test]
    fn test_contains_any_is_case_insensitive() {
        assert!(contains_any("<LINK href=\"Font-Awesome.css\">", FONT_AWESOME_MARKERS));
        assert!(!contains_any("<p>plain</p>", FONT_AWESOME_MARKERS));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn test_injected_snippets_satisfy_their_own_presence_checks() {
        let handler = Regex::new(ERROR_HANDLER_MARKERS).unwrap();
        assert!(handler.is_match(ERROR_HANDLER_SNIPPET));
        assert!(contains_any(TAILWIND_CDN_SCRIPT, CSS_FRAMEWORK_MARKERS));
        assert!(contains_any(FONT_AWESOME_STYLESHEET, FONT_AWESOME_MARKERS));
    }
}
