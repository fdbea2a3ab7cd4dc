//! Third-party API misconfiguration
//!
//! Everything here is advisory: the right fix (a real key, a hosted
//! backend, a different map library) is a decision for the page author.

use lazy_static::lazy_static;
use regex::Regex;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::patterns::{contains_any, preview, KEYLESS_MAP_LIBRARIES};

lazy_static! {
    static ref GOOGLE_MAPS_URL: Regex =
        Regex::new(r#"(?i)(?:https?:)?//maps\.googleapis\.com/[^"'\s<>]*"#).unwrap();
    static ref RELATIVE_FETCH: Regex =
        Regex::new(r#"fetch\s*\(\s*['"`]((?:\.{1,2})?/[^'"`\s]*)"#).unwrap();
    static ref LOOPBACK_WEBSOCKET: Regex =
        Regex::new(r"(?i)wss?://(?:localhost|127\.0\.0\.1|\[::1\])(?::\d+)?[^'\x22`\s<>]*").unwrap();
}

/// Report keyless Google Maps, relative fetches and loopback WebSockets
pub fn check_api_issues(html: &str, _fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();

    if !html.contains("GOOGLE_MAPS_API_KEY") {
        let keyless: Vec<&str> = GOOGLE_MAPS_URL
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|url| !url.contains("key="))
            .collect();
        for url in &keyless {
            ledger.push(
                Issue::unfixed(IssueKind::ApiIssue, "Google Maps API used without API key")
                    .at(preview(url, 80)),
            );
        }
        if !keyless.is_empty() {
            ledger.warn(
                "Google Maps API requires an API key. Add ?key=YOUR_API_KEY to the script URL.",
            );
        }
    }

    if html.contains("google.maps") && !contains_any(html, KEYLESS_MAP_LIBRARIES) {
        ledger.warn(
            "Consider using Leaflet with OpenStreetMap for maps that don't require an API key.",
        );
    }

    for caps in RELATIVE_FETCH.captures_iter(html) {
        let url = &caps[1];
        if url.starts_with("//") {
            continue;
        }
        ledger.push(Issue::unfixed(
            IssueKind::ApiIssue,
            format!(
                "Fetch to relative URL detected ({}) - may not work in standalone HTML",
                preview(url, 80)
            ),
        ));
    }

    for m in LOOPBACK_WEBSOCKET.find_iter(html) {
        ledger.push(Issue::unfixed(
            IssueKind::ApiIssue,
            format!(
                "WebSocket connection to localhost ({}) - will only work during development",
                preview(m.as_str(), 80)
            ),
        ));
    }

    PassOutput::unchanged(html, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptions(output: &PassOutput<'_>) -> Vec<String> {
        output
            .ledger
            .issues()
            .iter()
            .map(|i| i.description.clone())
            .collect()
    }

    #[test]
    fn test_google_maps_without_key() {
        let html = r#"<script src="https://maps.googleapis.com/maps/api/js?callback=initMap"></script>
<script>new google.maps.Map(el, {});</script>"#;
        let output = check_api_issues(html, true);

        assert_eq!(descriptions(&output), vec!["Google Maps API used without API key"]);
        assert_eq!(
            output.ledger.warnings(),
            &[
                "Google Maps API requires an API key. Add ?key=YOUR_API_KEY to the script URL."
                    .to_string(),
                "Consider using Leaflet with OpenStreetMap for maps that don't require an API key."
                    .to_string(),
            ]
        );
        assert!(!output.is_modified());
    }

    #[test]
    fn test_google_maps_with_key_or_env_reference() {
        let keyed = r#"<script src="https://maps.googleapis.com/maps/api/js?key=abc"></script>"#;
        assert!(check_api_issues(keyed, true).ledger.issues().is_empty());

        let templated = r#"<script src="https://maps.googleapis.com/maps/api/js"></script><!-- GOOGLE_MAPS_API_KEY -->"#;
        assert!(check_api_issues(templated, true).ledger.issues().is_empty());
    }

    #[test]
    fn test_leaflet_suppresses_map_suggestion() {
        let html = "<script src=\"leaflet.js\"></script><script>// not google.maps</script>";
        assert!(check_api_issues(html, true).ledger.warnings().is_empty());
    }

    #[test]
    fn test_relative_fetch() {
        let html = r#"<script>fetch('./data.json'); fetch("/api/items"); fetch(`../up`);
fetch('https://api.example.org/x'); fetch('//cdn.example.org/y');</script>"#;
        let output = check_api_issues(html, false);
        assert_eq!(
            descriptions(&output),
            vec![
                "Fetch to relative URL detected (./data.json) - may not work in standalone HTML",
                "Fetch to relative URL detected (/api/items) - may not work in standalone HTML",
                "Fetch to relative URL detected (../up) - may not work in standalone HTML",
            ]
        );
    }

    #[test]
    fn test_loopback_websocket() {
        let html = "<script>new WebSocket('ws://localhost:8080/feed'); new WebSocket('wss://127.0.0.1');\nnew WebSocket('wss://stream.example.org');</script>";
        let output = check_api_issues(html, true);
        assert_eq!(
            descriptions(&output),
            vec![
                "WebSocket connection to localhost (ws://localhost:8080/feed) - will only work during development",
                "WebSocket connection to localhost (wss://127.0.0.1) - will only work during development",
            ]
        );
    }
}
