//! Text-level markup helpers shared by the passes
//!
//! Nothing here builds a tree. Insertion points and script blocks are found
//! with regular expressions, which is approximate by nature: a `<head>`
//! inside a comment or a `</script>` inside a string literal will fool them.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head\b[^>]*>").unwrap();
    static ref HEAD_CLOSE: Regex = Regex::new(r"(?i)</head\s*>").unwrap();
    static ref BODY_OPEN: Regex = Regex::new(r"(?i)<body\b[^>]*>").unwrap();
    static ref SCRIPT_BLOCK: Regex =
        Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap();
    static ref SCRIPT_TYPE: Regex =
        Regex::new(r#"(?i)\btype\s*=\s*["']?([^"'\s>]+)"#).unwrap();
    static ref SCRIPT_SRC: Regex = Regex::new(r"(?i)\bsrc\s*=").unwrap();
    static ref CLASS_ATTR: Regex =
        Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// Where a snippet was injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    Head,
    Body,
}

impl InsertionPoint {
    /// Location hint reported on issues
    pub fn location(&self) -> &'static str {
        match self {
            InsertionPoint::Head => "<head>",
            InsertionPoint::Body => "<body>",
        }
    }
}

fn insert_at(html: &str, at: usize, snippet: &str) -> String {
    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..at]);
    out.push_str(snippet);
    out.push_str(&html[at..]);
    out
}

/// Insert `snippet` on its own line right after the `<head>` open tag
pub fn insert_after_head_open(html: &str, snippet: &str) -> Option<String> {
    let tag = HEAD_OPEN.find(html)?;
    Some(insert_at(html, tag.end(), &format!("\n{}", snippet)))
}

/// Insert `snippet` right before `</head>`, falling back to right after the
/// `<body>` open tag when the document has no head
pub fn insert_into_head_or_body(html: &str, snippet: &str) -> Option<(String, InsertionPoint)> {
    if let Some(tag) = HEAD_CLOSE.find(html) {
        return Some((insert_at(html, tag.start(), snippet), InsertionPoint::Head));
    }
    let tag = BODY_OPEN.find(html)?;
    Some((insert_at(html, tag.end(), snippet), InsertionPoint::Body))
}

/// Whether the document has a `<head>` open tag
pub fn has_head(html: &str) -> bool {
    HEAD_OPEN.is_match(html)
}

/// An inline or external `<script>` element
#[derive(Debug, Clone)]
pub struct ScriptBlock<'a> {
    /// Raw attribute text of the open tag
    pub attrs: &'a str,
    /// Text between the open and close tags
    pub content: &'a str,
    /// Byte range of `content` within the document
    pub content_range: Range<usize>,
}

impl ScriptBlock<'_> {
    /// Value of the `type` attribute, lowercased
    pub fn script_type(&self) -> Option<String> {
        SCRIPT_TYPE
            .captures(self.attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
    }

    /// Whether the block holds JavaScript (classic or module), as opposed to
    /// JSON, templates or other data blocks
    pub fn is_javascript(&self) -> bool {
        match self.script_type() {
            None => true,
            Some(t) => matches!(
                t.as_str(),
                "module" | "text/javascript" | "application/javascript" | "text/ecmascript"
            ),
        }
    }

    /// Whether the block is an ES module, where top-level `await` is legal
    pub fn is_module(&self) -> bool {
        self.script_type().as_deref() == Some("module")
    }

    /// Whether the block loads its code from a `src` URL
    pub fn is_external(&self) -> bool {
        SCRIPT_SRC.is_match(self.attrs)
    }
}

/// All `<script>` blocks in document order
pub fn script_blocks(html: &str) -> impl Iterator<Item = ScriptBlock<'_>> {
    SCRIPT_BLOCK.captures_iter(html).filter_map(|caps| {
        let attrs = caps.get(1)?;
        let content = caps.get(2)?;
        Some(ScriptBlock {
            attrs: attrs.as_str(),
            content: content.as_str(),
            content_range: content.range(),
        })
    })
}

/// Inline JavaScript blocks with non-empty content
pub fn inline_scripts(html: &str) -> impl Iterator<Item = ScriptBlock<'_>> {
    script_blocks(html)
        .filter(|b| b.is_javascript() && !b.is_external() && !b.content.trim().is_empty())
}

/// Rewrite the content of selected script blocks, leaving all other text
/// untouched. `rewrite` returns `None` to keep a block as is.
pub fn rewrite_scripts<F>(html: &str, mut rewrite: F) -> Option<String>
where
    F: FnMut(&ScriptBlock<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut changed = false;

    for block in inline_scripts(html) {
        if let Some(new_content) = rewrite(&block) {
            out.push_str(&html[last..block.content_range.start]);
            out.push_str(&new_content);
            last = block.content_range.end;
            changed = true;
        }
    }

    if !changed {
        return None;
    }
    out.push_str(&html[last..]);
    Some(out)
}

/// Class tokens from every `class` attribute in `text`, in order
pub fn class_tokens(text: &str) -> Vec<&str> {
    CLASS_ATTR
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .flat_map(|m| m.as_str().split_whitespace())
        .collect()
}
