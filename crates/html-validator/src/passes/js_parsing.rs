//! JavaScript syntax hazards in inline scripts
//!
//! Only the missing semicolon before an IIFE is rewritten. Unclosed template
//! literals and misplaced `await` need a human: guessing where a literal was
//! meant to end, or which function should become `async`, would change what
//! the page does.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use super::PassOutput;
use crate::issue::{Issue, IssueKind, IssueLedger};
use crate::markup::{inline_scripts, rewrite_scripts, ScriptBlock};

lazy_static! {
    /// A line ending in an expression-like token, followed by `(function`
    static ref IIFE_AFTER_EXPRESSION: Regex =
        Regex::new(r#"([A-Za-z0-9_$]+|[)\]"'`])([ \t]*)(\r?\n)(\s*)\(function\b"#).unwrap();
    static ref CONTROL_HEADER: Regex =
        Regex::new(r"^\s*(?:\}\s*)?(?:else\s+)?(?:if|for|while|with)\s*\(").unwrap();
    static ref JSON_PARSE_IDENT: Regex =
        Regex::new(r"JSON\.parse\(\s*[A-Za-z_$][A-Za-z0-9_$]*\s*\)").unwrap();
}

/// Words after which a newline already ends the statement, or where an
/// inserted `;` would detach the IIFE from the construct it belongs to.
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "else", "do", "try", "finally", "yield", "await", "typeof", "void", "new",
    "delete", "throw", "case", "in", "of",
];

const LOCATION: &str = "<script>";

/// Detect template literal, IIFE and `await` hazards; insert the missing
/// semicolon before IIFEs when `fix` is set
pub fn fix_javascript_errors(html: &str, fix: bool) -> PassOutput<'_> {
    let mut ledger = IssueLedger::new();

    for block in inline_scripts(html) {
        if has_unbalanced_backticks(block.content) {
            ledger.push(
                Issue::unfixed(
                    IssueKind::JsParsing,
                    "Possible unclosed template literal detected",
                )
                .at(LOCATION),
            );
        }
    }

    let mut iife_fixes = 0;
    let rewritten = if fix {
        rewrite_scripts(html, |block| {
            let (content, count) = insert_iife_semicolons(block.content);
            iife_fixes += count;
            (count > 0).then_some(content)
        })
    } else {
        for block in inline_scripts(html) {
            for _ in 0..missing_iife_semicolons(block.content) {
                ledger.push(
                    Issue::unfixed(IssueKind::JsParsing, "Missing semicolon before IIFE")
                        .at(LOCATION),
                );
            }
        }
        None
    };
    for _ in 0..iife_fixes {
        ledger.push(
            Issue::fixed(IssueKind::JsParsing, "Added missing semicolon before IIFE").at(LOCATION),
        );
    }

    for block in inline_scripts(html) {
        check_await(&block, &mut ledger);

        for m in JSON_PARSE_IDENT.find_iter(block.content) {
            debug!(call = m.as_str(), "JSON.parse on an identifier, not checked");
        }
    }

    PassOutput::with_rewrite(html, rewritten, ledger)
}

/// Odd number of unescaped backticks
fn has_unbalanced_backticks(script: &str) -> bool {
    let mut count = 0;
    let mut escaped = false;
    for c in script.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '`' => count += 1,
            _ => {}
        }
    }
    count % 2 == 1
}

/// `if (..)`, `for (..)`, `while (..)` or `with (..)` with nothing after
/// the closing paren
fn is_control_header(line: &str) -> bool {
    let Some(open) = CONTROL_HEADER.find(line) else {
        return false;
    };
    let mut depth = 1usize;
    for (i, c) in line[open.end()..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return open.end() + i + 1 == line.len();
                }
            }
            _ => {}
        }
    }
    false
}

/// Whether `line` has a `//` comment outside string literals
fn has_line_comment(line: &str) -> bool {
    let src = line.as_bytes();
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'"' | b'\'' | b'`' => i = skip_string(src, i),
            b'/' if src.get(i + 1) == Some(&b'/') => return true,
            _ => i += 1,
        }
    }
    false
}

/// A match needs a semicolon unless its token is a keyword, closes a
/// control-flow header the IIFE belongs to, or sits inside a line comment
fn is_candidate(script: &str, caps: &Captures<'_>) -> bool {
    let Some(token) = caps.get(1) else {
        return false;
    };
    if STATEMENT_KEYWORDS.contains(&token.as_str()) {
        return false;
    }
    let line_start = script[..token.start()].rfind('\n').map_or(0, |at| at + 1);
    let line = &script[line_start..token.end()];
    !is_control_header(line) && !has_line_comment(line)
}

fn missing_iife_semicolons(script: &str) -> usize {
    IIFE_AFTER_EXPRESSION
        .captures_iter(script)
        .filter(|caps| is_candidate(script, caps))
        .count()
}

fn insert_iife_semicolons(script: &str) -> (String, usize) {
    let mut count = 0;
    let out = IIFE_AFTER_EXPRESSION.replace_all(script, |caps: &Captures<'_>| {
        if is_candidate(script, caps) {
            count += 1;
            format!("{};{}{}{}(function", &caps[1], &caps[2], &caps[3], &caps[4])
        } else {
            caps[0].to_string()
        }
    });
    (out.into_owned(), count)
}

/// Walk a classic script tracking brace scopes and report each `await`
/// that is not inside an `async` function, method or arrow.
///
/// A `{` opens an async scope when the code since the previous `;`, `{` or
/// `}` mentions `async`; a non-async scope when it mentions `function` or
/// `=>`; otherwise it inherits its parent. Strings and comments are skipped.
fn check_await(block: &ScriptBlock<'_>, ledger: &mut IssueLedger) {
    if block.is_module() {
        return;
    }

    let src = block.content.as_bytes();
    let mut scopes: Vec<bool> = Vec::new();
    let mut segment = Segment::default();
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(src, i);
                continue;
            }
            b'/' if src.get(i + 1) == Some(&b'/') => {
                while i < src.len() && src[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if src.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < src.len() && !(src[i] == b'*' && src[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            b'=' if src.get(i + 1) == Some(&b'>') => {
                segment.has_arrow = true;
                i += 2;
                continue;
            }
            b'{' => {
                let inherited = scopes.last().copied().unwrap_or(false);
                let is_async = if segment.has_async {
                    true
                } else if segment.has_function || segment.has_arrow {
                    false
                } else {
                    inherited
                };
                scopes.push(is_async);
                segment = Segment::default();
            }
            b'}' => {
                scopes.pop();
                segment = Segment::default();
            }
            b';' => segment = Segment::default(),
            b if is_ident_byte(b) => {
                let end = ident_end(src, i);
                match &src[i..end] {
                    b"async" => segment.has_async = true,
                    b"function" => segment.has_function = true,
                    b"await" => {
                        let in_async = segment.has_async || scopes.last().copied().unwrap_or(false);
                        if !in_async {
                            ledger.push(
                                Issue::unfixed(
                                    IssueKind::JsParsing,
                                    "Possible 'await' used outside async function",
                                )
                                .at(LOCATION),
                            );
                        }
                    }
                    _ => {}
                }
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
}

/// Keywords seen since the last `;`, `{` or `}`
#[derive(Debug, Default)]
struct Segment {
    has_async: bool,
    has_function: bool,
    has_arrow: bool,
}

fn ident_end(src: &[u8], start: usize) -> usize {
    src[start..]
        .iter()
        .position(|b| !is_ident_byte(*b))
        .map_or(src.len(), |len| start + len)
}

/// Index just past the string literal starting at `start`
fn skip_string(src: &[u8], start: usize) -> usize {
    let quote = src[start];
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            b'\n' if quote != b'`' => return i,
            _ => i += 1,
        }
    }
    src.len()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
