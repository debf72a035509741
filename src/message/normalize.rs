//! Normalization of arbitrary backend output into a Conventional Commit.
//!
//! Backends return free-form text: fenced, prefixed with commentary, wrapped
//! in tables, or empty. This module repairs all of it — it never rejects.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::message::CommitMessage;

/// Grammar and length constraints applied during normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Title ceiling in bytes; longer titles are hard-truncated.
    pub max_title: usize,
    /// Body wrap column.
    pub max_body: usize,
    /// Accepted Conventional Commit types, matched case-insensitively.
    pub types: Vec<String>,
    /// Prepended when the chosen title has no accepted type.
    pub default_type: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_title: super::MAX_TITLE_LEN,
            max_body: super::MAX_BODY_LINE_LEN,
            types: super::ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            default_type: super::DEFAULT_TYPE.to_string(),
        }
    }
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid fence pattern"));

static ENUMERATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid enumeration pattern"));

static LEADING_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)(\([^)]+\))?:").expect("valid type pattern"));

/// Convert raw backend output (or silence) into a message satisfying the
/// Conventional Commit grammar and the length limits in `opt`.
///
/// Blank input yields `"<default_type>: update"`; this function never fails.
pub fn normalize(raw: &str, opt: &NormalizeOptions) -> CommitMessage {
    let msg = strip_noise(raw.trim());

    let title_re = title_regex(&opt.types);
    let lines: Vec<&str> = msg.split('\n').collect();

    // Prefer the first line that already reads as a Conventional Commit
    // title; otherwise fall back to the first non-blank line.
    let mut title_idx: Option<usize> = None;
    let mut title = String::new();
    for (i, line) in lines.iter().enumerate() {
        let l = line.trim();
        if l.is_empty() {
            continue;
        }
        if title_re.is_match(l) {
            title_idx = Some(i);
            title = l.to_string();
            break;
        }
    }
    if title_idx.is_none() {
        for line in &lines {
            let l = line.trim();
            if !l.is_empty() {
                title = l.to_string();
                break;
            }
        }
    }
    if title.is_empty() {
        return CommitMessage::title_only(format!("{}: update", opt.default_type));
    }

    let ty = leading_type(&title);
    if !contains_type(&opt.types, &ty) {
        title = format!("{}: {}", opt.default_type, title);
    }
    title = truncate_bytes(&title, opt.max_title);

    let mut body_lines: Vec<String> = Vec::new();
    if let Some(idx) = title_idx {
        for line in lines.iter().skip(idx + 1) {
            let t = line.trim();
            if t.is_empty() {
                body_lines.push(String::new());
                continue;
            }
            // Drop tables, numbered instructions, and prompt echo.
            if t.starts_with('|') || ENUMERATION_RE.is_match(t) {
                continue;
            }
            let lower = t.to_lowercase();
            if lower.contains("conventional commit")
                && (lower.contains("generate") || lower.contains("steps"))
            {
                continue;
            }
            body_lines.push(t.to_string());
        }
    }

    let body = wrap_lines(&body_lines.join("\n"), opt.max_body);
    let body = body.trim().to_string();

    if body.is_empty() {
        CommitMessage::title_only(title)
    } else {
        CommitMessage {
            title,
            body: Some(body),
        }
    }
}

/// Remove fenced code blocks and markdown table rows the backend added
/// against instructions.
fn strip_noise(s: &str) -> String {
    let s = FENCE_RE.replace_all(s, "");
    s.trim()
        .split('\n')
        .filter(|line| !line.trim().starts_with('|'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn title_regex(types: &[String]) -> Regex {
    let alternatives = types
        .iter()
        .map(|t| regex_escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^({alternatives})(\([^)]+\))?:\s+.+$"))
        .expect("valid title pattern")
}

fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

fn leading_type(title: &str) -> String {
    let lower = title.to_lowercase();
    match LEADING_TYPE_RE.captures(&lower) {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
        None => String::new(),
    }
}

fn contains_type(types: &[String], ty: &str) -> bool {
    let ty = ty.trim().to_lowercase();
    types.iter().any(|t| t.to_lowercase() == ty)
}

/// Hard truncation at `max` bytes, floored to a char boundary.
fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Word-wrap each line to `width` byte columns: break at the last space
/// at-or-before the limit, hard-break when a token has no space. Blank lines
/// survive as paragraph breaks.
pub(crate) fn wrap_lines(s: &str, width: usize) -> String {
    if width == 0 {
        return s.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    for line in s.split('\n') {
        let mut rest = line;
        while rest.len() > width {
            let limit = floor_char_boundary(rest, width);
            let break_at = match rest.as_bytes()[..limit].iter().rposition(|&b| b == b' ') {
                Some(pos) if pos > 0 => pos + 1,
                _ => limit.max(first_char_len(rest)),
            };
            out.push(rest[..break_at].trim_end().to_string());
            rest = rest[break_at..].trim_start();
        }
        out.push(rest.to_string());
    }
    out.join("\n")
}

fn floor_char_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn first_char_len(s: &str) -> usize {
    s.chars().next().map_or(0, |c| c.len_utf8())
}
