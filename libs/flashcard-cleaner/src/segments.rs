//! Splitting a back field into definition segments.
//!
//! Numbered definitions (`1. ...<br><br>2. ...`) take priority; otherwise a
//! legacy `<br>Or, ` separator splits the text; otherwise the whole field is a
//! single segment.

use lazy_static::lazy_static;
use regex::Regex;

use crate::markup::DOUBLE_BREAK;

lazy_static! {
    static ref NUMBER_PREFIX: Regex = Regex::new(r"^\d+\.\s").unwrap();
    static ref STRIP_NUMBER: Regex = Regex::new(r"^\d+\.\s*").unwrap();
    static ref OR_SEPARATOR: Regex = Regex::new(r"(?i)<br>\s*Or,\s*").unwrap();
}

/// Extract definition bodies in their original order, numbering removed.
pub fn extract(back: &str) -> Vec<String> {
    let numbered = split_numbered(back);
    if numbered.len() > 1 {
        return numbered
            .into_iter()
            .map(|part| STRIP_NUMBER.replace(part.trim(), "").into_owned())
            .filter(|part| !part.is_empty())
            .collect();
    }

    let alternatives: Vec<&str> = OR_SEPARATOR.split(back).collect();
    if alternatives.len() > 1 {
        return alternatives
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }

    let whole = back.trim();
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole.to_string()]
    }
}

/// Split at every double break that is directly followed by `N. `.
fn split_numbered(back: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(offset) = back[search..].find(DOUBLE_BREAK) {
        let at = search + offset;
        let after = at + DOUBLE_BREAK.len();
        if NUMBER_PREFIX.is_match(&back[after..]) {
            parts.push(&back[start..at]);
            start = after;
            search = after;
        } else {
            // `<` is ASCII, so one byte on is still a char boundary.
            search = at + 1;
        }
    }
    parts.push(&back[start..]);
    parts
}

/// Prefix each segment with its number and join them with a blank line.
pub fn join_numbered(segments: &[String]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join(DOUBLE_BREAK)
}
