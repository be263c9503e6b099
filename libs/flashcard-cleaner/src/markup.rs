//! Markup normalization and the small tag vocabulary cards use.
//!
//! Card fields carry a handful of inline constructs: `<i>` emphasis,
//! `<span style="...">` containers, literal `<br>` line breaks and textual
//! character entities. This module decodes entities, flattens invisible
//! spacing characters and rewrites every muted gray color declaration to a
//! single canonical spelling. [`normalize`] is idempotent.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::types::StyledSpan;

/// Literal line-break marker.
pub const LINE_BREAK: &str = "<br>";

/// Two consecutive line breaks, the paragraph separator.
pub const DOUBLE_BREAK: &str = "<br><br>";

/// Canonical muted color declaration.
pub const MUTED_COLOR_DECL: &str = "color: rgb(194, 194, 194)";

const SPAN_CLOSE: &str = "</span>";

lazy_static! {
    static ref SPAN_STYLE_DOUBLE: Regex =
        Regex::new(r#"(?i)<span\b([^>]*?)\bstyle="([^"]*)"([^>]*)>"#).unwrap();
    static ref SPAN_STYLE_SINGLE: Regex =
        Regex::new(r"(?i)<span\b([^>]*?)\bstyle='([^']*)'([^>]*)>").unwrap();
    static ref SPAN_TOKEN: Regex = Regex::new(r"(?is)<span\b[^>]*>.*?</span>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Apply every normalization step to one field.
pub fn normalize(text: &str) -> String {
    let decoded = decode_entities(text);
    let spaced = decoded.replace(['\u{00A0}', '\u{00AD}'], " ");
    canonicalize_muted_spans(&spaced)
}

/// Decode character entities until the text stops changing.
///
/// Doubly-escaped input such as `&amp;gt;` therefore ends up as `>`, which
/// keeps a second normalization pass from finding anything left to decode.
pub fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    while current.contains('&') {
        let next = match html_escape::decode_html_entities(&current) {
            Cow::Borrowed(_) => break,
            Cow::Owned(decoded) => decoded,
        };
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Rewrite muted color declarations on span open tags to the canonical form.
///
/// Other colors and other style properties are left exactly as written.
pub fn canonicalize_muted_spans(text: &str) -> String {
    let pass = SPAN_STYLE_DOUBLE.replace_all(text, |caps: &Captures| rebuild_span_tag(caps, '"'));
    SPAN_STYLE_SINGLE
        .replace_all(&pass, |caps: &Captures| rebuild_span_tag(caps, '\''))
        .into_owned()
}

fn rebuild_span_tag(caps: &Captures, quote: char) -> String {
    match canonical_style(&caps[2]) {
        Some(style) => format!(
            "<span{}style={quote}{style}{quote}{}>",
            &caps[1], &caps[3]
        ),
        None => caps[0].to_string(),
    }
}

fn canonical_style(style: &str) -> Option<String> {
    let declarations: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .collect();

    if !declarations.iter().any(|decl| is_muted_declaration(decl)) {
        return None;
    }

    let rebuilt: Vec<&str> = declarations
        .into_iter()
        .map(|decl| {
            if is_muted_declaration(decl) {
                MUTED_COLOR_DECL
            } else {
                decl
            }
        })
        .collect();
    Some(rebuilt.join("; "))
}

fn is_muted_declaration(declaration: &str) -> bool {
    match declaration.split_once(':') {
        Some((property, value)) => {
            property.trim().eq_ignore_ascii_case("color") && is_muted_value(value)
        }
        None => false,
    }
}

fn is_muted_value(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    compact == "#c2c2c2" || compact == "rgb(194,194,194)"
}

/// Wrap text in a canonical muted span.
pub fn wrap_muted(inner: &str) -> String {
    format!(r#"<span style="{MUTED_COLOR_DECL}">{inner}</span>"#)
}

/// The open tag of `html` when it starts with a span declaring the muted color.
pub fn muted_open_tag(html: &str) -> Option<&str> {
    let end = html.find('>')?;
    let open_tag = &html[..=end];
    let is_span = open_tag
        .get(..5)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("<span"));
    if !is_span {
        return None;
    }
    let style = SPAN_STYLE_DOUBLE
        .captures(open_tag)
        .or_else(|| SPAN_STYLE_SINGLE.captures(open_tag))?;
    if style[2].split(';').any(is_muted_declaration) {
        Some(open_tag)
    } else {
        None
    }
}

/// Split a complete `<span ...>...</span>` into its parts.
pub fn parse_span(html: &str) -> Option<StyledSpan> {
    let end = html.find('>')?;
    let close_at = html.len().checked_sub(SPAN_CLOSE.len())?;
    let close_tag = html.get(close_at..)?;
    if !close_tag.eq_ignore_ascii_case(SPAN_CLOSE) || close_at < end + 1 {
        return None;
    }
    let open_tag = &html[..=end];
    Some(StyledSpan {
        open_tag: open_tag.to_string(),
        inner: html[end + 1..close_at].to_string(),
        close_tag: close_tag.to_string(),
        muted: muted_open_tag(open_tag).is_some(),
    })
}

/// A run of markup split at span boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupToken<'a> {
    Text(&'a str),
    Span(&'a str),
}

/// Split text into plain runs and complete span containers, left to right.
///
/// A span without a matching close tag stays inside the surrounding text.
pub fn tokenize_spans(text: &str) -> Vec<MarkupToken<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for found in SPAN_TOKEN.find_iter(text) {
        if found.start() > last {
            tokens.push(MarkupToken::Text(&text[last..found.start()]));
        }
        tokens.push(MarkupToken::Span(found.as_str()));
        last = found.end();
    }
    if last < text.len() {
        tokens.push(MarkupToken::Text(&text[last..]));
    }
    tokens
}

/// Replace every tag with a single space.
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, " ").into_owned()
}

/// Whether `tag` opens (`Some(true)`) or closes (`Some(false)`) emphasis.
pub fn emphasis_tag(tag: &str) -> Option<bool> {
    let body = tag.strip_prefix('<')?.strip_suffix('>')?;
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    name.eq_ignore_ascii_case("i").then_some(!closing)
}
