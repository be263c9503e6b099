//! Line classification within one definition segment.
//!
//! A segment is split into span containers and plain runs. Spans are kept
//! whole; plain runs are split at `<br>` and each line goes through an
//! ordered rule table. The first rule that accepts a line decides its role
//! and may consume lines after it. Order matters: several legacy shorthands
//! overlap and the table encodes the tie-break.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::markup::{self, MarkupToken, LINE_BREAK};
use crate::types::{ClassifiedLine, StyledSpan};

lazy_static! {
    static ref TEX_IN_SPAN: Regex =
        Regex::new(r#"(?i)(<span\b[^>]*>)\s*t\.ex\.\s*("[^"]*")\s*</span>"#).unwrap();
    static ref PAREN_QUOTE_TAIL: Regex = Regex::new(r#"^(.*)\(\s*(["'].*)$"#).unwrap();
    static ref TEX_CLAUSE: Regex = Regex::new(r#"(?i)\(t\.ex\.\s*"[^"]*"\)"#).unwrap();
    static ref TEX_LOOSE: Regex = Regex::new(r"(?i)^\s*(.*?)\(\s*t\.ex\.\s*(.*?)\)\s*$").unwrap();
    static ref TEX_OPEN: Regex = Regex::new(r#"(?i)\(t\.ex\.\s*""#).unwrap();
    static ref WRAPPING_PARENS: Regex = Regex::new(r"^\(([^)]+)\)$").unwrap();
    static ref USAGE_NOTE: Regex = Regex::new(r"(?i)^ordet\s+anv\w*\b").unwrap();
    static ref NOTE_CUES: Vec<Regex> = [
        // synonym
        r"(?i)^\(syn:",
        // see also
        r"(?i)^\((?:jfr|se även)\b",
        // definite and plural forms
        r"(?i)^\((?:best|pl):",
        // preposition usage
        r"(?i)^\(på",
        // translation gloss: (en läst: a shoe mold), (ett ord)
        r"(?i)^\((?:en|ett) [^)]+[:)]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
}

/// A piece of a segment: a run of classified lines or an intact span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Lines(Vec<ClassifiedLine>),
    Span(StyledSpan),
}

/// Classified lines produced by one rule and the number of following lines
/// the rule consumed.
type Classified = (Vec<ClassifiedLine>, usize);

struct LineRule {
    name: &'static str,
    apply: fn(&str, &[&str]) -> Option<Classified>,
}

const RULES: &[LineRule] = &[
    LineRule { name: "blank", apply: blank },
    LineRule { name: "paren_quote_tail", apply: paren_quote_tail },
    LineRule { name: "inline_tex", apply: inline_tex },
    LineRule { name: "leading_tex", apply: leading_tex },
    LineRule { name: "quote_with_usage_note", apply: quote_with_usage_note },
    LineRule { name: "plain", apply: plain },
];

/// Split a segment into blocks and classify every plain line.
pub fn classify_segment(segment: &str, is_main: bool) -> Vec<Block> {
    let segment = TEX_IN_SPAN.replace_all(segment, "${1}${2}</span>");

    markup::tokenize_spans(&segment)
        .into_iter()
        .map(|token| match token {
            MarkupToken::Span(html) => match markup::parse_span(html) {
                Some(span) => Block::Span(span),
                None => Block::Lines(classify_lines(html, is_main)),
            },
            MarkupToken::Text(text) => Block::Lines(classify_lines(text, is_main)),
        })
        .collect()
}

/// Classify the `<br>`-separated lines of a plain run.
pub fn classify_lines(content: &str, is_main: bool) -> Vec<ClassifiedLine> {
    let lines: Vec<&str> = content.split(LINE_BREAK).collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx].trim();
        let rest = &lines[idx + 1..];
        let (name, (classified, consumed)) = RULES
            .iter()
            .find_map(|rule| (rule.apply)(line, rest).map(|hit| (rule.name, hit)))
            .unwrap_or(("definition", (vec![ClassifiedLine::definition(line)], 0)));

        trace!(rule = name, is_main, line, consumed, "classified line");
        out.extend(classified);
        idx += 1 + consumed;
    }
    out
}

fn blank(line: &str, _rest: &[&str]) -> Option<Classified> {
    line.is_empty().then(|| (vec![ClassifiedLine::blank()], 0))
}

/// `definition ("quote", <br>"quote")`: definition text followed by a
/// parenthesized run of quotations that may continue on the next lines.
fn paren_quote_tail(line: &str, rest: &[&str]) -> Option<Classified> {
    let caps = PAREN_QUOTE_TAIL.captures(line)?;
    let definition = caps[1].trim_end();
    let opening = caps[2].trim();
    if definition.is_empty() || !starts_with_quote(opening) {
        return None;
    }

    let mut quoted = vec![opening.to_string()];
    if !opening.ends_with(')') {
        for next in rest {
            let next = next.trim();
            if !starts_with_quote(next) {
                break;
            }
            quoted.push(next.to_string());
            if next.ends_with(')') {
                break;
            }
        }
    }
    let consumed = quoted.len() - 1;

    if let Some(last) = quoted.last_mut() {
        if let Some(stripped) = last.trim_end().strip_suffix(')') {
            *last = stripped.trim_end().to_string();
        }
    }

    // The leading text is classified as if it stood on its own line.
    let mut classified = vec![classify_plain(definition)];
    let mut quoted = quoted.into_iter();
    if let Some(first) = quoted.next() {
        classified.push(ClassifiedLine::example(first));
    }
    classified.extend(quoted.map(|line| ClassifiedLine::continuation(line)));
    Some((classified, consumed))
}

/// Lines containing `(t.ex. "...")`: the shorthand is dropped, the quotation
/// becomes an example and a synonym note on the next line joins its group.
fn inline_tex(line: &str, rest: &[&str]) -> Option<Classified> {
    if !line.to_lowercase().contains("(t.ex. \"") {
        return None;
    }

    let mut classified = Vec::new();
    let mut cursor = 0;
    let mut found = false;
    for clause in TEX_CLAUSE.find_iter(line) {
        let between = line[cursor..clause.start()].trim();
        if !between.is_empty() {
            classified.push(if found {
                ClassifiedLine::note(between)
            } else {
                classify_plain(between)
            });
        }
        classified.push(ClassifiedLine::example(quoted_part(clause.as_str())));
        cursor = clause.end();
        found = true;
    }

    if found {
        let trailing = line[cursor..].trim();
        if !trailing.is_empty() {
            classified.push(ClassifiedLine::note(trailing));
        }
        return Some(with_following_note(classified, rest));
    }

    if let Some(caps) = TEX_LOOSE.captures(line) {
        let definition = caps[1].trim();
        let example = caps[2].trim();
        if !definition.is_empty() {
            classified.push(classify_plain(definition));
        }
        if example.is_empty() {
            return Some((classified, 0));
        }
        classified.push(ClassifiedLine::example(example));
        return Some(with_following_note(classified, rest));
    }

    // The parenthesis opens here and closes on a later line.
    let opened = TEX_OPEN.replace_all(line, "\"");
    let opened = opened.strip_suffix(')').unwrap_or(&opened);
    Some((vec![classify_plain(opened)], 0))
}

/// Merge a synonym note on the next line into the group just produced.
fn with_following_note(mut classified: Vec<ClassifiedLine>, rest: &[&str]) -> Classified {
    match rest.first().map(|next| next.trim()) {
        Some(next) if !next.is_empty() && is_synonym_note(next) => {
            classified.push(ClassifiedLine::continuation(next));
            (classified, 1)
        }
        _ => (classified, 0),
    }
}

/// `"quote"` out of `(t.ex. "quote")`.
fn quoted_part(clause: &str) -> &str {
    match (clause.find('"'), clause.rfind('"')) {
        (Some(open), Some(close)) if close > open => &clause[open..=close],
        _ => clause,
    }
}

/// `t.ex. "quote"` at the start of a line.
fn leading_tex(line: &str, _rest: &[&str]) -> Option<Classified> {
    let prefix = line.get(..6)?;
    if !prefix.eq_ignore_ascii_case("t.ex. ") || !line[6..].starts_with('"') {
        return None;
    }
    Some((vec![ClassifiedLine::example(line[6..].trim())], 0))
}

/// A quotation followed by an "ordet används ..." usage note.
fn quote_with_usage_note(line: &str, rest: &[&str]) -> Option<Classified> {
    if !line.starts_with('"') {
        return None;
    }
    let next = rest.first()?.trim();
    if next.is_empty() || !USAGE_NOTE.is_match(next) {
        return None;
    }
    Some((
        vec![
            ClassifiedLine::example(remove_wrapping_parens(line)),
            ClassifiedLine::continuation(next),
        ],
        1,
    ))
}

fn plain(line: &str, _rest: &[&str]) -> Option<Classified> {
    Some((vec![classify_plain(line)], 0))
}

/// Classify a single line on its own, without lookahead.
pub fn classify_plain(line: &str) -> ClassifiedLine {
    if line.starts_with("<span")
        && line.ends_with("</span>")
        && markup::muted_open_tag(line).is_some()
    {
        return ClassifiedLine::styled(line);
    }
    if line.starts_with('"') {
        return ClassifiedLine::example(line);
    }
    let unwrapped = remove_wrapping_parens(line);
    if unwrapped != line && unwrapped.trim().starts_with('"') {
        return ClassifiedLine::example(unwrapped);
    }
    if is_synonym_note(line) {
        return ClassifiedLine::note(line);
    }
    ClassifiedLine::definition(line)
}

/// Whether a line opens with one of the parenthetical note cues.
pub fn is_synonym_note(line: &str) -> bool {
    NOTE_CUES.iter().any(|cue| cue.is_match(line))
}

/// `(text)` → `text` when the parentheses wrap the whole line.
pub fn remove_wrapping_parens(line: &str) -> &str {
    WRAPPING_PARENS
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or(line, |inner| inner.as_str())
}

pub(crate) fn starts_with_quote(text: &str) -> bool {
    text.starts_with('"') || text.starts_with('\'')
}
