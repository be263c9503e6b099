//! Rendering classified segments back into markup.

use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::{self, Block};
use crate::italic::ItalicContext;
use crate::markup::{self, DOUBLE_BREAK, LINE_BREAK};
use crate::segments;
use crate::types::{ClassifiedLine, LineRole, StyledSpan};

lazy_static! {
    static ref FRONT_COUNT: Regex = Regex::new(r"\s*\(\d+\)$").unwrap();
    static ref QUOTE_FIXES: Vec<(Regex, &'static str)> = [
        (r#""\s*,\s*$"#, "\""),
        (r"'\s*,\s*$", "'"),
        (r#""\s*\)\s*$"#, "\""),
        (r"'\s*\)\s*$", "'"),
        (r#""\s*,\s*""#, "\"<br>\""),
        (r"'\s*,\s*'", "'<br>'"),
    ]
    .iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
    .collect();
}

/// Renders segments for one card, sharing its emphasis context.
pub struct Reassembler<'a> {
    italics: &'a ItalicContext,
}

impl<'a> Reassembler<'a> {
    pub fn new(italics: &'a ItalicContext) -> Self {
        Self { italics }
    }

    /// Classify and render one segment.
    pub fn segment(&self, segment: &str, is_main: bool) -> String {
        let mut out = String::with_capacity(segment.len() + 64);
        for block in classify::classify_segment(segment, is_main) {
            match block {
                Block::Lines(lines) => out.push_str(&self.render_lines(&lines)),
                Block::Span(span) => {
                    let span = self.process_span(span);
                    let after_definition = !out.replace(LINE_BREAK, "").trim().is_empty();
                    out.push_str(&split_span(&span, after_definition));
                }
            }
        }
        out
    }

    /// Render every segment and join them, numbering when there are several.
    ///
    /// Returns `None` when there is nothing to render.
    pub fn back(&self, segments: &[String]) -> Option<String> {
        let rendered: Vec<String> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| self.segment(segment, i == 0))
            .collect();
        match rendered.len() {
            0 => None,
            1 => rendered.into_iter().next(),
            _ => Some(segments::join_numbered(&rendered)),
        }
    }

    /// Render a run of lines. Each muted group becomes one span and lines
    /// are joined by single breaks.
    pub fn render_lines(&self, lines: &[ClassifiedLine]) -> String {
        let mut rendered = Vec::with_capacity(lines.len());
        let mut idx = 0;
        while idx < lines.len() {
            let line = &lines[idx];
            idx += 1;
            match line.role {
                LineRole::Definition | LineRole::Blank => rendered.push(line.text.clone()),
                _ if line.already_styled => rendered.push(self.restyle(&line.text)),
                _ => {
                    let mut group = vec![line.text.as_str()];
                    while let Some(next) = lines
                        .get(idx)
                        .filter(|l| l.role == LineRole::Continuation)
                    {
                        group.push(next.text.as_str());
                        idx += 1;
                    }
                    rendered.push(self.muted(&group.join(LINE_BREAK)));
                }
            }
        }
        rendered.join(LINE_BREAK)
    }

    /// Normalize, emphasize and wrap text in a fresh muted span.
    fn muted(&self, text: &str) -> String {
        markup::wrap_muted(&self.inner(text))
    }

    fn inner(&self, text: &str) -> String {
        self.italics.apply(&normalize_quoted_lines(text))
    }

    /// Process the inside of a line that is already a muted span.
    fn restyle(&self, html: &str) -> String {
        match markup::parse_span(html) {
            Some(span) => self.process_span(span).render(),
            None => self.muted(html),
        }
    }

    fn process_span(&self, mut span: StyledSpan) -> StyledSpan {
        if span.muted {
            span.inner = self.inner(&span.inner);
        }
        span
    }
}

/// Break a muted span at a blank line when a parenthetical block follows it.
///
/// Only applies after non-blank text earlier in the segment. Repeats on the
/// remainder so a rendered span never qualifies again.
pub fn split_span(span: &StyledSpan, after_definition: bool) -> String {
    if !after_definition || !span.muted {
        return span.render();
    }
    let (left, right) = match span.inner.split_once(DOUBLE_BREAK) {
        Some(parts) => parts,
        None => return span.render(),
    };
    let right = right.trim();
    if !right.starts_with('(') {
        return span.render();
    }

    let head = StyledSpan {
        inner: left.trim().to_string(),
        ..span.clone()
    };
    let tail = StyledSpan {
        inner: right.to_string(),
        ..span.clone()
    };
    format!("{}{DOUBLE_BREAK}{}", head.render(), split_span(&tail, true))
}

/// Tidy quotation lines: unwrap `("...")`, drop trailing commas and
/// parentheses after the closing quote and break `"a", "b"` onto two lines.
pub fn normalize_quoted_lines(text: &str) -> String {
    text.split(LINE_BREAK)
        .map(normalize_quoted_line)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

fn normalize_quoted_line(part: &str) -> String {
    let stripped = part.trim();
    if stripped.is_empty() {
        return part.to_string();
    }

    let mut line = part;
    if stripped.starts_with('(') && stripped.ends_with(')') {
        let unwrapped = classify::remove_wrapping_parens(stripped);
        if classify::starts_with_quote(unwrapped.trim()) {
            line = unwrapped;
        }
    }
    if !classify::starts_with_quote(line.trim()) {
        return line.to_string();
    }

    QUOTE_FIXES
        .iter()
        .fold(line.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Replace the front's trailing `(k)` with the segment count when there is
/// more than one segment.
pub fn annotate_front(front: &str, segment_count: usize) -> String {
    if segment_count <= 1 {
        return front.to_string();
    }
    let base = FRONT_COUNT.replace(front, "");
    format!("{base} ({segment_count})")
}
