//! Emphasis of the headword inside example text.
//!
//! An [`ItalicContext`] is derived once per card from the front field. It
//! holds the headword's inflection candidates (longest first) and the words
//! that repeat across the card's quotations. [`ItalicContext::apply`] wraps
//! matches in `<i>` while scanning the text left to right, skipping anything
//! already emphasized so emphasis never nests.

use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;
use regex::Regex;

use crate::markup::{emphasis_tag, strip_tags};
use crate::types::HeadwordKind;

/// Single words at least this long tolerate an inflection suffix.
const SUFFIX_MIN_CHARS: usize = 4;
/// Single words at least this long also get a stem candidate.
const STEM_MIN_CHARS: usize = 5;
/// Longest inflection suffix a candidate absorbs.
const MAX_SUFFIX: usize = 3;
/// Shortest word the repeated-quotation heuristic considers.
const REPEATED_MIN_CHARS: usize = 4;

lazy_static! {
    static ref SOUND_MARKER: Regex = Regex::new(r"(?i)\s*\[sound:[^\]]+\]\s*").unwrap();
    static ref COUNT_SUFFIX: Regex = Regex::new(r"\s*\(\d+\)\s*$").unwrap();
    static ref HEAD_MARKER: Regex = Regex::new(r"(?i)^(en|ett|att)\s+").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SENSE_PAREN: Regex = Regex::new(r"(?i)\(\s*på\b[^)]*\)").unwrap();
    static ref QUOTED: Regex = Regex::new(r#""([^"]+)""#).unwrap();
    static ref WORD: Regex = Regex::new(r"\p{Alphabetic}+").unwrap();
}

/// One match rule applied to example text.
#[derive(Debug, Clone)]
struct MatchRule {
    text: String,
    pattern: Regex,
    /// Multi-word phrases check their word boundaries by hand.
    phrase: bool,
    /// Skip a match directly preceded by one of these words and a space.
    not_after: &'static [&'static str],
    /// Only match inside quotations.
    quotes_only: bool,
}

impl MatchRule {
    fn headword(text: &str, allow_suffix: bool, kind: HeadwordKind) -> Option<Self> {
        let escaped = regex::escape(text);
        let phrase = text.contains(char::is_whitespace);
        let source = if phrase {
            format!("(?i){escaped}")
        } else if allow_suffix {
            format!(r"(?i)\b{escaped}\w{{0,{MAX_SUFFIX}}}\b")
        } else {
            format!(r"(?i)\b{escaped}\b")
        };
        let not_after: &'static [&'static str] = match (phrase, kind) {
            (true, _) | (false, HeadwordKind::Plain) => &[],
            (false, HeadwordKind::Verb) => &["en", "ett"],
            (false, HeadwordKind::Noun) => &["att"],
        };
        Some(Self {
            text: text.to_string(),
            pattern: Regex::new(&source).ok()?,
            phrase,
            not_after,
            quotes_only: kind == HeadwordKind::Verb,
        })
    }

    fn repeated(word: &str) -> Option<Self> {
        let source = format!(r"(?i)\b{}\b", regex::escape(word));
        Some(Self {
            text: word.to_string(),
            pattern: Regex::new(&source).ok()?,
            phrase: false,
            not_after: &[],
            quotes_only: true,
        })
    }

    fn accepts(&self, chunk: &str, start: usize, end: usize) -> bool {
        if self.phrase {
            let before = chunk[..start].chars().next_back();
            let after = chunk[end..].chars().next();
            if before.map_or(false, is_word_char) || after.map_or(false, is_word_char) {
                return false;
            }
        }
        !self
            .not_after
            .iter()
            .any(|word| preceded_by_word(&chunk[..start], word))
    }

    /// The rule matches `word` as a whole.
    fn matches_whole(&self, word: &str) -> bool {
        self.pattern
            .find(word)
            .map_or(false, |found| found.start() == 0 && found.end() == word.len())
    }

    fn wrap(&self, chunk: &str) -> String {
        let mut out = String::with_capacity(chunk.len() + 8);
        let mut last = 0;
        let mut pos = 0;
        while let Some(found) = self.pattern.find_at(chunk, pos) {
            if found.start() == found.end() {
                break;
            }
            if self.accepts(chunk, found.start(), found.end()) {
                out.push_str(&chunk[last..found.start()]);
                out.push_str("<i>");
                out.push_str(found.as_str());
                out.push_str("</i>");
                last = found.end();
                pos = found.end();
            } else {
                pos = next_boundary(chunk, found.start());
            }
        }
        out.push_str(&chunk[last..]);
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}

/// `before` ends with `word` plus one whitespace character, and `word`
/// starts at a word boundary.
fn preceded_by_word(before: &str, word: &str) -> bool {
    let mut chars = before.chars();
    match chars.next_back() {
        Some(c) if c.is_whitespace() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    if rest.len() < word.len() || !rest.is_char_boundary(rest.len() - word.len()) {
        return false;
    }
    let (head, tail) = rest.split_at(rest.len() - word.len());
    tail.eq_ignore_ascii_case(word) && !head.chars().next_back().map_or(false, is_word_char)
}

/// Per-card emphasis state derived from the front field.
#[derive(Debug, Clone, Default)]
pub struct ItalicContext {
    kind: HeadwordKind,
    terms: Vec<MatchRule>,
    repeated: Vec<MatchRule>,
}

impl ItalicContext {
    /// Derive the headword candidates from a front field.
    pub fn from_front(front: &str) -> Self {
        let text = strip_tags(front);
        let text = SOUND_MARKER.replace_all(&text, " ");
        let text = COUNT_SUFFIX.replace(&text, "");
        let text = text.trim();

        let kind = match HEAD_MARKER.captures(text) {
            Some(caps) if caps[1].eq_ignore_ascii_case("att") => HeadwordKind::Verb,
            Some(_) => HeadwordKind::Noun,
            None => HeadwordKind::Plain,
        };
        let headword = HEAD_MARKER.replace(text, "");
        let headword = headword.trim();
        if headword.is_empty() {
            return Self {
                kind,
                ..Self::default()
            };
        }

        let mut candidates = vec![];
        let single = !headword.contains(char::is_whitespace);
        let chars = headword.chars().count();
        candidates.push((headword.to_string(), single && chars >= SUFFIX_MIN_CHARS));

        if single && chars >= STEM_MIN_CHARS {
            let lower = headword.to_lowercase();
            let ending = if lower.ends_with('a') {
                1
            } else if kind == HeadwordKind::Plain && lower.ends_with("en") {
                2
            } else {
                0
            };
            if ending > 0 {
                let stem: String = headword.chars().take(chars - ending).collect();
                candidates.push((stem, true));
            }
        }

        candidates.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        let terms = candidates
            .iter()
            .filter_map(|(term, allow_suffix)| MatchRule::headword(term, *allow_suffix, kind))
            .collect();

        Self {
            kind,
            terms,
            repeated: Vec::new(),
        }
    }

    /// Add the longest words shared by at least two distinct quotations in
    /// `back`, unless a headword rule already matches them.
    pub fn with_repeated_words(mut self, back: &str) -> Self {
        self.repeated = repeated_quoted_words(back)
            .into_iter()
            .filter(|word| !self.covers(word))
            .filter_map(|word| MatchRule::repeated(&word))
            .collect();
        self
    }

    pub fn kind(&self) -> HeadwordKind {
        self.kind
    }

    /// Headword candidates, longest first.
    pub fn candidates(&self) -> Vec<&str> {
        self.terms.iter().map(|rule| rule.text.as_str()).collect()
    }

    /// Words picked up by the repeated-quotation heuristic.
    pub fn repeated(&self) -> Vec<&str> {
        self.repeated.iter().map(|rule| rule.text.as_str()).collect()
    }

    /// A headword rule matches `word`, or `word` is part of the headword.
    pub fn covers(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.terms.iter().any(|rule| {
            rule.matches_whole(word)
                || rule
                    .text
                    .to_lowercase()
                    .split_whitespace()
                    .any(|part| part == lower)
        })
    }

    /// Wrap every eligible occurrence of the candidates in emphasis.
    pub fn apply(&self, text: &str) -> String {
        self.terms
            .iter()
            .chain(self.repeated.iter())
            .fold(text.to_string(), |acc, rule| apply_rule(&acc, rule))
    }
}

/// Scan state threaded through one left-to-right pass.
#[derive(Debug, Default)]
struct ScanState {
    emphasis_depth: usize,
    quote: Option<char>,
}

fn apply_rule(text: &str, rule: &MatchRule) -> String {
    let mut state = ScanState::default();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for tag in TAG.find_iter(text) {
        scan_text(&text[last..tag.start()], rule, &mut state, &mut out);
        match emphasis_tag(tag.as_str()) {
            Some(true) => state.emphasis_depth += 1,
            Some(false) => state.emphasis_depth = state.emphasis_depth.saturating_sub(1),
            None if tag.as_str().eq_ignore_ascii_case("<br>") => state.quote = None,
            None => {}
        }
        out.push_str(tag.as_str());
        last = tag.end();
    }
    scan_text(&text[last..], rule, &mut state, &mut out);
    out
}

/// Handle one run of text between tags.
fn scan_text(run: &str, rule: &MatchRule, state: &mut ScanState, out: &mut String) {
    if run.is_empty() {
        return;
    }
    let emphasized = state.emphasis_depth > 0;
    let mut region_start = 0;

    for (at, c) in run.char_indices() {
        if c != '"' && c != '\'' {
            continue;
        }
        let toggles = match state.quote {
            None => true,
            Some(open) => open == c,
        };
        if !toggles {
            continue;
        }
        let inside = state.quote.is_some();
        emit_region(&run[region_start..at], inside, emphasized, rule, out);
        out.push(c);
        state.quote = if inside { None } else { Some(c) };
        region_start = at + c.len_utf8();
    }
    emit_region(
        &run[region_start..],
        state.quote.is_some(),
        emphasized,
        rule,
        out,
    );
}

fn emit_region(
    region: &str,
    inside_quote: bool,
    emphasized: bool,
    rule: &MatchRule,
    out: &mut String,
) {
    if region.is_empty() {
        return;
    }
    if emphasized || (rule.quotes_only && !inside_quote) {
        out.push_str(region);
        return;
    }
    let mut last = 0;
    for sense in SENSE_PAREN.find_iter(region) {
        out.push_str(&rule.wrap(&region[last..sense.start()]));
        out.push_str(sense.as_str());
        last = sense.end();
    }
    out.push_str(&rule.wrap(&region[last..]));
}

/// Longest words appearing in at least two distinct quotations.
fn repeated_quoted_words(back: &str) -> Vec<String> {
    let plain = strip_tags(back);
    let quotes: BTreeSet<&str> = QUOTED
        .captures_iter(&plain)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    if quotes.len() < 2 {
        return Vec::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for quote in &quotes {
        let words: BTreeSet<String> = WORD
            .find_iter(quote)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        for word in words {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let shared: Vec<String> = counts
        .into_iter()
        .filter(|(word, count)| *count >= 2 && word.chars().count() >= REPEATED_MIN_CHARS)
        .map(|(word, _)| word)
        .collect();
    let longest = match shared.iter().map(|w| w.chars().count()).max() {
        Some(len) => len,
        None => return Vec::new(),
    };

    let mut picked: Vec<String> = shared
        .into_iter()
        .filter(|word| word.chars().count() == longest)
        .collect();
    picked.sort();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn noun_candidates() {
        let ctx = ItalicContext::from_front("En själ [sound:pronunciation_sv_själ.mp3]");
        assert_eq!(ctx.kind(), HeadwordKind::Noun);
        assert_eq!(ctx.candidates(), vec!["själ"]);
    }

    #[test]
    fn verb_candidates_include_stem() {
        let ctx = ItalicContext::from_front("Att försaka (2)");
        assert_eq!(ctx.kind(), HeadwordKind::Verb);
        assert_eq!(ctx.candidates(), vec!["försaka", "försak"]);
    }

    #[test]
    fn adjective_candidates_drop_en() {
        let ctx = ItalicContext::from_front("Mogen");
        assert_eq!(ctx.kind(), HeadwordKind::Plain);
        assert_eq!(ctx.candidates(), vec!["Mogen", "Mog"]);
    }

    #[test]
    fn phrase_has_single_candidate() {
        let ctx = ItalicContext::from_front("För övrigt");
        assert_eq!(ctx.candidates(), vec!["För övrigt"]);
    }

    #[test]
    fn empty_front_disables_italics() {
        let ctx = ItalicContext::from_front("  ");
        assert!(ctx.candidates().is_empty());
        assert_eq!(ctx.apply("\"anything\""), "\"anything\"");
    }

    #[test]
    fn suffix_tolerant_matching() {
        let ctx = ItalicContext::from_front("En stam");
        assert_eq!(
            ctx.apply("(best: stammen, pl: stammar) Björnstammen, ordstam"),
            "(best: <i>stammen</i>, pl: <i>stammar</i>) Björnstammen, ordstam"
        );
    }

    #[test]
    fn noun_not_italicized_after_att() {
        let ctx = ItalicContext::from_front("En stam");
        assert_eq!(ctx.apply("att stam, en stam"), "att stam, en <i>stam</i>");
    }

    #[test]
    fn verb_only_inside_quotes() {
        let ctx = ItalicContext::from_front("Att bölja");
        assert_eq!(
            ctx.apply("bölja \"En bölja reste sig.\" \"Vågorna började bölja.\""),
            "bölja \"En bölja reste sig.\" \"Vågorna började <i>bölja</i>.\""
        );
    }

    #[test]
    fn quote_state_resets_at_line_break() {
        let ctx = ItalicContext::from_front("Att bölja");
        assert_eq!(
            ctx.apply("\"open<br>bölja\""),
            "\"open<br>bölja\""
        );
    }

    #[test]
    fn existing_emphasis_is_left_alone() {
        let ctx = ItalicContext::from_front("För övrigt");
        let text = "\"Landet bör <i>för övrigt </i>stärka för övrigt\"";
        assert_eq!(
            ctx.apply(text),
            "\"Landet bör <i>för övrigt </i>stärka <i>för övrigt</i>\""
        );
    }

    #[test]
    fn phrase_needs_word_boundaries() {
        let ctx = ItalicContext::from_front("Utan skor");
        assert_eq!(ctx.apply("utan skorna, utan skor"), "utan skorna, <i>utan skor</i>");
    }

    #[test]
    fn sense_parenthetical_is_skipped() {
        let ctx = ItalicContext::from_front("En stubin");
        assert_eq!(
            ctx.apply("kort stubin<br>(på stubinen: omedelbart)"),
            "kort <i>stubin</i><br>(på stubinen: omedelbart)"
        );
    }

    #[test]
    fn apply_is_idempotent() {
        let ctx = ItalicContext::from_front("Att försaka");
        let once = ctx.apply("\"De försaker alla ting, försakat allt.\"");
        assert_eq!(once, "\"De <i>försaker</i> alla ting, <i>försakat</i> allt.\"");
        assert_eq!(ctx.apply(&once), once);
    }

    #[test]
    fn repeated_words_across_quotes() {
        let back = "Def<br>\"Solen sken över sjön.\"<br>\"Hela sjön glittrade i solen.\"";
        let ctx = ItalicContext::from_front("En glans").with_repeated_words(back);
        assert_eq!(ctx.repeated(), vec!["solen"]);
        assert_eq!(
            ctx.apply("\"Solen sken.\" solen"),
            "\"<i>Solen</i> sken.\" solen"
        );
    }

    #[test]
    fn repeated_word_covered_by_headword_is_ignored() {
        let back = "\"Vågorna började bölja.\"<br>\"Låt det bölja fritt.\"";
        let ctx = ItalicContext::from_front("Att bölja").with_repeated_words(back);
        assert!(ctx.repeated().is_empty());
    }

    #[test]
    fn repeated_words_ignore_markup_attributes() {
        let back = "<span style=\"color: rgb(194, 194, 194)\">\"Ett\"</span><span style=\"color: rgb(194, 194, 194)\">\"Två\"</span>";
        let ctx = ItalicContext::default().with_repeated_words(back);
        assert!(ctx.repeated().is_empty());
    }
}
