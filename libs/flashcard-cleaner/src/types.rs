//! Core types for the card cleaner.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A card's two markup-bearing text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Outcome of cleaning one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanResult {
    pub front: String,
    pub back: String,
    /// True when either field differs from the input as given.
    pub changed: bool,
}

/// Semantic role of one line inside a definition segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    /// Primary definition text, rendered unstyled.
    Definition,
    /// Quoted example sentence; opens a muted group.
    Example,
    /// Parenthetical synonym/reference note; a muted group of its own.
    SynonymNote,
    /// Extra line merged into the preceding muted group.
    Continuation,
    /// Empty separator line.
    Blank,
}

impl LineRole {
    /// Whether lines of this role render inside a muted span.
    pub fn is_muted(self) -> bool {
        matches!(self, Self::Example | Self::SynonymNote | Self::Continuation)
    }
}

/// One classified line of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub role: LineRole,
    pub text: String,
    /// The text is already a complete muted span and must not be wrapped again.
    pub already_styled: bool,
}

impl ClassifiedLine {
    pub fn new(role: LineRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            already_styled: false,
        }
    }

    pub fn definition(text: impl Into<String>) -> Self {
        Self::new(LineRole::Definition, text)
    }

    pub fn example(text: impl Into<String>) -> Self {
        Self::new(LineRole::Example, text)
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self::new(LineRole::SynonymNote, text)
    }

    pub fn continuation(text: impl Into<String>) -> Self {
        Self::new(LineRole::Continuation, text)
    }

    pub fn blank() -> Self {
        Self::new(LineRole::Blank, "")
    }

    pub fn styled(text: impl Into<String>) -> Self {
        Self {
            role: LineRole::Example,
            text: text.into(),
            already_styled: true,
        }
    }
}

/// A parsed `<span ...>inner</span>` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledSpan {
    pub open_tag: String,
    pub inner: String,
    pub close_tag: String,
    /// The open tag declares the muted gray color.
    pub muted: bool,
}

impl StyledSpan {
    pub fn render(&self) -> String {
        format!("{}{}{}", self.open_tag, self.inner, self.close_tag)
    }
}

/// Grammatical marker found in front of the headword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadwordKind {
    /// No article or infinitive marker.
    Plain,
    /// Noun marked with `en` or `ett`.
    Noun,
    /// Verb marked with the infinitive `att`.
    Verb,
}

impl Default for HeadwordKind {
    fn default() -> Self {
        Self::Plain
    }
}

/// Settings for the batch review driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    /// Cards fetched and transformed per review batch.
    pub batch_size: usize,
    /// Updates sent per bulk write.
    pub update_chunk_size: usize,
    /// Worker threads used to transform one batch.
    pub workers: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            batch_size: 25,
            update_chunk_size: 25,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl ReviewSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
