//! Plain-text deck files.
//!
//! # Format
//! ```text
//! ID: 12
//! Front: En stam
//! Back: Trunk (of a tree)<br>"Trädet hade en tjock stam."
//!
//! Front: Mogen
//! Back: 1. Mature
//! 2. Ripe
//! ```
//!
//! Lines after `Front:` or `Back:` continue that field. Cards without an
//! `ID:` line get the next free id when the file is parsed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CleanerError, Result};
use crate::source::{CardId, CardSource, FieldUpdate, SourceCard};

const FRONT_FIELD: &str = "Front";
const BACK_FIELD: &str = "Back";

/// One card of a deck file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCard {
    pub id: CardId,
    pub front: String,
    pub back: String,
    /// 1-based line where the card starts.
    pub line_number: usize,
}

/// A parsed deck file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFile {
    cards: Vec<DeckCard>,
}

impl DeckFile {
    /// Parse deck file content.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut parser = Parser::new();
        for (idx, line) in content.lines().enumerate() {
            parser.process_line(line, idx + 1)?;
        }
        let drafts = parser.finish()?;

        let mut seen = HashSet::new();
        for draft in &drafts {
            if let Some(id) = draft.id {
                if !seen.insert(id) {
                    return Err(CleanerError::DuplicateId {
                        id,
                        line: draft.line_number,
                    });
                }
            }
        }

        let mut next_id = seen.iter().max().map_or(1, |max| max + 1);
        let cards = drafts
            .into_iter()
            .map(|draft| {
                let id = draft.id.unwrap_or_else(|| {
                    next_id += 1;
                    next_id - 1
                });
                DeckCard {
                    id,
                    front: draft.front,
                    back: draft.back,
                    line_number: draft.line_number,
                }
            })
            .collect();
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[DeckCard] {
        &self.cards
    }

    pub fn get(&self, id: CardId) -> Option<&DeckCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Write the deck back out, one block per card.
    pub fn render(&self) -> String {
        self.cards
            .iter()
            .map(|card| format!("ID: {}\nFront: {}\nBack: {}", card.id, card.front, card.back))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl CardSource for DeckFile {
    fn card_ids(&self, _scope: &str) -> Result<Vec<CardId>> {
        Ok(self.cards.iter().map(|card| card.id).collect())
    }

    fn cards_info(&self, ids: &[CardId]) -> Result<Vec<SourceCard>> {
        ids.iter()
            .map(|id| {
                self.get(*id)
                    .map(|card| SourceCard::basic(card.id, &card.front, &card.back))
                    .ok_or(CleanerError::UnknownCard { id: *id })
            })
            .collect()
    }

    fn update_fields(&mut self, updates: &[FieldUpdate]) -> Result<()> {
        for update in updates {
            if self.get(update.card_id).is_none() {
                return Err(CleanerError::UnknownCard { id: update.card_id });
            }
            if update.front_field != FRONT_FIELD || update.back_field != BACK_FIELD {
                return Err(CleanerError::Source(format!(
                    "deck files only have {FRONT_FIELD} and {BACK_FIELD} fields"
                )));
            }
        }

        for update in updates {
            if let Some(card) = self.cards.iter_mut().find(|card| card.id == update.card_id) {
                card.front = update.front.clone();
                card.back = update.back.clone();
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Front,
    Back,
}

struct CardDraft {
    id: Option<CardId>,
    front: String,
    back: String,
    line_number: usize,
}

struct CardBuilder {
    id: Option<CardId>,
    front: Option<String>,
    back: Option<String>,
    start_line: usize,
}

impl CardBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            id: None,
            front: None,
            back: None,
            start_line,
        }
    }

    fn build(self) -> Result<CardDraft> {
        let front = self.front.ok_or(CleanerError::MissingFront {
            line: self.start_line,
        })?;
        let back = self.back.ok_or(CleanerError::MissingBack {
            line: self.start_line,
        })?;

        Ok(CardDraft {
            id: self.id,
            front: front.trim().to_string(),
            back: back.trim().to_string(),
            line_number: self.start_line,
        })
    }
}

struct Parser {
    cards: Vec<CardDraft>,
    current: Option<CardBuilder>,
    current_field: Option<Field>,
    buffer: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Self {
            cards: Vec::new(),
            current: None,
            current_field: None,
            buffer: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<()> {
        match Self::parse_line(line) {
            LineType::Id(value) => self.handle_id(value, line_num)?,
            LineType::Front(text) => self.handle_front(text, line_num)?,
            LineType::Back(text) => self.handle_back(text, line_num)?,
            LineType::Text(text) => {
                if self.current_field.is_some() {
                    self.buffer.push(text.to_string());
                }
            }
            LineType::Empty => {
                if self.current_field.is_some() {
                    self.buffer.push(String::new());
                }
            }
        }
        Ok(())
    }

    fn parse_line(line: &str) -> LineType<'_> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("ID:") {
            LineType::Id(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Front:") {
            LineType::Front(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Back:") {
            LineType::Back(rest.trim())
        } else if trimmed.is_empty() {
            LineType::Empty
        } else {
            LineType::Text(line)
        }
    }

    fn handle_id(&mut self, value: &str, line_num: usize) -> Result<()> {
        let id = value.parse::<CardId>().map_err(|_| CleanerError::InvalidId {
            line: line_num,
            value: value.to_string(),
        })?;

        self.start_card(line_num)?;
        if let Some(card) = self.current.as_mut() {
            card.id = Some(id);
        }
        Ok(())
    }

    fn handle_front(&mut self, text: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();
        let has_front = self.current.as_ref().map_or(true, |card| card.front.is_some());
        if has_front {
            self.start_card(line_num)?;
        }
        self.current_field = Some(Field::Front);
        self.buffer.push(text.to_string());
        Ok(())
    }

    fn handle_back(&mut self, text: &str, line_num: usize) -> Result<()> {
        self.flush_buffer();
        let has_back = self.current.as_ref().map_or(true, |card| card.back.is_some());
        if has_back {
            self.start_card(line_num)?;
        }
        self.current_field = Some(Field::Back);
        self.buffer.push(text.to_string());
        Ok(())
    }

    /// Close the current card, if any, and open a new one.
    fn start_card(&mut self, line_num: usize) -> Result<()> {
        self.flush_buffer();
        if let Some(card) = self.current.take() {
            self.cards.push(card.build()?);
        }
        self.current = Some(CardBuilder::new(line_num));
        self.current_field = None;
        Ok(())
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let content = self.buffer.join("\n");
        self.buffer.clear();

        if let Some(card) = self.current.as_mut() {
            match self.current_field {
                Some(Field::Front) => card.front = Some(content),
                Some(Field::Back) => card.back = Some(content),
                None => {}
            }
        }
    }

    fn finish(mut self) -> Result<Vec<CardDraft>> {
        self.flush_buffer();
        if let Some(card) = self.current.take() {
            self.cards.push(card.build()?);
        }
        Ok(self.cards)
    }
}

enum LineType<'a> {
    Id(&'a str),
    Front(&'a str),
    Back(&'a str),
    Text(&'a str),
    Empty,
}
