//! Card source seam.
//!
//! A [`CardSource`] hands out cards for a scope (usually a deck) and accepts
//! field updates. The engine never talks to a source directly; the batch
//! driver in [`crate::review`] does.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CleanerError, Result};

pub type CardId = i64;

/// Scheduling data used to order cards for review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub due: i64,
    pub reps: u32,
    pub is_due: bool,
    pub suspended: bool,
}

/// One named field of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteField {
    pub name: String,
    pub order: usize,
    pub value: String,
}

impl NoteField {
    pub fn new(name: impl Into<String>, order: usize, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            value: value.into(),
        }
    }
}

/// A card as reported by its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCard {
    pub card_id: CardId,
    pub note_id: Option<i64>,
    pub fields: Vec<NoteField>,
    #[serde(default)]
    pub schedule: Schedule,
}

impl SourceCard {
    /// A two-field card whose note shares the card's id.
    pub fn basic(card_id: CardId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            card_id,
            note_id: Some(card_id),
            fields: vec![NoteField::new("Front", 0, front), NoteField::new("Back", 1, back)],
            schedule: Schedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// The first two fields by order, taken as front and back.
    pub fn front_back(&self) -> Option<(&NoteField, &NoteField)> {
        let mut fields: Vec<&NoteField> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.order);
        match fields.as_slice() {
            [front, back, ..] => Some((*front, *back)),
            _ => None,
        }
    }
}

/// New values for a note's front and back fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub card_id: CardId,
    pub note_id: i64,
    pub front_field: String,
    pub back_field: String,
    pub front: String,
    pub back: String,
}

/// Where cards come from and where their updates go.
pub trait CardSource {
    /// Card ids in a scope.
    fn card_ids(&self, scope: &str) -> Result<Vec<CardId>>;

    /// Full card data for the given ids, in the same order.
    fn cards_info(&self, ids: &[CardId]) -> Result<Vec<SourceCard>>;

    /// Write several updates at once.
    fn update_fields(&mut self, updates: &[FieldUpdate]) -> Result<()>;

    /// Write a single update.
    fn update_one(&mut self, update: &FieldUpdate) -> Result<()> {
        self.update_fields(std::slice::from_ref(update))
    }
}

/// In-memory card source keyed by scope.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    scopes: BTreeMap<String, Vec<CardId>>,
    cards: HashMap<CardId, SourceCard>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card to a scope, replacing any card with the same id.
    pub fn insert(&mut self, scope: &str, card: SourceCard) {
        let ids = self.scopes.entry(scope.to_string()).or_default();
        if !ids.contains(&card.card_id) {
            ids.push(card.card_id);
        }
        self.cards.insert(card.card_id, card);
    }

    pub fn card(&self, id: CardId) -> Option<&SourceCard> {
        self.cards.get(&id)
    }

    /// Value of a named field.
    pub fn field(&self, id: CardId, name: &str) -> Option<&str> {
        self.card(id)?
            .fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }
}

impl CardSource for MemorySource {
    fn card_ids(&self, scope: &str) -> Result<Vec<CardId>> {
        Ok(self.scopes.get(scope).cloned().unwrap_or_default())
    }

    fn cards_info(&self, ids: &[CardId]) -> Result<Vec<SourceCard>> {
        ids.iter()
            .map(|id| {
                self.cards
                    .get(id)
                    .cloned()
                    .ok_or(CleanerError::UnknownCard { id: *id })
            })
            .collect()
    }

    fn update_fields(&mut self, updates: &[FieldUpdate]) -> Result<()> {
        // Validate the whole batch before touching anything.
        for update in updates {
            let card = self
                .cards
                .get(&update.card_id)
                .ok_or(CleanerError::UnknownCard { id: update.card_id })?;
            if card.note_id != Some(update.note_id) {
                return Err(CleanerError::Source(format!(
                    "card {} does not belong to note {}",
                    update.card_id, update.note_id
                )));
            }
            for name in [&update.front_field, &update.back_field] {
                if !card.fields.iter().any(|field| &field.name == name) {
                    return Err(CleanerError::Source(format!(
                        "card {} has no field {}",
                        update.card_id, name
                    )));
                }
            }
        }

        for update in updates {
            if let Some(card) = self.cards.get_mut(&update.card_id) {
                for field in &mut card.fields {
                    if field.name == update.front_field {
                        field.value = update.front.clone();
                    } else if field.name == update.back_field {
                        field.value = update.back.clone();
                    }
                }
            }
        }
        Ok(())
    }
}
