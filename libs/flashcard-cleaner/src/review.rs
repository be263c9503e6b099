//! Batch review driver.
//!
//! Walks a scope in prioritized order, a batch at a time, and reports the
//! cards whose transform would change them. Accepted changes are written back
//! in chunks.

use std::collections::{HashMap, HashSet};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cleaner::transform;
use crate::error::{CleanerError, Result};
use crate::source::{CardId, CardSource, FieldUpdate, SourceCard};
use crate::types::{CleanResult, ReviewSettings};

/// A proposed change to one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub card_id: CardId,
    pub note_id: i64,
    pub front_field: String,
    pub back_field: String,
    pub original_front: String,
    pub original_back: String,
    pub front: String,
    pub back: String,
}

impl PendingChange {
    pub fn to_update(&self) -> FieldUpdate {
        FieldUpdate {
            card_id: self.card_id,
            note_id: self.note_id,
            front_field: self.front_field.clone(),
            back_field: self.back_field.clone(),
            front: self.front.clone(),
            back: self.back.clone(),
        }
    }
}

/// Outcome of reviewing one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBatch {
    /// Changed cards only.
    pub cards: Vec<PendingChange>,
    pub skipped_count: usize,
    pub total_cards: usize,
    pub processed_count: usize,
    pub start_from: usize,
    pub next_start_from: usize,
}

impl ReviewBatch {
    /// No cards remain after this batch.
    pub fn is_last(&self) -> bool {
        self.next_start_from >= self.total_cards
    }
}

/// Outcome of writing accepted changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub updated_count: usize,
    pub total_updates: usize,
}

/// Review order for a scope: cards neither due nor suspended first, by due
/// position; then the rest, least reviewed first.
pub fn prioritize(cards: &[SourceCard]) -> Vec<CardId> {
    let (mut fresh, mut rest): (Vec<&SourceCard>, Vec<&SourceCard>) = cards
        .iter()
        .partition(|card| !card.schedule.is_due && !card.schedule.suspended);
    fresh.sort_by_key(|card| (card.schedule.due, card.card_id));
    rest.sort_by_key(|card| (card.schedule.reps, card.schedule.due, card.card_id));

    let mut seen = HashSet::new();
    fresh
        .into_iter()
        .chain(rest)
        .map(|card| card.card_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Transform `(front, back)` pairs on up to `workers` threads, keeping order.
pub fn transform_all(pairs: &[(String, String)], workers: usize) -> Vec<CleanResult> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let workers = workers.min(pairs.len()).max(1);
    if workers == 1 {
        return pairs.iter().map(|(front, back)| transform(front, back)).collect();
    }

    let chunk_size = (pairs.len() + workers - 1) / workers;
    thread::scope(|scope| {
        let handles: Vec<_> = pairs
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(front, back)| transform(front, back))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

/// Drives review batches over a card source.
#[derive(Debug, Clone, Default)]
pub struct Reviewer {
    settings: ReviewSettings,
    order: HashMap<String, Vec<CardId>>,
}

impl Reviewer {
    pub fn new(settings: ReviewSettings) -> Self {
        Self {
            settings,
            order: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// Review the batch starting at `start_from` in the scope's order.
    ///
    /// Starting from zero rebuilds the order, so a new pass sees cards
    /// added since the last one.
    pub fn review_batch<S>(
        &mut self,
        source: &S,
        scope: &str,
        start_from: usize,
    ) -> Result<ReviewBatch>
    where
        S: CardSource + ?Sized,
    {
        if start_from == 0 || !self.order.contains_key(scope) {
            let ids = source.card_ids(scope)?;
            let cards = source.cards_info(&ids)?;
            self.order.insert(scope.to_string(), prioritize(&cards));
        }
        let order = self.order.get(scope).map(Vec::as_slice).unwrap_or_default();

        let total_cards = order.len();
        let end = start_from.saturating_add(self.settings.batch_size).min(total_cards);
        let batch_ids = order.get(start_from..end).unwrap_or_default();
        if batch_ids.is_empty() {
            return Ok(ReviewBatch {
                total_cards,
                start_from,
                next_start_from: start_from,
                ..ReviewBatch::default()
            });
        }

        let mut skipped_count = 0;
        let mut candidates = Vec::with_capacity(batch_ids.len());
        for card in source.cards_info(batch_ids)? {
            match (card.note_id, card.front_back()) {
                (Some(note_id), Some((front, back))) => candidates.push(PendingChange {
                    card_id: card.card_id,
                    note_id,
                    front_field: front.name.clone(),
                    back_field: back.name.clone(),
                    original_front: front.value.clone(),
                    original_back: back.value.clone(),
                    front: String::new(),
                    back: String::new(),
                }),
                (None, _) => {
                    warn!("skipping card {}: no note id", card.card_id);
                    skipped_count += 1;
                }
                (_, None) => {
                    warn!("skipping {}", CleanerError::MissingFields { card_id: card.card_id });
                    skipped_count += 1;
                }
            }
        }

        let pairs: Vec<(String, String)> = candidates
            .iter()
            .map(|c| (c.original_front.clone(), c.original_back.clone()))
            .collect();
        let results = transform_all(&pairs, self.settings.workers);

        let cards: Vec<PendingChange> = candidates
            .into_iter()
            .zip(results)
            .filter(|(_, result)| result.changed)
            .map(|(mut change, result)| {
                change.front = result.front;
                change.back = result.back;
                change
            })
            .collect();

        debug!(
            scope,
            start_from,
            processed = batch_ids.len(),
            changed = cards.len(),
            skipped = skipped_count,
            "reviewed batch"
        );

        Ok(ReviewBatch {
            cards,
            skipped_count,
            total_cards,
            processed_count: batch_ids.len(),
            start_from,
            next_start_from: end,
        })
    }

    /// Write accepted updates in chunks, falling back to one write per card
    /// when a chunk fails.
    pub fn apply<S>(&self, source: &mut S, updates: &[FieldUpdate]) -> ApplyReport
    where
        S: CardSource + ?Sized,
    {
        let mut updated_count = 0;
        for chunk in updates.chunks(self.settings.update_chunk_size.max(1)) {
            match source.update_fields(chunk) {
                Ok(()) => updated_count += chunk.len(),
                Err(err) => {
                    warn!("bulk update of {} cards failed: {}", chunk.len(), err);
                    for update in chunk {
                        match source.update_one(update) {
                            Ok(()) => updated_count += 1,
                            Err(err) => warn!("failed to update card {}: {}", update.card_id, err),
                        }
                    }
                }
            }
        }

        debug!(updated = updated_count, total = updates.len(), "applied updates");
        ApplyReport {
            updated_count,
            total_updates: updates.len(),
        }
    }
}
