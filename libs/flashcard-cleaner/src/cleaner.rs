//! The card transform.
//!
//! [`transform`] is a total function: malformed markup degrades to plain
//! text and the only signal returned is whether anything changed.

use tracing::debug;

use crate::assemble::{self, Reassembler};
use crate::italic::ItalicContext;
use crate::markup;
use crate::segments;
use crate::types::{Card, CleanResult};

/// Normalize one card's front and back into canonical form.
pub fn transform(front: &str, back: &str) -> CleanResult {
    let new_front = markup::normalize(front);
    let normalized_back = markup::normalize(back);

    let italics = ItalicContext::from_front(&new_front).with_repeated_words(&normalized_back);
    let segments = segments::extract(&normalized_back);
    let new_back = Reassembler::new(&italics)
        .back(&segments)
        .unwrap_or_else(|| normalized_back.trim().to_string());
    let new_front = assemble::annotate_front(&new_front, segments.len());

    let changed = new_front != front || new_back != back;
    debug!(
        segments = segments.len(),
        headword = ?italics.kind(),
        changed,
        "transformed card"
    );

    CleanResult {
        front: new_front,
        back: new_back,
        changed,
    }
}

/// [`transform`] applied to a [`Card`].
pub fn transform_card(card: &Card) -> CleanResult {
    transform(&card.front, &card.back)
}

impl CleanResult {
    pub fn into_card(self) -> Card {
        Card::new(self.front, self.back)
    }
}
