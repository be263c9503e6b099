//! Normalization engine for language-learning flashcards.
//!
//! Provides:
//! - [`transform`], which rewrites a card's front and back into canonical
//!   markup (numbered definitions, muted example spans, emphasized headword)
//! - Markup normalization, segment extraction and line classification stages
//! - A card source seam with an in-memory source and a plain-text deck file
//! - A batch review driver that finds changed cards and writes them back

pub mod assemble;
pub mod classify;
pub mod cleaner;
pub mod deck_file;
pub mod error;
pub mod italic;
pub mod markup;
pub mod review;
pub mod segments;
pub mod source;
pub mod types;

pub use cleaner::{transform, transform_card};
pub use deck_file::{DeckCard, DeckFile};
pub use error::{CleanerError, Result};
pub use italic::ItalicContext;
pub use review::{prioritize, transform_all, ApplyReport, PendingChange, ReviewBatch, Reviewer};
pub use source::{CardId, CardSource, FieldUpdate, MemorySource, NoteField, Schedule, SourceCard};
pub use types::{
    Card, ClassifiedLine, CleanResult, HeadwordKind, LineRole, ReviewSettings, StyledSpan,
};
