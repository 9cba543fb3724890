//! `EventBook`/`CommandBook` level extensions: next-sequence calculation,
//! first/last page access (spec §3, §8 invariants).

use crate::cover::CoverExt;
use crate::proto::{CommandBook, EventBook, EventPage, MergeStrategy, Snapshot};

/// `next_sequence` of an empty book (and no snapshot) is `0` (spec §8).
pub fn calculate_next_sequence(pages: &[EventPage], snapshot: Option<&Snapshot>) -> u32 {
    match pages.last() {
        Some(last) => last.sequence + 1,
        None => snapshot.map(|s| s.sequence + 1).unwrap_or(0),
    }
}

pub fn calculate_set_next_seq(book: &mut EventBook) {
    book.next_sequence = calculate_next_sequence(&book.pages, book.snapshot.as_ref());
}

pub trait EventBookExt: CoverExt {
    fn next_sequence(&self) -> u32;
    fn is_empty(&self) -> bool;
    fn last_page(&self) -> Option<&EventPage>;
    fn first_page(&self) -> Option<&EventPage>;
}

impl EventBookExt for EventBook {
    fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn last_page(&self) -> Option<&EventPage> {
        self.pages.last()
    }

    fn first_page(&self) -> Option<&EventPage> {
        self.pages.first()
    }
}

pub trait CommandBookExt: CoverExt {
    fn command_sequence(&self) -> Option<u32>;
    fn first_command(&self) -> Option<&crate::proto::CommandPage>;
    /// Defaults to commutative when the book carries no pages.
    fn merge_strategy(&self) -> MergeStrategy;
}

impl CommandBookExt for CommandBook {
    fn command_sequence(&self) -> Option<u32> {
        self.pages.first().map(|p| p.sequence)
    }

    fn first_command(&self) -> Option<&crate::proto::CommandPage> {
        self.pages.first()
    }

    fn merge_strategy(&self) -> MergeStrategy {
        self.pages
            .first()
            .map(|p| p.merge_strategy())
            .unwrap_or(MergeStrategy::Commutative)
    }
}
