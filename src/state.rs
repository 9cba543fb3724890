//! StateRebuilder (spec §4.3): apply an ordered sequence of decoded
//! events to a fresh state value.

use crate::pages::EventPageExt;
use crate::proto::{EventBook, EventPage};
use prost::Message;
use tracing::trace;

/// Mutates `S` in place given raw event bytes already known to match this
/// applier's suffix.
type EventApplier<S> = Box<dyn Fn(&mut S, &[u8]) + Send + Sync>;

type StateFactory<S> = Box<dyn Fn() -> S + Send + Sync>;

/// Registry of `(suffix, applier)` pairs plus an optional state factory.
/// `WithEvents`/`WithEventBook` replay a page sequence into a fresh state,
/// silently skipping anything this binary doesn't understand or can't
/// decode (forward compatibility, spec §4.3).
pub struct StateRouter<S: Default> {
    appliers: Vec<(String, EventApplier<S>)>,
    factory: Option<StateFactory<S>>,
}

impl<S: Default> Default for StateRouter<S> {
    fn default() -> Self {
        Self {
            appliers: Vec::new(),
            factory: None,
        }
    }
}

impl<S: Default> StateRouter<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Register an applier for events whose type-URL ends with `suffix`.
    pub fn on<E: Message + Default + 'static>(
        mut self,
        suffix: impl Into<String>,
        apply: impl Fn(&mut S, &E) + Send + Sync + 'static,
    ) -> Self {
        let suffix = suffix.into();
        self.appliers.push((
            suffix,
            Box::new(move |state, bytes| {
                if let Ok(event) = E::decode(bytes) {
                    apply(state, &event);
                }
            }),
        ));
        self
    }

    pub fn create_state(&self) -> S {
        match &self.factory {
            Some(f) => f(),
            None => S::default(),
        }
    }

    /// Replay `pages` into a fresh state. A snapshot, if present, is
    /// treated as a pre-applied starting point: only pages with
    /// `sequence > snapshot.sequence` are applied.
    pub fn with_event_book(&self, book: &EventBook) -> S {
        let mut state = self.create_state();
        let floor = book.snapshot.as_ref().map(|s| s.sequence);
        for page in &book.pages {
            if floor.is_some_and(|f| page.sequence_num() <= f) {
                continue;
            }
            self.apply_single(&mut state, page);
        }
        state
    }

    pub fn with_events(&self, pages: &[EventPage]) -> S {
        let mut state = self.create_state();
        for page in pages {
            self.apply_single(&mut state, page);
        }
        state
    }

    fn apply_single(&self, state: &mut S, page: &EventPage) {
        let Some(type_url) = page.type_url() else {
            trace!("event page carries no typed payload, skipping");
            return;
        };
        let Some(bytes) = page.payload() else {
            return;
        };
        for (suffix, applier) in &self.appliers {
            if type_url.ends_with(suffix.as_str()) {
                applier(state, bytes);
                return;
            }
        }
        trace!(type_url, "no applier registered for event type, skipping");
    }

    /// Produce a plain function closing over this router, usable wherever
    /// a `fn(&EventBook) -> S` is expected.
    pub fn into_rebuilder(self) -> impl Fn(&EventBook) -> S
    where
        S: 'static,
    {
        move |book: &EventBook| self.with_event_book(book)
    }
}
