//! Saga half of the two-phase protocol (spec §4.7): a stateless reactor
//! that treats every event in isolation, producing command books.

use crate::pages::EventPageExt;
use crate::proto::{CommandBook, EventBook};
use tracing::debug;

/// `(source_book, typed_event) -> one command book`.
pub type ReactHandler =
    Box<dyn Fn(&EventBook, &prost_types::Any) -> CommandBook + Send + Sync>;

/// `(source_book, typed_event) -> zero or more command books` (broadcast).
pub type ReactMultiHandler =
    Box<dyn Fn(&EventBook, &prost_types::Any) -> Vec<CommandBook> + Send + Sync>;

enum Reaction {
    Single(ReactHandler),
    Multi(ReactMultiHandler),
}

/// A single-input-domain saga: register reactions by event-type suffix,
/// Execute emits one command book per matching page (or several, for
/// `reacts_to_multi`).
pub struct SagaRouter {
    name: String,
    input_domain: String,
    reactions: Vec<(String, Reaction)>,
}

impl SagaRouter {
    pub fn new(name: impl Into<String>, input_domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_domain: input_domain.into(),
            reactions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_domain(&self) -> &str {
        &self.input_domain
    }

    pub fn reacts_to(mut self, suffix: impl Into<String>, handler: ReactHandler) -> Self {
        self.reactions.push((suffix.into(), Reaction::Single(handler)));
        self
    }

    pub fn reacts_to_multi(mut self, suffix: impl Into<String>, handler: ReactMultiHandler) -> Self {
        self.reactions.push((suffix.into(), Reaction::Multi(handler)));
        self
    }

    /// Execute: iterate every page of `source`, first matching suffix
    /// wins, collect emitted command books in page order.
    pub fn execute(&self, source: &EventBook) -> Vec<CommandBook> {
        debug!(saga = %self.name, "executing saga");
        let mut commands = Vec::new();
        for page in &source.pages {
            let Some(type_url) = page.type_url() else {
                continue;
            };
            let Some(bytes) = page.payload() else {
                continue;
            };
            let Some((_, reaction)) = self
                .reactions
                .iter()
                .find(|(suffix, _)| type_url.ends_with(suffix.as_str()))
            else {
                continue;
            };
            let any = prost_types::Any {
                type_url: type_url.to_string(),
                value: bytes.to_vec(),
            };
            match reaction {
                Reaction::Single(handler) => commands.push(handler(source, &any)),
                Reaction::Multi(handler) => commands.extend(handler(source, &any)),
            }
        }
        commands
    }
}
