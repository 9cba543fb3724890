//! AggregateCore (spec §4.6): the OO-style aggregate for users who
//! prefer an object per aggregate rather than the functional
//! `CommandRouter`. Composition, not inheritance (spec §9) — a user
//! aggregate holds one of these and forwards lifecycle calls to it.

use crate::error::DispatchResult;
use crate::proto::{event_page, EventBook, EventPage};
use prost::Message;
use prost_types::Any;

type Applier<S> = Box<dyn Fn(&mut S, &[u8]) + Send + Sync>;
type SingleHandler<S> = Box<dyn Fn(&Any, &S) -> DispatchResult<Any> + Send + Sync>;
type MultiHandler<S> = Box<dyn Fn(&Any, &S) -> DispatchResult<Vec<Any>> + Send + Sync>;

enum Registration<S> {
    Single(SingleHandler<S>),
    Multi(MultiHandler<S>),
}

/// Constructed per request with the inbound event book and a state
/// factory; assembles its own outgoing `EventBook` as handlers dispatch.
pub struct AggregateCore<S: Default> {
    appliers: Vec<(String, Applier<S>)>,
    handlers: Vec<(String, Registration<S>)>,
    book: EventBook,
    state: Option<S>,
}

impl<S: Default> AggregateCore<S> {
    pub fn new(book: EventBook) -> Self {
        Self {
            appliers: Vec::new(),
            handlers: Vec::new(),
            book,
            state: None,
        }
    }

    pub fn applies<E: Message + Default + 'static>(
        mut self,
        suffix: impl Into<String>,
        apply: impl Fn(&mut S, &E) + Send + Sync + 'static,
    ) -> Self {
        self.appliers.push((
            suffix.into(),
            Box::new(move |state, bytes| {
                if let Ok(event) = E::decode(bytes) {
                    apply(state, &event);
                }
            }),
        ));
        self
    }

    pub fn handles(
        mut self,
        suffix: impl Into<String>,
        handle: impl Fn(&Any, &S) -> DispatchResult<Any> + Send + Sync + 'static,
    ) -> Self {
        self.handlers
            .push((suffix.into(), Registration::Single(Box::new(handle))));
        self
    }

    pub fn handles_multi(
        mut self,
        suffix: impl Into<String>,
        handle: impl Fn(&Any, &S) -> DispatchResult<Vec<Any>> + Send + Sync + 'static,
    ) -> Self {
        self.handlers
            .push((suffix.into(), Registration::Multi(Box::new(handle))));
        self
    }

    /// State is built lazily: rebuild scans the event book, applies each
    /// event, then clears the book so only newly produced events remain.
    pub fn state(&mut self) -> &S {
        if self.state.is_none() {
            let mut state = S::default();
            for page in &self.book.pages {
                self.apply_one(&mut state, page);
            }
            self.book.pages.clear();
            self.state = Some(state);
        }
        self.state.as_ref().unwrap()
    }

    fn apply_one(&self, state: &mut S, page: &EventPage) {
        let Some(event_page::Payload::Event(any)) = &page.payload else {
            return;
        };
        for (suffix, applier) in &self.appliers {
            if any.type_url.ends_with(suffix.as_str()) {
                applier(state, &any.value);
                return;
            }
        }
    }

    /// Dispatch a typed command: rebuild state if needed, invoke the
    /// matching handler, pack and apply every returned event, and append
    /// it to the event book.
    pub fn dispatch(&mut self, command: &Any) -> DispatchResult<()> {
        self.state();
        let handler_idx = self
            .handlers
            .iter()
            .position(|(suffix, _)| command.type_url.ends_with(suffix.as_str()));

        let Some(idx) = handler_idx else {
            return Err(crate::error::DispatchError::Unknown(command.type_url.clone()));
        };

        let produced = match &self.handlers[idx].1 {
            Registration::Single(handle) => vec![handle(command, self.state.as_ref().unwrap())?],
            Registration::Multi(handle) => handle(command, self.state.as_ref().unwrap())?,
        };

        let state = self.state.as_mut().unwrap();
        let mut next_seq = self.book.next_sequence;
        for any in produced {
            Self::apply_one_to(&self.appliers, state, &any);
            self.book.pages.push(EventPage {
                sequence: next_seq,
                created_at: None,
                payload: Some(event_page::Payload::Event(any)),
            });
            next_seq += 1;
        }
        self.book.next_sequence = next_seq;
        Ok(())
    }

    fn apply_one_to(appliers: &[(String, Applier<S>)], state: &mut S, any: &Any) {
        for (suffix, applier) in appliers {
            if any.type_url.ends_with(suffix.as_str()) {
                applier(state, &any.value);
                return;
            }
        }
    }

    /// The event book as it stands: after `dispatch` returns normally,
    /// contains exactly the newly produced events in order.
    pub fn into_book(self) -> EventBook {
        self.book
    }

    pub fn book(&self) -> &EventBook {
        &self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::type_url;

    #[derive(Clone, PartialEq, Message)]
    struct Deposit {
        #[prost(int64, tag = "1")]
        amount: i64,
    }

    #[derive(Clone, PartialEq, Message)]
    struct Deposited {
        #[prost(int64, tag = "1")]
        amount: i64,
    }

    #[derive(Default)]
    struct Account {
        balance: i64,
    }

    fn core() -> AggregateCore<Account> {
        AggregateCore::new(EventBook::default())
            .applies("Deposited", |s: &mut Account, e: &Deposited| {
                s.balance += e.amount;
            })
            .handles("Deposit", |any, _state: &Account| {
                let cmd = Deposit::decode(any.value.as_slice()).unwrap();
                Ok(Any {
                    type_url: type_url("examples.Deposited"),
                    value: Deposited { amount: cmd.amount }.encode_to_vec(),
                })
            })
    }

    #[test]
    fn dispatch_appends_new_events_and_updates_state() {
        let mut agg = core();
        let cmd = Any {
            type_url: type_url("examples.Deposit"),
            value: Deposit { amount: 10 }.encode_to_vec(),
        };
        agg.dispatch(&cmd).unwrap();
        assert_eq!(agg.state().balance, 10);
        let book = agg.into_book();
        assert_eq!(book.pages.len(), 1);
        assert_eq!(book.pages[0].sequence, 0);
        assert_eq!(book.next_sequence, 1);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut agg = core();
        let cmd = Any {
            type_url: type_url("examples.Withdraw"),
            value: vec![],
        };
        assert!(agg.dispatch(&cmd).is_err());
    }
}
