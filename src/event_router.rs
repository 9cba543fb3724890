//! EventRouter (spec §4.5): dispatch events from a source domain to
//! saga/process-manager/projector handlers. Serves three roles,
//! distinguished only by registration shape.

use crate::books::EventBookExt;
use crate::cover::CoverExt;
use crate::pages::EventPageExt;
use crate::proto::{CommandBook, Cover, EventBook};
use tracing::{debug, trace};

/// `(source_book, typed_event, destinations) -> emitted command books`.
pub type EventHandler =
    Box<dyn Fn(&EventBook, &prost_types::Any, &[EventBook]) -> Vec<CommandBook> + Send + Sync>;

/// `(source_book, typed_event) -> destination covers to fetch`.
pub type PrepareHandler = Box<dyn Fn(&EventBook, &prost_types::Any) -> Vec<Cover> + Send + Sync>;

struct DomainHandlers {
    handlers: Vec<(String, EventHandler)>,
    prepare_handlers: Vec<(String, PrepareHandler)>,
}

impl DomainHandlers {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
            prepare_handlers: Vec::new(),
        }
    }
}

/// Dispatches events for a saga (single input domain), a multi-domain
/// process manager/projector, or a Prepare phase, all via the same table
/// shape.
pub struct EventRouter {
    name: String,
    output_types: Vec<String>,
    domains: Vec<(String, DomainHandlers)>,
}

impl EventRouter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_types: Vec::new(),
            domains: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare the command types this router is allowed to emit (purely
    /// documentary / introspection, not enforced at dispatch).
    pub fn sends(mut self, type_name: impl Into<String>) -> Self {
        self.output_types.push(type_name.into());
        self
    }

    pub fn output_types(&self) -> &[String] {
        &self.output_types
    }

    fn domain_entry(&mut self, domain: &str) -> &mut DomainHandlers {
        if let Some(idx) = self.domains.iter().position(|(d, _)| d == domain) {
            &mut self.domains[idx].1
        } else {
            self.domains.push((domain.to_string(), DomainHandlers::new()));
            &mut self.domains.last_mut().unwrap().1
        }
    }

    /// Register a handler for `domain`'s events whose type-URL ends with
    /// `suffix`. For a single-domain saga, call this once per suffix with
    /// the saga's one input domain.
    pub fn on(mut self, domain: impl Into<String>, suffix: impl Into<String>, handler: EventHandler) -> Self {
        let domain = domain.into();
        self.domain_entry(&domain)
            .handlers
            .push((suffix.into(), handler));
        self
    }

    /// Register a Prepare-phase handler: given the triggering event,
    /// declare which destinations must be fetched before Execute runs.
    pub fn prepare(
        mut self,
        domain: impl Into<String>,
        suffix: impl Into<String>,
        handler: PrepareHandler,
    ) -> Self {
        let domain = domain.into();
        self.domain_entry(&domain)
            .prepare_handlers
            .push((suffix.into(), handler));
        self
    }

    pub fn input_domains(&self) -> Vec<&str> {
        self.domains.iter().map(|(d, _)| d.as_str()).collect()
    }

    /// Prepare algorithm (spec §4.5): only the *last* page of the source
    /// book is considered.
    pub fn prepare_destinations(&self, source: &EventBook) -> Vec<Cover> {
        let domain = source.domain();
        let Some((_, handlers)) = self.domains.iter().find(|(d, _)| d == domain) else {
            return Vec::new();
        };
        let Some(last) = source.last_page() else {
            return Vec::new();
        };
        let Some(type_url) = last.type_url() else {
            return Vec::new();
        };
        for (suffix, handler) in &handlers.prepare_handlers {
            if type_url.ends_with(suffix.as_str()) {
                let any = prost_types::Any {
                    type_url: type_url.to_string(),
                    value: last.payload().unwrap_or(&[]).to_vec(),
                };
                return handler(source, &any);
            }
        }
        Vec::new()
    }

    /// Execute algorithm (spec §4.5): iterate *all* pages; first matching
    /// suffix per page wins.
    pub fn dispatch(&self, source: &EventBook, destinations: &[EventBook]) -> Vec<CommandBook> {
        let domain = source.domain();
        debug!(router = %self.name, domain, "executing event router");
        let Some((_, handlers)) = self.domains.iter().find(|(d, _)| d == domain) else {
            trace!(domain, "no handlers registered for this domain");
            return Vec::new();
        };

        let mut commands = Vec::new();
        for page in &source.pages {
            let Some(type_url) = page.type_url() else {
                continue;
            };
            let Some(bytes) = page.payload() else {
                continue;
            };
            let matched = handlers
                .handlers
                .iter()
                .find(|(suffix, _)| type_url.ends_with(suffix.as_str()));
            if let Some((_, handler)) = matched {
                let any = prost_types::Any {
                    type_url: type_url.to_string(),
                    value: bytes.to_vec(),
                };
                commands.extend(handler(source, &any, destinations));
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{event_page, Cover, EventPage};
    use prost::Message;
    use prost_types::Any;

    #[derive(Clone, PartialEq, Message)]
    struct OrderPlaced {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    fn book_with(domain: &str, pages: Vec<EventPage>) -> EventBook {
        EventBook {
            cover: Some(Cover {
                domain: domain.into(),
                ..Default::default()
            }),
            pages,
            next_sequence: 0,
            snapshot: None,
        }
    }

    fn event_page(seq: u32, suffix: &str, bytes: Vec<u8>) -> EventPage {
        EventPage {
            sequence: seq,
            created_at: None,
            payload: Some(event_page::Payload::Event(Any {
                type_url: format!("type.googleapis.com/examples.{suffix}"),
                value: bytes,
            })),
        }
    }

    #[test]
    fn prepare_only_considers_last_page() {
        let router = EventRouter::new("shipment-saga").prepare(
            "order",
            "OrderPlaced",
            Box::new(|_source, _any| vec![Cover { domain: "fulfillment".into(), ..Default::default() }]),
        );

        let source = book_with(
            "order",
            vec![
                event_page(0, "SomethingElse", vec![]),
                event_page(1, "OrderPlaced", OrderPlaced { order_id: "1".into() }.encode_to_vec()),
            ],
        );

        let destinations = router.prepare_destinations(&source);
        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0].domain, "fulfillment");
    }

    #[test]
    fn execute_iterates_all_pages() {
        let router = EventRouter::new("shipment-saga").on(
            "order",
            "OrderPlaced",
            Box::new(|_source, _any, _dest| {
                vec![CommandBook::default()]
            }),
        );

        let source = book_with(
            "order",
            vec![
                event_page(0, "OrderPlaced", OrderPlaced { order_id: "1".into() }.encode_to_vec()),
                event_page(1, "OrderPlaced", OrderPlaced { order_id: "2".into() }.encode_to_vec()),
            ],
        );

        let commands = router.dispatch(&source, &[]);
        assert_eq!(commands.len(), 2);
    }
}
