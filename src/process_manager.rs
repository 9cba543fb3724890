//! Process-manager half of the two-phase protocol (spec §4.7): adds
//! state over time to the saga pattern. A PM maintains its own event
//! stream (`pm_domain`), separate from the input domains that trigger it,
//! so restarts rebuild its memory from durable PM events rather than
//! business events.

use crate::books::EventBookExt;
use crate::cover::CoverExt;
use crate::error::DispatchResult;
use crate::pages::EventPageExt;
use crate::proto::{CommandBook, Cover, EventBook, Notification, RejectionNotification};
use prost::Message;
use prost_types::Any;
use tracing::debug;

pub type StateRebuilder<S> = Box<dyn Fn(&EventBook) -> S + Send + Sync>;

type Applier<S> = Box<dyn Fn(&mut S, &[u8]) + Send + Sync>;

/// `(trigger, state, typed_event, destinations) -> (commands, pm_events)`.
pub type ProcessManagerHandler<S> = Box<
    dyn Fn(&EventBook, &S, &Any, &[EventBook]) -> DispatchResult<(Vec<CommandBook>, Vec<Any>)>
        + Send
        + Sync,
>;

/// `(trigger, state, notification) -> (commands, pm_events, outbound notification?)`.
pub type RejectionHandler<S> = Box<
    dyn Fn(&EventBook, &S, &RejectionNotification) -> DispatchResult<ProcessManagerResponse>
        + Send
        + Sync,
>;

#[derive(Default, Debug, Clone)]
pub struct ProcessManagerResponse {
    pub commands: Vec<CommandBook>,
    pub process_events: Vec<Any>,
    pub notification: Option<Notification>,
}

/// A stateful correlator reacting to events across one or more input
/// domains, with its own durable event stream keyed by `pm_domain`.
pub struct ProcessManagerRouter<S: Default> {
    name: String,
    pm_domain: String,
    rebuild: StateRebuilder<S>,
    appliers: Vec<(String, Applier<S>)>,
    handlers: Vec<((String, String), ProcessManagerHandler<S>)>,
    rejection_handlers: Vec<((String, String), RejectionHandler<S>)>,
}

impl<S: Default> ProcessManagerRouter<S> {
    pub fn new(name: impl Into<String>, pm_domain: impl Into<String>, rebuild: StateRebuilder<S>) -> Self {
        Self {
            name: name.into(),
            pm_domain: pm_domain.into(),
            rebuild,
            appliers: Vec::new(),
            handlers: Vec::new(),
            rejection_handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pm_domain(&self) -> &str {
        &self.pm_domain
    }

    pub fn input_domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.handlers.iter().map(|((d, _), _)| d.as_str()).collect();
        domains.sort_unstable();
        domains.dedup();
        domains
    }

    /// Register an applier maintaining the PM's own state from its own
    /// event stream.
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

    pub fn on(
        mut self,
        input_domain: impl Into<String>,
        suffix: impl Into<String>,
        handler: ProcessManagerHandler<S>,
    ) -> Self {
        self.handlers.push(((input_domain.into(), suffix.into()), handler));
        self
    }

    pub fn on_rejected(
        mut self,
        origin_domain: impl Into<String>,
        origin_command: impl Into<String>,
        handler: RejectionHandler<S>,
    ) -> Self {
        self.rejection_handlers
            .push(((origin_domain.into(), origin_command.into()), handler));
        self
    }

    pub fn rebuild_state(&self, process_events: &EventBook) -> S {
        (self.rebuild)(process_events)
    }

    /// Handle protocol (spec §4.7): rebuild PM state, then for each
    /// trigger page either route through the rejection table (Notification
    /// suffix) or the regular handler table, aggregating results.
    pub fn handle(
        &self,
        trigger: &EventBook,
        process_events: &EventBook,
        destinations: &[EventBook],
    ) -> DispatchResult<ProcessManagerResponse> {
        let state = self.rebuild_state(process_events);
        let domain = trigger.domain();
        debug!(pm = %self.name, domain, "handling trigger for process manager");

        let mut response = ProcessManagerResponse::default();
        for page in &trigger.pages {
            let Some(type_url) = page.type_url() else {
                continue;
            };
            let Some(bytes) = page.payload() else {
                continue;
            };

            if type_url.ends_with("Notification") {
                let envelope = Notification::decode(bytes).map_err(|e| {
                    crate::error::DispatchError::InvalidArgument(format!(
                        "malformed notification: {e}"
                    ))
                })?;
                let notification = envelope
                    .payload
                    .as_ref()
                    .map(|p| RejectionNotification::decode(p.value.as_slice()))
                    .transpose()
                    .map_err(|e| {
                        crate::error::DispatchError::InvalidArgument(format!(
                            "malformed rejection notification: {e}"
                        ))
                    })?
                    .unwrap_or_default();
                let (origin_domain, origin_command) =
                    crate::command_router::extract_rejection_key(&notification);
                if let Some((_, handler)) = self.rejection_handlers.iter().find(|((d, c), _)| {
                    d == &origin_domain && origin_command.ends_with(c.as_str())
                }) {
                    let result = handler(trigger, &state, &notification)?;
                    response.commands.extend(result.commands);
                    response.process_events.extend(result.process_events);
                    if result.notification.is_some() {
                        response.notification = result.notification;
                    }
                }
                continue;
            }

            let Some((_, handler)) = self
                .handlers
                .iter()
                .find(|((d, suffix), _)| d == domain && type_url.ends_with(suffix.as_str()))
            else {
                continue;
            };
            let any = Any {
                type_url: type_url.to_string(),
                value: bytes.to_vec(),
            };
            let (commands, pm_events) = handler(trigger, &state, &any, destinations)?;
            response.commands.extend(commands);
            response.process_events.extend(pm_events);
        }

        Ok(response)
    }

    /// Prepare phase, identical in spirit to `EventRouter::prepare_destinations`:
    /// the trigger's last page alone decides which destinations to fetch.
    /// PMs register their own per-domain/suffix `Cover` declarations the same
    /// way a saga does, via a caller-supplied closure evaluated against the
    /// last page, since PM prepare semantics are otherwise identical to a saga's.
    pub fn prepare_destinations(
        &self,
        trigger: &EventBook,
        declare: impl Fn(&Any) -> Vec<Cover>,
    ) -> Vec<Cover> {
        let Some(last) = trigger.last_page() else {
            return Vec::new();
        };
        let Some(type_url) = last.type_url() else {
            return Vec::new();
        };
        let Some(bytes) = last.payload() else {
            return Vec::new();
        };
        declare(&Any {
            type_url: type_url.to_string(),
            value: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{event_page, Cover as ProtoCover};

    #[derive(Clone, PartialEq, Message)]
    struct PaymentAuthorized {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    #[derive(Clone, PartialEq, Message)]
    struct OrderCorrelated {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    #[derive(Default)]
    struct FulfillmentState {
        correlated_orders: Vec<String>,
    }

    fn pm() -> ProcessManagerRouter<FulfillmentState> {
        ProcessManagerRouter::new(
            "fulfillment-pm",
            "_pm_fulfillment",
            Box::new(|_events: &EventBook| FulfillmentState::default()),
        )
        .applies("OrderCorrelated", |s: &mut FulfillmentState, e: &OrderCorrelated| {
            s.correlated_orders.push(e.order_id.clone());
        })
        .on(
            "payment",
            "PaymentAuthorized",
            Box::new(|_trigger, _state: &FulfillmentState, any, _dest| {
                let event = PaymentAuthorized::decode(any.value.as_slice()).unwrap();
                let pm_event = OrderCorrelated {
                    order_id: event.order_id.clone(),
                };
                Ok((
                    vec![CommandBook {
                        cover: Some(ProtoCover {
                            domain: "fulfillment".into(),
                            ..Default::default()
                        }),
                        pages: vec![],
                        saga_origin: None,
                    }],
                    vec![Any {
                        type_url: "type.googleapis.com/examples.OrderCorrelated".into(),
                        value: pm_event.encode_to_vec(),
                    }],
                ))
            }),
        )
    }

    #[test]
    fn handle_emits_commands_and_pm_events() {
        let trigger = EventBook {
            cover: Some(ProtoCover {
                domain: "payment".into(),
                ..Default::default()
            }),
            pages: vec![crate::proto::EventPage {
                sequence: 0,
                created_at: None,
                payload: Some(event_page::Payload::Event(Any {
                    type_url: "type.googleapis.com/examples.PaymentAuthorized".into(),
                    value: PaymentAuthorized { order_id: "1".into() }.encode_to_vec(),
                })),
            }],
            next_sequence: 1,
            snapshot: None,
        };

        let response = pm().handle(&trigger, &EventBook::default(), &[]).unwrap();
        assert_eq!(response.commands.len(), 1);
        assert_eq!(response.process_events.len(), 1);
    }
}
