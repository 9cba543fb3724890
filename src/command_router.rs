//! CommandRouter (spec §4.4): dispatch a command to one handler, keyed by
//! suffix, with rebuilt state and the next sequence; surface business
//! rejections as typed responses.

use crate::books::EventBookExt;
use crate::cover::CoverExt;
use crate::error::{DispatchError, DispatchResult};
use crate::pages::CommandPageExt;
use crate::proto::{
    business_response, BusinessResponse, CommandBook, ContextualCommand, EventBook, Notification,
    RejectionNotification, RevocationResponse,
};
use prost::Message;
use prost_types::Any;
use tracing::{debug, trace};

/// Rebuilds aggregate state `S` from the inbound prior-events book.
pub type StateRebuilder<S> = Box<dyn Fn(&EventBook) -> S + Send + Sync>;

/// `(command_book, typed_command, state, next_seq) -> new events`.
pub type CommandHandler<S> =
    Box<dyn Fn(&CommandBook, &Any, &S, u32) -> DispatchResult<EventBook> + Send + Sync>;

/// A compensation handler invoked when a rejection notification's
/// `(origin_domain, origin_command)` matches this registration.
pub type RevocationHandler<S> =
    Box<dyn Fn(&RejectionNotification, &S) -> DispatchResult<EventBook> + Send + Sync>;

/// Dispatches commands for one aggregate domain to suffix-keyed handlers.
pub struct CommandRouter<S> {
    domain: String,
    rebuild: StateRebuilder<S>,
    handlers: Vec<(String, CommandHandler<S>)>,
    rejection_handlers: Vec<((String, String), RevocationHandler<S>)>,
}

impl<S> CommandRouter<S> {
    pub fn new(domain: impl Into<String>, rebuild: StateRebuilder<S>) -> Self {
        Self {
            domain: domain.into(),
            rebuild,
            handlers: Vec::new(),
            rejection_handlers: Vec::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn command_types(&self) -> Vec<&str> {
        self.handlers.iter().map(|(s, _)| s.as_str()).collect()
    }

    /// Register a handler for commands whose type-URL ends with `suffix`.
    /// Later registrations for a colliding suffix never shadow an earlier
    /// one — first match wins at dispatch time, per registration order.
    pub fn on(mut self, suffix: impl Into<String>, handler: CommandHandler<S>) -> Self {
        self.handlers.push((suffix.into(), handler));
        self
    }

    /// Register a compensation handler keyed by the rejected command's
    /// `(origin_domain, origin_command_suffix)`.
    pub fn on_rejected(
        mut self,
        origin_domain: impl Into<String>,
        origin_command: impl Into<String>,
        handler: RevocationHandler<S>,
    ) -> Self {
        self.rejection_handlers
            .push(((origin_domain.into(), origin_command.into()), handler));
        self
    }

    pub fn rebuild_state(&self, events: &EventBook) -> S {
        (self.rebuild)(events)
    }

    /// Dispatch algorithm per spec §4.4.
    pub fn dispatch(&self, request: &ContextualCommand) -> DispatchResult<BusinessResponse> {
        let command = request
            .command
            .as_ref()
            .ok_or_else(|| DispatchError::InvalidArgument("no command pages".into()))?;
        let first_page = command
            .pages
            .first()
            .ok_or_else(|| DispatchError::InvalidArgument("no command pages".into()))?;
        let any = first_page
            .command
            .as_ref()
            .ok_or_else(|| DispatchError::InvalidArgument("empty command payload".into()))?;

        let events = request.events.clone().unwrap_or_default();
        let state = self.rebuild_state(&events);
        let next_seq = events.next_sequence();

        debug!(
            domain = %self.domain,
            correlation_id = %command.correlation_id(),
            type_url = %any.type_url,
            "dispatching command"
        );

        if any.type_url.ends_with("Notification") {
            return self.dispatch_notification(any, command, &state);
        }

        for (suffix, handler) in &self.handlers {
            if any.type_url.ends_with(suffix.as_str()) {
                let new_events = handler(command, any, &state, next_seq)?;
                return Ok(BusinessResponse {
                    response: Some(business_response::Response::Events(new_events)),
                });
            }
        }

        Err(DispatchError::Unknown(any.type_url.clone()))
    }

    pub fn dispatch_notification(
        &self,
        any: &Any,
        command: &CommandBook,
        state: &S,
    ) -> DispatchResult<BusinessResponse> {
        let envelope = Notification::decode(any.value.as_slice())
            .map_err(|e| DispatchError::InvalidArgument(format!("malformed notification: {e}")))?;
        let notification = envelope
            .payload
            .as_ref()
            .map(|p| RejectionNotification::decode(p.value.as_slice()))
            .transpose()
            .map_err(|e| {
                DispatchError::InvalidArgument(format!("malformed rejection notification: {e}"))
            })?
            .unwrap_or_default();
        let (origin_domain, origin_command) = extract_rejection_key(&notification);

        for ((domain, cmd_suffix), handler) in &self.rejection_handlers {
            if domain == &origin_domain && origin_command.ends_with(cmd_suffix.as_str()) {
                trace!(domain = %origin_domain, command = %origin_command, "routing rejection to compensation handler");
                let new_events = handler(&notification, state)?;
                return Ok(BusinessResponse {
                    response: Some(business_response::Response::Events(new_events)),
                });
            }
        }

        let reason = format!(
            "Aggregate {} has no custom compensation for {}/{}",
            self.domain, origin_domain, origin_command
        );
        debug!(reason = %reason, "no compensation handler, defaulting to delegation");
        let _ = command;
        Ok(BusinessResponse {
            response: Some(business_response::Response::Revocation(RevocationResponse {
                emit_system_revocation: true,
                reason,
                ..Default::default()
            })),
        })
    }
}

/// `(origin_domain, terminal_segment_of_rejected_command_type_url)`.
pub fn extract_rejection_key(notification: &RejectionNotification) -> (String, String) {
    let rejected = notification.rejected_command.as_ref();
    let domain = rejected
        .map(|c| c.domain().to_string())
        .unwrap_or_else(|| crate::cover::UNKNOWN_DOMAIN.to_string());
    let command = rejected
        .and_then(|c| c.pages.first())
        .and_then(|p| p.type_url())
        .map(crate::convert::type_name_from_url)
        .unwrap_or("")
        .to_string();
    (domain, command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{event_page, Cover, EventPage};
    use crate::error::CommandRejectedError;

    #[derive(Clone, PartialEq, Message)]
    struct RegisterPlayer {
        #[prost(string, tag = "1")]
        display_name: String,
        #[prost(string, tag = "2")]
        email: String,
    }

    #[derive(Clone, PartialEq, Message)]
    struct PlayerRegistered {
        #[prost(string, tag = "1")]
        display_name: String,
    }

    #[derive(Default)]
    struct PlayerState {
        registered: bool,
    }

    fn router() -> CommandRouter<PlayerState> {
        CommandRouter::new(
            "player",
            Box::new(|_events: &EventBook| PlayerState::default()),
        )
        .on(
            "RegisterPlayer",
            Box::new(|_cmd, any, state: &PlayerState, next_seq| {
                if state.registered {
                    return Err(CommandRejectedError::new("already registered").into());
                }
                let typed = RegisterPlayer::decode(any.value.as_slice()).unwrap();
                let event = PlayerRegistered {
                    display_name: typed.display_name,
                };
                Ok(EventBook {
                    cover: None,
                    pages: vec![EventPage {
                        sequence: next_seq,
                        created_at: None,
                        payload: Some(event_page::Payload::Event(Any {
                            type_url: "type.googleapis.com/examples.PlayerRegistered".into(),
                            value: event.encode_to_vec(),
                        })),
                    }],
                    next_sequence: next_seq + 1,
                    snapshot: None,
                })
            }),
        )
    }

    fn contextual_command(type_url: &str, bytes: Vec<u8>, seq: u32) -> ContextualCommand {
        ContextualCommand {
            command: Some(CommandBook {
                cover: Some(Cover {
                    domain: "player".into(),
                    ..Default::default()
                }),
                pages: vec![crate::proto::CommandPage {
                    sequence: seq,
                    merge_strategy: 0,
                    command: Some(Any {
                        type_url: type_url.into(),
                        value: bytes,
                    }),
                }],
                saga_origin: None,
            }),
            events: Some(EventBook::default()),
        }
    }

    #[test]
    fn dispatches_on_fresh_aggregate() {
        let request = contextual_command(
            "type.googleapis.com/examples.RegisterPlayer",
            RegisterPlayer {
                display_name: "A".into(),
                email: "a@x".into(),
            }
            .encode_to_vec(),
            0,
        );
        let response = router().dispatch(&request).unwrap();
        match response.response {
            Some(business_response::Response::Events(events)) => {
                assert_eq!(events.pages.len(), 1);
                assert_eq!(events.pages[0].sequence, 0);
                assert_eq!(events.next_sequence, 1);
            }
            _ => panic!("expected events"),
        }
    }

    #[test]
    fn unknown_command_suffix_is_invalid_argument() {
        let request = contextual_command("type.googleapis.com/examples.SomethingElse", vec![], 0);
        let err = router().dispatch(&request).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().starts_with("unknown command type"));
    }

    #[test]
    fn no_command_pages_is_an_error() {
        let request = ContextualCommand {
            command: Some(CommandBook::default()),
            events: None,
        };
        let err = router().dispatch(&request).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
