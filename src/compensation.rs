//! CompensationRouter (spec §4.8): detect rejection notifications, route
//! to `(domain, command)` handlers, and build delegation responses when
//! no custom handler applies.

use crate::cover::CoverExt;
use crate::error::DispatchResult;
use crate::proto::{
    business_response, BusinessResponse, CommandBook, IssuerType, Notification,
    RejectionNotification, RevocationResponse,
};
use prost::Message;
use tracing::debug;

/// `(rejection_notification) -> new compensation events, or a framework
/// delegation`.
pub type CompensationHandler =
    Box<dyn Fn(&CompensationContext) -> DispatchResult<BusinessResponse> + Send + Sync>;

/// Any payload whose type-URL ends in `Notification` is a candidate.
pub fn is_notification(type_url: &str) -> bool {
    type_url.ends_with("Notification")
}

/// A decoded view over a `Notification` carrying a `RejectionNotification`
/// payload. Malformed payloads yield an empty context, never raise.
#[derive(Default, Debug, Clone)]
pub struct CompensationContext {
    pub issuer_name: String,
    pub issuer_type: IssuerType,
    pub source_event_sequence: u32,
    pub rejection_reason: String,
    pub rejected_command: Option<CommandBook>,
    pub source_aggregate: Option<crate::proto::Cover>,
}

impl CompensationContext {
    pub fn from_notification(notification: &Notification) -> Self {
        let Some(payload) = notification.payload.as_ref() else {
            return Self::default();
        };
        if !is_notification(&payload.type_url) {
            return Self::default();
        }
        match RejectionNotification::decode(payload.value.as_slice()) {
            Ok(rejection) => Self {
                issuer_name: rejection.issuer_name,
                issuer_type: IssuerType::try_from(rejection.issuer_type)
                    .unwrap_or(IssuerType::Unspecified),
                source_event_sequence: rejection.source_event_sequence,
                rejection_reason: rejection.rejection_reason,
                rejected_command: rejection.rejected_command,
                source_aggregate: rejection.source_aggregate,
            },
            Err(_) => Self::default(),
        }
    }

    /// `(domain_of_rejected_command, terminal_segment_of_rejected_command_type_url)`.
    pub fn rejected_command_type_url(&self) -> Option<&str> {
        self.rejected_command
            .as_ref()?
            .pages
            .first()?
            .command
            .as_ref()
            .map(|a| a.type_url.as_str())
    }

    pub fn key(&self) -> (String, String) {
        let domain = self
            .rejected_command
            .as_ref()
            .map(|c| c.domain().to_string())
            .unwrap_or_else(|| crate::cover::UNKNOWN_DOMAIN.to_string());
        let command = self
            .rejected_command_type_url()
            .map(crate::convert::type_name_from_url)
            .unwrap_or("")
            .to_string();
        (domain, command)
    }
}

/// Routes rejection notifications for one aggregate domain to
/// `(origin_domain, origin_command)`-keyed compensation handlers.
pub struct CompensationRouter {
    domain: String,
    handlers: Vec<((String, String), CompensationHandler)>,
}

impl CompensationRouter {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            handlers: Vec::new(),
        }
    }

    pub fn on(
        mut self,
        origin_domain: impl Into<String>,
        origin_command: impl Into<String>,
        handler: CompensationHandler,
    ) -> Self {
        self.handlers
            .push(((origin_domain.into(), origin_command.into()), handler));
        self
    }

    pub fn route(&self, notification: &Notification) -> DispatchResult<BusinessResponse> {
        let context = CompensationContext::from_notification(notification);
        let (origin_domain, origin_command) = context.key();

        for ((domain, command_suffix), handler) in &self.handlers {
            if domain == &origin_domain && origin_command.ends_with(command_suffix.as_str()) {
                debug!(domain = %origin_domain, command = %origin_command, "routing to compensation handler");
                return handler(&context);
            }
        }

        let reason = format!(
            "Aggregate {} has no custom compensation for {}/{}",
            self.domain, origin_domain, origin_command
        );
        debug!(reason = %reason, "defaulting to framework delegation");
        Ok(BusinessResponse {
            response: Some(business_response::Response::Revocation(RevocationResponse {
                emit_system_revocation: true,
                reason,
                ..Default::default()
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{CommandPage, Cover};
    use prost_types::Any;

    fn rejection_notification(domain: &str, suffix: &str) -> Notification {
        let rejection = RejectionNotification {
            issuer_name: "fulfillment-saga".into(),
            issuer_type: IssuerType::Saga as i32,
            source_aggregate: Some(Cover {
                domain: "fulfillment".into(),
                ..Default::default()
            }),
            source_event_sequence: 3,
            rejection_reason: "insufficient stock".into(),
            rejected_command: Some(CommandBook {
                cover: Some(Cover {
                    domain: domain.into(),
                    ..Default::default()
                }),
                pages: vec![CommandPage {
                    sequence: 0,
                    merge_strategy: 0,
                    command: Some(Any {
                        type_url: format!("type.googleapis.com/examples.{suffix}"),
                        value: vec![],
                    }),
                }],
                saga_origin: None,
            }),
        };
        Notification {
            cover: Some(Cover {
                domain: "order".into(),
                ..Default::default()
            }),
            sent_at: None,
            payload: Some(Any {
                type_url: "type.googleapis.com/angzarr.RejectionNotification".into(),
                value: rejection.encode_to_vec(),
            }),
        }
    }

    #[test]
    fn routes_to_registered_handler() {
        let router = CompensationRouter::new("order").on(
            "fulfillment",
            "CreateShipment",
            Box::new(|_ctx| {
                Ok(BusinessResponse {
                    response: Some(business_response::Response::Events(
                        crate::proto::EventBook::default(),
                    )),
                })
            }),
        );
        let notification = rejection_notification("fulfillment", "CreateShipment");
        let response = router.route(&notification).unwrap();
        assert!(matches!(
            response.response,
            Some(business_response::Response::Events(_))
        ));
    }

    #[test]
    fn defaults_to_delegation_when_no_handler() {
        let router = CompensationRouter::new("order");
        let notification = rejection_notification("payment", "Charge");
        let response = router.route(&notification).unwrap();
        match response.response {
            Some(business_response::Response::Revocation(revocation)) => {
                assert!(revocation.emit_system_revocation);
                assert_eq!(
                    revocation.reason,
                    "Aggregate order has no custom compensation for payment/Charge"
                );
            }
            _ => panic!("expected revocation"),
        }
    }

    #[test]
    fn malformed_notification_yields_empty_context() {
        let notification = Notification {
            cover: None,
            sent_at: None,
            payload: Some(Any {
                type_url: "type.googleapis.com/angzarr.RejectionNotification".into(),
                value: vec![0xFF, 0xFF],
            }),
        };
        let context = CompensationContext::from_notification(&notification);
        assert_eq!(context.issuer_name, "");
        assert!(context.rejected_command.is_none());
    }
}
