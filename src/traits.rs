//! External interface traits (spec §6): the wire surface a transport
//! consumes from, or calls into, the dispatch core. No `tonic::transport`
//! connection machinery lives here — these are contracts, not clients.

use crate::error::DispatchResult;
use crate::proto::{
    BusinessResponse, CommandBook, ContextualCommand, EventBook, Query,
};
use async_trait::async_trait;

/// Implemented by whatever executes a `CommandBook` against an aggregate
/// over the wire.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn execute(&self, command: CommandBook) -> DispatchResult<BusinessResponse>;
}

/// Read-side access: `GetEventBook`/`GetEvents` (spec §6).
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn get_event_book(&self, query: Query) -> DispatchResult<EventBook>;
    async fn get_events(&self, query: Query) -> DispatchResult<Vec<EventBook>>;
}

/// Dry-run / speculative execution against a projector, saga, or process
/// manager without persistence (spec §6 Speculative surface).
#[async_trait]
pub trait SpeculativeClient: Send + Sync {
    async fn dry_run(&self, command: CommandBook) -> DispatchResult<BusinessResponse>;
    async fn speculate_projector(&self, name: &str, events: EventBook) -> DispatchResult<()>;
    async fn speculate_saga(&self, name: &str, events: EventBook) -> DispatchResult<Vec<CommandBook>>;
    async fn speculate_process_manager(
        &self,
        name: &str,
        trigger: EventBook,
    ) -> DispatchResult<Vec<CommandBook>>;
}

/// The aggregate-facing service surface a transport adapts a
/// `CommandRouter` to: `Handle`/`Replay` (spec §6).
#[async_trait]
pub trait AggregateService: Send + Sync {
    async fn handle(&self, request: ContextualCommand) -> DispatchResult<BusinessResponse>;
    async fn replay(&self, events: EventBook) -> DispatchResult<prost_types::Any>;
}

/// The saga-facing service surface: `Prepare`/`Execute` (spec §6).
#[async_trait]
pub trait SagaService: Send + Sync {
    async fn prepare(&self, source: EventBook) -> DispatchResult<Vec<crate::proto::Cover>>;
    async fn execute(
        &self,
        source: EventBook,
        destinations: Vec<EventBook>,
    ) -> DispatchResult<Vec<CommandBook>>;
}

/// The process-manager-facing service surface: `Prepare`/`Handle` (spec §6).
#[async_trait]
pub trait ProcessManagerService: Send + Sync {
    async fn prepare(
        &self,
        trigger: EventBook,
        process_state: EventBook,
    ) -> DispatchResult<Vec<crate::proto::Cover>>;
    async fn handle(
        &self,
        trigger: EventBook,
        process_state: EventBook,
        destinations: Vec<EventBook>,
    ) -> DispatchResult<crate::process_manager::ProcessManagerResponse>;
}
