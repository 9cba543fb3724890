//! Dispatch core for Angzarr-style event-sourced domains.
//!
//! This crate is the client/framework core: type-URL-suffix routing of
//! commands and events to typed handlers, aggregate command execution
//! with optimistic concurrency, the two-phase saga/process-manager
//! protocol, rejection compensation routing, and event upcasting. The RPC
//! transport, event persistence, and global ordering across aggregates
//! are the surrounding coordinator's job, not this crate's — see
//! [`traits`] for the contracts this core is wired into.

pub mod aggregate;
pub mod books;
pub mod builder;
pub mod command_router;
pub mod compensation;
pub mod convert;
pub mod cover;
pub mod edition;
pub mod error;
pub mod event_router;
pub mod pages;
pub mod process_manager;
pub mod proto;
pub mod saga;
pub mod state;
pub mod traits;
pub mod upcaster;
pub mod validation;

pub use aggregate::AggregateCore;
pub use books::{CommandBookExt, EventBookExt};
pub use builder::{CommandBuilder, QueryBuilder};
pub use command_router::CommandRouter;
pub use compensation::{CompensationContext, CompensationRouter};
pub use cover::CoverExt;
pub use edition::EditionExt;
pub use error::{CommandRejectedError, DispatchError, DispatchResult};
pub use event_router::EventRouter;
pub use pages::{CommandPageExt, EventPageExt};
pub use process_manager::ProcessManagerRouter;
pub use saga::SagaRouter;
pub use state::StateRouter;
pub use upcaster::UpcasterRouter;
