//! Error taxonomy for the dispatch core (spec §4.10, §7).

use tonic::{Code, Status};

/// Result alias used throughout the dispatch core.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// A business rule violated inside a handler. Validation helpers raise
/// this; routers translate it into a precondition-failed transport status.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandRejectedError(pub String);

impl CommandRejectedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The closed error taxonomy the dispatch core raises. Kinds, not message
/// strings: every variant maps to exactly one transport status code.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A business precondition failed inside a handler.
    #[error("command rejected: {0}")]
    CommandRejected(#[from] CommandRejectedError),

    /// Client-side shape or range failure: missing pages, malformed
    /// payload, unresolvable sequence.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An RFC3339 timestamp failed to parse.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// No handler matched the payload's type-URL suffix.
    #[error("unknown command type: {0}")]
    Unknown(String),

    /// A transport/GRPC failure observed by the core (e.g. during a
    /// saga's dependent fetch), preserved with its original code.
    #[error(transparent)]
    Grpc(Box<Status>),
}

impl DispatchError {
    /// Map this error onto the transport status it would surface as.
    pub fn code(&self) -> Code {
        match self {
            DispatchError::CommandRejected(_) => Code::FailedPrecondition,
            DispatchError::InvalidArgument(_) => Code::InvalidArgument,
            DispatchError::InvalidTimestamp(_) => Code::InvalidArgument,
            DispatchError::Unknown(_) => Code::InvalidArgument,
            DispatchError::Grpc(status) => status.code(),
        }
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.code() == Code::FailedPrecondition
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code() == Code::InvalidArgument
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Code::NotFound
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self.code(), Code::Unavailable | Code::DeadlineExceeded)
    }
}

impl From<Status> for DispatchError {
    fn from(status: Status) -> Self {
        DispatchError::Grpc(Box::new(status))
    }
}

impl From<DispatchError> for Status {
    fn from(err: DispatchError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}
