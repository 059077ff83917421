use crate::request::types::{RequestId, RequestPhase};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("request {0} was already sent")]
    AlreadySent(RequestId),
    #[error("request {0} is not pending or in flight")]
    UnknownRequest(RequestId),
    #[error("request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: RequestId,
        from: RequestPhase,
        to: RequestPhase,
    },
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("request {0} was cancelled")]
    Cancelled(RequestId),
}
