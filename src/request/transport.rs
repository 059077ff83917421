use std::collections::HashMap;
use std::time::Duration;

use crate::request::types::Method;

/// Failure reported by a transport, either at start or on completion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection-level failure; no status code is available
    #[error("network error: {0}")]
    Network(String),
    /// The exchange completed but the status indicates failure
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Fully merged request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    pub redirect_limit: u32,
}

/// Progress snapshot of an operation in flight
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperationPoll {
    pub upload_progress: f32,
    pub download_progress: f32,
    pub done: bool,
}

/// Result of a finished operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub url: String,
    pub status_code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub failure: Option<TransportError>,
}

impl Completion {
    pub fn network_failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            failure: Some(TransportError::Network(message.into())),
            ..Default::default()
        }
    }
}

/// A network exchange started by a [`Transport`]
pub trait Operation: Send {
    /// Current progress ratios; never blocks.
    fn poll(&mut self) -> OperationPoll;

    /// Take the result once `poll` reports `done`; `None` before that.
    fn take_completion(&mut self) -> Option<Completion>;

    /// Tear the exchange down. Teardown may finish asynchronously.
    fn cancel(&mut self);
}

/// Pluggable capability that actually moves bytes
pub trait Transport: Send + Sync {
    fn start(&self, request: &TransportRequest) -> Result<Box<dyn Operation>, TransportError>;
}
