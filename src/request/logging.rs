use std::time::Instant;

use tracing::{Span, field};
use uuid::Uuid;

use crate::request::types::{Method, RequestId};

/// Correlation ID for following one request across log lines
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logging context for request operations
#[derive(Debug, Clone)]
pub struct RequestLoggingContext {
    pub correlation_id: CorrelationId,
    pub request_id: RequestId,
    pub method: Method,
    pub uri: String,
    started_at: Instant,
}

impl RequestLoggingContext {
    pub fn new(request_id: RequestId, method: Method, uri: String) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            request_id,
            method,
            uri,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "request",
            correlation_id = %self.correlation_id,
            request_id = %self.request_id,
            method = %self.method,
            uri = %self.uri,
            outcome = field::Empty,
            elapsed_ms = field::Empty,
        )
    }
}
