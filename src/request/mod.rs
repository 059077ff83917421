// Request Module - lifecycle of network requests on top of the scheduler
//
// - Owned builders with snapshot-isolated default headers
// - Per-request state machine with exactly one terminal notification
// - In-flight registry polled once per tick for progress
// - Abort from any thread, silenced by a per-request cancellation token

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod transport;
pub mod headers;
pub mod response;
pub mod callbacks;
pub mod uri;
pub mod multipart;
pub mod registry;
pub mod handle;
pub mod manager;

pub(crate) mod record;
mod routine;

pub use types::{Method, Outcome, RequestId, RequestPhase};
pub use error::RequestError;
pub use config::{DEFAULT_REDIRECT_LIMIT, RequestConfig};
pub use logging::{CorrelationId, RequestLoggingContext};
pub use metrics::{RequestMetrics, RequestStats};
pub use transport::{
    Completion, Operation, OperationPoll, Transport, TransportError, TransportRequest,
};
pub use headers::SuperHeaders;
pub use response::{WebResponse, classify};
pub use callbacks::{Callbacks, ProgressCallback, ProgressTracker, ResponseCallback};
pub use uri::{construct_uri_with_parameters, encode_form};
pub use multipart::{MultipartBody, MultipartSection, encode_multipart};
pub use registry::InFlightRegistry;
pub use handle::{RequestHandle, SentRequest};
pub use manager::RequestLifecycleManager;

#[cfg(test)]
mod tests;
