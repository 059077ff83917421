use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::request::callbacks::Callbacks;
use crate::request::error::RequestError;
use crate::request::logging::CorrelationId;
use crate::request::manager::RequestLifecycleManager;
use crate::request::record::RequestRecord;
use crate::request::response::WebResponse;
use crate::request::transport::TransportRequest;
use crate::request::types::{Method, RequestId, RequestPhase};
use crate::scheduler::TaskId;

/// Builder for one network operation.
///
/// Created by the verb factories on [`RequestLifecycleManager`]. The super
/// headers are copied when the handle is created; `send` consumes the builder.
#[must_use = "a request does nothing until it is sent"]
pub struct RequestHandle {
    manager: RequestLifecycleManager,
    method: Method,
    uri: String,
    body: Option<Vec<u8>>,
    default_headers: HashMap<String, String>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
    redirect_limit: u32,
    callbacks: Callbacks,
}

impl RequestHandle {
    pub(crate) fn new(
        manager: RequestLifecycleManager,
        method: Method,
        uri: impl Into<String>,
        default_headers: HashMap<String, String>,
        timeout: Option<Duration>,
        redirect_limit: u32,
    ) -> Self {
        Self {
            manager,
            method,
            uri: uri.into(),
            body: None,
            default_headers,
            headers: HashMap::new(),
            timeout,
            redirect_limit,
            callbacks: Callbacks::default(),
        }
    }

    pub(crate) fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn set_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.insert(key.into(), value.into());
        }
        self
    }

    /// Drop `key` from both the explicit headers and the captured defaults.
    pub fn remove_header(mut self, key: &str) -> Self {
        self.headers.remove(key);
        self.default_headers.remove(key);
        self
    }

    /// Drop every default header captured at construction.
    pub fn remove_super_headers(mut self) -> Self {
        self.default_headers.clear();
        self
    }

    pub fn on_upload_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.callbacks.upload_progress.push(Box::new(callback));
        self
    }

    pub fn on_download_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.callbacks.download_progress.push(Box::new(callback));
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&WebResponse) + Send + 'static,
    {
        self.callbacks.success.push(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&WebResponse) + Send + 'static,
    {
        self.callbacks.error.push(Box::new(callback));
        self
    }

    pub fn on_network_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&WebResponse) + Send + 'static,
    {
        self.callbacks.network_error.push(Box::new(callback));
        self
    }

    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn set_redirect_limit(mut self, redirect_limit: u32) -> Self {
        self.redirect_limit = redirect_limit;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn redirect_limit(&self) -> u32 {
        self.redirect_limit
    }

    /// Headers that would be sent: defaults overridden by explicit headers
    pub fn headers(&self) -> HashMap<String, String> {
        let mut merged = self.default_headers.clone();
        merged.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Submit the request to the scheduler.
    pub fn send(self) -> Result<SentRequest, RequestError> {
        let manager = self.manager.clone();
        manager.send(self)
    }

    pub(crate) fn into_parts(self) -> (TransportRequest, Callbacks) {
        let headers = self.headers();
        let request = TransportRequest {
            method: self.method,
            uri: self.uri,
            headers,
            body: self.body,
            timeout: self.timeout,
            redirect_limit: self.redirect_limit,
        };
        (request, self.callbacks)
    }
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers())
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .field("redirect_limit", &self.redirect_limit)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Handle to a request that has been sent; cloneable and abortable.
#[derive(Clone)]
pub struct SentRequest {
    record: Arc<RequestRecord>,
    manager: RequestLifecycleManager,
}

impl SentRequest {
    pub(crate) fn new(record: Arc<RequestRecord>, manager: RequestLifecycleManager) -> Self {
        Self { record, manager }
    }

    pub fn id(&self) -> RequestId {
        self.record.id
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.record.context.correlation_id
    }

    pub fn phase(&self) -> RequestPhase {
        self.record.phase()
    }

    /// Scheduler task carrying this request
    pub fn task_id(&self) -> Option<TaskId> {
        self.record.task_id()
    }

    /// Merged headers handed to the transport
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.record.request().headers
    }

    /// Last reported (upload, download) ratios
    pub fn progress(&self) -> (f32, f32) {
        self.record.last_progress()
    }

    pub fn is_in_flight(&self) -> bool {
        self.manager.is_in_flight(self.id())
    }

    pub fn is_finished(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Cancel the request. Returns false when it had already finished or been
    /// aborted; no terminal callback fires after a successful abort.
    pub fn abort(&self) -> bool {
        self.manager.abort_record(&self.record)
    }
}

impl std::fmt::Debug for SentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentRequest")
            .field("record", &self.record)
            .finish()
    }
}
