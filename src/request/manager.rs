use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::request::config::RequestConfig;
use crate::request::error::RequestError;
use crate::request::handle::{RequestHandle, SentRequest};
use crate::request::headers::SuperHeaders;
use crate::request::metrics::{RequestMetrics, RequestStats};
use crate::request::multipart::{MultipartSection, encode_multipart};
use crate::request::record::RequestRecord;
use crate::request::registry::InFlightRegistry;
use crate::request::response::WebResponse;
use crate::request::routine::SendRoutine;
use crate::request::transport::{Completion, Transport};
use crate::request::types::{Method, RequestId, RequestPhase};
use crate::request::uri::encode_form;
use crate::scheduler::{RoutineHandle, TaskScheduler};

pub(crate) struct ManagerInner {
    scheduler: Arc<TaskScheduler>,
    transport: Arc<dyn Transport>,
    super_headers: SuperHeaders,
    /// Lock order: `registry` before `open`
    registry: Mutex<InFlightRegistry>,
    /// Every request that was sent and has not reached a terminal phase
    open: Mutex<BTreeMap<RequestId, Arc<RequestRecord>>>,
    config: RequestConfig,
    next_request_id: AtomicU64,
    metrics: Mutex<RequestMetrics>,
}

impl ManagerInner {
    /// Sent -> Running once the scheduler has started the send routine.
    pub(crate) fn register(&self, record: &Arc<RequestRecord>, routine: RoutineHandle) {
        let mut registry = self.registry.lock();
        if let Err(e) = record.transition(RequestPhase::Running) {
            drop(registry);
            tracing::debug!(parent: &record.span, error = %e, "Request not registered");
            routine.stop();
            return;
        }

        let task_id = routine.id();
        if let Err(e) = registry.register(record.clone(), routine) {
            tracing::error!(parent: &record.span, error = %e, "Failed to register request");
            return;
        }
        tracing::debug!(
            parent: &record.span,
            task_id = %task_id,
            in_flight = registry.len(),
            "Request in flight"
        );
    }

    /// Classify a finished operation and fire the matching terminal callbacks.
    pub(crate) fn complete(&self, record: &Arc<RequestRecord>, completion: Completion) {
        let response = WebResponse::from_completion(completion);
        let outcome = response.outcome;

        {
            let mut registry = self.registry.lock();
            if record.transition(outcome.phase()).is_err() {
                // Aborted while the operation was finishing.
                registry.remove(&record.id);
                tracing::debug!(
                    parent: &record.span,
                    error = %RequestError::Cancelled(record.id),
                    "Completion dropped"
                );
                return;
            }
        }
        self.metrics.lock().record_outcome(outcome);

        let fired = record.dispatch(&response);
        record.detach_operation();

        self.registry.lock().remove(&record.id);
        self.open.lock().remove(&record.id);

        let elapsed_ms = record.context.elapsed_ms();
        record.span.record("outcome", tracing::field::display(outcome));
        record.span.record("elapsed_ms", elapsed_ms);
        tracing::info!(
            parent: &record.span,
            outcome = %outcome,
            status_code = ?response.status_code,
            callbacks_fired = fired,
            elapsed_ms = elapsed_ms,
            "Request completed"
        );
    }

    /// Move a pending or in-flight request to Aborted. Returns false when the
    /// request already reached a terminal phase.
    pub(crate) fn abort_record(&self, record: &Arc<RequestRecord>) -> bool {
        let entry = {
            let mut registry = self.registry.lock();
            if record.transition(RequestPhase::Aborted).is_err() {
                return false;
            }
            record.cancel();
            registry.remove(&record.id)
        };
        self.open.lock().remove(&record.id);

        record.cancel_operation();
        record.release_callbacks();

        match entry {
            Some(entry) => entry.routine.stop(),
            None => {
                if let Some(task_id) = record.task_id() {
                    self.scheduler.cancel(task_id);
                }
            }
        }

        self.metrics.lock().record_abort();
        record.span.record("outcome", tracing::field::display(RequestPhase::Aborted));
        tracing::info!(
            parent: &record.span,
            elapsed_ms = record.context.elapsed_ms(),
            "Request aborted"
        );
        true
    }
}

/// Owns the per-request state machines and drives them through the scheduler.
///
/// Cloning is cheap; clones share the same registry and defaults.
#[derive(Clone)]
pub struct RequestLifecycleManager(Arc<ManagerInner>);

impl RequestLifecycleManager {
    pub fn new(scheduler: Arc<TaskScheduler>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(scheduler, transport, RequestConfig::default())
    }

    pub fn with_config(
        scheduler: Arc<TaskScheduler>,
        transport: Arc<dyn Transport>,
        config: RequestConfig,
    ) -> Self {
        Self(Arc::new(ManagerInner {
            scheduler,
            transport,
            super_headers: SuperHeaders::new(),
            registry: Mutex::new(InFlightRegistry::new()),
            open: Mutex::new(BTreeMap::new()),
            config,
            next_request_id: AtomicU64::new(0),
            metrics: Mutex::new(RequestMetrics::new()),
        }))
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.0.scheduler
    }

    pub fn config(&self) -> &RequestConfig {
        &self.0.config
    }

    pub fn super_headers(&self) -> &SuperHeaders {
        &self.0.super_headers
    }

    pub fn set_super_header(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RequestError> {
        self.0.super_headers.set(key, value)
    }

    pub fn remove_super_header(&self, key: &str) -> bool {
        self.0.super_headers.remove(key)
    }

    /// New builder with the current super headers and configured defaults.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> RequestHandle {
        RequestHandle::new(
            self.clone(),
            method,
            uri,
            self.0.super_headers.snapshot(),
            self.0.config.default_timeout(),
            self.0.config.redirect_limit,
        )
    }

    pub fn get(&self, uri: impl Into<String>) -> RequestHandle {
        self.request(Method::Get, uri)
    }

    /// POST with an `application/x-www-form-urlencoded` body
    pub fn post_form<K, V>(&self, uri: impl Into<String>, fields: &[(K, V)]) -> RequestHandle
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.post_bytes(
            uri,
            encode_form(fields).into_bytes(),
            "application/x-www-form-urlencoded",
        )
    }

    /// POST with a `multipart/form-data` body built from `sections`
    pub fn post_multipart(
        &self,
        uri: impl Into<String>,
        sections: &[MultipartSection],
    ) -> RequestHandle {
        let body = encode_multipart(sections);
        let content_type = body.content_type();
        self.post_bytes(uri, body.bytes, &content_type)
    }

    pub fn post_bytes(
        &self,
        uri: impl Into<String>,
        body: Vec<u8>,
        content_type: &str,
    ) -> RequestHandle {
        self.request(Method::Post, uri)
            .with_body(body)
            .set_header("Content-Type", content_type)
    }

    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        uri: impl Into<String>,
        value: &T,
    ) -> Result<RequestHandle, RequestError> {
        let body = serde_json::to_vec(value)?;
        Ok(self.post_bytes(uri, body, "application/json"))
    }

    pub fn post_json_str(&self, uri: impl Into<String>, json: &str) -> RequestHandle {
        self.post_bytes(uri, json.as_bytes().to_vec(), "application/json")
    }

    pub fn put(&self, uri: impl Into<String>, body: Vec<u8>) -> RequestHandle {
        self.request(Method::Put, uri).with_body(body)
    }

    pub fn put_str(&self, uri: impl Into<String>, body: &str) -> RequestHandle {
        self.put(uri, body.as_bytes().to_vec())
    }

    pub fn delete(&self, uri: impl Into<String>) -> RequestHandle {
        self.request(Method::Delete, uri)
    }

    pub fn head(&self, uri: impl Into<String>) -> RequestHandle {
        self.request(Method::Head, uri)
    }

    /// Building -> Sent, then hand the send routine to the scheduler.
    pub fn send(&self, handle: RequestHandle) -> Result<SentRequest, RequestError> {
        let id = RequestId::new(self.0.next_request_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (request, callbacks) = handle.into_parts();
        let record = Arc::new(RequestRecord::new(id, request, callbacks));

        record.transition(RequestPhase::Sent)?;
        self.0.open.lock().insert(id, record.clone());

        let routine = SendRoutine::new(
            record.clone(),
            self.0.transport.clone(),
            Arc::downgrade(&self.0),
        );
        let manager = Arc::downgrade(&self.0);
        let started = record.clone();
        let task_id = self.0.scheduler.enqueue_with(routine, move |handle| {
            match manager.upgrade() {
                Some(manager) => manager.register(&started, handle),
                None => handle.stop(),
            }
        });
        record.set_task_id(task_id);
        self.0.metrics.lock().record_send();

        tracing::info!(parent: &record.span, task_id = %task_id, "Request sent");
        Ok(SentRequest::new(record, self.clone()))
    }

    /// Poll every in-flight operation and report progress that moved forward.
    /// Returns how many operations were polled.
    pub fn tick(&self) -> usize {
        let records = self.0.registry.lock().records();

        let mut polled = 0;
        for record in records {
            if record.is_cancelled() || record.phase() != RequestPhase::Running {
                continue;
            }
            if let Some(poll) = record.poll_operation() {
                record.report_progress(poll);
                polled += 1;
            }
        }
        polled
    }

    /// Abort by ID. Unknown or already finished requests are a no-op.
    pub fn abort(&self, id: RequestId) -> bool {
        let record = self.0.open.lock().get(&id).cloned();
        match record {
            Some(record) => self.0.abort_record(&record),
            None => {
                tracing::debug!(
                    request_id = %id,
                    error = %RequestError::UnknownRequest(id),
                    "Abort ignored"
                );
                false
            }
        }
    }

    /// Abort every pending and in-flight request. Returns how many were aborted.
    pub fn abort_all(&self) -> usize {
        let records: Vec<_> = self.0.open.lock().values().cloned().collect();
        records
            .iter()
            .filter(|record| self.0.abort_record(record))
            .count()
    }

    pub(crate) fn abort_record(&self, record: &Arc<RequestRecord>) -> bool {
        self.0.abort_record(record)
    }

    pub fn is_in_flight(&self, id: RequestId) -> bool {
        self.0.registry.lock().contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.0.registry.lock().len()
    }

    /// Sent requests whose send routine has not started yet
    pub fn pending_count(&self) -> usize {
        self.0
            .open
            .lock()
            .values()
            .filter(|record| record.phase() == RequestPhase::Sent)
            .count()
    }

    /// Requests that were sent and have not reached a terminal phase
    pub fn open_count(&self) -> usize {
        self.0.open.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.open_count() == 0
    }

    pub fn in_flight_ids(&self) -> Vec<RequestId> {
        self.0.registry.lock().ids()
    }

    pub fn get_stats(&self) -> RequestStats {
        let metrics = self.0.metrics.lock().clone();
        RequestStats {
            pending: self.pending_count(),
            in_flight: self.in_flight_count(),
            total_sent: metrics.sent,
            succeeded: metrics.succeeded,
            http_errors: metrics.http_errors,
            network_errors: metrics.network_errors,
            aborted: metrics.aborted,
        }
    }
}

impl std::fmt::Debug for RequestLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLifecycleManager")
            .field("in_flight", &self.in_flight_count())
            .field("open", &self.open_count())
            .field("super_headers", &self.0.super_headers.len())
            .finish()
    }
}
