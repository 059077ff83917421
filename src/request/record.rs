use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::request::callbacks::{Callbacks, ProgressTracker};
use crate::request::error::RequestError;
use crate::request::logging::RequestLoggingContext;
use crate::request::response::WebResponse;
use crate::request::transport::{Completion, Operation, OperationPoll, TransportRequest};
use crate::request::types::{RequestId, RequestPhase};
use crate::scheduler::TaskId;

#[derive(Debug, Default)]
struct Progress {
    upload: ProgressTracker,
    download: ProgressTracker,
}

/// State shared by the caller's handle, the send routine and the registry.
///
/// No lock here is held while user callbacks run, except `callbacks` itself.
pub(crate) struct RequestRecord {
    pub(crate) id: RequestId,
    pub(crate) context: RequestLoggingContext,
    pub(crate) span: Span,
    request: TransportRequest,
    phase: Mutex<RequestPhase>,
    cancel: CancellationToken,
    callbacks: Mutex<Callbacks>,
    progress: Mutex<Progress>,
    operation: Mutex<Option<Box<dyn Operation>>>,
    task_id: Mutex<Option<TaskId>>,
}

impl RequestRecord {
    pub(crate) fn new(id: RequestId, request: TransportRequest, callbacks: Callbacks) -> Self {
        let context = RequestLoggingContext::new(id, request.method, request.uri.clone());
        let span = context.create_span();
        Self {
            id,
            context,
            span,
            request,
            phase: Mutex::new(RequestPhase::Building),
            cancel: CancellationToken::new(),
            callbacks: Mutex::new(callbacks),
            progress: Mutex::new(Progress::default()),
            operation: Mutex::new(None),
            task_id: Mutex::new(None),
        }
    }

    pub(crate) fn request(&self) -> &TransportRequest {
        &self.request
    }

    pub(crate) fn phase(&self) -> RequestPhase {
        *self.phase.lock()
    }

    /// Move the state machine forward, returning the previous phase.
    pub(crate) fn transition(&self, next: RequestPhase) -> Result<RequestPhase, RequestError> {
        let mut phase = self.phase.lock();
        let current = *phase;

        if !current.can_transition_to(next) {
            return Err(if next == RequestPhase::Sent {
                RequestError::AlreadySent(self.id)
            } else {
                RequestError::InvalidTransition {
                    id: self.id,
                    from: current,
                    to: next,
                }
            });
        }

        *phase = next;
        tracing::debug!(
            parent: &self.span,
            old_phase = %current,
            new_phase = %next,
            "Request phase transition"
        );
        Ok(current)
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn set_task_id(&self, task_id: TaskId) {
        *self.task_id.lock() = Some(task_id);
    }

    pub(crate) fn task_id(&self) -> Option<TaskId> {
        *self.task_id.lock()
    }

    pub(crate) fn attach_operation(&self, operation: Box<dyn Operation>) {
        *self.operation.lock() = Some(operation);
    }

    pub(crate) fn poll_operation(&self) -> Option<OperationPoll> {
        self.operation.lock().as_mut().map(|operation| operation.poll())
    }

    pub(crate) fn take_completion(&self) -> Option<Completion> {
        self.operation
            .lock()
            .as_mut()
            .and_then(|operation| operation.take_completion())
    }

    /// Cancel and drop the transport operation, if one is attached.
    pub(crate) fn cancel_operation(&self) {
        let operation = self.operation.lock().take();
        if let Some(mut operation) = operation {
            operation.cancel();
            tracing::debug!(parent: &self.span, "Transport operation cancelled");
        }
    }

    /// Drop a finished operation without cancelling it.
    pub(crate) fn detach_operation(&self) {
        self.operation.lock().take();
    }

    /// Fire progress callbacks for channels whose ratio strictly increased.
    pub(crate) fn report_progress(&self, poll: OperationPoll) {
        let (upload, download) = {
            let mut progress = self.progress.lock();
            (
                progress.upload.advance(poll.upload_progress),
                progress.download.advance(poll.download_progress),
            )
        };

        if upload.is_none() && download.is_none() {
            return;
        }

        let mut callbacks = self.callbacks.lock();
        if let Some(value) = upload {
            callbacks.fire_upload(value, &self.cancel);
        }
        if let Some(value) = download {
            callbacks.fire_download(value, &self.cancel);
        }
    }

    pub(crate) fn last_progress(&self) -> (f32, f32) {
        let progress = self.progress.lock();
        (progress.upload.last(), progress.download.last())
    }

    /// Fire the terminal callbacks for `response`, then drop every closure.
    pub(crate) fn dispatch(&self, response: &WebResponse) -> usize {
        let mut callbacks = self.callbacks.lock();
        let fired = callbacks.fire_terminal(response, &self.cancel);
        callbacks.clear();
        fired
    }

    /// Drop callbacks without blocking; skipped when called from inside one.
    pub(crate) fn release_callbacks(&self) {
        if let Some(mut callbacks) = self.callbacks.try_lock() {
            callbacks.clear();
        }
    }
}

impl std::fmt::Debug for RequestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRecord")
            .field("id", &self.id)
            .field("method", &self.request.method)
            .field("uri", &self.request.uri)
            .field("phase", &self.phase())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
