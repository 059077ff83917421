use std::sync::{Arc, Weak};

use crate::request::manager::ManagerInner;
use crate::request::record::RequestRecord;
use crate::request::transport::{Completion, Transport, TransportError};
use crate::scheduler::{Step, TaskStartError, UnitOfWork};

/// Unit of work carrying one request through the transport.
///
/// `start` hands the request to the transport; every resume polls the
/// operation until it reports done, then passes the completion back to the
/// manager for classification and dispatch.
pub(crate) struct SendRoutine {
    record: Arc<RequestRecord>,
    transport: Arc<dyn Transport>,
    manager: Weak<ManagerInner>,
    start_failure: Option<TransportError>,
}

impl SendRoutine {
    pub(crate) fn new(
        record: Arc<RequestRecord>,
        transport: Arc<dyn Transport>,
        manager: Weak<ManagerInner>,
    ) -> Self {
        Self {
            record,
            transport,
            manager,
            start_failure: None,
        }
    }

    fn finish(&self, completion: Completion) -> Step {
        if let Some(manager) = self.manager.upgrade() {
            manager.complete(&self.record, completion);
        }
        Step::Done
    }
}

impl UnitOfWork for SendRoutine {
    fn start(&mut self) -> Result<Step, TaskStartError> {
        if self.record.is_cancelled() {
            return Ok(Step::Done);
        }

        match self.transport.start(self.record.request()) {
            Ok(operation) => {
                self.record.attach_operation(operation);
                tracing::debug!(parent: &self.record.span, "Transport operation started");
            }
            Err(e) => {
                // Reported on the first resume, once the request is registered.
                tracing::warn!(parent: &self.record.span, error = %e, "Transport refused request");
                self.start_failure = Some(e);
            }
        }
        Ok(Step::Yield)
    }

    fn resume(&mut self) -> Step {
        if self.record.is_cancelled() {
            return Step::Done;
        }

        let uri = &self.record.request().uri;
        if let Some(failure) = self.start_failure.take() {
            return self.finish(Completion {
                url: uri.clone(),
                failure: Some(failure),
                ..Default::default()
            });
        }

        let Some(poll) = self.record.poll_operation() else {
            return self.finish(Completion::network_failure(
                uri.clone(),
                "transport operation missing",
            ));
        };
        if !poll.done {
            return Step::Yield;
        }

        self.record.report_progress(poll);
        let completion = self.record.take_completion().unwrap_or_else(|| {
            Completion::network_failure(uri.clone(), "transport finished without a result")
        });
        self.finish(completion)
    }

    fn stop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.abort_record(&self.record);
        }
        self.record.cancel_operation();
        self.record.release_callbacks();
    }
}
