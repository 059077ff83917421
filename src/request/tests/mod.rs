mod state_machine;
mod headers;
mod progress;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::scheduler::TaskScheduler;

/// Scripted state of one mock operation, shared with the test body
#[derive(Debug, Default)]
pub(super) struct OpState {
    pub upload: f32,
    pub download: f32,
    pub completion: Option<Completion>,
    pub cancelled: bool,
    pub polls: u32,
}

impl OpState {
    pub fn progress(&mut self, upload: f32, download: f32) {
        self.upload = upload;
        self.download = download;
    }

    pub fn succeed(&mut self, status: u16, body: &str) {
        self.completion = Some(Completion {
            url: String::new(),
            status_code: Some(status),
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
            failure: None,
        });
    }

    pub fn fail_http(&mut self, status: u16) {
        self.completion = Some(Completion {
            status_code: Some(status),
            failure: Some(TransportError::Protocol(format!("HTTP {status}"))),
            ..Default::default()
        });
    }

    pub fn fail_network(&mut self, message: &str) {
        self.completion = Some(Completion::network_failure("", message));
    }
}

#[derive(Default)]
struct MockState {
    started: Vec<TransportRequest>,
    controls: HashMap<String, Arc<Mutex<OpState>>>,
    refusals: HashMap<String, TransportError>,
}

/// Transport whose operations are driven by the test through [`OpState`]
#[derive(Clone, Default)]
pub(super) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control block for the operation started for `uri`
    pub fn control(&self, uri: &str) -> Arc<Mutex<OpState>> {
        self.state
            .lock()
            .controls
            .entry(uri.to_string())
            .or_default()
            .clone()
    }

    pub fn refuse(&self, uri: &str, error: TransportError) {
        self.state.lock().refusals.insert(uri.to_string(), error);
    }

    pub fn started(&self) -> Vec<TransportRequest> {
        self.state.lock().started.clone()
    }
}

impl Transport for MockTransport {
    fn start(&self, request: &TransportRequest) -> Result<Box<dyn Operation>, TransportError> {
        let mut state = self.state.lock();
        if let Some(error) = state.refusals.get(&request.uri) {
            return Err(error.clone());
        }
        state.started.push(request.clone());
        let control = state.controls.entry(request.uri.clone()).or_default().clone();
        Ok(Box::new(MockOperation {
            uri: request.uri.clone(),
            control,
        }))
    }
}

struct MockOperation {
    uri: String,
    control: Arc<Mutex<OpState>>,
}

impl Operation for MockOperation {
    fn poll(&mut self) -> OperationPoll {
        let mut control = self.control.lock();
        control.polls += 1;
        OperationPoll {
            upload_progress: control.upload,
            download_progress: control.download,
            done: control.completion.is_some(),
        }
    }

    fn take_completion(&mut self) -> Option<Completion> {
        self.control.lock().completion.take().map(|mut completion| {
            if completion.url.is_empty() {
                completion.url = self.uri.clone();
            }
            completion
        })
    }

    fn cancel(&mut self) {
        self.control.lock().cancelled = true;
    }
}

pub(super) struct Harness {
    pub scheduler: Arc<TaskScheduler>,
    pub transport: MockTransport,
    pub manager: RequestLifecycleManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RequestConfig::default())
    }

    pub fn with_config(config: RequestConfig) -> Self {
        let scheduler = Arc::new(TaskScheduler::new());
        let transport = MockTransport::new();
        let manager = RequestLifecycleManager::with_config(
            scheduler.clone(),
            Arc::new(transport.clone()),
            config,
        );
        Self {
            scheduler,
            transport,
            manager,
        }
    }

    /// One driver tick: progress polling then a drive cycle
    pub fn cycle(&self) {
        self.manager.tick();
        self.scheduler.drive();
    }

    pub fn cycles(&self, count: usize) {
        for _ in 0..count {
            self.cycle();
        }
    }
}

/// Shared event log written by callbacks
pub(super) type Events = Arc<Mutex<Vec<String>>>;

pub(super) fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

/// Register one callback of every kind, each recording into `log`
pub(super) fn observe(handle: RequestHandle, log: &Events) -> RequestHandle {
    let (up, down, ok) = (log.clone(), log.clone(), log.clone());
    let (err, net) = (log.clone(), log.clone());
    handle
        .on_upload_progress(move |p| up.lock().push(format!("up:{p}")))
        .on_download_progress(move |p| down.lock().push(format!("down:{p}")))
        .on_success(move |r| ok.lock().push(format!("success:{}", r.status_code.unwrap_or(0))))
        .on_error(move |r| err.lock().push(format!("error:{}", r.status_code.unwrap_or(0))))
        .on_network_error(move |_| net.lock().push("network".to_string()))
}

pub(super) fn terminal_count(log: &Events) -> usize {
    log.lock()
        .iter()
        .filter(|e| e.starts_with("success") || e.starts_with("error") || e.starts_with("network"))
        .count()
}
