use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::redirect::Policy;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::request::{
    Completion, Method, Operation, OperationPoll, Transport, TransportError, TransportRequest,
};

/// [`Transport`] backed by `reqwest`, running exchanges on a tokio runtime.
///
/// `start` never blocks: the exchange is spawned on the runtime and the
/// returned operation only reads shared progress. Clients are built once per
/// redirect limit and reused, so connections are pooled across requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    runtime: Handle,
    clients: Arc<Mutex<HashMap<u32, reqwest::Client>>>,
}

impl ReqwestTransport {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Transport bound to the runtime of the calling context
    pub fn current() -> Result<Self, TransportError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| TransportError::Network(format!("no tokio runtime: {e}")))
    }

    /// Number of distinct clients built so far
    pub fn cached_clients(&self) -> usize {
        self.clients.lock().len()
    }

    /// Shared client for a redirect limit. Redirect policy is fixed per
    /// client, so the limit is the cache key.
    fn client_for(&self, redirect_limit: u32) -> Result<reqwest::Client, TransportError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&redirect_limit) {
            return Ok(client.clone());
        }

        let policy = match redirect_limit {
            0 => Policy::none(),
            limit => Policy::limited(limit as usize),
        };
        let client = reqwest::Client::builder()
            .redirect(policy)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build client: {e}")))?;
        tracing::debug!(redirect_limit = redirect_limit, "Built HTTP client");
        clients.insert(redirect_limit, client.clone());
        Ok(client)
    }

    fn build(
        &self,
        request: &TransportRequest,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let client = self.client_for(request.redirect_limit)?;

        let url = url::Url::parse(&request.uri)
            .map_err(|e| TransportError::Network(format!("invalid uri '{}': {e}", request.uri)))?;

        let mut builder = client.request(to_reqwest_method(request.method), url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

impl Transport for ReqwestTransport {
    fn start(&self, request: &TransportRequest) -> Result<Box<dyn Operation>, TransportError> {
        let builder = self.build(request)?;
        let shared = Arc::new(Mutex::new(Exchange::default()));
        let cancel = CancellationToken::new();

        let uri = request.uri.clone();
        let method = request.method;
        let task_shared = shared.clone();
        let task_cancel = cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    tracing::debug!(uri = %uri, method = %method, "Exchange cancelled");
                }
                completion = exchange(builder, uri.clone(), task_shared.clone()) => {
                    tracing::trace!(
                        uri = %uri,
                        status_code = ?completion.status_code,
                        "Exchange finished"
                    );
                    task_shared.lock().completion = Some(completion);
                }
            }
        });

        Ok(Box::new(ReqwestOperation {
            shared,
            cancel,
            finished: false,
        }))
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

#[derive(Debug, Default)]
struct Exchange {
    upload: f32,
    download: f32,
    completion: Option<Completion>,
}

async fn exchange(
    request: reqwest::RequestBuilder,
    uri: String,
    shared: Arc<Mutex<Exchange>>,
) -> Completion {
    let mut response = match request.send().await {
        Ok(response) => response,
        Err(e) => return Completion::network_failure(uri, describe(&e)),
    };
    shared.lock().upload = 1.0;

    let url = response.url().to_string();
    let status = response.status();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let total = response.content_length().filter(|len| *len > 0);

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                if let Some(total) = total {
                    shared.lock().download = (body.len() as f64 / total as f64) as f32;
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Completion {
                    url,
                    status_code: Some(status.as_u16()),
                    headers,
                    body,
                    failure: Some(TransportError::Network(describe(&e))),
                };
            }
        }
    }
    shared.lock().download = 1.0;

    let failure = (status.is_client_error() || status.is_server_error())
        .then(|| TransportError::Protocol(format!("HTTP {status}")));

    Completion {
        url,
        status_code: Some(status.as_u16()),
        headers,
        body,
        failure,
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_redirect() {
        format!("redirect limit exceeded: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

/// Handle to one spawned exchange
pub struct ReqwestOperation {
    shared: Arc<Mutex<Exchange>>,
    cancel: CancellationToken,
    finished: bool,
}

impl Operation for ReqwestOperation {
    fn poll(&mut self) -> OperationPoll {
        let shared = self.shared.lock();
        OperationPoll {
            upload_progress: shared.upload,
            download_progress: shared.download,
            done: self.finished || shared.completion.is_some(),
        }
    }

    fn take_completion(&mut self) -> Option<Completion> {
        let completion = self.shared.lock().completion.take();
        if completion.is_some() {
            self.finished = true;
        }
        completion
    }

    fn cancel(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for ReqwestOperation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
