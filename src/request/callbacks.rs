use tokio_util::sync::CancellationToken;

use crate::request::response::WebResponse;
use crate::request::types::Outcome;

pub type ProgressCallback = Box<dyn FnMut(f32) + Send + 'static>;
pub type ResponseCallback = Box<dyn FnMut(&WebResponse) + Send + 'static>;

/// Ordered callback lists, one per event category.
///
/// Registration is additive and firing follows registration order. Every
/// invocation is preceded by a check of the request's cancellation token.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) upload_progress: Vec<ProgressCallback>,
    pub(crate) download_progress: Vec<ProgressCallback>,
    pub(crate) success: Vec<ResponseCallback>,
    pub(crate) error: Vec<ResponseCallback>,
    pub(crate) network_error: Vec<ResponseCallback>,
}

impl Callbacks {
    pub(crate) fn fire_upload(&mut self, progress: f32, cancel: &CancellationToken) {
        fire_progress(&mut self.upload_progress, progress, cancel);
    }

    pub(crate) fn fire_download(&mut self, progress: f32, cancel: &CancellationToken) {
        fire_progress(&mut self.download_progress, progress, cancel);
    }

    /// Fire the list matching the response outcome. Returns how many callbacks ran.
    pub(crate) fn fire_terminal(
        &mut self,
        response: &WebResponse,
        cancel: &CancellationToken,
    ) -> usize {
        let callbacks = match response.outcome {
            Outcome::Succeeded => &mut self.success,
            Outcome::HttpError => &mut self.error,
            Outcome::NetworkError => &mut self.network_error,
        };

        let mut fired = 0;
        for callback in callbacks.iter_mut() {
            if cancel.is_cancelled() {
                break;
            }
            callback(response);
            fired += 1;
        }
        fired
    }

    /// Release every closure once the request can no longer fire.
    pub(crate) fn clear(&mut self) {
        *self = Callbacks::default();
    }

    pub fn len(&self) -> usize {
        self.upload_progress.len()
            + self.download_progress.len()
            + self.success.len()
            + self.error.len()
            + self.network_error.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("upload_progress", &self.upload_progress.len())
            .field("download_progress", &self.download_progress.len())
            .field("success", &self.success.len())
            .field("error", &self.error.len())
            .field("network_error", &self.network_error.len())
            .finish()
    }
}

fn fire_progress(callbacks: &mut [ProgressCallback], progress: f32, cancel: &CancellationToken) {
    for callback in callbacks.iter_mut() {
        if cancel.is_cancelled() {
            break;
        }
        callback(progress);
    }
}

/// Last reported ratio for one progress channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressTracker {
    last: f32,
}

impl ProgressTracker {
    pub fn last(&self) -> f32 {
        self.last
    }

    /// Accept `value` only when it strictly exceeds the last reported ratio.
    /// Values are clamped into [0, 1]; NaN is ignored.
    pub fn advance(&mut self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let value = value.clamp(0.0, 1.0);
        if value > self.last {
            self.last = value;
            Some(value)
        } else {
            None
        }
    }
}
