use crate::request::types::Outcome;

/// Lifetime counters for the lifecycle manager
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    pub sent: u64,
    pub succeeded: u64,
    pub http_errors: u64,
    pub network_errors: u64,
    pub aborted: u64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_send(&mut self) {
        self.sent += 1;
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::HttpError => self.http_errors += 1,
            Outcome::NetworkError => self.network_errors += 1,
        }
    }

    pub fn record_abort(&mut self) {
        self.aborted += 1;
    }

    pub fn completed(&self) -> u64 {
        self.succeeded + self.http_errors + self.network_errors
    }
}

/// Statistics for lifecycle monitoring
#[derive(Debug, Clone)]
pub struct RequestStats {
    pub pending: usize,
    pub in_flight: usize,
    pub total_sent: u64,
    pub succeeded: u64,
    pub http_errors: u64,
    pub network_errors: u64,
    pub aborted: u64,
}
