use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REDIRECT_LIMIT: u32 = 32;

/// Defaults applied to requests that do not override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Request timeout in seconds, `None` leaves it to the transport
    pub default_timeout_secs: Option<u64>,
    /// Maximum redirects followed, 0 disables redirects
    pub redirect_limit: u32,
}

impl RequestConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: None,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
        }
    }
}
