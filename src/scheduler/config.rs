use serde::{Deserialize, Serialize};

use crate::scheduler::pool::DEFAULT_POOL_CAPACITY;

/// Configuration for scheduler behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of idle task records kept for reuse
    pub pool_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}
