// Scheduler Module - cooperative execution of resumable units of work
//
// - Thread-safe ingestion queue with monotonic task IDs
// - Single-threaded drain-and-start loop driven by an external tick
// - Explicit routine state machines resumed once per drive cycle
// - Bounded pool recycling task records

pub mod types;
pub mod config;
pub mod metrics;
pub mod pool;
pub mod routine;
pub mod executor;

pub use types::{DriveSummary, RoutineState, SchedulerStats, Step, TaskId, TaskStartError};
pub use config::SchedulerConfig;
pub use metrics::SchedulerMetrics;
pub use pool::{DEFAULT_POOL_CAPACITY, Task, TaskPool};
pub use routine::{FnRoutine, OnStarted, RoutineHandle, UnitOfWork};
pub use executor::TaskScheduler;

#[cfg(test)]
mod tests;
