/// Monotonic identifier assigned to every enqueued task
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Marker carried by cleared task records sitting in the pool
    pub const UNASSIGNED: TaskId = TaskId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        TaskId::UNASSIGNED
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of advancing a unit of work by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspended; resume on the next drive cycle
    Yield,
    /// Finished; the routine is dropped
    Done,
}

/// Execution state of a started routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineState {
    NotStarted,
    Running,
    Suspended,
    Done,
    Stopped,
}

impl RoutineState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RoutineState::Done | RoutineState::Stopped)
    }
}

impl std::fmt::Display for RoutineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineState::NotStarted => write!(f, "not_started"),
            RoutineState::Running => write!(f, "running"),
            RoutineState::Suspended => write!(f, "suspended"),
            RoutineState::Done => write!(f, "done"),
            RoutineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Synchronous failure raised while a unit of work runs to its first suspension point
#[derive(Debug, Clone, thiserror::Error)]
#[error("task failed to start: {message}")]
pub struct TaskStartError {
    pub message: String,
}

impl TaskStartError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Counts produced by a single `drive()` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub resumed: usize,
    pub completed: usize,
    pub stopped: usize,
    pub started: usize,
    pub start_failures: usize,
}

impl DriveSummary {
    pub fn is_idle(&self) -> bool {
        *self == DriveSummary::default()
    }
}

/// Statistics for scheduler monitoring
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    pub pending: usize,
    pub running: usize,
    pub pooled: usize,
    pub pool_capacity: usize,
    pub total_enqueued: u64,
    pub total_started: u64,
    pub total_start_failures: u64,
    pub total_cancelled: u64,
}
