use parking_lot::Mutex;

use crate::scheduler::routine::{OnStarted, UnitOfWork};
use crate::scheduler::types::TaskId;

pub const DEFAULT_POOL_CAPACITY: usize = 100;

/// A queued unit of work waiting for the next drive cycle
#[derive(Default)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) work: Option<Box<dyn UnitOfWork>>,
    pub(crate) on_started: Option<OnStarted>,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Drop every reference the record holds so a pooled record retains nothing.
    pub fn clear(&mut self) {
        self.id = TaskId::UNASSIGNED;
        self.work = None;
        self.on_started = None;
    }

    pub fn is_clear(&self) -> bool {
        !self.id.is_assigned() && self.work.is_none() && self.on_started.is_none()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("work", &self.work.as_ref().map(|_| "<unit of work>"))
            .field("on_started", &self.on_started.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Bounded stack of recycled task records.
///
/// Records must be cleared before `release`; the pool never clears them itself.
#[derive(Debug)]
pub struct TaskPool {
    stack: Mutex<Vec<Box<Task>>>,
    capacity: usize,
}

impl TaskPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Pop a recycled record, or allocate a fresh one when the pool is empty.
    pub fn acquire(&self) -> Box<Task> {
        self.stack.lock().pop().unwrap_or_default()
    }

    /// Return a cleared record; dropped when the pool is already at capacity.
    pub fn release(&self, task: Box<Task>) {
        debug_assert!(task.is_clear(), "task records must be cleared before release");
        let mut stack = self.stack.lock();
        if stack.len() < self.capacity {
            stack.push(task);
        }
    }

    pub fn len(&self) -> usize {
        self.stack.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
