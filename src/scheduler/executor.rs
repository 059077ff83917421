use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::scheduler::config::SchedulerConfig;
use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::pool::{Task, TaskPool};
use crate::scheduler::routine::{OnStarted, Routine, RoutineHandle, UnitOfWork};
use crate::scheduler::types::{DriveSummary, RoutineState, SchedulerStats, Step, TaskId};

/// Cooperative scheduler with a thread-safe ingestion queue.
///
/// Producers on any thread call [`TaskScheduler::enqueue`]; a single driver
/// thread calls [`TaskScheduler::drive`] once per tick. Locks are only held for
/// queue hand-off, never while a unit of work or callback runs.
pub struct TaskScheduler {
    /// Tasks waiting for the next drive cycle
    pending: Mutex<Vec<Box<Task>>>,
    /// Reusable snapshot buffer, only touched by the driver
    ready: Mutex<Vec<Box<Task>>>,
    /// Routines started in earlier cycles; empty while a drive holds them
    running: Mutex<Vec<Routine>>,
    /// Started routines that have not finished, including those held by a drive
    live_routines: AtomicUsize,
    /// Bumped by `stop_all`; routines created before the bump are stopped
    stop_generation: AtomicU64,
    /// Recycled task records
    pool: TaskPool,
    /// Counter for generating monotonic task IDs
    task_counter: AtomicU64,
    metrics: SchedulerMetrics,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            ready: Mutex::new(Vec::new()),
            running: Mutex::new(Vec::new()),
            live_routines: AtomicUsize::new(0),
            stop_generation: AtomicU64::new(0),
            pool: TaskPool::new(config.pool_capacity),
            task_counter: AtomicU64::new(0),
            metrics: SchedulerMetrics::new(),
        }
    }

    /// Queue a unit of work for the next drive cycle.
    pub fn enqueue<W>(&self, work: W) -> TaskId
    where
        W: UnitOfWork + 'static,
    {
        self.enqueue_boxed(Box::new(work), None)
    }

    /// Queue a unit of work and receive its routine handle once it has started.
    pub fn enqueue_with<W, F>(&self, work: W, on_started: F) -> TaskId
    where
        W: UnitOfWork + 'static,
        F: FnOnce(RoutineHandle) + Send + 'static,
    {
        self.enqueue_boxed(Box::new(work), Some(Box::new(on_started)))
    }

    pub fn enqueue_boxed(
        &self,
        work: Box<dyn UnitOfWork>,
        on_started: Option<OnStarted>,
    ) -> TaskId {
        let task_id = TaskId::new(self.task_counter.fetch_add(1, Ordering::SeqCst) + 1);

        let mut task = self.pool.acquire();
        task.id = task_id;
        task.work = Some(work);
        task.on_started = on_started;

        let queued = {
            let mut pending = self.pending.lock();
            pending.push(task);
            pending.len()
        };
        self.metrics.record_enqueue();

        tracing::trace!(task_id = %task_id, queued = queued, "Task enqueued");
        task_id
    }

    /// Run one scheduling tick.
    ///
    /// Routines started in earlier cycles are resumed first, then every task that
    /// was pending when the call began is started in FIFO order. Tasks enqueued
    /// while this runs wait for the next call.
    pub fn drive(&self) -> DriveSummary {
        let span = tracing::trace_span!("drive_cycle");
        let _enter = span.enter();

        let mut summary = DriveSummary::default();

        // Snapshot first: anything enqueued from here on waits for the next cycle.
        let mut ready = std::mem::take(&mut *self.ready.lock());
        ready.append(&mut self.pending.lock());

        let mut routines = std::mem::take(&mut *self.running.lock());
        routines.retain_mut(|routine| {
            // Reloaded per routine so a `stop_all` from an earlier resume applies.
            if routine.generation() < self.stop_generation.load(Ordering::SeqCst) {
                routine.handle().stop();
            }
            let keep = match routine.advance() {
                RoutineState::Stopped => {
                    summary.stopped += 1;
                    tracing::debug!(task_id = %routine.id(), "Routine stopped");
                    false
                }
                RoutineState::Done => {
                    summary.resumed += 1;
                    summary.completed += 1;
                    tracing::trace!(task_id = %routine.id(), "Routine completed");
                    false
                }
                _ => {
                    summary.resumed += 1;
                    true
                }
            };
            if !keep {
                self.live_routines.fetch_sub(1, Ordering::SeqCst);
            }
            keep
        });

        for mut task in ready.drain(..) {
            let task_id = task.id;
            let on_started = task.on_started.take();

            if let Some(work) = task.work.take() {
                let generation = self.stop_generation.load(Ordering::SeqCst);
                let mut routine = Routine::new(task_id, work, generation);
                match routine.start() {
                    Ok(step) => {
                        summary.started += 1;
                        self.metrics.record_start();
                        if let Some(on_started) = on_started {
                            on_started(routine.handle());
                        }
                        match step {
                            Step::Yield => {
                                self.live_routines.fetch_add(1, Ordering::SeqCst);
                                routines.push(routine);
                            }
                            Step::Done => summary.completed += 1,
                        }
                    }
                    Err(e) => {
                        summary.start_failures += 1;
                        self.metrics.record_start_failure();
                        tracing::error!(
                            task_id = %task_id,
                            error = %e,
                            "Task threw while starting"
                        );
                    }
                }
            }

            task.clear();
            self.pool.release(task);
        }

        // The buffer keeps its capacity for the next cycle.
        *self.ready.lock() = ready;

        {
            let mut running = self.running.lock();
            routines.append(&mut running);
            *running = routines;
        }

        if !summary.is_idle() {
            tracing::debug!(
                resumed = summary.resumed,
                completed = summary.completed,
                stopped = summary.stopped,
                started = summary.started,
                start_failures = summary.start_failures,
                "Drive cycle finished"
            );
        }

        summary
    }

    /// Remove a task that has not started yet. Returns false for started or
    /// unknown IDs.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let removed = {
            let mut pending = self.pending.lock();
            pending
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| pending.remove(index))
        };

        match removed {
            Some(mut task) => {
                task.clear();
                self.pool.release(task);
                self.metrics.record_cancel();
                tracing::debug!(task_id = %task_id, "Pending task cancelled");
                true
            }
            None => false,
        }
    }

    /// Request a stop for every running routine. Pending tasks are left queued.
    ///
    /// Safe to call from inside a drive cycle; routines held by the cycle are
    /// stopped when they are next advanced.
    pub fn stop_all(&self) -> usize {
        self.stop_generation.fetch_add(1, Ordering::SeqCst);
        for routine in self.running.lock().iter() {
            routine.handle().stop();
        }
        let routines = self.running_count();
        tracing::debug!(routines = routines, "Stop requested for all routines");
        routines
    }

    pub fn is_pending(&self, task_id: TaskId) -> bool {
        self.pending.lock().iter().any(|task| task.id == task_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn running_count(&self) -> usize {
        self.live_routines.load(Ordering::SeqCst)
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    pub fn get_stats(&self) -> SchedulerStats {
        SchedulerStats {
            pending: self.pending_count(),
            running: self.running_count(),
            pooled: self.pool.len(),
            pool_capacity: self.pool.capacity(),
            total_enqueued: self.metrics.enqueued(),
            total_started: self.metrics.started(),
            total_start_failures: self.metrics.start_failures(),
            total_cancelled: self.metrics.cancelled(),
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("pending", &self.pending_count())
            .field("running", &self.running_count())
            .field("pool", &self.pool)
            .finish()
    }
}
