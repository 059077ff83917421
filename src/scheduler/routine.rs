use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::scheduler::types::{RoutineState, Step, TaskId, TaskStartError};

/// A resumable computation driven by the scheduler.
///
/// The resume point lives in the implementor's own fields; the scheduler never
/// keeps a suspended call stack. `start` runs up to the first suspension point and
/// may fail synchronously, `resume` advances from the saved state.
pub trait UnitOfWork: Send {
    fn start(&mut self) -> Result<Step, TaskStartError>;

    fn resume(&mut self) -> Step;

    /// Called once when the routine is stopped before reaching `Step::Done`.
    fn stop(&mut self) {}
}

/// Callback receiving the handle of a routine that has just started
pub type OnStarted = Box<dyn FnOnce(RoutineHandle) + Send + 'static>;

#[derive(Debug)]
pub(crate) struct RoutineShared {
    state: Mutex<RoutineState>,
    stop_requested: AtomicBool,
}

impl RoutineShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(RoutineState::NotStarted),
            stop_requested: AtomicBool::new(false),
        }
    }
}

/// Cancellable handle to a started routine
#[derive(Debug, Clone)]
pub struct RoutineHandle {
    id: TaskId,
    shared: Arc<RoutineShared>,
}

impl RoutineHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn state(&self) -> RoutineState {
        *self.shared.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Request a stop; the scheduler removes the routine on its next drive.
    pub fn stop(&self) {
        if !self.is_finished() {
            self.shared.stop_requested.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop_requested.load(Ordering::SeqCst)
    }
}

/// A started unit of work together with its shared state
pub(crate) struct Routine {
    id: TaskId,
    work: Box<dyn UnitOfWork>,
    shared: Arc<RoutineShared>,
    /// Scheduler stop generation observed when the routine was created
    generation: u64,
}

impl Routine {
    pub(crate) fn new(id: TaskId, work: Box<dyn UnitOfWork>, generation: u64) -> Self {
        Self {
            id,
            work,
            shared: Arc::new(RoutineShared::new()),
            generation,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn handle(&self) -> RoutineHandle {
        RoutineHandle {
            id: self.id,
            shared: self.shared.clone(),
        }
    }

    fn set_state(&self, state: RoutineState) {
        let mut current = self.shared.state.lock();
        tracing::trace!(
            task_id = %self.id,
            old_state = %*current,
            new_state = %state,
            "Routine state transition"
        );
        *current = state;
    }

    pub(crate) fn start(&mut self) -> Result<Step, TaskStartError> {
        self.set_state(RoutineState::Running);
        match self.work.start() {
            Ok(step) => {
                self.settle(step);
                Ok(step)
            }
            Err(e) => {
                self.set_state(RoutineState::Done);
                Err(e)
            }
        }
    }

    /// Advance one step, honouring a pending stop request first.
    pub(crate) fn advance(&mut self) -> RoutineState {
        if self.shared.stop_requested.load(Ordering::SeqCst) {
            self.work.stop();
            self.set_state(RoutineState::Stopped);
            return RoutineState::Stopped;
        }
        self.set_state(RoutineState::Running);
        let step = self.work.resume();
        self.settle(step);
        self.state()
    }

    fn settle(&self, step: Step) {
        match step {
            Step::Yield => self.set_state(RoutineState::Suspended),
            Step::Done => self.set_state(RoutineState::Done),
        }
    }

    fn state(&self) -> RoutineState {
        *self.shared.state.lock()
    }
}

type StartFn = Box<dyn FnMut() -> Result<Step, TaskStartError> + Send>;
type ResumeFn = Box<dyn FnMut() -> Step + Send>;

/// Unit of work assembled from closures
pub struct FnRoutine {
    on_start: StartFn,
    on_resume: ResumeFn,
}

impl FnRoutine {
    pub fn new<S, R>(on_start: S, on_resume: R) -> Self
    where
        S: FnMut() -> Result<Step, TaskStartError> + Send + 'static,
        R: FnMut() -> Step + Send + 'static,
    {
        Self {
            on_start: Box::new(on_start),
            on_resume: Box::new(on_resume),
        }
    }

    /// Runs `handler` on start and finishes immediately.
    pub fn once<F>(mut handler: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::new(
            move || {
                handler();
                Ok(Step::Done)
            },
            || Step::Done,
        )
    }

    /// Suspends until `predicate` holds, then runs `then`.
    pub fn wait_until<P, F>(predicate: P, then: F) -> Self
    where
        P: FnMut() -> bool + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(Mutex::new((predicate, Some(then))));
        let start_state = state.clone();

        fn check<P: FnMut() -> bool, F: FnOnce()>(state: &Mutex<(P, Option<F>)>) -> Step {
            let mut guard = state.lock();
            let (predicate, then) = &mut *guard;
            if predicate() {
                if let Some(then) = then.take() {
                    then();
                }
                Step::Done
            } else {
                Step::Yield
            }
        }

        Self::new(move || Ok(check(&start_state)), move || check(&state))
    }
}

impl UnitOfWork for FnRoutine {
    fn start(&mut self) -> Result<Step, TaskStartError> {
        (self.on_start)()
    }

    fn resume(&mut self) -> Step {
        (self.on_resume)()
    }
}
