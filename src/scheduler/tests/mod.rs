
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;

/// Unit of work that records its label when started and finishes immediately
pub(super) fn recording(log: &Arc<Mutex<Vec<u32>>>, label: u32) -> FnRoutine {
    let log = log.clone();
    FnRoutine::once(move || log.lock().push(label))
}

/// Unit of work that yields `yields` times before finishing
pub(super) struct CountingWork {
    pub remaining: u32,
    pub resumes: Arc<Mutex<u32>>,
    pub stopped: Arc<Mutex<bool>>,
}

impl CountingWork {
    pub fn new(yields: u32) -> (Self, Arc<Mutex<u32>>, Arc<Mutex<bool>>) {
        let resumes = Arc::new(Mutex::new(0));
        let stopped = Arc::new(Mutex::new(false));
        (
            Self {
                remaining: yields,
                resumes: resumes.clone(),
                stopped: stopped.clone(),
            },
            resumes,
            stopped,
        )
    }
}

impl UnitOfWork for CountingWork {
    fn start(&mut self) -> Result<Step, TaskStartError> {
        Ok(if self.remaining == 0 { Step::Done } else { Step::Yield })
    }

    fn resume(&mut self) -> Step {
        *self.resumes.lock() += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 { Step::Done } else { Step::Yield }
    }

    fn stop(&mut self) {
        *self.stopped.lock() = true;
    }
}
