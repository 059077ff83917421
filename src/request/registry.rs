use std::collections::BTreeMap;
use std::sync::Arc;

use crate::request::error::RequestError;
use crate::request::record::RequestRecord;
use crate::request::types::RequestId;
use crate::scheduler::RoutineHandle;

pub(crate) struct InFlightEntry {
    pub(crate) record: Arc<RequestRecord>,
    pub(crate) routine: RoutineHandle,
}

/// Requests whose transport operation has started and has not yet finished.
///
/// Keyed by request ID, so iteration follows send order.
#[derive(Default)]
pub struct InFlightRegistry {
    entries: BTreeMap<RequestId, InFlightEntry>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &mut self,
        record: Arc<RequestRecord>,
        routine: RoutineHandle,
    ) -> Result<(), RequestError> {
        if self.entries.contains_key(&record.id) {
            return Err(RequestError::AlreadySent(record.id));
        }
        self.entries.insert(record.id, InFlightEntry { record, routine });
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &RequestId) -> Option<InFlightEntry> {
        self.entries.remove(id)
    }

    /// Cloned record list so callers can release the lock before polling.
    pub(crate) fn records(&self) -> Vec<Arc<RequestRecord>> {
        self.entries.values().map(|entry| entry.record.clone()).collect()
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<RequestId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
