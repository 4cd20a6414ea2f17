//! Append-only in-memory event log.
//!
//! This is the distribution surface for external indexers: every committed
//! state transition appends its events here, in commit order. The log is
//! storage, not pub/sub; consumers poll it (or snapshot it) at their own
//! pace.

use std::sync::RwLock;

use thiserror::Error;

use crate::Event;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventLogError {
    #[error("event log lock poisoned")]
    Poisoned,
}

/// In-memory append-only event log.
///
/// Intended for tests/dev and single-process deployments. Not optimized for
/// performance.
#[derive(Debug, Default)]
pub struct EventLog<E: Event> {
    entries: RwLock<Vec<E>>,
}

impl<E: Event> EventLog<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append a batch of events in order. Events from a single state
    /// transition are appended together so the log never shows a
    /// partially-committed call.
    pub fn append_batch(&self, events: &[E]) -> Result<(), EventLogError> {
        let mut entries = self.entries.write().map_err(|_| EventLogError::Poisoned)?;
        entries.extend_from_slice(events);
        Ok(())
    }

    /// Snapshot of the full log, in append order.
    pub fn snapshot(&self) -> Result<Vec<E>, EventLogError> {
        let entries = self.entries.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(entries.clone())
    }

    pub fn len(&self) -> Result<usize, EventLogError> {
        let entries = self.entries.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, EventLogError> {
        Ok(self.len()? == 0)
    }
}
