//! Downstream notification seam for membership state transitions.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use clubdues_core::PersonId;
use clubdues_membership::MembershipState;

/// A persisted membership state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub person_id: PersonId,
    pub previous: MembershipState,
    pub current: MembershipState,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Sink for state transitions (republish, notify, project).
///
/// Emission happens after the write succeeded and is fire-and-forget; a
/// sink must not block the orchestrator.
pub trait StateChangeSink: Send + Sync {
    fn emit(&self, change: StateChange);
}

impl<S> StateChangeSink for Arc<S>
where
    S: StateChangeSink + ?Sized,
{
    fn emit(&self, change: StateChange) {
        (**self).emit(change)
    }
}

/// Collects emitted changes in memory (tests/dev).
#[derive(Debug, Default)]
pub struct RecordingSink {
    inner: Mutex<Vec<StateChange>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<StateChange> {
        match self.inner.lock() {
            Ok(changes) => changes.clone(),
            Err(_) => vec![],
        }
    }
}

impl StateChangeSink for RecordingSink {
    fn emit(&self, change: StateChange) {
        if let Ok(mut changes) = self.inner.lock() {
            changes.push(change);
        }
    }
}
