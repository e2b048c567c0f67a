//! Recalculation orchestrator: the single writer of membership state.
//!
//! Triggered by external mutating events (join/leave, household change,
//! sport flag change, fee-schedule append). Re-derives the state from fresh
//! facts and persists it only when it actually changed, so recalculation is
//! idempotent and the cached timestamp stays put on no-ops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use clubdues_core::{PersonId, SportId};
use clubdues_membership::{derive_state, MembershipState, StateRecord};

use crate::error::EngineError;
use crate::sink::{StateChange, StateChangeSink};
use crate::store::{ClubStore, MembershipStateStore, StoreError};

/// Keyed mutual exclusion: one async lock per person, created on first use.
///
/// A single global lock would serialize unrelated persons; this map only
/// serializes same-person recalculations.
#[derive(Default)]
struct PersonLocks {
    inner: Mutex<HashMap<PersonId, Arc<tokio::sync::Mutex<()>>>>,
}

impl PersonLocks {
    async fn acquire(&self, person_id: PersonId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(map.entry(person_id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Derives and persists membership activity state.
pub struct Recalculator<S, W> {
    store: S,
    states: W,
    locks: PersonLocks,
    sinks: Vec<Arc<dyn StateChangeSink>>,
}

impl<S, W> Recalculator<S, W>
where
    S: ClubStore,
    W: MembershipStateStore,
{
    pub fn new(store: S, states: W) -> Self {
        Self {
            store,
            states,
            locks: PersonLocks::default(),
            sinks: Vec::new(),
        }
    }

    /// Register a sink notified after each persisted transition.
    pub fn with_sink(mut self, sink: Arc<dyn StateChangeSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Re-derive one person's state from current facts and persist it if it
    /// changed. Concurrent calls for the same person serialize; calls for
    /// distinct persons run in parallel.
    ///
    /// `reason` is stored for audit alongside the new state; it never feeds
    /// the decision. A write conflict triggers one full retry with fresh
    /// facts before surfacing.
    pub async fn recalculate(
        &self,
        person_id: PersonId,
        reason: &str,
    ) -> Result<MembershipState, EngineError> {
        let _guard = self.locks.acquire(person_id).await;

        let mut retried = false;
        loop {
            let person = self.store.person(person_id).await?;
            let enrollments = self.store.enrollments_for_person(person_id).await?;

            let mut sports = HashMap::new();
            for enrollment in enrollments.iter().filter(|e| e.is_open()) {
                if !sports.contains_key(&enrollment.sport_id) {
                    let sport = self.store.sport(enrollment.sport_id).await?;
                    sports.insert(enrollment.sport_id, sport);
                }
            }

            let derived = derive_state(&enrollments, &sports)?;
            if derived == person.state {
                debug!(person_id = %person_id, state = ?derived, "recalculation is a no-op");
                return Ok(derived);
            }

            let change = StateChange {
                person_id,
                previous: person.state,
                current: derived,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            };
            let record = StateRecord {
                state: derived,
                reason: reason.to_string(),
                recalculated_at: change.occurred_at,
            };

            match self.states.save_state(person_id, record).await {
                Ok(()) => {
                    info!(
                        person_id = %person_id,
                        from = ?change.previous,
                        to = ?derived,
                        reason,
                        "membership state changed"
                    );
                    for sink in &self.sinks {
                        sink.emit(change.clone());
                    }
                    return Ok(derived);
                }
                Err(StoreError::Conflict(msg)) if !retried => {
                    retried = true;
                    debug!(
                        person_id = %person_id,
                        error = %msg,
                        "state write conflict, retrying with fresh facts"
                    );
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(EngineError::RecalcConflict(person_id));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Re-derive every person currently enrolled in a sport. Convenience
    /// for sport-level triggers (flag flips, fee-schedule appends).
    pub async fn recalculate_sport_members(
        &self,
        sport_id: SportId,
        reason: &str,
    ) -> Result<Vec<(PersonId, MembershipState)>, EngineError> {
        self.store.sport(sport_id).await?;
        let open = self.store.open_enrollments_for_sport(sport_id).await?;

        let mut results = Vec::with_capacity(open.len());
        for enrollment in open {
            let state = self.recalculate(enrollment.person_id, reason).await?;
            results.push((enrollment.person_id, state));
        }
        Ok(results)
    }
}
