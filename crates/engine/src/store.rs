//! Collaborator contracts for the persistence layer.
//!
//! The engine owns no storage. It reads club facts through [`ClubStore`]
//! and writes exactly one thing — the derived membership-state cache —
//! through [`MembershipStateStore`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use clubdues_core::{HouseholdId, PersonId, SportId};
use clubdues_fees::FeeScheduleEntry;
use clubdues_membership::{Enrollment, Household, Person, Settings, Sport, StateRecord};

/// Store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown id. Surfaced to the caller as-is, never retried.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A write-time integrity rule was violated (duplicate effective date,
    /// second open enrollment for a pair, dangling household reference, ...).
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The persistence layer reported a concurrent-write conflict.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Fetch/persist failure, wrapped with the entity it concerned.
    #[error("{entity} store failure")]
    Backend {
        entity: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(entity: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            entity,
            source: source.into(),
        }
    }
}

/// Read-only view of club facts.
///
/// Every call returns a snapshot taken at call time; no consistency across
/// calls is promised (a read racing a recalculation may see the state from
/// before or after it, never a torn one).
#[async_trait]
pub trait ClubStore: Send + Sync {
    async fn person(&self, id: PersonId) -> Result<Person, StoreError>;
    async fn persons(&self) -> Result<Vec<Person>, StoreError>;

    async fn household(&self, id: HouseholdId) -> Result<Household, StoreError>;
    async fn household_members(&self, id: HouseholdId) -> Result<Vec<Person>, StoreError>;

    async fn sport(&self, id: SportId) -> Result<Sport, StoreError>;
    async fn sports(&self) -> Result<Vec<Sport>, StoreError>;

    /// All enrollment periods of a person, historical ones included,
    /// ordered by `joined`.
    async fn enrollments_for_person(&self, id: PersonId) -> Result<Vec<Enrollment>, StoreError>;

    /// Enrollments with `left == None` in the given sport.
    async fn open_enrollments_for_sport(&self, id: SportId) -> Result<Vec<Enrollment>, StoreError>;

    /// Full fee history of a sport, ordered by `effective_from`.
    async fn fee_history(&self, id: SportId) -> Result<Vec<FeeScheduleEntry>, StoreError>;

    async fn settings(&self) -> Result<Settings, StoreError>;
}

/// Membership-state cache writes. Only the recalculation orchestrator is
/// supposed to call this.
#[async_trait]
pub trait MembershipStateStore: Send + Sync {
    /// Persist a derived state atomically: state, reason and timestamp land
    /// together or not at all.
    async fn save_state(
        &self,
        person_id: PersonId,
        record: StateRecord,
    ) -> Result<(), StoreError>;

    /// The cached record of the last persisted recalculation, if any.
    async fn state_record(&self, person_id: PersonId) -> Result<Option<StateRecord>, StoreError>;
}

#[async_trait]
impl<S> ClubStore for Arc<S>
where
    S: ClubStore + ?Sized,
{
    async fn person(&self, id: PersonId) -> Result<Person, StoreError> {
        (**self).person(id).await
    }

    async fn persons(&self) -> Result<Vec<Person>, StoreError> {
        (**self).persons().await
    }

    async fn household(&self, id: HouseholdId) -> Result<Household, StoreError> {
        (**self).household(id).await
    }

    async fn household_members(&self, id: HouseholdId) -> Result<Vec<Person>, StoreError> {
        (**self).household_members(id).await
    }

    async fn sport(&self, id: SportId) -> Result<Sport, StoreError> {
        (**self).sport(id).await
    }

    async fn sports(&self) -> Result<Vec<Sport>, StoreError> {
        (**self).sports().await
    }

    async fn enrollments_for_person(&self, id: PersonId) -> Result<Vec<Enrollment>, StoreError> {
        (**self).enrollments_for_person(id).await
    }

    async fn open_enrollments_for_sport(&self, id: SportId) -> Result<Vec<Enrollment>, StoreError> {
        (**self).open_enrollments_for_sport(id).await
    }

    async fn fee_history(&self, id: SportId) -> Result<Vec<FeeScheduleEntry>, StoreError> {
        (**self).fee_history(id).await
    }

    async fn settings(&self) -> Result<Settings, StoreError> {
        (**self).settings().await
    }
}

#[async_trait]
impl<S> MembershipStateStore for Arc<S>
where
    S: MembershipStateStore + ?Sized,
{
    async fn save_state(
        &self,
        person_id: PersonId,
        record: StateRecord,
    ) -> Result<(), StoreError> {
        (**self).save_state(person_id, record).await
    }

    async fn state_record(&self, person_id: PersonId) -> Result<Option<StateRecord>, StoreError> {
        (**self).state_record(person_id).await
    }
}
