use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clubdues_core::{Entity, HouseholdId, PersonId};

/// Membership activity state.
///
/// Never edited directly: the stored value is a cache of what the state
/// machine derives from current enrollment facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    Active,
    Passive,
}

/// Cached result of one state recalculation.
///
/// State, reason and timestamp are persisted together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: MembershipState,
    /// Triggering reason, stored for audit. Never an input to the decision.
    pub reason: String,
    pub recalculated_at: DateTime<Utc>,
}

/// A club member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Must reference an existing household; the owning store enforces this
    /// at write time.
    pub household_id: HouseholdId,
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Derived, cached. Only the recalculation orchestrator writes this.
    pub state: MembershipState,
}

impl Person {
    /// New member. Joins as `Passive` until a recalculation says otherwise.
    pub fn new(
        id: PersonId,
        household_id: HouseholdId,
        name: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            id,
            household_id,
            name: name.into(),
            date_of_birth,
            state: MembershipState::Passive,
        }
    }

    /// Completed years of age on `as_of`.
    pub fn age_on(&self, as_of: NaiveDate) -> u32 {
        as_of.years_since(self.date_of_birth).unwrap_or(0)
    }
}

impl Entity for Person {
    type Id = PersonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_completed_years() {
        let p = Person::new(
            PersonId::new(),
            HouseholdId::new(),
            "Test",
            date(2008, 6, 15),
        );
        assert_eq!(p.age_on(date(2026, 6, 14)), 17);
        assert_eq!(p.age_on(date(2026, 6, 15)), 18);
    }

    #[test]
    fn age_before_birth_is_zero() {
        let p = Person::new(
            PersonId::new(),
            HouseholdId::new(),
            "Test",
            date(2020, 1, 1),
        );
        assert_eq!(p.age_on(date(2019, 1, 1)), 0);
    }
}
