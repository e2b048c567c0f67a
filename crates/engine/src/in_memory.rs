//! In-memory club store.
//!
//! Intended for tests/dev. Implements both collaborator contracts behind a
//! single lock, so every read is a consistent snapshot and the state write
//! is atomic. Enforces the write-time integrity rules the production
//! persistence layer owns: household references, one open enrollment per
//! (person, sport) pair, `left >= joined`, no duplicate `effective_from`,
//! household deletion only when empty, and the cached sport fee projection.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use clubdues_core::{EnrollmentId, HouseholdId, PersonId, SportId};
use clubdues_fees::FeeScheduleEntry;
use clubdues_membership::{Enrollment, Household, Person, Settings, Sport, StateRecord};

use crate::store::{ClubStore, MembershipStateStore, StoreError};

#[derive(Debug)]
struct Inner {
    settings: Settings,
    households: HashMap<HouseholdId, Household>,
    persons: HashMap<PersonId, Person>,
    sports: HashMap<SportId, Sport>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    fee_history: HashMap<SportId, Vec<FeeScheduleEntry>>,
    state_records: HashMap<PersonId, StateRecord>,
    /// Append-only log of persisted state transitions.
    audit: Vec<(PersonId, StateRecord)>,
    /// Fault injection: fail the next N `save_state` calls with a conflict.
    conflicts_to_inject: u32,
}

#[derive(Debug)]
pub struct InMemoryClubStore {
    inner: RwLock<Inner>,
}

impl InMemoryClubStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(Inner {
                settings,
                households: HashMap::new(),
                persons: HashMap::new(),
                sports: HashMap::new(),
                enrollments: HashMap::new(),
                fee_history: HashMap::new(),
                state_records: HashMap::new(),
                audit: Vec::new(),
                conflicts_to_inject: 0,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("store", anyhow::anyhow!("lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("store", anyhow::anyhow!("lock poisoned")))
    }

    pub fn put_settings(&self, settings: Settings) -> Result<(), StoreError> {
        settings
            .validate()
            .map_err(|e| StoreError::integrity(e.to_string()))?;
        self.write()?.settings = settings;
        Ok(())
    }

    pub fn add_household(&self, household: Household) -> Result<(), StoreError> {
        household
            .validate()
            .map_err(|e| StoreError::integrity(e.to_string()))?;
        self.write()?.households.insert(household.id, household);
        Ok(())
    }

    /// Delete a household. Refused while any person still references it.
    pub fn remove_household(&self, id: HouseholdId) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.households.contains_key(&id) {
            return Err(StoreError::not_found("household", id));
        }
        if inner.persons.values().any(|p| p.household_id == id) {
            return Err(StoreError::integrity(format!(
                "household {id} still has members"
            )));
        }
        inner.households.remove(&id);
        Ok(())
    }

    pub fn add_person(&self, person: Person) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.households.contains_key(&person.household_id) {
            return Err(StoreError::integrity(format!(
                "person {} references unknown household {}",
                person.id, person.household_id
            )));
        }
        inner.persons.insert(person.id, person);
        Ok(())
    }

    /// Move a person to another (existing) household.
    pub fn move_person(&self, person_id: PersonId, household_id: HouseholdId) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.households.contains_key(&household_id) {
            return Err(StoreError::not_found("household", household_id));
        }
        let person = inner
            .persons
            .get_mut(&person_id)
            .ok_or_else(|| StoreError::not_found("person", person_id))?;
        person.household_id = household_id;
        Ok(())
    }

    /// Register a sport together with its initial fee-schedule entry; a
    /// sport never exists without one.
    pub fn register_sport(
        &self,
        mut sport: Sport,
        initial_entry: FeeScheduleEntry,
    ) -> Result<(), StoreError> {
        sport
            .validate()
            .map_err(|e| StoreError::integrity(e.to_string()))?;
        initial_entry
            .validate()
            .map_err(|e| StoreError::integrity(e.to_string()))?;
        if initial_entry.sport_id != sport.id {
            return Err(StoreError::integrity(format!(
                "initial fee entry references sport {}, expected {}",
                initial_entry.sport_id, sport.id
            )));
        }

        sport.current_adult_fee = initial_entry.adult_fee;
        sport.current_child_fee = initial_entry.child_fee;

        let mut inner = self.write()?;
        inner.fee_history.insert(sport.id, vec![initial_entry]);
        inner.sports.insert(sport.id, sport);
        Ok(())
    }

    pub fn set_sport_active(&self, sport_id: SportId, active: bool) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let sport = inner
            .sports
            .get_mut(&sport_id)
            .ok_or_else(|| StoreError::not_found("sport", sport_id))?;
        sport.active = active;
        Ok(())
    }

    /// Append a fee-schedule entry. Duplicate `effective_from` dates are an
    /// integrity violation; the sport's cached current fee is refreshed when
    /// the appended entry becomes the latest.
    pub fn append_fee_entry(&self, entry: FeeScheduleEntry) -> Result<(), StoreError> {
        entry
            .validate()
            .map_err(|e| StoreError::integrity(e.to_string()))?;

        let mut inner = self.write()?;
        if !inner.sports.contains_key(&entry.sport_id) {
            return Err(StoreError::not_found("sport", entry.sport_id));
        }

        let history = inner.fee_history.entry(entry.sport_id).or_default();
        if history
            .iter()
            .any(|e| e.effective_from == entry.effective_from)
        {
            return Err(StoreError::integrity(format!(
                "sport {} already has a fee entry effective {}",
                entry.sport_id, entry.effective_from
            )));
        }

        let is_latest = history
            .iter()
            .all(|e| e.effective_from < entry.effective_from);
        history.push(entry.clone());
        history.sort_by_key(|e| e.effective_from);

        if is_latest {
            if let Some(sport) = inner.sports.get_mut(&entry.sport_id) {
                sport.current_adult_fee = entry.adult_fee;
                sport.current_child_fee = entry.child_fee;
            }
        }
        Ok(())
    }

    /// Open an enrollment. At most one open enrollment per (person, sport)
    /// pair; rejoin after leaving is a new row.
    pub fn join_sport(
        &self,
        person_id: PersonId,
        sport_id: SportId,
        joined: NaiveDate,
    ) -> Result<EnrollmentId, StoreError> {
        let mut inner = self.write()?;
        if !inner.persons.contains_key(&person_id) {
            return Err(StoreError::not_found("person", person_id));
        }
        if !inner.sports.contains_key(&sport_id) {
            return Err(StoreError::not_found("sport", sport_id));
        }
        if inner
            .enrollments
            .values()
            .any(|e| e.person_id == person_id && e.sport_id == sport_id && e.is_open())
        {
            return Err(StoreError::integrity(format!(
                "person {person_id} already has an open enrollment in sport {sport_id}"
            )));
        }

        let enrollment = Enrollment::open(EnrollmentId::new(), person_id, sport_id, joined);
        let id = enrollment.id;
        inner.enrollments.insert(id, enrollment);
        Ok(id)
    }

    /// Close an enrollment with the given leave date.
    pub fn leave_sport(&self, enrollment_id: EnrollmentId, left: NaiveDate) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let enrollment = inner
            .enrollments
            .get_mut(&enrollment_id)
            .ok_or_else(|| StoreError::not_found("enrollment", enrollment_id))?;
        enrollment
            .close(left)
            .map_err(|e| StoreError::integrity(e.to_string()))
    }

    /// Fault injection for exercising the orchestrator's conflict retry:
    /// the next `n` `save_state` calls fail with `StoreError::Conflict`.
    pub fn inject_save_conflicts(&self, n: u32) {
        if let Ok(mut inner) = self.inner.write() {
            inner.conflicts_to_inject = n;
        }
    }

    /// Snapshot of the persisted state-transition audit log.
    pub fn audit_log(&self) -> Vec<(PersonId, StateRecord)> {
        match self.inner.read() {
            Ok(inner) => inner.audit.clone(),
            Err(_) => vec![],
        }
    }
}

#[async_trait]
impl ClubStore for InMemoryClubStore {
    async fn person(&self, id: PersonId) -> Result<Person, StoreError> {
        self.read()?
            .persons
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("person", id))
    }

    async fn persons(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.read()?.persons.values().cloned().collect())
    }

    async fn household(&self, id: HouseholdId) -> Result<Household, StoreError> {
        self.read()?
            .households
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("household", id))
    }

    async fn household_members(&self, id: HouseholdId) -> Result<Vec<Person>, StoreError> {
        Ok(self
            .read()?
            .persons
            .values()
            .filter(|p| p.household_id == id)
            .cloned()
            .collect())
    }

    async fn sport(&self, id: SportId) -> Result<Sport, StoreError> {
        self.read()?
            .sports
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("sport", id))
    }

    async fn sports(&self) -> Result<Vec<Sport>, StoreError> {
        Ok(self.read()?.sports.values().cloned().collect())
    }

    async fn enrollments_for_person(&self, id: PersonId) -> Result<Vec<Enrollment>, StoreError> {
        let mut enrollments: Vec<Enrollment> = self
            .read()?
            .enrollments
            .values()
            .filter(|e| e.person_id == id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| e.joined);
        Ok(enrollments)
    }

    async fn open_enrollments_for_sport(&self, id: SportId) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .read()?
            .enrollments
            .values()
            .filter(|e| e.sport_id == id && e.is_open())
            .cloned()
            .collect())
    }

    async fn fee_history(&self, id: SportId) -> Result<Vec<FeeScheduleEntry>, StoreError> {
        self.read()?
            .fee_history
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("sport", id))
    }

    async fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.read()?.settings.clone())
    }
}

#[async_trait]
impl MembershipStateStore for InMemoryClubStore {
    async fn save_state(
        &self,
        person_id: PersonId,
        record: StateRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        if inner.conflicts_to_inject > 0 {
            inner.conflicts_to_inject -= 1;
            return Err(StoreError::conflict(format!(
                "stale state for person {person_id}"
            )));
        }

        let person = inner
            .persons
            .get_mut(&person_id)
            .ok_or_else(|| StoreError::not_found("person", person_id))?;

        // One write guard: cached state, record and audit land together.
        person.state = record.state;
        inner.state_records.insert(person_id, record.clone());
        inner.audit.push((person_id, record));
        Ok(())
    }

    async fn state_record(&self, person_id: PersonId) -> Result<Option<StateRecord>, StoreError> {
        Ok(self.read()?.state_records.get(&person_id).cloned())
    }
}
