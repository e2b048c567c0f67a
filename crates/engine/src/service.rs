//! Read-side fee facade: fetch a snapshot, reduce with the pure calculator.
//!
//! Each operation fetches everything it needs from the collaborator up
//! front and hands the snapshot to [`FeeCalculator`] — no query language,
//! no clock, the query date is always an explicit parameter. Cancellation
//! is structural: dropping the returned future abandons the request.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use clubdues_core::{HouseholdId, Money, PersonId, SportId};
use clubdues_fees::{FeeCalculator, FeeSchedule, ScheduleBook};
use clubdues_membership::{Enrollment, MembershipState, Person};

use crate::error::EngineError;
use crate::store::ClubStore;

/// Annual fee reads over one [`ClubStore`].
pub struct FeeService<S> {
    store: S,
}

impl<S> FeeService<S>
where
    S: ClubStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch the fee schedules for the given sports into one book.
    async fn book_for<I>(&self, sport_ids: I) -> Result<ScheduleBook, EngineError>
    where
        I: IntoIterator<Item = SportId>,
    {
        let mut book = ScheduleBook::new();
        let mut seen = HashSet::new();
        for sport_id in sport_ids {
            if !seen.insert(sport_id) {
                continue;
            }
            let history = self.store.fee_history(sport_id).await?;
            book.insert(FeeSchedule::new(sport_id, history)?);
        }
        Ok(book)
    }

    /// Annual fee owed by one person as of `as_of`.
    pub async fn person_annual(
        &self,
        person_id: PersonId,
        as_of: NaiveDate,
    ) -> Result<Money, EngineError> {
        let person = self.store.person(person_id).await?;
        let enrollments = self.store.enrollments_for_person(person_id).await?;
        let settings = self.store.settings().await?;
        let book = self
            .book_for(open_sport_ids(&enrollments))
            .await?;

        let total = FeeCalculator::new(&book, &settings).person_annual(&person, &enrollments, as_of)?;
        debug!(person_id = %person_id, %as_of, fee = %total, "person annual fee");
        Ok(total)
    }

    /// Annual fee for a household: active members' fees summed. An unknown
    /// household surfaces `NotFound`, never a zero total.
    pub async fn household_annual(
        &self,
        household_id: HouseholdId,
        as_of: NaiveDate,
    ) -> Result<Money, EngineError> {
        self.store.household(household_id).await?;
        let members = self.store.household_members(household_id).await?;
        let settings = self.store.settings().await?;

        let mut with_enrollments = Vec::with_capacity(members.len());
        for person in members {
            let enrollments = self.store.enrollments_for_person(person.id).await?;
            with_enrollments.push((person, enrollments));
        }

        let active_sport_ids = with_enrollments
            .iter()
            .filter(|(p, _)| p.state == MembershipState::Active)
            .flat_map(|(_, es)| open_sport_ids(es))
            .collect::<Vec<_>>();
        let book = self.book_for(active_sport_ids).await?;

        let total =
            FeeCalculator::new(&book, &settings).household_annual(&with_enrollments, as_of)?;
        debug!(household_id = %household_id, %as_of, fee = %total, "household annual fee");
        Ok(total)
    }

    /// Annual fee a sport brings in across its currently-enrolled active
    /// participants.
    pub async fn sport_annual(
        &self,
        sport_id: SportId,
        as_of: NaiveDate,
    ) -> Result<Money, EngineError> {
        self.store.sport(sport_id).await?;
        let open = self.store.open_enrollments_for_sport(sport_id).await?;
        let settings = self.store.settings().await?;

        let mut participants = Vec::with_capacity(open.len());
        for enrollment in &open {
            participants.push(self.store.person(enrollment.person_id).await?);
        }

        let book = self.book_for([sport_id]).await?;
        let total = FeeCalculator::new(&book, &settings).sport_annual(sport_id, &participants, as_of)?;
        debug!(sport_id = %sport_id, %as_of, fee = %total, "sport annual fee");
        Ok(total)
    }

    /// Club-wide total: the sum of `sport_annual` over every sport with at
    /// least one open enrollment.
    pub async fn all_sports_annual(&self, as_of: NaiveDate) -> Result<Money, EngineError> {
        let sports = self.store.sports().await?;
        let settings = self.store.settings().await?;

        let mut book = ScheduleBook::new();
        let mut rosters: Vec<(SportId, Vec<Person>)> = Vec::new();
        for sport in sports {
            let open = self.store.open_enrollments_for_sport(sport.id).await?;
            if open.is_empty() {
                continue;
            }
            let mut participants = Vec::with_capacity(open.len());
            for enrollment in &open {
                participants.push(self.store.person(enrollment.person_id).await?);
            }
            let history = self.store.fee_history(sport.id).await?;
            book.insert(FeeSchedule::new(sport.id, history)?);
            rosters.push((sport.id, participants));
        }

        let total = FeeCalculator::new(&book, &settings).all_sports_annual(&rosters, as_of)?;
        debug!(%as_of, fee = %total, sports = rosters.len(), "club-wide annual fee");
        Ok(total)
    }

    /// Sum of `person_annual` over every member, passive flat fees included.
    pub async fn all_persons_annual(&self, as_of: NaiveDate) -> Result<Money, EngineError> {
        let persons = self.store.persons().await?;
        let settings = self.store.settings().await?;

        let mut with_enrollments = Vec::with_capacity(persons.len());
        for person in persons {
            let enrollments = self.store.enrollments_for_person(person.id).await?;
            with_enrollments.push((person, enrollments));
        }

        let sport_ids = with_enrollments
            .iter()
            .flat_map(|(_, es)| open_sport_ids(es))
            .collect::<Vec<_>>();
        let book = self.book_for(sport_ids).await?;

        let total =
            FeeCalculator::new(&book, &settings).all_persons_annual(&with_enrollments, as_of)?;
        debug!(%as_of, fee = %total, "all-persons annual fee");
        Ok(total)
    }
}

fn open_sport_ids(enrollments: &[Enrollment]) -> Vec<SportId> {
    enrollments
        .iter()
        .filter(|e| e.is_open())
        .map(|e| e.sport_id)
        .collect()
}
