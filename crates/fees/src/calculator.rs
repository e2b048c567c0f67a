//! Annual fee aggregation.
//!
//! All four club granularities (person, household, sport, club) reduce over
//! a snapshot the caller fetched up front. Nothing here mutates state or
//! touches a clock; zero-result sets total to zero, failures never yield a
//! partial sum.

use chrono::NaiveDate;

use clubdues_core::{Money, SportId};
use clubdues_membership::{Enrollment, MembershipState, Person, Settings};

use crate::schedule::{FeeError, ScheduleBook};

/// Pure fee aggregation over one fetched snapshot.
pub struct FeeCalculator<'a> {
    book: &'a ScheduleBook,
    settings: &'a Settings,
}

impl<'a> FeeCalculator<'a> {
    pub fn new(book: &'a ScheduleBook, settings: &'a Settings) -> Self {
        Self { book, settings }
    }

    /// Annual fee owed by one person as of `as_of`.
    ///
    /// Passive members owe the flat fee from settings for their age bracket;
    /// active members owe the sum of the resolved fee over every open
    /// enrollment.
    pub fn person_annual(
        &self,
        person: &Person,
        enrollments: &[Enrollment],
        as_of: NaiveDate,
    ) -> Result<Money, FeeError> {
        let bracket = self.settings.bracket_of(person, as_of);
        match person.state {
            MembershipState::Passive => Ok(self.settings.passive_fee(bracket)),
            MembershipState::Active => {
                let mut total = Money::ZERO;
                for enrollment in enrollments.iter().filter(|e| e.is_open()) {
                    let entry = self.book.resolve(enrollment.sport_id, as_of)?;
                    total = total
                        .checked_add(entry.fee_for(bracket))
                        .ok_or(FeeError::Overflow)?;
                }
                Ok(total)
            }
        }
    }

    /// Annual fee for a household: the sum of `person_annual` over its
    /// active members only.
    ///
    /// Passive members contribute nothing here — their flat fee is billed
    /// individually, not through the household total (see DESIGN.md).
    pub fn household_annual(
        &self,
        members: &[(Person, Vec<Enrollment>)],
        as_of: NaiveDate,
    ) -> Result<Money, FeeError> {
        let mut total = Money::ZERO;
        for (person, enrollments) in members {
            if person.state != MembershipState::Active {
                continue;
            }
            let fee = self.person_annual(person, enrollments, as_of)?;
            total = total.checked_add(fee).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }

    /// Annual fee a sport brings in: the resolved fee once per
    /// currently-enrolled active participant, bracketed by that
    /// participant's age.
    pub fn sport_annual(
        &self,
        sport_id: SportId,
        participants: &[Person],
        as_of: NaiveDate,
    ) -> Result<Money, FeeError> {
        let mut total = Money::ZERO;
        for person in participants
            .iter()
            .filter(|p| p.state == MembershipState::Active)
        {
            let entry = self.book.resolve(sport_id, as_of)?;
            let fee = entry.fee_for(self.settings.bracket_of(person, as_of));
            total = total.checked_add(fee).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }

    /// Club-wide total: the sum of `sport_annual` over each roster of
    /// currently-enrolled participants.
    pub fn all_sports_annual(
        &self,
        rosters: &[(SportId, Vec<Person>)],
        as_of: NaiveDate,
    ) -> Result<Money, FeeError> {
        let mut total = Money::ZERO;
        for (sport_id, participants) in rosters {
            let fee = self.sport_annual(*sport_id, participants, as_of)?;
            total = total.checked_add(fee).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }

    /// Sum of `person_annual` over every member, passive flat fees included.
    pub fn all_persons_annual(
        &self,
        persons: &[(Person, Vec<Enrollment>)],
        as_of: NaiveDate,
    ) -> Result<Money, FeeError> {
        let mut total = Money::ZERO;
        for (person, enrollments) in persons {
            let fee = self.person_annual(person, enrollments, as_of)?;
            total = total.checked_add(fee).ok_or(FeeError::Overflow)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use clubdues_core::{EnrollmentId, HouseholdId, PersonId};

    use crate::schedule::{FeeSchedule, FeeScheduleEntry};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> Settings {
        Settings::new(Money::from_major(80), Money::from_major(40), 18)
    }

    fn adult(state: MembershipState) -> Person {
        let mut p = Person::new(
            PersonId::new(),
            HouseholdId::new(),
            "Adult",
            date(1990, 3, 12),
        );
        p.state = state;
        p
    }

    fn child(state: MembershipState) -> Person {
        let mut p = Person::new(
            PersonId::new(),
            HouseholdId::new(),
            "Child",
            date(2015, 9, 1),
        );
        p.state = state;
        p
    }

    fn enroll(person: &Person, sport_id: SportId, joined: NaiveDate) -> Enrollment {
        Enrollment::open(EnrollmentId::new(), person.id, sport_id, joined)
    }

    fn schedule(sport_id: SportId, fees: &[(i64, NaiveDate)]) -> FeeSchedule {
        let entries = fees
            .iter()
            .map(|(major, from)| {
                FeeScheduleEntry::new(
                    sport_id,
                    Money::from_major(*major),
                    Money::from_major(*major / 2),
                    *from,
                    "adjustment",
                )
            })
            .collect();
        FeeSchedule::new(sport_id, entries).unwrap()
    }

    fn football_book() -> (SportId, ScheduleBook) {
        let sport_id = SportId::new();
        let mut book = ScheduleBook::new();
        book.insert(schedule(
            sport_id,
            &[(500, date(2020, 1, 1)), (600, date(2023, 1, 1))],
        ));
        (sport_id, book)
    }

    #[test]
    fn active_person_pays_the_fee_in_effect_at_the_query_date() {
        let (sport_id, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let person = adult(MembershipState::Active);
        let enrollments = vec![enroll(&person, sport_id, date(2022, 6, 1))];

        assert_eq!(
            calc.person_annual(&person, &enrollments, date(2022, 12, 31))
                .unwrap(),
            Money::from_major(500)
        );
        assert_eq!(
            calc.person_annual(&person, &enrollments, date(2023, 6, 1))
                .unwrap(),
            Money::from_major(600)
        );
    }

    #[test]
    fn active_child_pays_the_child_rate() {
        let (sport_id, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let person = child(MembershipState::Active);
        let enrollments = vec![enroll(&person, sport_id, date(2022, 6, 1))];

        assert_eq!(
            calc.person_annual(&person, &enrollments, date(2022, 12, 31))
                .unwrap(),
            Money::from_major(250)
        );
    }

    #[test]
    fn passive_person_pays_the_flat_fee_for_their_bracket() {
        let (_, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        assert_eq!(
            calc.person_annual(&adult(MembershipState::Passive), &[], date(2024, 1, 1))
                .unwrap(),
            Money::from_major(80)
        );
        assert_eq!(
            calc.person_annual(&child(MembershipState::Passive), &[], date(2024, 1, 1))
                .unwrap(),
            Money::from_major(40)
        );
    }

    #[test]
    fn active_person_with_open_enrollments_sums_each_sport() {
        let sport_a = SportId::new();
        let sport_b = SportId::new();
        let mut book = ScheduleBook::new();
        book.insert(schedule(sport_a, &[(500, date(2020, 1, 1))]));
        book.insert(schedule(sport_b, &[(300, date(2020, 1, 1))]));
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let person = adult(MembershipState::Active);
        let mut ended = enroll(&person, sport_b, date(2019, 1, 1));
        ended.close(date(2019, 12, 31)).unwrap();
        let enrollments = vec![
            enroll(&person, sport_a, date(2022, 6, 1)),
            enroll(&person, sport_b, date(2022, 6, 1)),
            ended,
        ];

        // Two open enrollments count; the ended one does not.
        assert_eq!(
            calc.person_annual(&person, &enrollments, date(2024, 1, 1))
                .unwrap(),
            Money::from_major(800)
        );
    }

    #[test]
    fn missing_schedule_surfaces_not_zero() {
        let book = ScheduleBook::new();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let person = adult(MembershipState::Active);
        let enrollments = vec![enroll(&person, SportId::new(), date(2022, 6, 1))];

        let err = calc
            .person_annual(&person, &enrollments, date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, FeeError::NoFeeSchedule { .. }));
    }

    #[test]
    fn household_sums_active_members_only() {
        let (sport_id, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let active_adult = adult(MembershipState::Active);
        let active_child = child(MembershipState::Active);
        let members = vec![
            (
                active_adult.clone(),
                vec![enroll(&active_adult, sport_id, date(2022, 6, 1))],
            ),
            (
                active_child.clone(),
                vec![enroll(&active_child, sport_id, date(2022, 6, 1))],
            ),
        ];

        let as_of = date(2024, 1, 1);
        let base = calc.household_annual(&members, as_of).unwrap();
        assert_eq!(base, Money::from_major(600 + 300));

        // Adding a passive member does not change the household total.
        let mut with_passive = members;
        with_passive.push((adult(MembershipState::Passive), vec![]));
        assert_eq!(calc.household_annual(&with_passive, as_of).unwrap(), base);
    }

    #[test]
    fn empty_household_totals_zero() {
        let (_, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        assert_eq!(
            calc.household_annual(&[], date(2024, 1, 1)).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn sport_annual_counts_each_active_participant_by_bracket() {
        let (sport_id, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let participants = vec![
            adult(MembershipState::Active),
            child(MembershipState::Active),
            adult(MembershipState::Passive),
        ];

        // 600 (adult) + 300 (child); the passive participant is skipped.
        assert_eq!(
            calc.sport_annual(sport_id, &participants, date(2024, 1, 1))
                .unwrap(),
            Money::from_major(900)
        );
    }

    #[test]
    fn all_sports_equals_sum_of_sport_annual() {
        let sport_a = SportId::new();
        let sport_b = SportId::new();
        let mut book = ScheduleBook::new();
        book.insert(schedule(sport_a, &[(500, date(2020, 1, 1))]));
        book.insert(schedule(sport_b, &[(300, date(2020, 1, 1))]));
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let rosters = vec![
            (
                sport_a,
                vec![adult(MembershipState::Active), child(MembershipState::Active)],
            ),
            (sport_b, vec![adult(MembershipState::Active)]),
        ];

        let as_of = date(2024, 1, 1);
        let by_parts = Money::checked_sum(
            rosters
                .iter()
                .map(|(id, ps)| calc.sport_annual(*id, ps, as_of).unwrap()),
        )
        .unwrap();

        assert_eq!(calc.all_sports_annual(&rosters, as_of).unwrap(), by_parts);
        assert_eq!(by_parts, Money::from_major(500 + 250 + 300));
    }

    #[test]
    fn all_persons_includes_passive_flat_fees() {
        let (sport_id, book) = football_book();
        let settings = settings();
        let calc = FeeCalculator::new(&book, &settings);

        let active = adult(MembershipState::Active);
        let persons = vec![
            (
                active.clone(),
                vec![enroll(&active, sport_id, date(2022, 6, 1))],
            ),
            (adult(MembershipState::Passive), vec![]),
            (child(MembershipState::Passive), vec![]),
        ];

        assert_eq!(
            calc.all_persons_annual(&persons, date(2024, 1, 1)).unwrap(),
            Money::from_major(600 + 80 + 40)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an active person's annual fee equals the plain sum of
        /// the resolved fee over their open enrollments, whatever the
        /// schedule amounts, and is independent of enrollment order.
        #[test]
        fn person_annual_is_the_sum_over_open_enrollments(
            fees in prop::collection::vec(0i64..1_000_000, 1..8)
        ) {
            let mut book = ScheduleBook::new();
            let person = adult(MembershipState::Active);
            let mut enrollments = Vec::new();
            let mut expected: i64 = 0;

            for major in &fees {
                let sport_id = SportId::new();
                book.insert(schedule(sport_id, &[(*major, date(2020, 1, 1))]));
                enrollments.push(enroll(&person, sport_id, date(2022, 6, 1)));
                expected += major * 100;
            }

            let settings = settings();
            let calc = FeeCalculator::new(&book, &settings);
            let as_of = date(2024, 1, 1);

            let total = calc.person_annual(&person, &enrollments, as_of).unwrap();
            prop_assert_eq!(total, Money::from_minor(expected));

            enrollments.reverse();
            let reversed = calc.person_annual(&person, &enrollments, as_of).unwrap();
            prop_assert_eq!(reversed, total);
        }
    }
}
