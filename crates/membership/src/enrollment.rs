use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clubdues_core::{DomainError, DomainResult, EnrollmentId, Entity, PersonId, SportId};

/// One time-bounded membership of a person in a sport.
///
/// A person may hold several historical enrollments in the same sport
/// (rejoin), but at most one open one per (person, sport) pair — the owning
/// store enforces that at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub person_id: PersonId,
    pub sport_id: SportId,
    pub joined: NaiveDate,
    /// `None` while the person is still enrolled.
    pub left: Option<NaiveDate>,
}

impl Enrollment {
    /// A currently-running enrollment starting at `joined`.
    pub fn open(id: EnrollmentId, person_id: PersonId, sport_id: SportId, joined: NaiveDate) -> Self {
        Self {
            id,
            person_id,
            sport_id,
            joined,
            left: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.left.is_none()
    }

    /// End the enrollment. `left` must not precede `joined`.
    pub fn close(&mut self, left: NaiveDate) -> DomainResult<()> {
        if self.left.is_some() {
            return Err(DomainError::conflict(format!(
                "enrollment {} is already closed",
                self.id
            )));
        }
        if left < self.joined {
            return Err(DomainError::invariant(format!(
                "left date {left} precedes joined date {}",
                self.joined
            )));
        }
        self.left = Some(left);
        Ok(())
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(left) = self.left {
            if left < self.joined {
                return Err(DomainError::invariant(format!(
                    "left date {left} precedes joined date {}",
                    self.joined
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Enrollment {
    type Id = EnrollmentId;

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

    fn open_enrollment() -> Enrollment {
        Enrollment::open(
            EnrollmentId::new(),
            PersonId::new(),
            SportId::new(),
            date(2022, 6, 1),
        )
    }

    #[test]
    fn close_sets_left_date() {
        let mut e = open_enrollment();
        assert!(e.is_open());

        e.close(date(2023, 1, 31)).unwrap();
        assert!(!e.is_open());
        assert_eq!(e.left, Some(date(2023, 1, 31)));
    }

    #[test]
    fn close_on_join_date_is_allowed() {
        let mut e = open_enrollment();
        e.close(date(2022, 6, 1)).unwrap();
        assert!(e.validate().is_ok());
    }

    #[test]
    fn close_before_joined_is_rejected() {
        let mut e = open_enrollment();
        let err = e.close(date(2022, 5, 31)).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("expected InvariantViolation"),
        }
        assert!(e.is_open());
    }

    #[test]
    fn double_close_is_a_conflict() {
        let mut e = open_enrollment();
        e.close(date(2023, 1, 1)).unwrap();
        let err = e.close(date(2023, 2, 1)).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("expected Conflict"),
        }
    }
}
