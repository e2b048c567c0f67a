use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clubdues_core::{DomainError, DomainResult, Money, SportId};
use clubdues_membership::AgeBracket;

/// Fee domain error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeError {
    /// No entry is in effect for the sport at the query date. Every sport is
    /// supposed to carry an initial entry dated at or before its creation,
    /// so this is a data-integrity defect — it must surface, never read as
    /// a zero fee.
    #[error("no fee schedule for sport {sport_id} as of {as_of}")]
    NoFeeSchedule { sport_id: SportId, as_of: NaiveDate },

    /// Two entries for one sport share an `effective_from`. Rejected when a
    /// schedule is assembled; the owning store rejects it at write time too.
    #[error("duplicate fee schedule entry for sport {sport_id} effective {effective_from}")]
    DuplicateEffectiveDate {
        sport_id: SportId,
        effective_from: NaiveDate,
    },

    /// An entry for one sport ended up in another sport's schedule.
    #[error("entry for sport {found} in the schedule of sport {expected}")]
    ForeignEntry { expected: SportId, found: SportId },

    /// Checked summation overflowed. Partial sums are never returned.
    #[error("fee aggregation overflow")]
    Overflow,
}

/// One versioned fee for a sport, in effect from `effective_from` until
/// superseded by a later entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeScheduleEntry {
    pub sport_id: SportId,
    pub adult_fee: Money,
    pub child_fee: Money,
    /// Inclusive. No end date is stored — it is implied by the next entry's
    /// `effective_from`, open-ended until then.
    pub effective_from: NaiveDate,
    /// Free-text reason recorded with the change, for audit.
    pub reason: String,
}

impl FeeScheduleEntry {
    pub fn new(
        sport_id: SportId,
        adult_fee: Money,
        child_fee: Money,
        effective_from: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            sport_id,
            adult_fee,
            child_fee,
            effective_from,
            reason: reason.into(),
        }
    }

    pub fn fee_for(&self, bracket: AgeBracket) -> Money {
        match bracket {
            AgeBracket::Adult => self.adult_fee,
            AgeBracket::Child => self.child_fee,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.adult_fee.is_negative() || self.child_fee.is_negative() {
            return Err(DomainError::validation("fees cannot be negative"));
        }
        Ok(())
    }
}

/// A sport's full fee history, ordered by `effective_from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    sport_id: SportId,
    entries: Vec<FeeScheduleEntry>,
}

impl FeeSchedule {
    /// Assemble a schedule from (possibly unordered) entries.
    ///
    /// Rejects entries belonging to another sport and duplicate effective
    /// dates. An empty history is allowed here — it resolves to
    /// `NoFeeSchedule` for every date.
    pub fn new(sport_id: SportId, mut entries: Vec<FeeScheduleEntry>) -> Result<Self, FeeError> {
        for entry in &entries {
            if entry.sport_id != sport_id {
                return Err(FeeError::ForeignEntry {
                    expected: sport_id,
                    found: entry.sport_id,
                });
            }
        }

        entries.sort_by_key(|e| e.effective_from);
        for pair in entries.windows(2) {
            if pair[0].effective_from == pair[1].effective_from {
                return Err(FeeError::DuplicateEffectiveDate {
                    sport_id,
                    effective_from: pair[0].effective_from,
                });
            }
        }

        Ok(Self { sport_id, entries })
    }

    pub fn sport_id(&self) -> SportId {
        self.sport_id
    }

    pub fn entries(&self) -> &[FeeScheduleEntry] {
        &self.entries
    }

    /// The entry in effect at `as_of`: among entries with
    /// `effective_from <= as_of`, the one with the maximum `effective_from`.
    pub fn resolve(&self, as_of: NaiveDate) -> Result<&FeeScheduleEntry, FeeError> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.effective_from <= as_of)
            .ok_or(FeeError::NoFeeSchedule {
                sport_id: self.sport_id,
                as_of,
            })
    }

    /// The entry with the latest `effective_from`, regardless of date.
    pub fn latest(&self) -> Option<&FeeScheduleEntry> {
        self.entries.last()
    }
}

/// The per-sport schedules fetched for one calculation.
#[derive(Debug, Default, Clone)]
pub struct ScheduleBook {
    schedules: HashMap<SportId, FeeSchedule>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schedule: FeeSchedule) {
        self.schedules.insert(schedule.sport_id(), schedule);
    }

    /// Resolve the entry in effect for a sport. A sport with no schedule in
    /// the book resolves to `NoFeeSchedule`.
    pub fn resolve(&self, sport_id: SportId, as_of: NaiveDate) -> Result<&FeeScheduleEntry, FeeError> {
        match self.schedules.get(&sport_id) {
            Some(schedule) => schedule.resolve(as_of),
            None => Err(FeeError::NoFeeSchedule { sport_id, as_of }),
        }
    }
}
