use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clubdues_core::{DomainError, DomainResult, Money, ValueObject};

use crate::person::Person;

/// Age bracket used to pick between adult and child rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    Adult,
    Child,
}

impl ValueObject for AgeBracket {}

/// Singleton club settings.
///
/// Passive members have no sport fees; they are charged the flat annual fee
/// configured here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub passive_adult_fee: Money,
    pub passive_child_fee: Money,
    /// Completed years of age at which a member counts as an adult.
    pub adult_age: u32,
}

impl Settings {
    pub fn new(passive_adult_fee: Money, passive_child_fee: Money, adult_age: u32) -> Self {
        Self {
            passive_adult_fee,
            passive_child_fee,
            adult_age,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.passive_adult_fee.is_negative() || self.passive_child_fee.is_negative() {
            return Err(DomainError::validation("passive fees cannot be negative"));
        }
        if self.adult_age == 0 {
            return Err(DomainError::validation("adult age threshold must be positive"));
        }
        Ok(())
    }

    /// Bracket a person by age as of the given date.
    pub fn bracket_of(&self, person: &Person, as_of: NaiveDate) -> AgeBracket {
        if person.age_on(as_of) >= self.adult_age {
            AgeBracket::Adult
        } else {
            AgeBracket::Child
        }
    }

    /// Flat annual fee for a passive member of the given bracket.
    pub fn passive_fee(&self, bracket: AgeBracket) -> Money {
        match bracket {
            AgeBracket::Adult => self.passive_adult_fee,
            AgeBracket::Child => self.passive_child_fee,
        }
    }
}
