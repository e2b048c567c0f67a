use serde::{Deserialize, Serialize};

use clubdues_core::{DomainError, DomainResult, Entity, Money, SportId};

/// A sport offered by the club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sport {
    pub id: SportId,
    pub name: String,
    /// Inactive sports keep their enrollment and fee history but no longer
    /// count toward the `Active` membership state.
    pub active: bool,
    /// Cached projection of the fee-schedule entry with the latest
    /// `effective_from`. The owning store refreshes these on schedule writes.
    pub current_adult_fee: Money,
    pub current_child_fee: Money,
}

impl Sport {
    /// New sport, active, with the cached fees still to be projected from
    /// its initial schedule entry.
    pub fn new(id: SportId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            current_adult_fee: Money::ZERO,
            current_child_fee: Money::ZERO,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("sport name cannot be empty"));
        }
        Ok(())
    }
}

impl Entity for Sport {
    type Id = SportId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
