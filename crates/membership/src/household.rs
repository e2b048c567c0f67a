use serde::{Deserialize, Serialize};

use clubdues_core::{DomainError, DomainResult, Entity, HouseholdId};

/// A household: the address shared by one or more members.
///
/// The collection of member Persons is implicit — persons point here via
/// `household_id`. The owning store may delete a household only when no
/// person references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Household {
    pub fn new(
        id: HouseholdId,
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id,
            street: street.into(),
            postal_code: postal_code.into(),
            city: city.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.street.trim().is_empty() {
            return Err(DomainError::validation("street cannot be empty"));
        }
        if self.city.trim().is_empty() {
            return Err(DomainError::validation("city cannot be empty"));
        }
        Ok(())
    }
}

impl Entity for Household {
    type Id = HouseholdId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
