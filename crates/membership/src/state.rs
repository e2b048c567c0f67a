//! Membership state machine.
//!
//! Activity state is a pure function of current facts: no clock, no hidden
//! prior-state-dependent transitions, so recomputation is idempotent.

use std::collections::HashMap;

use clubdues_core::{DomainError, DomainResult, SportId};

use crate::enrollment::Enrollment;
use crate::person::MembershipState;
use crate::sport::Sport;

/// Derive a person's activity state from their enrollments and the sports
/// those enrollments reference.
///
/// `Active` iff at least one open enrollment (`left == None`) is in a sport
/// whose `active` flag is set; `Passive` otherwise — including persons with
/// only ended enrollments or only enrollments in inactive sports.
///
/// `sports` must contain every sport referenced by an open enrollment; a
/// missing one is an invariant violation, not a silent `Passive`.
pub fn derive_state(
    enrollments: &[Enrollment],
    sports: &HashMap<SportId, Sport>,
) -> DomainResult<MembershipState> {
    for enrollment in enrollments.iter().filter(|e| e.is_open()) {
        let sport = sports.get(&enrollment.sport_id).ok_or_else(|| {
            DomainError::invariant(format!(
                "enrollment {} references unknown sport {}",
                enrollment.id, enrollment.sport_id
            ))
        })?;
        if sport.active {
            return Ok(MembershipState::Active);
        }
    }
    Ok(MembershipState::Passive)
}
