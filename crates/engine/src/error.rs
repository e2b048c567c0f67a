//! Engine-level error taxonomy.

use thiserror::Error;

use clubdues_core::{DomainError, PersonId};
use clubdues_fees::FeeError;

use crate::store::StoreError;

/// Failure of a fee read or a recalculation.
///
/// Nothing is swallowed on the way up: collaborator failures keep their
/// entity/id context, and a missing fee schedule stays distinguishable from
/// a zero fee.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The state write conflicted on the initial attempt and again on the
    /// single retry with fresh facts.
    #[error("recalculation conflict for person {0}")]
    RecalcConflict(PersonId),
}
