//! `clubdues-engine` — infrastructure seam around the membership and fee
//! domains: collaborator contracts, an in-memory store for tests/dev, the
//! read-side fee service, and the recalculation orchestrator.

pub mod error;
pub mod in_memory;
pub mod orchestrator;
pub mod service;
pub mod sink;
pub mod store;

pub use error::EngineError;
pub use in_memory::InMemoryClubStore;
pub use orchestrator::Recalculator;
pub use service::FeeService;
pub use sink::{RecordingSink, StateChange, StateChangeSink};
pub use store::{ClubStore, MembershipStateStore, StoreError};
