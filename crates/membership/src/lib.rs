//! `clubdues-membership` — membership domain: people, households, sports,
//! enrollments, club settings, and the activity state machine.

pub mod enrollment;
pub mod household;
pub mod person;
pub mod settings;
pub mod sport;
pub mod state;

pub use enrollment::Enrollment;
pub use household::Household;
pub use person::{MembershipState, Person, StateRecord};
pub use settings::{AgeBracket, Settings};
pub use sport::Sport;
pub use state::derive_state;
