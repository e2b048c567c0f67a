//! `clubdues-fees` — versioned fee schedules and annual fee aggregation.
//!
//! Everything here is pure: schedules and calculations operate on an
//! in-memory snapshot handed in by the caller (fetch-then-reduce), with the
//! query date always an explicit parameter.

pub mod calculator;
pub mod schedule;

pub use calculator::FeeCalculator;
pub use schedule::{FeeError, FeeSchedule, FeeScheduleEntry, ScheduleBook};
