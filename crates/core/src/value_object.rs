//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances
/// with the same attribute values are the same value. `Money` is the canonical
/// example here — `Money::from_major(50)` is equal to any other
/// `Money::from_major(50)` regardless of where either came from. To "modify" a
/// value object, construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
