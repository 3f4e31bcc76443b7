//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A value object is immutable and defined entirely by its attributes: two
/// prices of `10.00` are the same price. Constructors are expected to enforce
/// the object's invariants so an existing value is always valid.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
