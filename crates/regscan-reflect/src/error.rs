//! Reflection errors

use thiserror::Error;

/// Errors raised while reading a field, accessor or element of a live value
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    /// The value is a primitive or null, not an object reference
    #[error("Value is not an object reference")]
    NotAnObject,

    /// The reference points outside the heap
    #[error("Dangling object reference: #{0}")]
    DanglingReference(usize),

    /// The instance's runtime type does not derive from the declaring type
    #[error("Type mismatch: {member} is declared on {declaring}, instance is {actual}")]
    TypeMismatch {
        /// Member being read
        member: String,
        /// Type declaring the member
        declaring: String,
        /// Runtime type of the instance
        actual: String,
    },

    /// The instance has no storage for the field (partially constructed)
    #[error("Field {field} has no storage on this instance (slot {slot})")]
    MissingSlot {
        /// Field name
        field: String,
        /// Slot that was requested
        slot: usize,
    },

    /// Static fields are not reachable through an instance
    #[error("Static field {0} cannot be read through an instance")]
    StaticField(String),

    /// No field or accessor with this name exists on the instance's type
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// The element enumerator was invalidated mid-walk
    #[error("Enumeration faulted after {0} elements")]
    EnumerationFault(usize),
}

/// Errors raised while registering types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// A type with the same full name is already registered
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    /// A referenced type id is not registered
    #[error("Unknown type id: {0}")]
    UnknownType(usize),

    /// A type declares the same field name twice
    #[error("Duplicate field {field} on {ty}")]
    DuplicateField {
        /// Declaring type
        ty: String,
        /// Field name
        field: String,
    },
}

/// Errors raised while building an object graph
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// Type registration or lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Field write failed
    #[error(transparent)]
    Access(#[from] AccessError),
}
