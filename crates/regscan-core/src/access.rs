//! Fault-tolerant field reads

use regscan_reflect::{AccessError, FieldDescriptor, Introspector, Value};
use tracing::trace;

use crate::enumerate::find_field;

/// Outcome of reading one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRead {
    /// A non-null value
    Value(Value),
    /// The field holds null
    Null,
    /// The field could not be read
    Unavailable(AccessError),
}

impl FieldRead {
    /// The value, if one was read and it is not null
    pub fn into_value(self) -> Option<Value> {
        match self {
            FieldRead::Value(value) => Some(value),
            FieldRead::Null | FieldRead::Unavailable(_) => None,
        }
    }
}

/// Read a field, absorbing any failure into [`FieldRead::Unavailable`]
pub fn read_field(
    introspector: &dyn Introspector,
    instance: &Value,
    field: &FieldDescriptor,
) -> FieldRead {
    match introspector.read_field(instance, field) {
        Ok(Value::Null) => FieldRead::Null,
        Ok(value) => FieldRead::Value(value),
        Err(err) => {
            trace!(field = %field.name, error = %err, "field unavailable");
            FieldRead::Unavailable(err)
        }
    }
}

/// Look up a field by name on the instance's runtime type and read it
///
/// Returns `None` when the instance has no runtime type or no such field.
pub fn read_named<'a>(
    introspector: &'a dyn Introspector,
    instance: &Value,
    name: &str,
) -> Option<(&'a FieldDescriptor, FieldRead)> {
    let ty = introspector.runtime_type(instance)?;
    let field = find_field(introspector, ty, name)?;
    Some((field, read_field(introspector, instance, field)))
}
