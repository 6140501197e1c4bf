//! The introspection capability
//!
//! Everything above this crate sees a live object graph only through the
//! [`Introspector`] trait: type identity to ordered field descriptors, plus
//! getters that may fail. How the descriptors are produced (native
//! reflection, generated tables, a loaded snapshot) is the implementor's
//! business.

use crate::error::AccessError;
use crate::heap::Value;
use crate::ty::{AccessorDescriptor, FieldDescriptor, TypeDescriptor, TypeId};

/// Iterator over the elements of a collection; an `Err` item means the
/// enumerator faulted and no further items follow
pub type ElementIter<'a> = Box<dyn Iterator<Item = Result<Value, AccessError>> + 'a>;

/// Read-only view of a live object graph
pub trait Introspector {
    /// Descriptor for a type id
    fn type_descriptor(&self, ty: TypeId) -> Option<&TypeDescriptor>;

    /// Resolve a type by name
    fn lookup_type(&self, name: &str) -> Option<TypeId>;

    /// Runtime type of a value (None for null or dangling references)
    fn runtime_type(&self, value: &Value) -> Option<TypeId>;

    /// Read an instance field
    fn read_field(&self, instance: &Value, field: &FieldDescriptor) -> Result<Value, AccessError>;

    /// Invoke a zero-argument accessor
    fn read_accessor(
        &self,
        instance: &Value,
        accessor: &AccessorDescriptor,
    ) -> Result<Value, AccessError>;

    /// Enumerate a value's elements, or None if it is not enumerable
    fn elements(&self, value: &Value) -> Option<ElementIter<'_>>;

    /// Full name of a type, or `<unknown>`
    fn type_name(&self, ty: TypeId) -> String {
        self.type_descriptor(ty)
            .map(TypeDescriptor::full_name)
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Full name of a value's runtime type, `null` for null
    fn value_type_name(&self, value: &Value) -> String {
        match self.runtime_type(value) {
            Some(ty) => self.type_name(ty),
            None if value.is_null() => "null".to_string(),
            None => "<unknown>".to_string(),
        }
    }

    /// Accessor by name, searched from `ty` up through its ancestors
    fn find_accessor(&self, ty: TypeId, name: &str) -> Option<&AccessorDescriptor> {
        chain(self, ty).find_map(|level| level.declared_accessor(name))
    }

    /// Structural member read: an accessor named `name`, else an instance
    /// field named `name`, nearest declaration first
    fn member(&self, instance: &Value, name: &str) -> Result<Value, AccessError> {
        let ty = self.runtime_type(instance).ok_or(AccessError::NotAnObject)?;
        for level in chain(self, ty) {
            if let Some(accessor) = level.declared_accessor(name) {
                return self.read_accessor(instance, accessor);
            }
            if let Some(field) = level.declared_field(name).filter(|f| !f.is_static) {
                return self.read_field(instance, field);
            }
        }
        Err(AccessError::MemberNotFound(name.to_string()))
    }
}

/// Walk a parent chain, stopping at the root, at an unknown id, or at the
/// first repeated id reported by a malformed implementation
fn chain<'a, I: Introspector + ?Sized>(
    introspector: &'a I,
    ty: TypeId,
) -> impl Iterator<Item = &'a TypeDescriptor> + 'a {
    let mut seen = Vec::new();
    let mut next = Some(ty);
    std::iter::from_fn(move || {
        let id = next.take()?;
        if seen.contains(&id) {
            return None;
        }
        seen.push(id);
        let level = introspector.type_descriptor(id)?;
        next = level.parent;
        Some(level)
    })
}
