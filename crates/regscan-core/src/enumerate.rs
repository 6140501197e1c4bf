//! Field enumeration across a type hierarchy

use regscan_reflect::{FieldDescriptor, Introspector, TypeId};

/// Instance fields of a type: its own declarations first, then each
/// ancestor's, up to the root
///
/// Every visibility is included. Shadowed names are kept once per declaring
/// level. An unknown type id yields nothing.
pub fn instance_fields<I: Introspector + ?Sized>(
    introspector: &I,
    ty: TypeId,
) -> InstanceFields<'_, I> {
    InstanceFields {
        introspector,
        next_level: Some(ty),
        current: None,
        visited: Vec::new(),
    }
}

/// First instance field named `name`, nearest declaration first
pub fn find_field<'a, I: Introspector + ?Sized>(
    introspector: &'a I,
    ty: TypeId,
    name: &str,
) -> Option<&'a FieldDescriptor> {
    instance_fields(introspector, ty).find(|f| f.name == name)
}

/// Iterator returned by [`instance_fields`]
pub struct InstanceFields<'a, I: ?Sized> {
    introspector: &'a I,
    next_level: Option<TypeId>,
    current: Option<std::slice::Iter<'a, FieldDescriptor>>,
    visited: Vec<TypeId>,
}

impl<'a, I: Introspector + ?Sized> Iterator for InstanceFields<'a, I> {
    type Item = &'a FieldDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.current.as_mut().and_then(|fields| fields.find(|f| !f.is_static));
            if let Some(field) = next {
                return Some(field);
            }

            let level = self.next_level.take()?;
            // A well-formed registry cannot produce a cycle; a foreign
            // introspector might.
            if self.visited.contains(&level) {
                return None;
            }
            self.visited.push(level);

            let descriptor = self.introspector.type_descriptor(level)?;
            self.next_level = descriptor.parent;
            self.current = Some(descriptor.fields.iter());
        }
    }
}
