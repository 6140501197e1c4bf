//! In-memory object graph
//!
//! [`ObjectGraph`] pairs a [`TypeRegistry`] with a [`Heap`] and implements
//! [`Introspector`] over them. Snapshots load into it, and tests build
//! synthetic graphs with it directly.

use crate::error::{AccessError, GraphError, RegistryError};
use crate::heap::{Elements, Heap, HeapObject, Value};
use crate::introspector::{ElementIter, Introspector};
use crate::registry::{TypeBuilder, TypeRegistry};
use crate::ty::{AccessorDescriptor, AccessorKind, FieldDescriptor, TypeDescriptor, TypeId};

/// Types plus objects
#[derive(Debug, Default)]
pub struct ObjectGraph {
    types: TypeRegistry,
    heap: Heap,
}

impl ObjectGraph {
    /// Empty graph with the built-in primitives registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Type registry
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Object storage
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Register a type
    pub fn define(&mut self, builder: TypeBuilder) -> Result<TypeId, RegistryError> {
        self.types.register(builder)
    }

    /// Allocate a fully-constructed instance with all fields null
    pub fn instantiate(&mut self, ty: TypeId) -> Result<Value, GraphError> {
        let slots = self.descriptor(ty)?.instance_slots;
        self.instantiate_partial(ty, slots)
    }

    /// Allocate an instance with only the first `slots` fields backed
    pub fn instantiate_partial(&mut self, ty: TypeId, slots: usize) -> Result<Value, GraphError> {
        self.descriptor(ty)?;
        let id = self.heap.alloc(HeapObject::new(ty, slots));
        Ok(Value::Ref(id))
    }

    /// Allocate an enumerable collection
    pub fn collection(&mut self, ty: TypeId, elements: Elements) -> Result<Value, GraphError> {
        let slots = self.descriptor(ty)?.instance_slots;
        let id = self
            .heap
            .alloc(HeapObject::new(ty, slots).with_elements(elements));
        Ok(Value::Ref(id))
    }

    /// Allocate a mapping whose elements are `entry_ty` instances carrying
    /// `key`/`value` fields
    pub fn map(
        &mut self,
        map_ty: TypeId,
        entry_ty: TypeId,
        entries: Vec<(Value, Value)>,
    ) -> Result<Value, GraphError> {
        let items = self.entries(entry_ty, entries)?;
        self.collection(map_ty, Elements::new(items))
    }

    /// Allocate one `entry_ty` instance per pair
    pub fn entries(
        &mut self,
        entry_ty: TypeId,
        entries: Vec<(Value, Value)>,
    ) -> Result<Vec<Value>, GraphError> {
        let mut items = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let entry = self.instantiate(entry_ty)?;
            self.set_field(&entry, "key", key)?;
            self.set_field(&entry, "value", value)?;
            items.push(entry);
        }
        Ok(items)
    }

    /// Replace an object's enumerable contents
    pub fn set_elements(
        &mut self,
        instance: &Value,
        elements: Elements,
    ) -> Result<(), AccessError> {
        let id = instance.as_object().ok_or(AccessError::NotAnObject)?;
        let object = self.heap.get_mut(id).ok_or(AccessError::DanglingReference(id.0))?;
        object.elements = Some(elements);
        Ok(())
    }

    /// Write an instance field by name (nearest declaration wins)
    pub fn set_field(
        &mut self,
        instance: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        let id = instance.as_object().ok_or(AccessError::NotAnObject)?;
        let ty = self.heap.get(id).ok_or(AccessError::DanglingReference(id.0))?.ty;
        let slot = self
            .types
            .hierarchy(ty)
            .into_iter()
            .find_map(|level| level.declared_field(name).filter(|f| !f.is_static))
            .map(|f| f.slot)
            .ok_or_else(|| AccessError::MemberNotFound(name.to_string()))?;

        let object = self.heap.get_mut(id).ok_or(AccessError::DanglingReference(id.0))?;
        let target = object.slots.get_mut(slot).ok_or_else(|| AccessError::MissingSlot {
            field: name.to_string(),
            slot,
        })?;
        *target = value;
        Ok(())
    }

    fn descriptor(&self, ty: TypeId) -> Result<&TypeDescriptor, RegistryError> {
        self.types.get(ty).ok_or(RegistryError::UnknownType(ty.0))
    }

    fn object(&self, instance: &Value) -> Result<&HeapObject, AccessError> {
        let id = instance.as_object().ok_or(AccessError::NotAnObject)?;
        self.heap.get(id).ok_or(AccessError::DanglingReference(id.0))
    }

    fn check_declaring(
        &self,
        object: &HeapObject,
        member: &str,
        declaring: TypeId,
    ) -> Result<(), AccessError> {
        if self.types.is_subtype_of(object.ty, declaring) {
            Ok(())
        } else {
            Err(AccessError::TypeMismatch {
                member: member.to_string(),
                declaring: self.types.full_name(declaring),
                actual: self.types.full_name(object.ty),
            })
        }
    }
}

impl Introspector for ObjectGraph {
    fn type_descriptor(&self, ty: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(ty)
    }

    fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.types.lookup(name)
    }

    fn runtime_type(&self, value: &Value) -> Option<TypeId> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::I32(_) => Some(TypeId::I32),
            Value::I64(_) => Some(TypeId::I64),
            Value::U64(_) => Some(TypeId::U64),
            Value::Str(_) => Some(TypeId::STRING),
            Value::Ref(id) => self.heap.get(*id).map(|o| o.ty),
        }
    }

    fn read_field(&self, instance: &Value, field: &FieldDescriptor) -> Result<Value, AccessError> {
        if field.is_static {
            return Err(AccessError::StaticField(field.name.clone()));
        }
        let object = self.object(instance)?;
        self.check_declaring(object, &field.name, field.declaring_type)?;
        object
            .slots
            .get(field.slot)
            .cloned()
            .ok_or_else(|| AccessError::MissingSlot {
                field: field.name.clone(),
                slot: field.slot,
            })
    }

    fn read_accessor(
        &self,
        instance: &Value,
        accessor: &AccessorDescriptor,
    ) -> Result<Value, AccessError> {
        let object = self.object(instance)?;
        self.check_declaring(object, &accessor.name, accessor.declaring_type)?;
        match &accessor.kind {
            AccessorKind::ElementCount => {
                let len = object.elements.as_ref().map_or(0, |e| e.items.len());
                Ok(i32::try_from(len).map_or(Value::I64(len as i64), Value::I32))
            }
            AccessorKind::Field(name) => {
                let field = self
                    .types
                    .hierarchy(object.ty)
                    .into_iter()
                    .find_map(|level| level.declared_field(name).filter(|f| !f.is_static))
                    .ok_or_else(|| AccessError::MemberNotFound(name.clone()))?;
                self.read_field(instance, field)
            }
        }
    }

    fn elements(&self, value: &Value) -> Option<ElementIter<'_>> {
        let object = self.object(value).ok()?;
        let elements = object.elements.as_ref()?;
        Some(Box::new(ElementWalk {
            items: &elements.items,
            position: 0,
            fault_after: elements.fault_after,
            finished: false,
        }))
    }
}

struct ElementWalk<'a> {
    items: &'a [Value],
    position: usize,
    fault_after: Option<usize>,
    finished: bool,
}

impl Iterator for ElementWalk<'_> {
    type Item = Result<Value, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.fault_after == Some(self.position) {
            self.finished = true;
            return Some(Err(AccessError::EnumerationFault(self.position)));
        }
        let item = self.items.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjectId;
    use crate::ty::Visibility;

    fn renderer_graph() -> (ObjectGraph, TypeId, TypeId) {
        let mut graph = ObjectGraph::new();
        let base = graph
            .define(TypeBuilder::new("Base").field("_id", TypeId::I32))
            .unwrap();
        let renderer = graph
            .define(
                TypeBuilder::new("Renderer")
                    .namespace("Web")
                    .parent(base)
                    .field_with("Name", TypeId::STRING, Visibility::Public, false)
                    .static_field("Instances", TypeId::I32),
            )
            .unwrap();
        (graph, base, renderer)
    }

    #[test]
    fn test_set_and_read_inherited_field() {
        let (mut graph, base, renderer) = renderer_graph();
        let obj = graph.instantiate(renderer).unwrap();
        graph.set_field(&obj, "_id", Value::I32(7)).unwrap();

        let field = graph.types().get(base).unwrap().declared_field("_id").unwrap().clone();
        assert_eq!(graph.read_field(&obj, &field).unwrap(), Value::I32(7));
        assert_eq!(graph.runtime_type(&obj), Some(renderer));
        assert_eq!(graph.value_type_name(&obj), "Web.Renderer");
    }

    #[test]
    fn test_read_field_failures() {
        let (mut graph, _, renderer) = renderer_graph();
        let unrelated = graph.define(TypeBuilder::new("Unrelated")).unwrap();
        let other = graph.instantiate(unrelated).unwrap();
        let descriptor = graph.types().get(renderer).unwrap();
        let name = descriptor.declared_field("Name").unwrap().clone();
        let statics = descriptor.declared_field("Instances").unwrap().clone();

        assert!(matches!(graph.read_field(&other, &name), Err(AccessError::TypeMismatch { .. })));
        assert_eq!(graph.read_field(&Value::I32(1), &name), Err(AccessError::NotAnObject));
        assert_eq!(
            graph.read_field(&Value::Ref(ObjectId(999)), &name),
            Err(AccessError::DanglingReference(999))
        );

        let partial = graph.instantiate_partial(renderer, 1).unwrap();
        assert!(matches!(
            graph.read_field(&partial, &name),
            Err(AccessError::MissingSlot { slot: 1, .. })
        ));

        let full = graph.instantiate(renderer).unwrap();
        assert_eq!(
            graph.read_field(&full, &statics),
            Err(AccessError::StaticField("Instances".to_string()))
        );
    }

    #[test]
    fn test_map_members_and_count() {
        let mut graph = ObjectGraph::new();
        let entry = graph
            .define(TypeBuilder::new("KeyValuePair").entry(TypeId::U64, TypeId::STRING))
            .unwrap();
        let map = graph
            .define(
                TypeBuilder::new("Dictionary")
                    .generic("Dictionary`2", vec![TypeId::U64, TypeId::STRING])
                    .counted(),
            )
            .unwrap();
        let value = graph
            .map(
                map,
                entry,
                vec![
                    (Value::U64(1), Value::Str("a".into())),
                    (Value::U64(2), Value::Null),
                ],
            )
            .unwrap();

        let count = graph.find_accessor(map, "Count").unwrap().clone();
        assert_eq!(graph.read_accessor(&value, &count).unwrap(), Value::I32(2));

        let items: Vec<_> = graph.elements(&value).unwrap().collect();
        assert_eq!(items.len(), 2);
        let first = items[0].clone().unwrap();
        assert_eq!(graph.member(&first, "Key").unwrap(), Value::U64(1));
        assert_eq!(graph.member(&first, "Value").unwrap(), Value::Str("a".into()));
        assert_eq!(
            graph.member(&first, "Missing"),
            Err(AccessError::MemberNotFound("Missing".to_string()))
        );
    }

    #[test]
    fn test_faulting_enumeration_stops_after_error() {
        let mut graph = ObjectGraph::new();
        let list = graph.define(TypeBuilder::new("List")).unwrap();
        let value = graph
            .collection(
                list,
                Elements::faulting(vec![Value::I32(1), Value::I32(2), Value::I32(3)], 2),
            )
            .unwrap();

        let items: Vec<_> = graph.elements(&value).unwrap().collect();
        assert_eq!(
            items,
            vec![Ok(Value::I32(1)), Ok(Value::I32(2)), Err(AccessError::EnumerationFault(2))]
        );
        assert!(graph.elements(&Value::I32(1)).is_none());
    }

    #[test]
    fn test_unknown_type_instantiation() {
        let mut graph = ObjectGraph::new();
        assert_eq!(
            graph.instantiate(TypeId(500)),
            Err(GraphError::Registry(RegistryError::UnknownType(500)))
        );
    }
}
