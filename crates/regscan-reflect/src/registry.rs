//! Type registry
//!
//! Owns every [`TypeDescriptor`] of an object graph. Types are registered
//! through a [`TypeBuilder`]; a parent must be registered before its
//! children, so parent chains are always finite and acyclic.

use rustc_hash::FxHashMap;

use crate::error::RegistryError;
use crate::ty::{
    AccessorDescriptor, AccessorKind, FieldDescriptor, GenericInstance, TypeDescriptor, TypeId,
    Visibility,
};

struct PendingField {
    name: String,
    ty: TypeId,
    visibility: Visibility,
    is_static: bool,
}

struct PendingAccessor {
    name: String,
    return_type: TypeId,
    visibility: Visibility,
    kind: AccessorKind,
}

/// Builder for a type about to be registered
pub struct TypeBuilder {
    name: String,
    namespace: Option<String>,
    parent: Option<TypeId>,
    generic: Option<GenericInstance>,
    fields: Vec<PendingField>,
    accessors: Vec<PendingAccessor>,
}

impl TypeBuilder {
    /// Start a new type with a short name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            parent: None,
            generic: None,
            fields: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the parent type
    pub fn parent(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark as a closed instantiation of a generic definition
    pub fn generic(mut self, definition: impl Into<String>, arguments: Vec<TypeId>) -> Self {
        self.generic = Some(GenericInstance {
            definition: definition.into(),
            arguments,
        });
        self
    }

    /// Add a private instance field
    pub fn field(self, name: impl Into<String>, ty: TypeId) -> Self {
        self.field_with(name, ty, Visibility::Private, false)
    }

    /// Add a static field
    pub fn static_field(self, name: impl Into<String>, ty: TypeId) -> Self {
        self.field_with(name, ty, Visibility::Private, true)
    }

    /// Add a field with explicit visibility and storage class
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        ty: TypeId,
        visibility: Visibility,
        is_static: bool,
    ) -> Self {
        self.fields.push(PendingField {
            name: name.into(),
            ty,
            visibility,
            is_static,
        });
        self
    }

    /// Add a public accessor
    pub fn accessor(
        self,
        name: impl Into<String>,
        return_type: TypeId,
        kind: AccessorKind,
    ) -> Self {
        self.accessor_with(name, return_type, Visibility::Public, kind)
    }

    /// Add an accessor with explicit visibility
    pub fn accessor_with(
        mut self,
        name: impl Into<String>,
        return_type: TypeId,
        visibility: Visibility,
        kind: AccessorKind,
    ) -> Self {
        self.accessors.push(PendingAccessor {
            name: name.into(),
            return_type,
            visibility,
            kind,
        });
        self
    }

    /// Shorthand for a public `Count` accessor over the instance's elements
    pub fn counted(self) -> Self {
        self.accessor("Count", TypeId::I32, AccessorKind::ElementCount)
    }

    /// Shorthand for a key/value entry type: `key`/`value` fields exposed
    /// through public `Key`/`Value` accessors
    pub fn entry(self, key_type: TypeId, value_type: TypeId) -> Self {
        self.field("key", key_type)
            .field("value", value_type)
            .accessor("Key", key_type, AccessorKind::Field("key".to_string()))
            .accessor("Value", value_type, AccessorKind::Field("value".to_string()))
    }
}

/// Registry of all types known to an object graph
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_full_name: FxHashMap<String, TypeId>,
    by_short_name: FxHashMap<String, Vec<TypeId>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the built-in primitives
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_full_name: FxHashMap::default(),
            by_short_name: FxHashMap::default(),
        };
        // Registration order fixes the TypeId constants.
        for name in ["object", "bool", "i32", "i64", "u64", "string"] {
            let builder = TypeBuilder::new(name);
            registry
                .register(builder)
                .expect("built-in primitive names are unique");
        }
        registry
    }

    /// Register a type, returning its id
    pub fn register(&mut self, builder: TypeBuilder) -> Result<TypeId, RegistryError> {
        let id = TypeId(self.types.len());

        let inherited_slots = match builder.parent {
            Some(parent) => {
                self.get(parent)
                    .ok_or(RegistryError::UnknownType(parent.0))?
                    .instance_slots
            }
            None => 0,
        };
        if let Some(generic) = &builder.generic {
            if let Some(missing) = generic.arguments.iter().find(|a| self.get(**a).is_none()) {
                return Err(RegistryError::UnknownType(missing.0));
            }
        }

        let full_name = match &builder.namespace {
            Some(ns) => format!("{}.{}", ns, builder.name),
            None => builder.name.clone(),
        };
        if self.by_full_name.contains_key(&full_name) {
            return Err(RegistryError::DuplicateType(full_name));
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(builder.fields.len());
        let mut next_instance = inherited_slots;
        let mut next_static = 0;
        for pending in builder.fields {
            if fields.iter().any(|f| f.name == pending.name) {
                return Err(RegistryError::DuplicateField {
                    ty: full_name,
                    field: pending.name,
                });
            }
            if self.get(pending.ty).is_none() && pending.ty != id {
                return Err(RegistryError::UnknownType(pending.ty.0));
            }
            let slot = if pending.is_static {
                next_static += 1;
                next_static - 1
            } else {
                next_instance += 1;
                next_instance - 1
            };
            fields.push(FieldDescriptor {
                declaring_type: id,
                name: pending.name,
                field_type: pending.ty,
                slot,
                visibility: pending.visibility,
                is_static: pending.is_static,
            });
        }

        let accessors = builder
            .accessors
            .into_iter()
            .map(|a| AccessorDescriptor {
                declaring_type: id,
                name: a.name,
                return_type: a.return_type,
                visibility: a.visibility,
                kind: a.kind,
            })
            .collect();

        self.by_full_name.insert(full_name, id);
        self.by_short_name.entry(builder.name.clone()).or_default().push(id);
        self.types.push(TypeDescriptor {
            id,
            name: builder.name,
            namespace: builder.namespace,
            parent: builder.parent,
            generic: builder.generic,
            fields,
            accessors,
            instance_slots: next_instance,
        });

        Ok(id)
    }

    /// Get a type by id
    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.0)
    }

    /// Look up a type by full name, falling back to an unambiguous short name
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        if let Some(id) = self.by_full_name.get(name) {
            return Some(*id);
        }
        match self.by_short_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    /// Full name of a type, or `<unknown>`
    pub fn full_name(&self, id: TypeId) -> String {
        self.get(id)
            .map(TypeDescriptor::full_name)
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Inheritance chain from the type itself up to its root
    pub fn hierarchy(&self, id: TypeId) -> Vec<&TypeDescriptor> {
        let mut hierarchy = Vec::new();
        let mut current = Some(id);

        while let Some(ty) = current.and_then(|id| self.get(id)) {
            hierarchy.push(ty);
            current = ty.parent;
        }

        hierarchy
    }

    /// Whether `sub` is `sup` or derives from it
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        self.hierarchy(sub).iter().any(|ty| ty.id == sup)
    }

    /// Number of registered types, primitives included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: primitives are registered on construction
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
