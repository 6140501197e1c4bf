//! Runtime type descriptors
//!
//! A [`TypeDescriptor`] describes one level of a type hierarchy: the fields
//! and accessors it declares itself, plus a link to its parent. Inherited
//! members are never copied down; walking the parent chain is the caller's job.

use serde::Deserialize;

/// Identity of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl TypeId {
    /// Root of every object type
    pub const OBJECT: TypeId = TypeId(0);
    /// Boolean primitive
    pub const BOOL: TypeId = TypeId(1);
    /// 32-bit signed integer primitive
    pub const I32: TypeId = TypeId(2);
    /// 64-bit signed integer primitive
    pub const I64: TypeId = TypeId(3);
    /// 64-bit unsigned integer primitive
    pub const U64: TypeId = TypeId(4);
    /// String primitive
    pub const STRING: TypeId = TypeId(5);

    /// Whether this is one of the integral primitives
    pub fn is_integral(self) -> bool {
        matches!(self, TypeId::I32 | TypeId::I64 | TypeId::U64)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible within the defining assembly/module
    Internal,
    /// Visible only to the declaring type
    #[default]
    Private,
}

/// A field declared on one level of a hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Type that declares the field
    pub declaring_type: TypeId,
    /// Field name
    pub name: String,
    /// Declared (static) type of the field
    pub field_type: TypeId,
    /// Storage slot: instance slot, or index into the static table
    pub slot: usize,
    /// Declared visibility
    pub visibility: Visibility,
    /// Whether the field is static
    pub is_static: bool,
}

/// How an accessor produces its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorKind {
    /// Number of elements held by the instance
    ElementCount,
    /// Reads the named instance field
    Field(String),
}

/// A zero-argument member (property getter)
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorDescriptor {
    /// Type that declares the accessor
    pub declaring_type: TypeId,
    /// Accessor name
    pub name: String,
    /// Return type
    pub return_type: TypeId,
    /// Declared visibility
    pub visibility: Visibility,
    /// Behaviour
    pub kind: AccessorKind,
}

/// A closed instantiation of an open generic definition
#[derive(Debug, Clone, PartialEq)]
pub struct GenericInstance {
    /// Open definition name, e.g. ``System.Collections.Generic.Dictionary`2``
    pub definition: String,
    /// Type arguments in order
    pub arguments: Vec<TypeId>,
}

/// Runtime description of a single type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type identity
    pub id: TypeId,
    /// Short name
    pub name: String,
    /// Namespace (full name is `namespace.name`)
    pub namespace: Option<String>,
    /// Parent type (None for roots)
    pub parent: Option<TypeId>,
    /// Generic instantiation (None for non-generic types)
    pub generic: Option<GenericInstance>,
    /// Fields declared on this level only
    pub fields: Vec<FieldDescriptor>,
    /// Accessors declared on this level only
    pub accessors: Vec<AccessorDescriptor>,
    /// Number of instance slots including inherited ones
    pub instance_slots: usize,
}

impl TypeDescriptor {
    /// Full name including namespace
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Whether this type is a generic instantiation
    pub fn is_generic(&self) -> bool {
        self.generic.is_some()
    }

    /// Instance (non-static) fields declared on this level
    pub fn declared_instance_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    /// Field declared on this level by name
    pub fn declared_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Accessor declared on this level by name
    pub fn declared_accessor(&self, name: &str) -> Option<&AccessorDescriptor> {
        self.accessors.iter().find(|a| a.name == name)
    }
}
