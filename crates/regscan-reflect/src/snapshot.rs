//! Object graph snapshots
//!
//! A snapshot file describes types and objects by name and numeric id, in
//! JSON or TOML:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Entry", "entry": { "key": "u64", "value": "string" } },
//!     { "name": "Dictionary", "generic": { "definition": "Dictionary`2",
//!       "arguments": ["u64", "string"] }, "count": true },
//!     { "name": "Renderer", "fields": [{ "name": "_handlers", "type": "Dictionary" }] }
//!   ],
//!   "objects": [
//!     { "id": 1, "type": "Renderer", "fields": { "_handlers": { "ref": 2 } } },
//!     { "id": 2, "type": "Dictionary", "entry_type": "Entry", "entries": [[7, "click"]] }
//!   ]
//! }
//! ```
//!
//! Types must be listed after their parents. Integer literals are narrowed
//! to the declared type of the slot they land in.

use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::error::{GraphError, RegistryError};
use crate::graph::ObjectGraph;
use crate::heap::{Elements, ObjectId, Value};
use crate::introspector::Introspector;
use crate::registry::TypeBuilder;
use crate::ty::{TypeId, Visibility};

/// Errors raised while loading a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Failed to read the snapshot file
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON
    #[error("Failed to parse snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse TOML
    #[error("Failed to parse snapshot TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A type name could not be resolved
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A type could not be registered
    #[error("Type {name}: {source}")]
    Type {
        /// Type being registered
        name: String,
        /// Cause
        source: RegistryError,
    },

    /// Two objects share an id
    #[error("Duplicate object id: {0}")]
    DuplicateObject(u64),

    /// A reference names an object that does not exist
    #[error("Unknown object id: {0}")]
    UnknownObject(u64),

    /// An object could not be populated
    #[error("Object {id}: {source}")]
    Object {
        /// Object id
        id: u64,
        /// Cause
        source: GraphError,
    },

    /// An integer literal does not fit the declared type
    #[error("Object {id}: integer {value} does not fit {ty}")]
    IntegerOutOfRange {
        /// Object id
        id: u64,
        /// Literal
        value: i128,
        /// Declared type
        ty: String,
    },

    /// `entries` given without `entry_type`
    #[error("Object {0}: entries require an entry_type")]
    MissingEntryType(u64),
}

/// Top-level snapshot document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotFile {
    /// Types in registration order
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    /// Objects
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

/// A type declaration
#[derive(Debug, Clone, Deserialize)]
pub struct TypeSpec {
    /// Short name
    pub name: String,
    /// Namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Parent type name
    #[serde(default)]
    pub parent: Option<String>,
    /// Generic instantiation
    #[serde(default)]
    pub generic: Option<GenericSpec>,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Expose a public `Count` accessor
    #[serde(default)]
    pub count: bool,
    /// Make this a key/value entry type
    #[serde(default)]
    pub entry: Option<EntrySpec>,
}

/// Generic instantiation by name
#[derive(Debug, Clone, Deserialize)]
pub struct GenericSpec {
    /// Open definition name
    pub definition: String,
    /// Type argument names
    pub arguments: Vec<String>,
}

/// A field declaration
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Declared type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Visibility (private by default)
    #[serde(default)]
    pub visibility: Visibility,
    /// Static storage
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// Key and value type names of an entry type
#[derive(Debug, Clone, Deserialize)]
pub struct EntrySpec {
    /// Key type name
    pub key: String,
    /// Value type name
    pub value: String,
}

/// An object
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    /// Snapshot-local id
    pub id: u64,
    /// Runtime type name
    #[serde(rename = "type")]
    pub ty: String,
    /// Field values by name
    #[serde(default)]
    pub fields: BTreeMap<String, ValueSpec>,
    /// Enumerable contents
    #[serde(default)]
    pub elements: Option<Vec<ValueSpec>>,
    /// Key/value contents, materialised as `entry_type` instances
    #[serde(default)]
    pub entries: Option<Vec<(ValueSpec, ValueSpec)>>,
    /// Entry type used for `entries`
    #[serde(default)]
    pub entry_type: Option<String>,
    /// Enumeration faults after this many elements
    #[serde(default)]
    pub fault_after: Option<usize>,
    /// Backed slot count, for partially-constructed objects
    #[serde(default)]
    pub slots: Option<usize>,
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    /// `null`
    Null,
    /// Boolean literal
    Bool(bool),
    /// Signed integer literal
    Int(i64),
    /// Unsigned integer literal beyond `i64`
    UInt(u64),
    /// String literal
    Str(String),
    /// `{ "ref": id }`
    Ref {
        /// Referenced object id
        #[serde(rename = "ref")]
        target: u64,
    },
}

/// A built graph plus the mapping from snapshot ids to heap objects
#[derive(Debug)]
pub struct Snapshot {
    graph: ObjectGraph,
    objects: FxHashMap<u64, ObjectId>,
}

impl Snapshot {
    /// Load a snapshot file; `.toml` files are parsed as TOML, anything
    /// else as JSON
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => SnapshotFile::from_toml(&content)?,
            _ => SnapshotFile::from_json(&content)?,
        };
        file.build()
    }

    /// The loaded graph
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Value referring to a snapshot object id
    pub fn object(&self, id: u64) -> Option<Value> {
        self.objects.get(&id).map(|o| Value::Ref(*o))
    }
}

impl SnapshotFile {
    /// Parse JSON
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse TOML
    pub fn from_toml(content: &str) -> Result<Self, SnapshotError> {
        Ok(toml::from_str(content)?)
    }

    /// Register every type and materialise every object
    pub fn build(&self) -> Result<Snapshot, SnapshotError> {
        let mut graph = ObjectGraph::new();
        for spec in &self.types {
            register_type(&mut graph, spec)?;
        }

        // Allocate first so references may point forward.
        let mut objects = FxHashMap::default();
        let mut allocated = Vec::with_capacity(self.objects.len());
        for spec in &self.objects {
            let ty = resolve_type(&graph, &spec.ty)?;
            let value = match spec.slots {
                Some(slots) => graph.instantiate_partial(ty, slots),
                None => graph.instantiate(ty),
            }
            .map_err(|source| SnapshotError::Object { id: spec.id, source })?;
            let object = value.as_object().ok_or(SnapshotError::UnknownObject(spec.id))?;
            if objects.insert(spec.id, object).is_some() {
                return Err(SnapshotError::DuplicateObject(spec.id));
            }
            allocated.push((spec, ty, value));
        }

        let mut loader = Loader { graph, objects };
        for (spec, ty, value) in allocated {
            loader.populate(spec, ty, &value)?;
        }

        Ok(Snapshot {
            graph: loader.graph,
            objects: loader.objects,
        })
    }
}

fn resolve_type(graph: &ObjectGraph, name: &str) -> Result<TypeId, SnapshotError> {
    graph
        .lookup_type(name)
        .ok_or_else(|| SnapshotError::UnknownType(name.to_string()))
}

fn register_type(graph: &mut ObjectGraph, spec: &TypeSpec) -> Result<TypeId, SnapshotError> {
    let mut builder = TypeBuilder::new(&spec.name);
    if let Some(ns) = &spec.namespace {
        builder = builder.namespace(ns);
    }
    if let Some(parent) = &spec.parent {
        builder = builder.parent(resolve_type(graph, parent)?);
    }
    if let Some(generic) = &spec.generic {
        let arguments = generic
            .arguments
            .iter()
            .map(|a| resolve_type(graph, a))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.generic(&generic.definition, arguments);
    }
    for field in &spec.fields {
        let ty = resolve_field_type(graph, spec, &field.ty)?;
        builder = builder.field_with(&field.name, ty, field.visibility, field.is_static);
    }
    if spec.count {
        builder = builder.counted();
    }
    if let Some(entry) = &spec.entry {
        builder = builder.entry(
            resolve_type(graph, &entry.key)?,
            resolve_type(graph, &entry.value)?,
        );
    }

    graph.define(builder).map_err(|source| SnapshotError::Type {
        name: spec.name.clone(),
        source,
    })
}

/// Like [`resolve_type`], but a field may name the type being registered
fn resolve_field_type(
    graph: &ObjectGraph,
    spec: &TypeSpec,
    name: &str,
) -> Result<TypeId, SnapshotError> {
    let is_self = name == spec.name
        || spec
            .namespace
            .as_ref()
            .is_some_and(|ns| name == format!("{}.{}", ns, spec.name));
    if is_self {
        Ok(TypeId(graph.types().len()))
    } else {
        resolve_type(graph, name)
    }
}

struct Loader {
    graph: ObjectGraph,
    objects: FxHashMap<u64, ObjectId>,
}

impl Loader {
    fn populate(
        &mut self,
        spec: &ObjectSpec,
        ty: TypeId,
        value: &Value,
    ) -> Result<(), SnapshotError> {
        for (name, literal) in &spec.fields {
            let declared = self.declared_type(ty, name).unwrap_or(TypeId::OBJECT);
            let field_value = self.resolve(spec.id, literal, declared)?;
            self.graph
                .set_field(value, name, field_value)
                .map_err(|e| SnapshotError::Object { id: spec.id, source: e.into() })?;
        }

        let mut items = Vec::new();
        if let Some(elements) = &spec.elements {
            for literal in elements {
                items.push(self.resolve(spec.id, literal, TypeId::OBJECT)?);
            }
        }
        if let Some(entries) = &spec.entries {
            let entry_name = spec
                .entry_type
                .as_deref()
                .ok_or(SnapshotError::MissingEntryType(spec.id))?;
            let entry_ty = resolve_type(&self.graph, entry_name)?;
            let key_ty = self.declared_type(entry_ty, "key").unwrap_or(TypeId::OBJECT);
            let value_ty = self.declared_type(entry_ty, "value").unwrap_or(TypeId::OBJECT);

            let mut pairs = Vec::with_capacity(entries.len());
            for (key, val) in entries {
                pairs.push((
                    self.resolve(spec.id, key, key_ty)?,
                    self.resolve(spec.id, val, value_ty)?,
                ));
            }
            let materialised = self
                .graph
                .entries(entry_ty, pairs)
                .map_err(|source| SnapshotError::Object { id: spec.id, source })?;
            items.extend(materialised);
        }

        if spec.elements.is_some() || spec.entries.is_some() {
            let elements = match spec.fault_after {
                Some(after) => Elements::faulting(items, after),
                None => Elements::new(items),
            };
            self.graph
                .set_elements(value, elements)
                .map_err(|e| SnapshotError::Object { id: spec.id, source: e.into() })?;
        }
        Ok(())
    }

    fn declared_type(&self, ty: TypeId, field: &str) -> Option<TypeId> {
        self.graph
            .types()
            .hierarchy(ty)
            .into_iter()
            .find_map(|level| level.declared_field(field))
            .map(|f| f.field_type)
    }

    fn resolve(
        &self,
        id: u64,
        literal: &ValueSpec,
        declared: TypeId,
    ) -> Result<Value, SnapshotError> {
        let out_of_range = |value: i128| SnapshotError::IntegerOutOfRange {
            id,
            value,
            ty: self.graph.types().full_name(declared),
        };
        Ok(match literal {
            ValueSpec::Null => Value::Null,
            ValueSpec::Bool(b) => Value::Bool(*b),
            ValueSpec::Str(s) => Value::Str(s.clone()),
            ValueSpec::Ref { target } => Value::Ref(
                *self
                    .objects
                    .get(target)
                    .ok_or(SnapshotError::UnknownObject(*target))?,
            ),
            ValueSpec::Int(n) => match declared {
                TypeId::U64 => {
                    Value::U64(u64::try_from(*n).map_err(|_| out_of_range(i128::from(*n)))?)
                }
                TypeId::I32 => {
                    Value::I32(i32::try_from(*n).map_err(|_| out_of_range(i128::from(*n)))?)
                }
                _ => Value::I64(*n),
            },
            ValueSpec::UInt(n) => match declared {
                TypeId::U64 | TypeId::OBJECT => Value::U64(*n),
                _ => return Err(out_of_range(i128::from(*n))),
            },
        })
    }
}
