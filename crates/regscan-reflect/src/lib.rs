//! regscan reflection layer
//!
//! Provides the [`Introspector`] capability the scanner is written against,
//! and an in-memory implementation of it:
//! - **Types**: [`TypeRegistry`] of per-level [`TypeDescriptor`]s (`ty`, `registry`)
//! - **Objects**: [`Value`]s and heap storage (`heap`)
//! - **Graph**: [`ObjectGraph`], registry + heap behind the trait (`graph`)
//! - **Snapshots**: JSON/TOML object graph files (`snapshot`)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod graph;
pub mod heap;
pub mod introspector;
pub mod registry;
pub mod snapshot;
pub mod ty;

pub use error::{AccessError, GraphError, RegistryError};
pub use graph::ObjectGraph;
pub use heap::{Elements, Heap, HeapObject, ObjectId, Value};
pub use introspector::{ElementIter, Introspector};
pub use registry::{TypeBuilder, TypeRegistry};
pub use snapshot::{Snapshot, SnapshotError, SnapshotFile};
pub use ty::{
    AccessorDescriptor, AccessorKind, FieldDescriptor, GenericInstance, TypeDescriptor, TypeId,
    Visibility,
};
