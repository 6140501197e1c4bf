//! One-level search inside a suspected registry container
//!
//! The bound is the cycle strategy: the scanner never follows a reference
//! it finds inside the container, so no visited set is needed.

use regscan_reflect::{FieldDescriptor, Introspector, Value};

use crate::access::read_field;
use crate::enumerate::instance_fields;
use crate::shape::MapShapeDetector;

/// A map-shaped field found directly inside a container
#[derive(Debug, Clone, PartialEq)]
pub struct NestedMatch {
    /// `ContainerType.field`
    pub path: String,
    /// The matching field
    pub field: FieldDescriptor,
    /// Its value
    pub value: Value,
}

/// Scans the fields of a flagged container for map-shaped values
#[derive(Debug, Clone, Copy)]
pub struct NestedScanner<'a> {
    shape: &'a MapShapeDetector,
}

impl<'a> NestedScanner<'a> {
    /// Scanner using the given shape detector
    pub fn new(shape: &'a MapShapeDetector) -> Self {
        Self { shape }
    }

    /// Map-shaped fields of `container`, in enumeration order
    pub fn scan(&self, introspector: &dyn Introspector, container: &Value) -> Vec<NestedMatch> {
        let Some(container_ty) = introspector.runtime_type(container) else {
            return Vec::new();
        };
        let container_name = introspector
            .type_descriptor(container_ty)
            .map(|t| t.name.clone())
            .unwrap_or_default();

        let mut matches = Vec::new();
        for field in instance_fields(introspector, container_ty) {
            let Some(value) = read_field(introspector, container, field).into_value() else {
                continue;
            };
            let Some(value_ty) = introspector.runtime_type(&value) else {
                continue;
            };
            if self.shape.matches(introspector, value_ty) {
                matches.push(NestedMatch {
                    path: format!("{}.{}", container_name, field.name),
                    field: field.clone(),
                    value,
                });
            }
        }
        matches
    }
}
