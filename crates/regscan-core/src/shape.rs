//! Map shape detection
//!
//! A value "looks like" a registry when its runtime type is a two-argument
//! generic instantiation, the generic definition's name contains a
//! dictionary-family marker, and the first argument is exactly the key type.
//! This is a naming heuristic, not a capability check: any generic whose
//! definition name happens to contain a marker will match.

use regscan_reflect::{Introspector, TypeId};

use crate::config::ScanConfig;
use crate::evidence::Evidence;

/// Recognises mappings keyed by a fixed scalar type
#[derive(Debug, Clone)]
pub struct MapShapeDetector {
    markers: Vec<String>,
    key_type: Option<TypeId>,
}

impl MapShapeDetector {
    /// Build a detector for an explicit key type
    pub fn new(markers: &[String], key_type: Option<TypeId>) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            key_type,
        }
    }

    /// Build a detector from a config, resolving the key type by name.
    /// An unresolvable key type rejects everything.
    pub fn from_config(introspector: &dyn Introspector, config: &ScanConfig) -> Self {
        Self::new(&config.map_markers, introspector.lookup_type(&config.key_type))
    }

    /// Key type this detector requires, if it resolved
    pub fn key_type(&self) -> Option<TypeId> {
        self.key_type
    }

    /// Classify a runtime type
    pub fn classify(&self, introspector: &dyn Introspector, ty: TypeId) -> Evidence {
        if self.matches(introspector, ty) {
            Evidence::Confirmed
        } else {
            Evidence::Rejected
        }
    }

    /// Whether a runtime type has the map shape
    pub fn matches(&self, introspector: &dyn Introspector, ty: TypeId) -> bool {
        let Some(key_type) = self.key_type else {
            return false;
        };
        let Some(generic) = introspector.type_descriptor(ty).and_then(|t| t.generic.as_ref()) else {
            return false;
        };

        let definition = generic.definition.to_lowercase();
        self.markers.iter().any(|m| definition.contains(m.as_str()))
            && generic.arguments.len() == 2
            && generic.arguments[0] == key_type
    }
}
