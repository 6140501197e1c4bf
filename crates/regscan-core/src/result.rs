//! Scan output

use regscan_reflect::Value;
use serde::Serialize;

use crate::evidence::Evidence;
use crate::summary::MapSummary;

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// Looking up the handle on the root
    ResolvingRoot,
    /// Looking up the scan target on the handle
    ResolvingInner,
    /// Checking historically used field names
    FastPathScan,
    /// Walking every field of the target
    HeuristicScan,
    /// Sampling each candidate
    Summarizing,
    /// Finished normally
    Done,
    /// A required lookup failed
    Aborted,
}

/// Why a required lookup produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupFailure {
    /// The configured base type is not known to the introspector
    UnknownBaseType(String),
    /// The instance is null or its type cannot be determined
    NoRuntimeType,
    /// No field with the configured name exists
    FieldNotFound,
    /// The field holds null
    Null,
    /// The field exists but could not be read
    Unreadable(String),
}

/// The required lookup that aborted a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "lookup", rename_all = "snake_case")]
pub enum AbortReason {
    /// The handle could not be resolved from the root
    RootUnavailable {
        /// Field that was looked up
        field: String,
        /// What went wrong
        failure: LookupFailure,
    },
    /// The scan target could not be resolved from the handle
    InnerUnavailable {
        /// Field that was looked up
        field: String,
        /// What went wrong
        failure: LookupFailure,
    },
}

/// Where a candidate was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// A historically used field name
    FastPath,
    /// A map-shaped field of the target
    Direct,
    /// A map-shaped field inside a suspected container field of the target
    Nested {
        /// Target field holding the container
        container_field: String,
        /// Container's runtime type
        container_type: String,
    },
}

/// A discovered mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Dotted location, `Container.field`
    pub path: String,
    /// Field name
    pub field: String,
    /// Full name of the type declaring the field
    pub declaring_type: String,
    /// Full name of the value's runtime type
    pub type_name: String,
    /// The value itself
    #[serde(skip)]
    pub value: Value,
    /// How it was found
    pub provenance: Provenance,
    /// Strength of the shape signal
    pub evidence: Evidence,
    /// Size and sample
    pub summary: MapSummary,
}

/// The per-component state collection found on the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCollection {
    /// Field name
    pub field: String,
    /// Runtime type name
    pub type_name: String,
    /// `Count`, when exposed
    pub count: Option<u64>,
}

/// Everything a scan discovered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    /// Final state
    pub phase: ScanPhase,
    /// Set when a required lookup failed
    pub aborted: Option<AbortReason>,
    /// Runtime type of the root
    pub root_type: Option<String>,
    /// Runtime type of the resolved handle
    pub handle_type: Option<String>,
    /// Runtime type of the scan target
    pub target_type: Option<String>,
    /// Component identifier read from the handle
    pub component_id: Option<String>,
    /// Per-component state collection on the target
    pub component_states: Option<StateCollection>,
    /// Fast-path, then direct (by field name), then nested (discovery order)
    pub candidates: Vec<Candidate>,
    /// Whether any candidate was recorded
    pub found_any: bool,
}

impl ScanResult {
    pub(crate) fn new() -> Self {
        Self {
            phase: ScanPhase::ResolvingRoot,
            aborted: None,
            root_type: None,
            handle_type: None,
            target_type: None,
            component_id: None,
            component_states: None,
            candidates: Vec::new(),
            found_any: false,
        }
    }

    /// Whether a required lookup failed
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Candidates that came from the fast path
    pub fn fast_path(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .iter()
            .filter(|c| matches!(c.provenance, Provenance::FastPath))
    }

    /// Candidates found by the heuristic scan, direct or nested
    pub fn discovered(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .iter()
            .filter(|c| !matches!(c.provenance, Provenance::FastPath))
    }
}
