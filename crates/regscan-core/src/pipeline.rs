//! Scan orchestration
//!
//! ```text
//! ResolvingRoot -> ResolvingInner -> FastPathScan -> HeuristicScan -> Summarizing -> Done
//!        \               \
//!         +---------------+--> Aborted
//! ```
//!
//! Only the two required lookups can abort a scan. Every other failure is
//! absorbed where it happens and shows up, at most, as a marker in the
//! result.

use std::cmp::Ordering;

use regscan_reflect::{FieldDescriptor, Introspector, TypeId, Value};
use tracing::{debug, warn};

use crate::access::{read_field, read_named, FieldRead};
use crate::config::ScanConfig;
use crate::enumerate::{find_field, instance_fields};
use crate::evidence::Evidence;
use crate::heuristic::NameHeuristic;
use crate::nested::NestedScanner;
use crate::result::{
    AbortReason, Candidate, LookupFailure, Provenance, ScanPhase, ScanResult, StateCollection,
};
use crate::shape::MapShapeDetector;
use crate::summary::{read_count, DictionarySummarizer};

/// Discovers u64-keyed registries below a root object
#[derive(Debug, Clone, Default)]
pub struct ScanPipeline {
    config: ScanConfig,
}

impl ScanPipeline {
    /// Pipeline with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the object graph below `root`. Never panics and never fails;
    /// a failed required lookup is reported through [`ScanResult::aborted`].
    pub fn scan(&self, introspector: &dyn Introspector, root: &Value) -> ScanResult {
        ScanRun::new(&self.config, introspector).execute(root)
    }
}

/// A mapping found before summarization
struct Finding {
    path: String,
    field: FieldDescriptor,
    value: Value,
    provenance: Provenance,
    evidence: Evidence,
}

struct ScanRun<'a> {
    config: &'a ScanConfig,
    introspector: &'a dyn Introspector,
    shape: MapShapeDetector,
    names: NameHeuristic,
    result: ScanResult,
}

impl<'a> ScanRun<'a> {
    fn new(config: &'a ScanConfig, introspector: &'a dyn Introspector) -> Self {
        Self {
            config,
            introspector,
            shape: MapShapeDetector::from_config(introspector, config),
            names: NameHeuristic::new(&config.keywords),
            result: ScanResult::new(),
        }
    }

    fn execute(mut self, root: &Value) -> ScanResult {
        let config = self.config;

        self.enter(ScanPhase::ResolvingRoot);
        self.result.root_type = self.type_name_of(root);
        let handle = match self.resolve_handle(root) {
            Ok(handle) => handle,
            Err(failure) => {
                return self.abort(AbortReason::RootUnavailable {
                    field: config.handle_field.clone(),
                    failure,
                })
            }
        };
        self.result.handle_type = self.type_name_of(&handle);

        self.enter(ScanPhase::ResolvingInner);
        let target = match self.resolve_target(&handle) {
            Ok(target) => target,
            Err(failure) => {
                return self.abort(AbortReason::InnerUnavailable {
                    field: config.inner_field.clone(),
                    failure,
                })
            }
        };
        self.result.target_type = self.type_name_of(&target);
        self.inspect_component(&handle, &target);

        self.enter(ScanPhase::FastPathScan);
        let fast = self.fast_path(&target);

        self.enter(ScanPhase::HeuristicScan);
        let (direct, nested) = self.heuristic_scan(&target);

        self.enter(ScanPhase::Summarizing);
        let summarizer = DictionarySummarizer::new(config.sample_limit);
        let candidates: Vec<Candidate> = fast
            .into_iter()
            .chain(direct)
            .chain(nested)
            .map(|finding| self.summarize(&summarizer, finding))
            .collect();
        self.result.found_any = !candidates.is_empty();
        self.result.candidates = candidates;

        self.enter(ScanPhase::Done);
        debug!(
            candidates = self.result.candidates.len(),
            found_any = self.result.found_any,
            "scan complete"
        );
        self.result
    }

    fn enter(&mut self, phase: ScanPhase) {
        debug!(?phase, "entering scan phase");
        self.result.phase = phase;
    }

    fn abort(mut self, reason: AbortReason) -> ScanResult {
        warn!(?reason, "required lookup failed, scan aborted");
        self.result.phase = ScanPhase::Aborted;
        self.result.aborted = Some(reason);
        self.result
    }

    fn type_name_of(&self, value: &Value) -> Option<String> {
        self.introspector
            .runtime_type(value)
            .map(|ty| self.introspector.type_name(ty))
    }

    /// The handle is looked up on the root's declared base type, which may
    /// be an ancestor of its runtime type.
    fn resolve_handle(&self, root: &Value) -> Result<Value, LookupFailure> {
        let base = match &self.config.root_base_type {
            Some(name) => self
                .introspector
                .lookup_type(name)
                .ok_or_else(|| LookupFailure::UnknownBaseType(name.clone()))?,
            None => self
                .introspector
                .runtime_type(root)
                .ok_or(LookupFailure::NoRuntimeType)?,
        };
        self.lookup_required(root, base, &self.config.handle_field)
    }

    fn resolve_target(&self, handle: &Value) -> Result<Value, LookupFailure> {
        let ty = self
            .introspector
            .runtime_type(handle)
            .ok_or(LookupFailure::NoRuntimeType)?;
        self.lookup_required(handle, ty, &self.config.inner_field)
    }

    fn lookup_required(
        &self,
        instance: &Value,
        ty: TypeId,
        name: &str,
    ) -> Result<Value, LookupFailure> {
        let field =
            find_field(self.introspector, ty, name).ok_or(LookupFailure::FieldNotFound)?;
        match read_field(self.introspector, instance, field) {
            FieldRead::Value(value) => Ok(value),
            FieldRead::Null => Err(LookupFailure::Null),
            FieldRead::Unavailable(err) => Err(LookupFailure::Unreadable(err.to_string())),
        }
    }

    fn inspect_component(&mut self, handle: &Value, target: &Value) {
        let id_field = &self.config.component_id_field;
        if let Some((_, FieldRead::Value(id))) = read_named(self.introspector, handle, id_field) {
            self.result.component_id = Some(id.to_string());
        }

        let states = read_named(self.introspector, target, &self.config.component_state_field);
        if let Some((field, FieldRead::Value(value))) = states {
            self.result.component_states = Some(StateCollection {
                field: field.name.clone(),
                type_name: self.introspector.value_type_name(&value),
                count: read_count(self.introspector, &value),
            });
        }
    }

    /// Fast-path names are trusted without a shape match; the shape only
    /// decides between `Confirmed` and `Suspected`. A name listed twice is
    /// recorded once.
    fn fast_path(&self, target: &Value) -> Vec<Finding> {
        let mut findings: Vec<Finding> = Vec::new();
        for name in &self.config.fast_path_names {
            let Some((field, FieldRead::Value(value))) =
                read_named(self.introspector, target, name)
            else {
                continue;
            };
            if findings.iter().any(|f| same_field(&f.field, field)) {
                continue;
            }
            let evidence = match self.shape_of(&value) {
                Evidence::Confirmed => Evidence::Confirmed,
                _ => Evidence::Suspected,
            };
            debug!(field = %field.name, ?evidence, "fast-path candidate");
            findings.push(Finding {
                path: self.path_of(field),
                field: field.clone(),
                value,
                provenance: Provenance::FastPath,
                evidence,
            });
        }
        findings
    }

    /// Every map-shaped field is a direct candidate, including one the fast
    /// path already recorded.
    fn heuristic_scan(&self, target: &Value) -> (Vec<Finding>, Vec<Finding>) {
        let mut direct = Vec::new();
        let mut nested = Vec::new();
        let Some(target_ty) = self.introspector.runtime_type(target) else {
            return (direct, nested);
        };
        let scanner = NestedScanner::new(&self.shape);

        for field in instance_fields(self.introspector, target_ty) {
            let Some(value) = read_field(self.introspector, target, field).into_value() else {
                continue;
            };

            if self.shape_of(&value) == Evidence::Confirmed {
                debug!(field = %field.name, "direct candidate");
                direct.push(Finding {
                    path: self.path_of(field),
                    field: field.clone(),
                    value,
                    provenance: Provenance::Direct,
                    evidence: Evidence::Confirmed,
                });
                continue;
            }

            let type_name = self.introspector.value_type_name(&value);
            if !self.names.classify(&field.name, &type_name).is_positive() {
                continue;
            }
            for found in scanner.scan(self.introspector, &value) {
                debug!(container = %field.name, path = %found.path, "nested candidate");
                nested.push(Finding {
                    path: found.path,
                    field: found.field,
                    value: found.value,
                    provenance: Provenance::Nested {
                        container_field: field.name.clone(),
                        container_type: type_name.clone(),
                    },
                    evidence: Evidence::Confirmed,
                });
            }
        }

        direct.sort_by(|a, b| compare_names(&a.field.name, &b.field.name));
        (direct, nested)
    }

    fn summarize(&self, summarizer: &DictionarySummarizer, finding: Finding) -> Candidate {
        let summary = summarizer.summarize(self.introspector, &finding.value);
        Candidate {
            path: finding.path,
            declaring_type: self.introspector.type_name(finding.field.declaring_type),
            field: finding.field.name,
            type_name: self.introspector.value_type_name(&finding.value),
            value: finding.value,
            provenance: finding.provenance,
            evidence: finding.evidence,
            summary,
        }
    }

    fn shape_of(&self, value: &Value) -> Evidence {
        match self.introspector.runtime_type(value) {
            Some(ty) => self.shape.classify(self.introspector, ty),
            None => Evidence::Rejected,
        }
    }

    fn path_of(&self, field: &FieldDescriptor) -> String {
        let owner = self
            .introspector
            .type_descriptor(field.declaring_type)
            .map(|t| t.name.as_str())
            .unwrap_or("<unknown>");
        format!("{}.{}", owner, field.name)
    }
}

fn same_field(a: &FieldDescriptor, b: &FieldDescriptor) -> bool {
    a.declaring_type == b.declaring_type && a.name == b.name
}

/// Case-insensitive order, ordinal on ties
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
