//! regscan core
//!
//! Finds registries keyed by a 64-bit identifier inside an object graph
//! whose layout is not known in advance. The scanner sees the graph only
//! through [`regscan_reflect::Introspector`].
//!
//! - **Enumeration**: fields across a type hierarchy (`enumerate`, `access`)
//! - **Classification**: map shape and name heuristics (`shape`, `heuristic`, `evidence`)
//! - **Search**: one-level nested search (`nested`)
//! - **Summaries**: bounded entry samples (`summary`)
//! - **Pipeline**: the two-phase scan and its result (`pipeline`, `result`)
//!
//! # Example
//!
//! ```rust,ignore
//! use regscan_core::{ScanConfig, ScanPipeline};
//!
//! let snapshot = regscan_reflect::Snapshot::from_file(path)?;
//! let root = snapshot.object(1).unwrap();
//! let result = ScanPipeline::new(ScanConfig::default()).scan(snapshot.graph(), &root);
//! for candidate in &result.candidates {
//!     println!("{} ({:?})", candidate.path, candidate.summary.size);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod access;
pub mod config;
pub mod enumerate;
pub mod evidence;
pub mod heuristic;
pub mod nested;
pub mod pipeline;
pub mod result;
pub mod shape;
pub mod summary;

pub use access::FieldRead;
pub use config::{ConfigError, ScanConfig};
pub use evidence::Evidence;
pub use heuristic::NameHeuristic;
pub use nested::{NestedMatch, NestedScanner};
pub use pipeline::ScanPipeline;
pub use result::{
    AbortReason, Candidate, LookupFailure, Provenance, ScanPhase, ScanResult, StateCollection,
};
pub use shape::MapShapeDetector;
pub use summary::{DictionarySummarizer, EntrySample, MapSummary, SampleStatus};
