//! Bounded summaries of map-like values

use regscan_reflect::{AccessError, Introspector, Value, Visibility};
use serde::Serialize;
use tracing::trace;

/// One sampled entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySample {
    /// Position in enumeration order
    pub index: usize,
    /// Rendered key, None when the element has no `Key` member
    pub key: Option<String>,
    /// Runtime type name of the entry's value (`null` when absent)
    pub value_type: String,
}

/// How sampling ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleStatus {
    /// At least one entry sampled, enumeration did not fail
    Sampled,
    /// Enumeration yielded nothing
    Empty,
    /// Enumeration faulted; entries sampled before the fault are kept
    EnumerationFailed {
        /// Fault description
        reason: String,
    },
    /// The value is not enumerable
    NotEnumerable,
}

/// Size and sample of a map-like value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSummary {
    /// Value of a public integral `Count` accessor, if any
    pub size: Option<u64>,
    /// Up to the sample limit, in enumeration order
    pub samples: Vec<EntrySample>,
    /// Sampling outcome
    pub status: SampleStatus,
}

/// Produces [`MapSummary`]s
#[derive(Debug, Clone, Copy)]
pub struct DictionarySummarizer {
    limit: usize,
}

impl DictionarySummarizer {
    /// Summarizer sampling at most `limit` entries
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Summarize a value believed to be a mapping
    pub fn summarize(&self, introspector: &dyn Introspector, value: &Value) -> MapSummary {
        let size = read_count(introspector, value);

        let Some(elements) = introspector.elements(value) else {
            return MapSummary {
                size,
                samples: Vec::new(),
                status: SampleStatus::NotEnumerable,
            };
        };

        let mut samples = Vec::new();
        let mut failure = None;
        for (index, item) in elements.take(self.limit).enumerate() {
            match item.and_then(|element| sample(introspector, index, &element)) {
                Ok(entry) => samples.push(entry),
                Err(err) => {
                    trace!(error = %err, sampled = samples.len(), "enumeration failed");
                    failure = Some(err);
                    break;
                }
            }
        }

        let status = match failure {
            Some(err) => SampleStatus::EnumerationFailed {
                reason: err.to_string(),
            },
            None if samples.is_empty() => SampleStatus::Empty,
            None => SampleStatus::Sampled,
        };
        MapSummary { size, samples, status }
    }
}

/// Public zero-argument `Count` returning an integral type
pub fn read_count(introspector: &dyn Introspector, value: &Value) -> Option<u64> {
    let ty = introspector.runtime_type(value)?;
    let accessor = introspector
        .find_accessor(ty, "Count")
        .filter(|a| a.visibility == Visibility::Public && a.return_type.is_integral())?;
    let count = introspector.read_accessor(value, accessor).ok()?;
    count.as_integral().and_then(|n| u64::try_from(n).ok())
}

fn sample(
    introspector: &dyn Introspector,
    index: usize,
    element: &Value,
) -> Result<EntrySample, AccessError> {
    let key = optional_member(introspector, element, "Key")?;
    let value = optional_member(introspector, element, "Value")?;
    Ok(EntrySample {
        index,
        key: key.map(|k| k.to_string()),
        value_type: value
            .map(|v| introspector.value_type_name(&v))
            .unwrap_or_else(|| "null".to_string()),
    })
}

fn optional_member(
    introspector: &dyn Introspector,
    element: &Value,
    name: &str,
) -> Result<Option<Value>, AccessError> {
    match introspector.member(element, name) {
        Ok(value) => Ok(Some(value)),
        Err(AccessError::MemberNotFound(_) | AccessError::NotAnObject) => Ok(None),
        Err(err) => Err(err),
    }
}
