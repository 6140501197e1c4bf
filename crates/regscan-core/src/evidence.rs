//! Classification outcomes

use serde::Serialize;

/// How strongly a signal supports "this is the registry"
///
/// Shape matches are `Confirmed`, name matches are only `Suspected`; callers
/// decide how much each is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// Structural shape matched
    Confirmed,
    /// Only a naming signal matched
    Suspected,
    /// No signal matched
    Rejected,
}

impl Evidence {
    /// Anything but `Rejected`
    pub fn is_positive(self) -> bool {
        !matches!(self, Evidence::Rejected)
    }
}
