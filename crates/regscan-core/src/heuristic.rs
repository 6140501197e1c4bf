//! Name-based registry suspicion

use crate::evidence::Evidence;

/// Flags fields whose name or value type name mentions a keyword
#[derive(Debug, Clone)]
pub struct NameHeuristic {
    keywords: Vec<String>,
}

impl NameHeuristic {
    /// Build from a keyword list (matched case-insensitively)
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// `Suspected` if either name contains a keyword, else `Rejected`
    pub fn classify(&self, field_name: &str, type_name: &str) -> Evidence {
        let field_name = field_name.to_lowercase();
        let type_name = type_name.to_lowercase();
        let hit = self
            .keywords
            .iter()
            .any(|k| field_name.contains(k.as_str()) || type_name.contains(k.as_str()));
        if hit {
            Evidence::Suspected
        } else {
            Evidence::Rejected
        }
    }
}
