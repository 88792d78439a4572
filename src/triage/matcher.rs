//! Keyword matching of free clinical narration onto the symptom taxonomy.
//!
//! Matching is case-insensitive substring containment and nothing else: no
//! stemming, no punctuation stripping, no word boundaries. Overlapping
//! keywords across symptoms all fire; severity aggregation resolves them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::reference::TriageReference;
use super::types::SymptomId;

/// Phrases that send a case straight to emergency regardless of the checklist.
static CRITICAL_OVERRIDE_PHRASES: &[&str] = &[
    "unconscious",
    "not breathing",
    "cardiac arrest",
    "massive bleeding",
];

/// Triage level reported when a critical phrase fires.
pub const CRITICAL_OVERRIDE_LEVEL: &str = "RED - CRITICAL";

/// The keyword that triggered a symptom, for highlighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordHit {
    pub symptom: SymptomId,
    pub keyword: String,
    /// Byte offset in the lowercased text.
    pub offset: usize,
}

/// A critical phrase found in the narration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CriticalOverride {
    pub phrase: &'static str,
}

/// Map free text to the set of symptoms whose keywords it contains.
pub fn match_symptoms(text: &str, reference: &TriageReference) -> BTreeSet<SymptomId> {
    if text.is_empty() {
        return BTreeSet::new();
    }
    let lower = text.to_lowercase();

    reference
        .definitions()
        .iter()
        .filter(|def| def.keywords.iter().any(|kw| lower.contains(kw.as_str())))
        .map(|def| def.id)
        .collect()
}

/// Like [`match_symptoms`], but reports the first keyword (in dictionary
/// order) that fired for each symptom and where.
pub fn scan_keyword_hits(text: &str, reference: &TriageReference) -> Vec<KeywordHit> {
    let lower = text.to_lowercase();
    let mut hits = Vec::new();

    for def in reference.definitions() {
        let first = def
            .keywords
            .iter()
            .find_map(|kw| lower.find(kw.as_str()).map(|offset| (kw, offset)));
        if let Some((keyword, offset)) = first {
            hits.push(KeywordHit {
                symptom: def.id,
                keyword: keyword.clone(),
                offset,
            });
        }
    }

    tracing::debug!(hit_count = hits.len(), "Keyword scan complete");
    hits
}

/// Check narration for a phrase that overrides checklist triage.
pub fn critical_override(text: &str) -> Option<CriticalOverride> {
    let lower = text.to_lowercase();
    CRITICAL_OVERRIDE_PHRASES
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
        .map(|phrase| CriticalOverride { phrase })
}
