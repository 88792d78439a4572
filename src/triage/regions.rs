//! Anatomical localization of active symptoms for the body overlay.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::classifier::{classify_iter, classify_region};
use super::reference::TriageReference;
use super::types::{Anchor, SeverityTier, SymptomId};

/// One implicated region: its aggregate tier and the symptoms that put it there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionFinding {
    pub severity: SeverityTier,
    pub matched_symptoms: BTreeSet<SymptomId>,
    pub anchor: Anchor,
}

/// Regions with at least one active symptom, keyed by region name.
///
/// Regions with nothing active are omitted; callers treat absence as
/// "not implicated".
pub fn map_regions(
    active: &BTreeSet<SymptomId>,
    reference: &TriageReference,
) -> BTreeMap<String, RegionFinding> {
    let mut map = BTreeMap::new();

    for region in reference.regions() {
        let Some(severity) = classify_region(active, &region.symptoms, reference) else {
            continue;
        };
        let matched_symptoms = region
            .symptoms
            .iter()
            .copied()
            .filter(|id| active.contains(id))
            .collect();
        map.insert(
            region.name.clone(),
            RegionFinding {
                severity,
                matched_symptoms,
                anchor: region.anchor,
            },
        );
    }

    map
}

/// True when any non-localized symptom is active.
pub fn has_systemic_involvement(active: &BTreeSet<SymptomId>, reference: &TriageReference) -> bool {
    active.iter().any(|id| reference.is_systemic(*id))
}

/// Tier of the whole-body overlay, computed over the non-localized subset only.
pub fn systemic_severity(
    active: &BTreeSet<SymptomId>,
    reference: &TriageReference,
) -> Option<SeverityTier> {
    classify_iter(
        active.iter().copied().filter(|id| reference.is_systemic(*id)),
        reference,
    )
}
