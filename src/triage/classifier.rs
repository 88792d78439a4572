use std::collections::BTreeSet;

use super::reference::TriageReference;
use super::types::{SeverityTier, SymptomId};

/// Highest tier among the active symptoms, `None` when nothing is active.
pub fn classify(active: &BTreeSet<SymptomId>, reference: &TriageReference) -> Option<SeverityTier> {
    classify_iter(active.iter().copied(), reference)
}

/// Same rule restricted to the symptoms of one region.
pub fn classify_region(
    active: &BTreeSet<SymptomId>,
    region_symptoms: &[SymptomId],
    reference: &TriageReference,
) -> Option<SeverityTier> {
    classify_iter(
        region_symptoms.iter().copied().filter(|id| active.contains(id)),
        reference,
    )
}

pub(crate) fn classify_iter(
    ids: impl Iterator<Item = SymptomId>,
    reference: &TriageReference,
) -> Option<SeverityTier> {
    ids.map(|id| reference.tier_of(id)).max()
}
