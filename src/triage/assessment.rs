use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classifier::classify;
use super::reference::TriageReference;
use super::regions::{has_systemic_involvement, map_regions, systemic_severity, RegionFinding};
use super::symptom_set::SymptomSet;
use super::types::SeverityTier;

/// Everything the rendering layer draws for one case: checklist, overall
/// tier, region markers and the whole-body overlay.
///
/// Always derived from a `SymptomSet` plus the reference; never stored on
/// its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub symptoms: SymptomSet,
    pub overall_severity: Option<SeverityTier>,
    pub region_severity: BTreeMap<String, RegionFinding>,
    pub systemic_involvement: bool,
    pub systemic_severity: Option<SeverityTier>,
}

impl TriageAssessment {
    /// No active symptoms yet: "unknown / pending", not an error.
    pub fn is_pending(&self) -> bool {
        self.overall_severity.is_none()
    }
}

/// Recompute the assessment from scratch. Pure.
pub fn recompute_assessment(symptoms: &SymptomSet, reference: &TriageReference) -> TriageAssessment {
    let active = symptoms.active();
    TriageAssessment {
        symptoms: symptoms.clone(),
        overall_severity: classify(&active, reference),
        region_severity: map_regions(&active, reference),
        systemic_involvement: has_systemic_involvement(&active, reference),
        systemic_severity: systemic_severity(&active, reference),
    }
}
