//! Symptom triage: keyword detection, severity aggregation and the per-case
//! session that feeds the routing service.

pub mod assessment;
pub mod classifier;
pub mod desk;
pub mod document;
pub mod matcher;
pub mod reference;
pub mod regions;
pub mod session;
pub mod symptom_set;
pub mod types;
pub mod vitals;

pub use assessment::{recompute_assessment, TriageAssessment};
pub use classifier::{classify, classify_region};
pub use desk::{RiskService, RoutingDecision, TriageDesk, TriageOutcome};
pub use matcher::{critical_override, match_symptoms, CriticalOverride, KeywordHit};
pub use reference::TriageReference;
pub use regions::{map_regions, RegionFinding};
pub use session::{
    DetectionFailure, DetectionOutcome, DetectionReport, DetectionSource, DetectionTicket,
    DiscardReason, SessionState, SubmittedTriage, TriageSession,
};
pub use symptom_set::SymptomSet;
pub use types::{Department, SeverityTier, SymptomId, TriageError};
pub use vitals::{CompleteVitals, RiskPayload, Vitals};
