use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SeverityTier
// ---------------------------------------------------------------------------

/// Three-level triage scale. Declaration order gives the total order
/// `Mild < Moderate < Critical`, so aggregation is a plain `max`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Mild,
    Moderate,
    Critical,
}

impl SeverityTier {
    /// Highest tier first, the order checkbox groups are rendered in.
    pub const DESCENDING: [SeverityTier; 3] = [Self::Critical, Self::Moderate, Self::Mild];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SymptomId
// ---------------------------------------------------------------------------

/// Closed set of symptom identifiers known to the triage form.
///
/// Variants are declared grouped by tier (critical, moderate, mild) and that
/// order is the stable rendering order of `TriageReference::all_ids`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum SymptomId {
    ChestPain,
    SevereBreathlessness,
    SuddenConfusion,
    StrokeSymptoms,
    Seizure,
    SevereTrauma,
    UncontrolledBleeding,
    LossOfConsciousness,
    SevereAllergicReaction,
    PersistentFever,
    Vomiting,
    ModerateAbdominalPain,
    PersistentCough,
    ModerateBreathlessness,
    SevereHeadache,
    Dizziness,
    Dehydration,
    Palpitations,
    Migraine,
    MildHeadache,
    SoreThroat,
    RunnyNose,
    MildCough,
    Fatigue,
    BodyAche,
    MildAbdominalPain,
    SkinRash,
    MildBackPain,
    MildJointPain,
}

impl SymptomId {
    pub const COUNT: usize = 29;

    pub const ALL: [SymptomId; Self::COUNT] = [
        Self::ChestPain,
        Self::SevereBreathlessness,
        Self::SuddenConfusion,
        Self::StrokeSymptoms,
        Self::Seizure,
        Self::SevereTrauma,
        Self::UncontrolledBleeding,
        Self::LossOfConsciousness,
        Self::SevereAllergicReaction,
        Self::PersistentFever,
        Self::Vomiting,
        Self::ModerateAbdominalPain,
        Self::PersistentCough,
        Self::ModerateBreathlessness,
        Self::SevereHeadache,
        Self::Dizziness,
        Self::Dehydration,
        Self::Palpitations,
        Self::Migraine,
        Self::MildHeadache,
        Self::SoreThroat,
        Self::RunnyNose,
        Self::MildCough,
        Self::Fatigue,
        Self::BodyAche,
        Self::MildAbdominalPain,
        Self::SkinRash,
        Self::MildBackPain,
        Self::MildJointPain,
    ];

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire key, identical to the triage request field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChestPain => "chest_pain",
            Self::SevereBreathlessness => "severe_breathlessness",
            Self::SuddenConfusion => "sudden_confusion",
            Self::StrokeSymptoms => "stroke_symptoms",
            Self::Seizure => "seizure",
            Self::SevereTrauma => "severe_trauma",
            Self::UncontrolledBleeding => "uncontrolled_bleeding",
            Self::LossOfConsciousness => "loss_of_consciousness",
            Self::SevereAllergicReaction => "severe_allergic_reaction",
            Self::PersistentFever => "persistent_fever",
            Self::Vomiting => "vomiting",
            Self::ModerateAbdominalPain => "moderate_abdominal_pain",
            Self::PersistentCough => "persistent_cough",
            Self::ModerateBreathlessness => "moderate_breathlessness",
            Self::SevereHeadache => "severe_headache",
            Self::Dizziness => "dizziness",
            Self::Dehydration => "dehydration",
            Self::Palpitations => "palpitations",
            Self::Migraine => "migraine",
            Self::MildHeadache => "mild_headache",
            Self::SoreThroat => "sore_throat",
            Self::RunnyNose => "runny_nose",
            Self::MildCough => "mild_cough",
            Self::Fatigue => "fatigue",
            Self::BodyAche => "body_ache",
            Self::MildAbdominalPain => "mild_abdominal_pain",
            Self::SkinRash => "skin_rash",
            Self::MildBackPain => "mild_back_pain",
            Self::MildJointPain => "mild_joint_pain",
        }
    }
}

impl fmt::Display for SymptomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymptomId {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TriageError::UnknownSymptom(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Taxonomy and region configuration
// ---------------------------------------------------------------------------

/// One entry of the symptom taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomDefinition {
    pub id: SymptomId,
    pub tier: SeverityTier,
    /// Lowercase phrases; any one contained in the input triggers the symptom.
    pub keywords: Vec<String>,
    pub display_label: String,
}

/// Marker position on the body overlay (100x100 canvas).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Named anatomical grouping used to localize active symptoms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyRegion {
    pub name: String,
    pub anchor: Anchor,
    pub symptoms: Vec<SymptomId>,
}

// ---------------------------------------------------------------------------
// Department
// ---------------------------------------------------------------------------

/// Clinical departments the routing service can assign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Department {
    Emergency,
    #[serde(rename = "General_Medicine")]
    GeneralMedicine,
    Cardiology,
    Neurology,
    Pulmonology,
    Gastroenterology,
    Orthopedics,
    Pediatrics,
    Nephrology,
    Endocrinology,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::GeneralMedicine => "General_Medicine",
            Self::Cardiology => "Cardiology",
            Self::Neurology => "Neurology",
            Self::Pulmonology => "Pulmonology",
            Self::Gastroenterology => "Gastroenterology",
            Self::Orthopedics => "Orthopedics",
            Self::Pediatrics => "Pediatrics",
            Self::Nephrology => "Nephrology",
            Self::Endocrinology => "Endocrinology",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Unknown symptom id: {0}")]
    UnknownSymptom(String),

    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    #[error("A detection pass is already in flight for case {0}")]
    DetectionInFlight(Uuid),

    #[error("Submission rejected, missing required fields: {}", missing.join(", "))]
    EmptySubmission { missing: Vec<&'static str> },

    #[error("Invalid patient id: {0:?}")]
    InvalidPatientId(String),

    #[error("Case {0} has been submitted and can no longer change")]
    SessionClosed(Uuid),

    #[error("Case {0} has not been submitted yet")]
    NotSubmitted(Uuid),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Invalid reference data: {0}")]
    InvalidReference(String),

    #[error("Risk service error: {0}")]
    RiskService(String),

    #[error("Session lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(SeverityTier::Critical > SeverityTier::Moderate);
        assert!(SeverityTier::Moderate > SeverityTier::Mild);
        assert_eq!(
            [SeverityTier::Mild, SeverityTier::Critical, SeverityTier::Moderate]
                .into_iter()
                .max(),
            Some(SeverityTier::Critical)
        );
    }

    #[test]
    fn all_ids_match_declaration_order() {
        for (i, id) in SymptomId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn symptom_id_parses_wire_key() {
        assert_eq!("chest_pain".parse::<SymptomId>().unwrap(), SymptomId::ChestPain);
        assert_eq!(
            "mild_joint_pain".parse::<SymptomId>().unwrap(),
            SymptomId::MildJointPain
        );
    }

    #[test]
    fn symptom_id_rejects_unknown_key() {
        let err = "broken_leg".parse::<SymptomId>().unwrap_err();
        assert!(matches!(err, TriageError::UnknownSymptom(ref s) if s == "broken_leg"));
    }

    #[test]
    fn serde_key_matches_as_str() {
        for id in SymptomId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn department_serializes_with_underscore_name() {
        let json = serde_json::to_string(&Department::GeneralMedicine).unwrap();
        assert_eq!(json, "\"General_Medicine\"");
        assert_eq!(Department::GeneralMedicine.as_str(), "General_Medicine");
    }

    #[test]
    fn empty_submission_lists_missing_fields() {
        let err = TriageError::EmptySubmission {
            missing: vec!["heart_rate", "oxygen"],
        };
        assert_eq!(
            err.to_string(),
            "Submission rejected, missing required fields: heart_rate, oxygen"
        );
    }
}
