//! Vitals pass-through and the flattened payload for the routing service.
//!
//! Vitals are carried, never interpreted: the only rule is that all four
//! must be present before a case can be submitted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::symptom_set::SymptomSet;
use super::types::TriageError;

/// Vitals as entered so far. Any field may still be blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub systolic_bp: Option<u32>,
    pub heart_rate: Option<u32>,
    pub temperature: Option<f64>,
    pub oxygen: Option<u32>,
}

/// Vitals with every field present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompleteVitals {
    pub systolic_bp: u32,
    pub heart_rate: u32,
    pub temperature: f64,
    pub oxygen: u32,
}

impl Vitals {
    pub fn is_blank(&self) -> bool {
        self.missing_fields().len() == 4
    }

    /// Names of the fields still blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.systolic_bp.is_none() {
            missing.push("systolic_bp");
        }
        if self.heart_rate.is_none() {
            missing.push("heart_rate");
        }
        if self.temperature.is_none() {
            missing.push("temperature");
        }
        if self.oxygen.is_none() {
            missing.push("oxygen");
        }
        missing
    }

    /// All four vitals are mandatory for submission.
    pub fn require_complete(&self) -> Result<CompleteVitals, TriageError> {
        match (self.systolic_bp, self.heart_rate, self.temperature, self.oxygen) {
            (Some(systolic_bp), Some(heart_rate), Some(temperature), Some(oxygen)) => {
                Ok(CompleteVitals {
                    systolic_bp,
                    heart_rate,
                    temperature,
                    oxygen,
                })
            }
            _ => Err(TriageError::EmptySubmission {
                missing: self.missing_fields(),
            }),
        }
    }
}

/// Body sent to the risk/department service: case and patient ids, vitals
/// and one boolean per symptom, all at the top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPayload {
    pub case_id: Uuid,
    /// Registry id; the service looks up demographics and history with it.
    pub patient_id: String,
    #[serde(flatten)]
    pub vitals: CompleteVitals,
    #[serde(flatten)]
    pub symptoms: SymptomSet,
    pub emergency_override: bool,
}

impl RiskPayload {
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::types::SymptomId;

    fn full() -> Vitals {
        Vitals {
            systolic_bp: Some(128),
            heart_rate: Some(92),
            temperature: Some(38.4),
            oxygen: Some(95),
        }
    }

    #[test]
    fn complete_vitals_pass() {
        let complete = full().require_complete().unwrap();
        assert_eq!(complete.heart_rate, 92);
        assert_eq!(complete.temperature, 38.4);
    }

    #[test]
    fn blank_vitals_list_every_field() {
        let vitals = Vitals::default();
        assert!(vitals.is_blank());
        match vitals.require_complete() {
            Err(TriageError::EmptySubmission { missing }) => {
                assert_eq!(missing, vec!["systolic_bp", "heart_rate", "temperature", "oxygen"]);
            }
            other => panic!("expected EmptySubmission, got {other:?}"),
        }
    }

    #[test]
    fn partial_vitals_list_only_missing() {
        let vitals = Vitals {
            oxygen: None,
            ..full()
        };
        assert!(!vitals.is_blank());
        assert_eq!(vitals.missing_fields(), vec!["oxygen"]);
        assert!(vitals.require_complete().is_err());
    }

    #[test]
    fn payload_is_flat() {
        let mut symptoms = SymptomSet::new();
        symptoms.set(SymptomId::PersistentFever, true);
        let payload = RiskPayload {
            case_id: Uuid::nil(),
            patient_id: "P-1042".into(),
            vitals: full().require_complete().unwrap(),
            symptoms,
            emergency_override: false,
        };
        let json = payload.to_json().unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["patient_id"], "P-1042");
        assert_eq!(obj["systolic_bp"], 128);
        assert_eq!(obj["oxygen"], 95);
        assert_eq!(obj["persistent_fever"], true);
        assert_eq!(obj["chest_pain"], false);
        assert_eq!(obj["emergency_override"], false);
        // case id + patient id + 4 vitals + every symptom + override flag
        assert_eq!(obj.len(), 2 + 4 + SymptomId::COUNT + 1);
    }
}
