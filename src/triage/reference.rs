use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{Anchor, BodyRegion, SeverityTier, SymptomDefinition, SymptomId, TriageError};

// ── Keyword dictionary ──────────────────────────────────────

struct StaticSymptom {
    id: SymptomId,
    tier: SeverityTier,
    label: &'static str,
    keywords: &'static [&'static str],
}

static SYMPTOM_TABLE: &[StaticSymptom] = &[
    // Critical
    StaticSymptom {
        id: SymptomId::ChestPain,
        tier: SeverityTier::Critical,
        label: "Chest Pain",
        keywords: &["chest pain", "chest hurts", "chest ache", "pain in chest"],
    },
    StaticSymptom {
        id: SymptomId::SevereBreathlessness,
        tier: SeverityTier::Critical,
        label: "Severe Breathlessness",
        keywords: &[
            "severe breathlessness",
            "can't breathe",
            "cannot breathe",
            "extreme difficulty breathing",
            "severe breathing",
        ],
    },
    StaticSymptom {
        id: SymptomId::SuddenConfusion,
        tier: SeverityTier::Critical,
        label: "Sudden Confusion",
        keywords: &["sudden confusion", "confused", "disoriented", "confusion"],
    },
    StaticSymptom {
        id: SymptomId::StrokeSymptoms,
        tier: SeverityTier::Critical,
        label: "Stroke Symptoms",
        keywords: &["stroke", "facial droop", "slurred speech", "arm weakness"],
    },
    StaticSymptom {
        id: SymptomId::Seizure,
        tier: SeverityTier::Critical,
        label: "Seizure",
        keywords: &["seizure", "convulsion", "fits", "fitting"],
    },
    StaticSymptom {
        id: SymptomId::SevereTrauma,
        tier: SeverityTier::Critical,
        label: "Severe Trauma",
        keywords: &["severe trauma", "major injury", "major trauma", "severe injury"],
    },
    StaticSymptom {
        id: SymptomId::UncontrolledBleeding,
        tier: SeverityTier::Critical,
        label: "Uncontrolled Bleeding",
        keywords: &[
            "uncontrolled bleeding",
            "heavy bleeding",
            "massive bleeding",
            "bleeding won't stop",
        ],
    },
    StaticSymptom {
        id: SymptomId::LossOfConsciousness,
        tier: SeverityTier::Critical,
        label: "Loss of Consciousness",
        keywords: &[
            "unconscious",
            "loss of consciousness",
            "passed out",
            "fainted",
            "unresponsive",
        ],
    },
    StaticSymptom {
        id: SymptomId::SevereAllergicReaction,
        tier: SeverityTier::Critical,
        label: "Severe Allergic Reaction",
        keywords: &["anaphylaxis", "severe allergic", "allergic reaction", "swelling throat"],
    },
    // Moderate
    StaticSymptom {
        id: SymptomId::PersistentFever,
        tier: SeverityTier::Moderate,
        label: "Persistent Fever",
        keywords: &["persistent fever", "high fever", "fever", "temperature high"],
    },
    StaticSymptom {
        id: SymptomId::Vomiting,
        tier: SeverityTier::Moderate,
        label: "Vomiting",
        keywords: &["vomiting", "throwing up", "nausea and vomiting", "puking"],
    },
    StaticSymptom {
        id: SymptomId::ModerateAbdominalPain,
        tier: SeverityTier::Moderate,
        label: "Moderate Abdominal Pain",
        keywords: &["abdominal pain", "stomach pain", "belly pain", "stomach ache"],
    },
    StaticSymptom {
        id: SymptomId::PersistentCough,
        tier: SeverityTier::Moderate,
        label: "Persistent Cough",
        keywords: &["persistent cough", "chronic cough", "coughing a lot", "keeps coughing"],
    },
    StaticSymptom {
        id: SymptomId::ModerateBreathlessness,
        tier: SeverityTier::Moderate,
        label: "Moderate Breathlessness",
        keywords: &[
            "breathlessness",
            "shortness of breath",
            "difficulty breathing",
            "breathless",
        ],
    },
    StaticSymptom {
        id: SymptomId::SevereHeadache,
        tier: SeverityTier::Moderate,
        label: "Severe Headache",
        keywords: &[
            "severe headache",
            "intense headache",
            "worst headache",
            "splitting headache",
        ],
    },
    StaticSymptom {
        id: SymptomId::Dizziness,
        tier: SeverityTier::Moderate,
        label: "Dizziness",
        keywords: &["dizziness", "dizzy", "lightheaded", "light headed", "vertigo"],
    },
    StaticSymptom {
        id: SymptomId::Dehydration,
        tier: SeverityTier::Moderate,
        label: "Dehydration",
        keywords: &["dehydration", "dehydrated", "very thirsty", "dry mouth"],
    },
    StaticSymptom {
        id: SymptomId::Palpitations,
        tier: SeverityTier::Moderate,
        label: "Palpitations",
        keywords: &["palpitations", "heart racing", "heart pounding", "rapid heartbeat"],
    },
    StaticSymptom {
        id: SymptomId::Migraine,
        tier: SeverityTier::Moderate,
        label: "Migraine",
        keywords: &["migraine"],
    },
    // Mild
    StaticSymptom {
        id: SymptomId::MildHeadache,
        tier: SeverityTier::Mild,
        label: "Mild Headache",
        keywords: &["mild headache", "headache", "slight headache", "head hurts"],
    },
    StaticSymptom {
        id: SymptomId::SoreThroat,
        tier: SeverityTier::Mild,
        label: "Sore Throat",
        keywords: &["sore throat", "throat pain", "throat hurts"],
    },
    StaticSymptom {
        id: SymptomId::RunnyNose,
        tier: SeverityTier::Mild,
        label: "Runny Nose",
        keywords: &["runny nose", "nasal congestion", "stuffy nose", "blocked nose"],
    },
    StaticSymptom {
        id: SymptomId::MildCough,
        tier: SeverityTier::Mild,
        label: "Mild Cough",
        keywords: &["mild cough", "cough", "slight cough", "little cough"],
    },
    StaticSymptom {
        id: SymptomId::Fatigue,
        tier: SeverityTier::Mild,
        label: "Fatigue",
        keywords: &["fatigue", "tired", "exhausted", "weakness", "weak", "lethargic"],
    },
    StaticSymptom {
        id: SymptomId::BodyAche,
        tier: SeverityTier::Mild,
        label: "Body Ache",
        keywords: &["body ache", "body pain", "muscle pain", "aching all over"],
    },
    StaticSymptom {
        id: SymptomId::MildAbdominalPain,
        tier: SeverityTier::Mild,
        label: "Mild Abdominal Pain",
        keywords: &["mild abdominal pain", "mild stomach pain", "slight belly pain"],
    },
    StaticSymptom {
        id: SymptomId::SkinRash,
        tier: SeverityTier::Mild,
        label: "Skin Rash",
        keywords: &["skin rash", "rash", "itchy skin", "hives", "redness"],
    },
    StaticSymptom {
        id: SymptomId::MildBackPain,
        tier: SeverityTier::Mild,
        label: "Mild Back Pain",
        keywords: &["mild back pain", "back pain", "backache", "back hurts"],
    },
    StaticSymptom {
        id: SymptomId::MildJointPain,
        tier: SeverityTier::Mild,
        label: "Mild Joint Pain",
        keywords: &["mild joint pain", "joint pain", "joint ache", "knee pain", "elbow pain"],
    },
];

// ── Region table ────────────────────────────────────────────

const LIMB_SYMPTOMS: &[SymptomId] = &[
    SymptomId::SevereTrauma,
    SymptomId::UncontrolledBleeding,
    SymptomId::MildJointPain,
];

static REGION_TABLE: &[(&str, f32, f32, &[SymptomId])] = &[
    (
        "Head",
        50.0,
        8.0,
        &[
            SymptomId::SuddenConfusion,
            SymptomId::StrokeSymptoms,
            SymptomId::LossOfConsciousness,
            SymptomId::SevereHeadache,
            SymptomId::Dizziness,
            SymptomId::Migraine,
            SymptomId::MildHeadache,
        ],
    ),
    ("Nose", 50.0, 13.0, &[SymptomId::RunnyNose]),
    ("Throat", 50.0, 19.0, &[SymptomId::SoreThroat]),
    (
        "Chest",
        50.0,
        32.0,
        &[
            SymptomId::ChestPain,
            SymptomId::SevereBreathlessness,
            SymptomId::PersistentCough,
            SymptomId::ModerateBreathlessness,
            SymptomId::Palpitations,
            SymptomId::MildCough,
        ],
    ),
    ("Back", 50.0, 40.0, &[SymptomId::MildBackPain]),
    (
        "Abdomen",
        50.0,
        47.0,
        &[
            SymptomId::Vomiting,
            SymptomId::ModerateAbdominalPain,
            SymptomId::MildAbdominalPain,
        ],
    ),
    ("Left Arm", 24.0, 40.0, LIMB_SYMPTOMS),
    ("Right Arm", 76.0, 40.0, LIMB_SYMPTOMS),
    ("Left Leg", 42.0, 78.0, LIMB_SYMPTOMS),
    ("Right Leg", 58.0, 78.0, LIMB_SYMPTOMS),
];

/// Symptoms not tied to one region; rendered as a whole-body overlay.
static SYSTEMIC_SYMPTOMS: &[SymptomId] = &[
    SymptomId::Seizure,
    SymptomId::SevereAllergicReaction,
    SymptomId::PersistentFever,
    SymptomId::Dehydration,
    SymptomId::Fatigue,
    SymptomId::BodyAche,
    SymptomId::SkinRash,
];

// ── TriageReference ─────────────────────────────────────────

/// Serialized shape of a reference override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceFile {
    pub symptoms: Vec<SymptomDefinition>,
    pub regions: Vec<BodyRegion>,
    pub systemic: Vec<SymptomId>,
}

/// Immutable taxonomy, keyword dictionary and region table.
///
/// Built once at startup and shared by reference. Definitions are stored in
/// `SymptomId::ALL` order, which construction guarantees.
#[derive(Debug, Clone)]
pub struct TriageReference {
    definitions: Vec<SymptomDefinition>,
    regions: Vec<BodyRegion>,
    systemic: Vec<SymptomId>,
}

impl TriageReference {
    /// The reference taxonomy compiled into the crate.
    pub fn builtin() -> Self {
        let mut definitions: Vec<SymptomDefinition> = SYMPTOM_TABLE
            .iter()
            .map(|s| SymptomDefinition {
                id: s.id,
                tier: s.tier,
                keywords: s.keywords.iter().map(|k| k.to_string()).collect(),
                display_label: s.label.to_string(),
            })
            .collect();
        definitions.sort_by_key(|d| d.id);

        let regions = REGION_TABLE
            .iter()
            .map(|(name, x, y, symptoms)| BodyRegion {
                name: name.to_string(),
                anchor: Anchor { x: *x, y: *y },
                symptoms: symptoms.to_vec(),
            })
            .collect();

        let mut systemic = SYSTEMIC_SYMPTOMS.to_vec();
        systemic.sort();

        Self {
            definitions,
            regions,
            systemic,
        }
    }

    /// Build from an override file, validating every invariant.
    pub fn from_file_contents(file: ReferenceFile) -> Result<Self, TriageError> {
        let ReferenceFile {
            mut symptoms,
            regions,
            mut systemic,
        } = file;

        let mut seen = HashSet::new();
        for def in &symptoms {
            if !seen.insert(def.id) {
                return Err(TriageError::InvalidReference(format!(
                    "symptom {} defined more than once",
                    def.id
                )));
            }
            if def.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(TriageError::InvalidReference(format!(
                    "symptom {} has no keywords",
                    def.id
                )));
            }
        }
        if let Some(missing) = SymptomId::ALL.iter().find(|id| !seen.contains(*id)) {
            return Err(TriageError::InvalidReference(format!(
                "symptom {missing} has no definition"
            )));
        }

        let mut names = HashSet::new();
        for region in &regions {
            if !names.insert(region.name.as_str()) {
                return Err(TriageError::InvalidReference(format!(
                    "region {} defined more than once",
                    region.name
                )));
            }
        }

        for def in &mut symptoms {
            def.keywords = def
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.trim().is_empty())
                .collect();
        }
        symptoms.sort_by_key(|d| d.id);
        systemic.sort();
        systemic.dedup();

        Ok(Self {
            definitions: symptoms,
            regions,
            systemic,
        })
    }

    /// Parse and validate a JSON override.
    pub fn from_json(source: &str, json: &str) -> Result<Self, TriageError> {
        let file: ReferenceFile = serde_json::from_str(json)
            .map_err(|e| TriageError::ReferenceDataParse(source.to_string(), e.to_string()))?;
        Self::from_file_contents(file)
    }

    /// Load a JSON override from disk.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TriageError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let reference = Self::from_json(&path.display().to_string(), &json)?;
        tracing::info!(
            path = %path.display(),
            symptoms = reference.definitions.len(),
            regions = reference.regions.len(),
            "Loaded triage reference override"
        );
        Ok(reference)
    }

    /// Load the override when one exists, otherwise use the builtin table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, TriageError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => {
                tracing::info!("Using builtin triage reference");
                Ok(Self::builtin())
            }
        }
    }

    /// Snapshot suitable for writing an override file.
    pub fn to_file_contents(&self) -> ReferenceFile {
        ReferenceFile {
            symptoms: self.definitions.clone(),
            regions: self.regions.clone(),
            systemic: self.systemic.clone(),
        }
    }

    // ── Taxonomy queries ────────────────────────────────────

    /// Definition for an id. Infallible: construction checked completeness.
    pub fn definition(&self, id: SymptomId) -> &SymptomDefinition {
        &self.definitions[id.index()]
    }

    /// Look up a definition by wire key.
    pub fn lookup(&self, key: &str) -> Result<&SymptomDefinition, TriageError> {
        let id: SymptomId = key.parse()?;
        Ok(self.definition(id))
    }

    pub fn tier_of(&self, id: SymptomId) -> SeverityTier {
        self.definition(id).tier
    }

    /// Every id, grouped by tier with critical first.
    pub fn all_ids(&self) -> Vec<SymptomId> {
        SeverityTier::DESCENDING
            .iter()
            .flat_map(|tier| self.ids_in_tier(*tier))
            .collect()
    }

    pub fn ids_in_tier(&self, tier: SeverityTier) -> Vec<SymptomId> {
        self.definitions
            .iter()
            .filter(|d| d.tier == tier)
            .map(|d| d.id)
            .collect()
    }

    pub fn definitions(&self) -> &[SymptomDefinition] {
        &self.definitions
    }

    // ── Region queries ──────────────────────────────────────

    pub fn regions(&self) -> &[BodyRegion] {
        &self.regions
    }

    pub fn systemic_symptoms(&self) -> &[SymptomId] {
        &self.systemic
    }

    pub fn is_systemic(&self, id: SymptomId) -> bool {
        self.systemic.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defines_every_symptom_once() {
        let reference = TriageReference::builtin();
        assert_eq!(reference.definitions().len(), SymptomId::COUNT);
        for id in SymptomId::ALL {
            assert_eq!(reference.definition(id).id, id);
        }
    }

    #[test]
    fn builtin_tier_counts() {
        let reference = TriageReference::builtin();
        assert_eq!(reference.ids_in_tier(SeverityTier::Critical).len(), 9);
        assert_eq!(reference.ids_in_tier(SeverityTier::Moderate).len(), 10);
        assert_eq!(reference.ids_in_tier(SeverityTier::Mild).len(), 10);
    }

    #[test]
    fn all_ids_groups_critical_first() {
        let reference = TriageReference::builtin();
        let ids = reference.all_ids();
        assert_eq!(ids.len(), SymptomId::COUNT);
        assert_eq!(ids.first(), Some(&SymptomId::ChestPain));
        assert_eq!(ids.last(), Some(&SymptomId::MildJointPain));
        let tiers: Vec<SeverityTier> = ids.iter().map(|id| reference.tier_of(*id)).collect();
        assert!(tiers.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn lookup_known_key() {
        let reference = TriageReference::builtin();
        let def = reference.lookup("chest_pain").unwrap();
        assert_eq!(def.tier, SeverityTier::Critical);
        assert_eq!(def.display_label, "Chest Pain");
    }

    #[test]
    fn lookup_unknown_key_fails() {
        let reference = TriageReference::builtin();
        assert!(matches!(
            reference.lookup("hiccups"),
            Err(TriageError::UnknownSymptom(_))
        ));
    }

    #[test]
    fn builtin_keywords_are_lowercase() {
        let reference = TriageReference::builtin();
        for def in reference.definitions() {
            assert!(!def.keywords.is_empty());
            for kw in &def.keywords {
                assert_eq!(kw, &kw.to_lowercase(), "{kw} in {}", def.id);
            }
        }
    }

    #[test]
    fn every_symptom_is_localized_or_systemic() {
        let reference = TriageReference::builtin();
        for id in SymptomId::ALL {
            let in_region = reference.regions().iter().any(|r| r.symptoms.contains(&id));
            assert!(in_region || reference.is_systemic(id), "{id} unplaced");
        }
    }

    #[test]
    fn trauma_maps_to_both_arms() {
        let reference = TriageReference::builtin();
        for name in ["Left Arm", "Right Arm"] {
            let region = reference.regions().iter().find(|r| r.name == name).unwrap();
            assert!(region.symptoms.contains(&SymptomId::SevereTrauma));
        }
    }

    #[test]
    fn json_round_trip_preserves_reference() {
        let reference = TriageReference::builtin();
        let json = serde_json::to_string(&reference.to_file_contents()).unwrap();
        let loaded = TriageReference::from_json("inline", &json).unwrap();
        assert_eq!(loaded.definitions(), reference.definitions());
        assert_eq!(loaded.regions(), reference.regions());
        assert_eq!(loaded.systemic_symptoms(), reference.systemic_symptoms());
    }

    #[test]
    fn override_missing_symptom_is_rejected() {
        let mut file = TriageReference::builtin().to_file_contents();
        file.symptoms.retain(|d| d.id != SymptomId::Migraine);
        let err = TriageReference::from_file_contents(file).unwrap_err();
        assert!(err.to_string().contains("migraine"));
    }

    #[test]
    fn override_duplicate_symptom_is_rejected() {
        let mut file = TriageReference::builtin().to_file_contents();
        let mut dup = file.symptoms[0].clone();
        dup.tier = SeverityTier::Mild;
        file.symptoms.push(dup);
        assert!(matches!(
            TriageReference::from_file_contents(file),
            Err(TriageError::InvalidReference(_))
        ));
    }

    #[test]
    fn override_duplicate_region_is_rejected() {
        let mut file = TriageReference::builtin().to_file_contents();
        let dup = file.regions[0].clone();
        file.regions.push(dup);
        assert!(matches!(
            TriageReference::from_file_contents(file),
            Err(TriageError::InvalidReference(_))
        ));
    }

    #[test]
    fn override_keywords_are_lowercased() {
        let mut file = TriageReference::builtin().to_file_contents();
        file.symptoms[0].keywords = vec!["CHEST Tightness".into(), "  ".into()];
        let reference = TriageReference::from_file_contents(file).unwrap();
        assert_eq!(
            reference.definition(SymptomId::ChestPain).keywords,
            vec!["chest tightness".to_string()]
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            TriageReference::from_json("bad.json", "{not json"),
            Err(TriageError::ReferenceDataParse(_, _))
        ));
    }

    #[test]
    fn load_reads_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage_reference.json");
        let mut file = TriageReference::builtin().to_file_contents();
        file.symptoms[0].keywords.push("crushing chest".into());
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let reference = TriageReference::load(&path).unwrap();
        assert!(reference
            .definition(SymptomId::ChestPain)
            .keywords
            .contains(&"crushing chest".to_string()));
    }

    #[test]
    fn load_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TriageReference::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TriageError::ReferenceDataLoad(_, _)));
    }

    #[test]
    fn load_or_builtin_falls_back_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let reference = TriageReference::load_or_builtin(Some(&path)).unwrap();
        assert_eq!(reference.definitions().len(), SymptomId::COUNT);
        let reference = TriageReference::load_or_builtin(None).unwrap();
        assert_eq!(reference.regions().len(), 10);
    }
}
