use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::types::SymptomId;

/// Per-case checklist: one flag for every id in the taxonomy.
///
/// Detection passes only ever raise flags (`merge`); lowering a flag takes
/// an explicit `set(id, false)` from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SymptomId, bool>", into = "BTreeMap<SymptomId, bool>")]
pub struct SymptomSet {
    flags: [bool; SymptomId::COUNT],
}

impl SymptomSet {
    /// All flags false.
    pub fn new() -> Self {
        Self {
            flags: [false; SymptomId::COUNT],
        }
    }

    pub fn from_active(active: &BTreeSet<SymptomId>) -> Self {
        let mut set = Self::new();
        set.merge(active);
        set
    }

    pub fn is_set(&self, id: SymptomId) -> bool {
        self.flags[id.index()]
    }

    /// Explicit user edit; the only way a flag goes back to false.
    pub fn set(&mut self, id: SymptomId, value: bool) {
        self.flags[id.index()] = value;
    }

    /// Additive OR of newly detected symptoms. Returns the ids that flipped
    /// from false to true.
    pub fn merge(&mut self, detected: &BTreeSet<SymptomId>) -> BTreeSet<SymptomId> {
        let mut raised = BTreeSet::new();
        for id in detected {
            if !self.flags[id.index()] {
                self.flags[id.index()] = true;
                raised.insert(*id);
            }
        }
        raised
    }

    pub fn active(&self) -> BTreeSet<SymptomId> {
        SymptomId::ALL
            .iter()
            .copied()
            .filter(|id| self.is_set(*id))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// `(id, flag)` for the full taxonomy in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SymptomId, bool)> + '_ {
        SymptomId::ALL.iter().map(|id| (*id, self.is_set(*id)))
    }
}

impl Default for SymptomSet {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<SymptomId, bool>> for SymptomSet {
    fn from(map: BTreeMap<SymptomId, bool>) -> Self {
        let mut set = Self::new();
        for (id, value) in map {
            set.set(id, value);
        }
        set
    }
}

impl From<SymptomSet> for BTreeMap<SymptomId, bool> {
    fn from(set: SymptomSet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[SymptomId]) -> BTreeSet<SymptomId> {
        list.iter().copied().collect()
    }

    #[test]
    fn new_set_has_every_key_false() {
        let set = SymptomSet::new();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), SymptomId::COUNT);
        assert!(set.iter().all(|(_, v)| !v));
    }

    #[test]
    fn merge_is_additive() {
        let mut set = SymptomSet::new();
        set.set(SymptomId::Seizure, true);
        let raised = set.merge(&ids(&[SymptomId::Fatigue]));
        assert_eq!(raised, ids(&[SymptomId::Fatigue]));
        assert_eq!(set.active(), ids(&[SymptomId::Seizure, SymptomId::Fatigue]));
    }

    #[test]
    fn empty_merge_keeps_manual_flags() {
        let mut set = SymptomSet::new();
        set.set(SymptomId::Seizure, true);
        let raised = set.merge(&BTreeSet::new());
        assert!(raised.is_empty());
        assert!(set.is_set(SymptomId::Seizure));
    }

    #[test]
    fn merge_never_lowers_a_flag() {
        let prior = ids(&[SymptomId::ChestPain, SymptomId::Dizziness, SymptomId::RunnyNose]);
        let detected_sets = [
            ids(&[]),
            ids(&[SymptomId::ChestPain]),
            ids(&[SymptomId::Migraine, SymptomId::SkinRash]),
            SymptomId::ALL.iter().copied().collect(),
        ];
        for detected in detected_sets {
            let mut set = SymptomSet::from_active(&prior);
            set.merge(&detected);
            let active = set.active();
            assert!(prior.is_subset(&active));
            assert!(detected.is_subset(&active));
            assert_eq!(active, prior.union(&detected).copied().collect());
        }
    }

    #[test]
    fn merge_reports_only_new_flags() {
        let mut set = SymptomSet::from_active(&ids(&[SymptomId::ChestPain]));
        let raised = set.merge(&ids(&[SymptomId::ChestPain, SymptomId::Vomiting]));
        assert_eq!(raised, ids(&[SymptomId::Vomiting]));
    }

    #[test]
    fn explicit_toggle_can_clear() {
        let mut set = SymptomSet::from_active(&ids(&[SymptomId::MildCough]));
        set.set(SymptomId::MildCough, false);
        assert!(set.is_empty());
    }

    #[test]
    fn serializes_as_full_flat_map() {
        let set = SymptomSet::from_active(&ids(&[SymptomId::ChestPain]));
        let value = serde_json::to_value(&set).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), SymptomId::COUNT);
        assert_eq!(obj["chest_pain"], serde_json::Value::Bool(true));
        assert_eq!(obj["mild_cough"], serde_json::Value::Bool(false));
    }

    #[test]
    fn deserializes_partial_map() {
        let set: SymptomSet =
            serde_json::from_str(r#"{"seizure": true, "fatigue": false}"#).unwrap();
        assert_eq!(set.active(), ids(&[SymptomId::Seizure]));
    }
}
