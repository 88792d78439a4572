//! Per-case triage session: the only component with mutable state.
//!
//! Lifecycle: `Empty -> Detecting -> Reviewed -> Submitted`. Detection passes
//! are bracketed by a `DetectionTicket` tagged with the case id, so a result
//! that arrives after the case was reset, replaced or submitted is dropped
//! instead of leaking into the next patient.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::{recompute_assessment, TriageAssessment};
use super::document::extract_patient_name;
use super::matcher::{critical_override, match_symptoms, scan_keyword_hits, CriticalOverride, KeywordHit};
use super::reference::TriageReference;
use super::symptom_set::SymptomSet;
use super::types::{SymptomId, TriageError};
use super::vitals::{CompleteVitals, RiskPayload, Vitals};

// ═══════════════════════════════════════════
// State and detection types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Fresh case, nothing recorded.
    Empty,
    /// A pass is in flight, or detected symptoms await review.
    Detecting,
    /// The user has edited or confirmed the checklist.
    Reviewed,
    /// Handed to routing. Terminal.
    Submitted,
}

/// Where the text of a detection pass comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionSource {
    VoiceTranscript,
    /// Narration typed by the clinician instead of dictated.
    TypedNarration,
    Document { patient_name_hint: Option<String> },
}

impl DetectionSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VoiceTranscript => "voice",
            Self::TypedNarration => "typed",
            Self::Document { .. } => "document",
        }
    }

    /// Whether critical phrases in this text force emergency routing. Only
    /// live narration of the presenting case does; documents carry history.
    pub fn screens_critical_phrases(&self) -> bool {
        matches!(self, Self::VoiceTranscript | Self::TypedNarration)
    }
}

/// Handle for one in-flight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionTicket {
    pub case_id: Uuid,
    pub pass_id: Uuid,
}

/// Error reported by a transcription or document-analysis collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionFailure(pub String);

/// What a successful pass changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub pass_id: Uuid,
    pub source: DetectionSource,
    pub matched: BTreeSet<SymptomId>,
    /// Subset of `matched` that was not already set.
    pub newly_set: BTreeSet<SymptomId>,
    pub keyword_hits: Vec<KeywordHit>,
    pub critical_override: Option<CriticalOverride>,
    pub patient_name_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscardReason {
    /// The session moved on to another case.
    CaseChanged,
    /// The ticket does not belong to the pass currently in flight.
    NotPending,
    /// The case was submitted while the pass was in flight.
    SessionSubmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DetectionOutcome {
    Applied(DetectionReport),
    Discarded(DiscardReason),
}

struct PendingPass {
    ticket: DetectionTicket,
    source: DetectionSource,
    prior_state: SessionState,
}

/// Immutable record of a submitted case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedTriage {
    pub case_id: Uuid,
    pub patient_id: String,
    pub assessment: TriageAssessment,
    pub vitals: CompleteVitals,
    pub payload: RiskPayload,
    pub critical_override: Option<CriticalOverride>,
    pub patient_name_hint: Option<String>,
    pub submitted_at: NaiveDateTime,
}

// ═══════════════════════════════════════════
// TriageSession
// ═══════════════════════════════════════════

pub struct TriageSession {
    reference: Arc<TriageReference>,
    case_id: Uuid,
    state: SessionState,
    symptoms: SymptomSet,
    vitals: Vitals,
    patient_id: Option<String>,
    pending: Option<PendingPass>,
    critical_override: Option<CriticalOverride>,
    patient_name_hint: Option<String>,
    submitted: Option<SubmittedTriage>,
}

impl TriageSession {
    pub fn new(reference: Arc<TriageReference>) -> Self {
        Self {
            reference,
            case_id: Uuid::new_v4(),
            state: SessionState::Empty,
            symptoms: SymptomSet::new(),
            vitals: Vitals::default(),
            patient_id: None,
            pending: None,
            critical_override: None,
            patient_name_hint: None,
            submitted: None,
        }
    }

    // ── Read access ─────────────────────────────────────

    pub fn case_id(&self) -> Uuid {
        self.case_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn symptoms(&self) -> &SymptomSet {
        &self.symptoms
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Registry id of the patient this case belongs to.
    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn reference(&self) -> &TriageReference {
        &self.reference
    }

    pub fn in_flight(&self) -> Option<DetectionTicket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    pub fn critical_override(&self) -> Option<&CriticalOverride> {
        self.critical_override.as_ref()
    }

    pub fn patient_name_hint(&self) -> Option<&str> {
        self.patient_name_hint.as_deref()
    }

    pub fn submitted(&self) -> Option<&SubmittedTriage> {
        self.submitted.as_ref()
    }

    /// Current assessment, recomputed from the checklist.
    pub fn assessment(&self) -> TriageAssessment {
        recompute_assessment(&self.symptoms, &self.reference)
    }

    // ── Detection passes ────────────────────────────────

    /// Start a pass. Only one may be in flight per case.
    pub fn begin_detection(&mut self, source: DetectionSource) -> Result<DetectionTicket, TriageError> {
        self.ensure_open()?;
        if self.pending.is_some() {
            return Err(TriageError::DetectionInFlight(self.case_id));
        }

        let ticket = DetectionTicket {
            case_id: self.case_id,
            pass_id: Uuid::new_v4(),
        };
        tracing::debug!(
            case_id = %self.case_id,
            pass_id = %ticket.pass_id,
            source = source.kind(),
            "Detection pass started"
        );
        self.pending = Some(PendingPass {
            ticket,
            source,
            prior_state: self.state,
        });
        self.state = SessionState::Detecting;
        Ok(ticket)
    }

    /// Finish a pass with the collaborator's text or error.
    ///
    /// Stale tickets are discarded without touching the checklist. A failed
    /// pass restores the state it started from and returns `DetectionFailed`.
    pub fn complete_detection(
        &mut self,
        ticket: DetectionTicket,
        result: Result<String, DetectionFailure>,
    ) -> Result<DetectionOutcome, TriageError> {
        if let Some(reason) = self.stale_reason(&ticket) {
            tracing::warn!(
                case_id = %self.case_id,
                ticket_case_id = %ticket.case_id,
                pass_id = %ticket.pass_id,
                reason = ?reason,
                "Discarding stale detection result"
            );
            return Ok(DetectionOutcome::Discarded(reason));
        }
        let Some(pending) = self.pending.take() else {
            return Ok(DetectionOutcome::Discarded(DiscardReason::NotPending));
        };

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return Err(self.fail_detection(&pending, "collaborator returned no text")),
            Err(DetectionFailure(reason)) => return Err(self.fail_detection(&pending, &reason)),
        };

        let matched = match_symptoms(&text, &self.reference);
        let keyword_hits = scan_keyword_hits(&text, &self.reference);
        let newly_set = self.symptoms.merge(&matched);

        let found_override = if pending.source.screens_critical_phrases() {
            critical_override(&text)
        } else {
            None
        };
        if let Some(found) = &found_override {
            tracing::warn!(
                case_id = %self.case_id,
                phrase = found.phrase,
                "Critical phrase detected, case routes to emergency"
            );
            if self.critical_override.is_none() {
                self.critical_override = Some(found.clone());
            }
        }

        let patient_name_hint = match &pending.source {
            DetectionSource::Document { patient_name_hint } => patient_name_hint
                .clone()
                .filter(|n| !n.trim().is_empty())
                .or_else(|| extract_patient_name(&text)),
            DetectionSource::VoiceTranscript | DetectionSource::TypedNarration => None,
        };
        if patient_name_hint.is_some() {
            self.patient_name_hint = patient_name_hint.clone();
        }

        self.state = if self.state == SessionState::Reviewed
            || pending.prior_state == SessionState::Reviewed
        {
            SessionState::Reviewed
        } else {
            SessionState::Detecting
        };

        tracing::info!(
            case_id = %self.case_id,
            pass_id = %ticket.pass_id,
            source = pending.source.kind(),
            matched = matched.len(),
            newly_set = newly_set.len(),
            state = ?self.state,
            "Detection pass applied"
        );
        tracing::debug!(case_id = %self.case_id, symptoms = ?matched, "Matched symptom ids");

        Ok(DetectionOutcome::Applied(DetectionReport {
            pass_id: ticket.pass_id,
            source: pending.source,
            matched,
            newly_set,
            keyword_hits,
            critical_override: found_override,
            patient_name_hint,
        }))
    }

    /// OR-merge symptoms detected outside a pass, e.g. a document scanned
    /// before the patient was confirmed.
    pub fn apply_detected(
        &mut self,
        detected: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, TriageError> {
        self.ensure_open()?;
        let newly_set = self.symptoms.merge(detected);
        if self.state == SessionState::Empty && !detected.is_empty() {
            self.state = SessionState::Detecting;
        }
        Ok(newly_set)
    }

    /// Drop an in-flight pass whose collaborator went away without answering.
    /// Returns `false` when the ticket is not the pending one.
    pub fn abandon_detection(&mut self, ticket: DetectionTicket) -> bool {
        if self.stale_reason(&ticket).is_some() {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if self.state != SessionState::Reviewed {
            self.state = pending.prior_state;
        }
        tracing::debug!(case_id = %self.case_id, pass_id = %ticket.pass_id, "Detection pass abandoned");
        true
    }

    fn stale_reason(&self, ticket: &DetectionTicket) -> Option<DiscardReason> {
        if ticket.case_id != self.case_id {
            return Some(DiscardReason::CaseChanged);
        }
        if self.state == SessionState::Submitted {
            return Some(DiscardReason::SessionSubmitted);
        }
        match &self.pending {
            Some(p) if p.ticket == *ticket => None,
            _ => Some(DiscardReason::NotPending),
        }
    }

    fn fail_detection(&mut self, pending: &PendingPass, reason: &str) -> TriageError {
        // A user edit during the pass keeps the session in Reviewed.
        if self.state != SessionState::Reviewed {
            self.state = pending.prior_state;
        }
        tracing::warn!(
            case_id = %self.case_id,
            pass_id = %pending.ticket.pass_id,
            source = pending.source.kind(),
            state = ?self.state,
            "Detection pass failed"
        );
        TriageError::DetectionFailed(reason.to_string())
    }

    // ── Patient selection ───────────────────────────────

    /// Attach the case to a registry patient.
    ///
    /// Choosing a different patient than the one already selected starts a
    /// new case, discarding the checklist and any pass in flight. The first
    /// selection keeps work recorded so far, e.g. a document scanned before
    /// the patient was confirmed.
    pub fn select_patient(&mut self, patient_id: &str) -> Result<Uuid, TriageError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(TriageError::InvalidPatientId(patient_id.to_string()));
        }
        if self.patient_id.as_deref() == Some(patient_id) {
            return Ok(self.case_id);
        }
        if self.patient_id.is_some() || self.state == SessionState::Submitted {
            self.reset();
        }
        self.patient_id = Some(patient_id.to_string());
        tracing::info!(case_id = %self.case_id, "Patient selected");
        Ok(self.case_id)
    }

    // ── User edits ──────────────────────────────────────

    /// Explicit checkbox edit. Allowed while a pass is in flight.
    pub fn toggle(&mut self, id: SymptomId, value: bool) -> Result<(), TriageError> {
        self.ensure_open()?;
        self.symptoms.set(id, value);
        self.state = SessionState::Reviewed;
        Ok(())
    }

    /// Mark the checklist as reviewed without changing it.
    pub fn confirm_review(&mut self) -> Result<(), TriageError> {
        self.ensure_open()?;
        self.state = SessionState::Reviewed;
        Ok(())
    }

    pub fn record_vitals(&mut self, vitals: Vitals) -> Result<(), TriageError> {
        self.ensure_open()?;
        self.vitals = vitals;
        Ok(())
    }

    // ── Submission and reset ────────────────────────────

    /// Freeze the case. A selected patient and all four vitals are required;
    /// an empty checklist is a valid pending assessment.
    pub fn submit(&mut self) -> Result<SubmittedTriage, TriageError> {
        self.ensure_open()?;
        let (patient_id, vitals) = match (&self.patient_id, self.vitals.require_complete()) {
            (Some(patient_id), Ok(vitals)) => (patient_id.clone(), vitals),
            (patient_id, _) => {
                let mut missing = Vec::new();
                if patient_id.is_none() {
                    missing.push("patient_id");
                }
                missing.extend(self.vitals.missing_fields());
                let err = TriageError::EmptySubmission { missing };
                tracing::warn!(case_id = %self.case_id, error = %err, "Submission rejected");
                return Err(err);
            }
        };

        let assessment = self.assessment();
        let payload = RiskPayload {
            case_id: self.case_id,
            patient_id: patient_id.clone(),
            vitals,
            symptoms: self.symptoms.clone(),
            emergency_override: self.critical_override.is_some(),
        };
        let submitted = SubmittedTriage {
            case_id: self.case_id,
            patient_id,
            assessment,
            vitals,
            payload,
            critical_override: self.critical_override.clone(),
            patient_name_hint: self.patient_name_hint.clone(),
            submitted_at: chrono::Local::now().naive_local(),
        };

        if let Some(p) = self.pending.take() {
            tracing::debug!(
                case_id = %self.case_id,
                pass_id = %p.ticket.pass_id,
                "Submitted with a pass in flight; its result will be discarded"
            );
        }
        self.state = SessionState::Submitted;
        self.submitted = Some(submitted.clone());

        tracing::info!(
            case_id = %self.case_id,
            active = self.symptoms.active_count(),
            severity = ?submitted.assessment.overall_severity,
            emergency_override = submitted.payload.emergency_override,
            "Triage submitted"
        );
        Ok(submitted)
    }

    /// Start over for a new patient. Any in-flight result is dropped on arrival.
    pub fn reset(&mut self) -> Uuid {
        let previous = self.case_id;
        self.case_id = Uuid::new_v4();
        self.state = SessionState::Empty;
        self.symptoms = SymptomSet::new();
        self.vitals = Vitals::default();
        self.patient_id = None;
        self.pending = None;
        self.critical_override = None;
        self.patient_name_hint = None;
        self.submitted = None;
        tracing::info!(previous_case_id = %previous, case_id = %self.case_id, "Triage session reset");
        self.case_id
    }

    fn ensure_open(&self) -> Result<(), TriageError> {
        if self.state == SessionState::Submitted {
            Err(TriageError::SessionClosed(self.case_id))
        } else {
            Ok(())
        }
    }
}
