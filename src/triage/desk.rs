//! Shared front door for one triage station.
//!
//! `TriageDesk` owns the session behind a `Mutex` so voice capture, document
//! upload and checkbox edits can run concurrently. The lock is never held
//! across a collaborator await, so a user toggle always lands while a
//! transcription is pending.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::TriageAssessment;
use super::matcher::CRITICAL_OVERRIDE_LEVEL;
use super::reference::TriageReference;
use super::session::{
    DetectionFailure, DetectionOutcome, DetectionSource, DetectionTicket, SessionState,
    SubmittedTriage, TriageSession,
};
use super::symptom_set::SymptomSet;
use super::types::{Department, SymptomId, TriageError};
use super::vitals::{RiskPayload, Vitals};

// ──── Routing seam ────

/// Department and risk level returned for a submitted case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub department: Department,
    pub predicted_risk: String,
    pub confidence: Option<f32>,
    /// Set when a critical phrase bypassed the routing service.
    #[serde(default)]
    pub overridden: bool,
}

impl RoutingDecision {
    fn critical_override() -> Self {
        Self {
            department: Department::Emergency,
            predicted_risk: CRITICAL_OVERRIDE_LEVEL.to_string(),
            confidence: Some(1.0),
            overridden: true,
        }
    }
}

/// External risk-prediction and department-routing service.
pub trait RiskService: Send + Sync {
    fn route(&self, payload: &RiskPayload) -> Result<RoutingDecision, TriageError>;
}

/// A submitted case together with where it was sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageOutcome {
    pub submitted: SubmittedTriage,
    pub routing: RoutingDecision,
}

// ──── Desk ────

pub struct TriageDesk {
    reference: Arc<TriageReference>,
    session: Mutex<TriageSession>,
}

impl TriageDesk {
    pub fn new(reference: Arc<TriageReference>) -> Self {
        let session = TriageSession::new(Arc::clone(&reference));
        tracing::info!(case_id = %session.case_id(), "Triage desk opened");
        Self {
            reference,
            session: Mutex::new(session),
        }
    }

    pub fn reference(&self) -> &TriageReference {
        &self.reference
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, TriageSession>, TriageError> {
        self.session.lock().map_err(|_| TriageError::LockPoisoned)
    }

    // ── Snapshots ──

    pub fn case_id(&self) -> Result<Uuid, TriageError> {
        Ok(self.lock_session()?.case_id())
    }

    pub fn state(&self) -> Result<SessionState, TriageError> {
        Ok(self.lock_session()?.state())
    }

    pub fn symptoms(&self) -> Result<SymptomSet, TriageError> {
        Ok(self.lock_session()?.symptoms().clone())
    }

    pub fn in_flight(&self) -> Result<Option<DetectionTicket>, TriageError> {
        Ok(self.lock_session()?.in_flight())
    }

    pub fn assessment(&self) -> Result<TriageAssessment, TriageError> {
        Ok(self.lock_session()?.assessment())
    }

    pub fn patient_name_hint(&self) -> Result<Option<String>, TriageError> {
        Ok(self.lock_session()?.patient_name_hint().map(str::to_string))
    }

    // ── Detection ──

    /// Run one detection pass. `pass` yields the transcript or extracted
    /// document text. If the returned future is dropped before the
    /// collaborator answers, the pass is abandoned and the slot freed.
    pub async fn detect<F>(
        &self,
        source: DetectionSource,
        pass: F,
    ) -> Result<DetectionOutcome, TriageError>
    where
        F: Future<Output = Result<String, DetectionFailure>>,
    {
        let ticket = self.lock_session()?.begin_detection(source)?;
        let mut guard = PassGuard {
            desk: self,
            ticket: Some(ticket),
        };

        let result = pass.await;

        guard.ticket = None;
        self.lock_session()?.complete_detection(ticket, result)
    }

    pub fn apply_detected(
        &self,
        detected: &BTreeSet<SymptomId>,
    ) -> Result<BTreeSet<SymptomId>, TriageError> {
        self.lock_session()?.apply_detected(detected)
    }

    // ── Edits ──

    /// Attach the case to a registry patient; a different patient starts a
    /// new case.
    pub fn select_patient(&self, patient_id: &str) -> Result<Uuid, TriageError> {
        self.lock_session()?.select_patient(patient_id)
    }

    pub fn toggle(&self, id: SymptomId, value: bool) -> Result<(), TriageError> {
        self.lock_session()?.toggle(id, value)
    }

    /// Toggle by wire key, e.g. `"chest_pain"`.
    pub fn toggle_key(&self, key: &str, value: bool) -> Result<(), TriageError> {
        let id = self.reference.lookup(key)?.id;
        self.toggle(id, value)
    }

    pub fn confirm_review(&self) -> Result<(), TriageError> {
        self.lock_session()?.confirm_review()
    }

    pub fn record_vitals(&self, vitals: Vitals) -> Result<(), TriageError> {
        self.lock_session()?.record_vitals(vitals)
    }

    pub fn reset(&self) -> Result<Uuid, TriageError> {
        Ok(self.lock_session()?.reset())
    }

    // ── Submission ──

    /// Freeze the case and route it. A case flagged by a critical phrase goes
    /// to Emergency without consulting the service.
    ///
    /// If routing fails the case stays submitted; retry with
    /// [`TriageDesk::route_submitted`].
    pub fn submit(&self, service: &dyn RiskService) -> Result<TriageOutcome, TriageError> {
        let submitted = self.lock_session()?.submit()?;
        let routing = route(&submitted, service)?;
        Ok(TriageOutcome {
            submitted,
            routing,
        })
    }

    /// Route the already-submitted case again.
    pub fn route_submitted(&self, service: &dyn RiskService) -> Result<TriageOutcome, TriageError> {
        let submitted = {
            let session = self.lock_session()?;
            session
                .submitted()
                .cloned()
                .ok_or(TriageError::NotSubmitted(session.case_id()))?
        };
        let routing = route(&submitted, service)?;
        Ok(TriageOutcome {
            submitted,
            routing,
        })
    }
}

fn route(
    submitted: &SubmittedTriage,
    service: &dyn RiskService,
) -> Result<RoutingDecision, TriageError> {
    if let Some(found) = &submitted.critical_override {
        tracing::warn!(
            case_id = %submitted.case_id,
            phrase = found.phrase,
            "Critical override, routing to Emergency"
        );
        return Ok(RoutingDecision::critical_override());
    }

    let decision = service.route(&submitted.payload).inspect_err(|e| {
        tracing::warn!(case_id = %submitted.case_id, error = %e, "Routing failed");
    })?;
    tracing::info!(
        case_id = %submitted.case_id,
        department = decision.department.as_str(),
        risk = %decision.predicted_risk,
        "Case routed"
    );
    Ok(decision)
}

/// Abandons the pass if `detect` is dropped mid-await.
struct PassGuard<'a> {
    desk: &'a TriageDesk,
    ticket: Option<DetectionTicket>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            if let Ok(mut session) = self.desk.session.lock() {
                session.abandon_detection(ticket);
            }
        }
    }
}
