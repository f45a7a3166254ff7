//! Wizard session — the resumable record of onboarding progress.
//!
//! Created when onboarding begins, mutated only by the controller's
//! transition functions, persisted through a [`crate::store::SessionStore`]
//! after every mutation, and discarded on completion or abandonment.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::types::{
    BehavioralResponse, CalculateResponse, DemographicsResponse, KycDocument,
    QuestionnaireResponse, UserProfile,
};
use crate::error::WizardError;

use super::payload::StepPayload;
use super::step::WizardStep;

/// Lifecycle of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    NotStarted,
    /// Passed local validation; used for steps that advance without a
    /// submission.
    Valid,
    /// A submission for this step is in flight.
    Submitting,
    /// The backend acknowledged the submission. Terminal for the step; its
    /// payload is immutable from here on.
    Submitted,
    /// The last submission failed. The payload is kept for retry.
    Failed,
}

/// Backend acknowledgments recorded as each step lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc: Option<KycDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaire: Option<QuestionnaireResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<DemographicsResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral: Option<BehavioralResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_profile: Option<CalculateResponse>,
}

/// All state for one onboarding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSession {
    pub id: Uuid,
    pub user_id: i64,
    /// The step currently shown.
    pub current: WizardStep,
    /// Furthest step ever reached; resumption lands here, not at step 1.
    pub highest: WizardStep,
    #[serde(default)]
    pub statuses: BTreeMap<WizardStep, StepStatus>,
    /// Entered payloads, kept across retreat, failure, and resume.
    #[serde(default)]
    pub answers: BTreeMap<WizardStep, StepPayload>,
    #[serde(default)]
    pub scores: ScoreBook,
    /// Last submission error, for re-display after resume.
    #[serde(default)]
    pub last_error: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WizardSession {
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            current: WizardStep::PersonalInfo,
            highest: WizardStep::PersonalInfo,
            statuses: BTreeMap::new(),
            answers: BTreeMap::new(),
            scores: ScoreBook::default(),
            last_error: None,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self, step: WizardStep) -> StepStatus {
        self.statuses.get(&step).copied().unwrap_or_default()
    }

    pub fn set_status(&mut self, step: WizardStep, status: StepStatus) {
        self.statuses.insert(step, status);
        self.touch();
    }

    pub fn is_submitted(&self, step: WizardStep) -> bool {
        self.status(step) == StepStatus::Submitted
    }

    pub fn payload(&self, step: WizardStep) -> Option<&StepPayload> {
        self.answers.get(&step)
    }

    /// Store (or overwrite) the draft payload for its step. Rejected once
    /// the step is submitted.
    pub fn put_draft(&mut self, payload: StepPayload) -> Result<(), WizardError> {
        let step = payload.step();
        if self.is_submitted(step) {
            return Err(WizardError::PayloadLocked(step));
        }
        self.answers.insert(step, payload);
        self.touch();
        Ok(())
    }

    /// Move to `step`, raising the high-water mark when walking forward.
    pub fn advance_to(&mut self, step: WizardStep) {
        self.current = step;
        if step.number() > self.highest.number() {
            self.highest = step;
        }
        self.touch();
    }

    /// Land on the furthest step previously reached. A submission that was
    /// in flight when the session was last saved is treated as failed so the
    /// step can be retried.
    pub fn resume(&mut self) {
        self.current = self.highest;
        let interrupted: Vec<WizardStep> = self
            .statuses
            .iter()
            .filter(|(_, status)| **status == StepStatus::Submitting)
            .map(|(step, _)| *step)
            .collect();
        for step in interrupted {
            tracing::warn!(step = %step, "Submission was interrupted; marking for retry");
            self.set_status(step, StepStatus::Failed);
        }
        self.touch();
    }

    /// Fraction of steps passed, for the progress header.
    pub fn progress(&self) -> f64 {
        self.current.number() as f64 / WizardStep::ALL.len() as f64
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
