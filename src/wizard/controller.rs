//! WizardController — sequences steps, submissions, and failure recovery.
//!
//! The controller is the only writer of the session. `advance` runs the
//! step's validator, then applies the step's fixed policy: local-only steps
//! move on without touching the network; remote steps issue exactly one
//! submission and move on only when the backend acknowledges it. A failed
//! submission marks the step `failed`, keeps the entered payload, and leaves
//! the session exactly where it was so the user can retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::api::OnboardingApi;
use crate::api::types::{
    BehavioralData, Demographics, KycUpload, PersonalInfo, QuestionnaireRequest,
};
use crate::error::WizardError;
use crate::store::SessionStore;

use super::payload::StepPayload;
use super::session::{StepStatus, WizardSession};
use super::step::{Submission, WizardStep};
use super::validate;

/// Outcome of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The session moved to this step.
    Moved(WizardStep),
    /// The submission resolved after the user navigated off the step; its
    /// result was discarded and the session was left untouched.
    Stale,
}

/// A submission the current step's policy requires.
enum Pending<'a> {
    Profile(&'a PersonalInfo),
    Kyc(&'a KycUpload),
    Questionnaire(&'a QuestionnaireRequest),
    Demographics(&'a Demographics),
    Behavioral(&'a BehavioralData),
    Calculate,
}

impl<'a> Pending<'a> {
    fn from_payload(payload: &'a StepPayload) -> Self {
        match payload {
            StepPayload::PersonalInfo(info) => Self::Profile(info),
            StepPayload::KycUpload(upload) => Self::Kyc(upload),
            StepPayload::Questionnaire(request) => Self::Questionnaire(request),
            StepPayload::Demographics(demo) => Self::Demographics(demo),
            StepPayload::Behavioral(data) => Self::Behavioral(data),
        }
    }
}

/// A backend acknowledgment for one submission.
enum Acknowledged {
    Profile(crate::api::types::UserProfile),
    Kyc(crate::api::types::KycDocument),
    Questionnaire(crate::api::types::QuestionnaireResponse),
    Demographics(crate::api::types::DemographicsResponse),
    Behavioral(crate::api::types::BehavioralResponse),
    Calculated(crate::api::types::CalculateResponse),
}

impl Acknowledged {
    fn record(self, session: &mut WizardSession) {
        match self {
            Self::Profile(profile) => session.scores.profile = Some(profile),
            Self::Kyc(document) => session.scores.kyc = Some(document),
            Self::Questionnaire(response) => session.scores.questionnaire = Some(response),
            Self::Demographics(response) => session.scores.demographics = Some(response),
            Self::Behavioral(response) => session.scores.behavioral = Some(response),
            Self::Calculated(response) => session.scores.risk_profile = Some(response),
        }
    }
}

/// Drives one wizard session against the backend and the session store.
pub struct WizardController {
    api: Arc<dyn OnboardingApi>,
    store: Arc<dyn SessionStore>,
    session: Arc<RwLock<WizardSession>>,
    /// At most one submission in flight per session.
    in_flight: AtomicBool,
}

impl WizardController {
    pub fn new(
        api: Arc<dyn OnboardingApi>,
        store: Arc<dyn SessionStore>,
        session: WizardSession,
    ) -> Self {
        Self {
            api,
            store,
            session: Arc::new(RwLock::new(session)),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Resume the most recent unfinished session, or start a fresh one.
    /// Resumption lands on the furthest step previously reached.
    pub async fn resume_or_start(
        api: Arc<dyn OnboardingApi>,
        store: Arc<dyn SessionStore>,
        user_id: i64,
    ) -> Result<Self, WizardError> {
        let session = match store.load_latest().await? {
            Some(mut session) => {
                session.resume();
                tracing::info!(
                    session = %session.id,
                    step = %session.current,
                    "Resuming onboarding session"
                );
                session
            }
            None => {
                let session = WizardSession::new(user_id);
                tracing::info!(session = %session.id, "Starting onboarding session");
                session
            }
        };
        let controller = Self::new(api, store, session);
        controller.persist().await?;
        Ok(controller)
    }

    /// A point-in-time copy of the session, for rendering.
    pub async fn snapshot(&self) -> WizardSession {
        self.session.read().await.clone()
    }

    pub async fn current_step(&self) -> WizardStep {
        self.session.read().await.current
    }

    pub async fn is_complete(&self) -> bool {
        self.session.read().await.completed
    }

    /// Store the form data entered for its step. Re-entry is allowed until
    /// the step is submitted; a failed submission keeps the draft visible.
    pub async fn enter_draft(&self, payload: StepPayload) -> Result<(), WizardError> {
        self.session.write().await.put_draft(payload)?;
        self.persist().await
    }

    /// Validate the current step and advance per its policy.
    ///
    /// Guarded against double invocation: a second call while a submission
    /// is outstanding fails fast with `SubmissionInFlight`.
    pub async fn advance(&self) -> Result<Advance, WizardError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(WizardError::SubmissionInFlight);
        }
        let result = self.advance_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn advance_inner(&self) -> Result<Advance, WizardError> {
        let (session_id, step, payload) = {
            let session = self.session.read().await;
            if session.completed || session.current.is_terminal() {
                return Err(WizardError::AtTerminalStep);
            }
            (
                session.id,
                session.current,
                session.payload(session.current).cloned(),
            )
        };
        let Some(next) = step.next() else {
            return Err(WizardError::AtTerminalStep);
        };
        let policy = step.policy();

        // The questionnaire ships the fixed default answer set when no
        // per-question answers were entered.
        let payload = match (payload, step) {
            (None, WizardStep::Questionnaire) => Some(StepPayload::default_questionnaire()),
            (payload, _) => payload,
        };

        // Local validation always runs before any network call.
        if let Some(ref payload) = payload {
            validate::validate(payload)?;
        }

        let pending = match policy.submission {
            Submission::None => None,
            Submission::IfAttached => payload.as_ref().map(Pending::from_payload),
            Submission::Required => match payload.as_ref() {
                Some(payload) => Some(Pending::from_payload(payload)),
                None if !policy.has_payload => Some(Pending::Calculate),
                None => return Err(WizardError::PayloadMissing(step)),
            },
        };

        let Some(pending) = pending else {
            // Pure local advance.
            {
                let mut session = self.session.write().await;
                session.set_status(step, StepStatus::Valid);
                session.advance_to(next);
            }
            self.persist().await?;
            return Ok(Advance::Moved(next));
        };

        // Never re-submit an acknowledged step (retreat then advance).
        if self.session.read().await.is_submitted(step) {
            {
                let mut session = self.session.write().await;
                session.advance_to(next);
            }
            self.persist().await?;
            return Ok(Advance::Moved(next));
        }

        {
            let mut session = self.session.write().await;
            session.set_status(step, StepStatus::Submitting);
        }
        self.persist().await?;

        // No session lock is held across the call, so the user can navigate
        // while the submission is outstanding.
        let outcome = self.submit(pending).await;

        let mut session = self.session.write().await;
        if session.id != session_id || session.current != step {
            tracing::warn!(step = %step, "Discarding late submission result; session moved on");
            // Nothing is in flight anymore; leave the step retryable instead
            // of stuck at `submitting`.
            if session.id == session_id && session.status(step) == StepStatus::Submitting {
                session.set_status(step, StepStatus::Failed);
                drop(session);
                self.persist().await?;
            }
            return Ok(Advance::Stale);
        }

        match outcome {
            Ok(ack) => {
                ack.record(&mut session);
                session.set_status(step, StepStatus::Submitted);
                session.last_error = None;
                session.advance_to(next);
                drop(session);
                self.persist().await?;
                tracing::debug!(step = %step, next = %next, "Step submitted");
                Ok(Advance::Moved(next))
            }
            Err(error) => {
                session.set_status(step, StepStatus::Failed);
                session.last_error = Some(error.to_string());
                drop(session);
                // Progress is persisted before any auth-expiry redirect.
                self.persist().await?;
                Err(WizardError::Submission(error))
            }
        }
    }

    /// Issue exactly one remote submission. The acknowledgment is returned
    /// rather than applied, so a late response can be discarded without ever
    /// touching the session.
    async fn submit(&self, pending: Pending<'_>) -> Result<Acknowledged, crate::error::ApiError> {
        Ok(match pending {
            Pending::Profile(info) => Acknowledged::Profile(self.api.update_profile(info).await?),
            Pending::Kyc(upload) => Acknowledged::Kyc(self.api.upload_kyc(upload).await?),
            Pending::Questionnaire(request) => {
                Acknowledged::Questionnaire(self.api.submit_questionnaire(request).await?)
            }
            Pending::Demographics(demo) => {
                Acknowledged::Demographics(self.api.submit_demographics(demo).await?)
            }
            Pending::Behavioral(data) => {
                Acknowledged::Behavioral(self.api.submit_behavioral(data).await?)
            }
            Pending::Calculate => {
                Acknowledged::Calculated(self.api.calculate_risk_profile().await?)
            }
        })
    }

    /// Move back one step. Entered payloads are kept; nothing is
    /// re-submitted.
    pub async fn retreat(&self) -> Result<WizardStep, WizardError> {
        {
            let mut session = self.session.write().await;
            if session.completed {
                return Err(WizardError::AtTerminalStep);
            }
            let Some(prev) = session.current.prev() else {
                return Err(WizardError::AtFirstStep);
            };
            session.advance_to(prev);
        }
        self.persist().await?;
        Ok(self.session.read().await.current)
    }

    /// Skip an optional step without payload or validation.
    pub async fn skip(&self) -> Result<WizardStep, WizardError> {
        let next = {
            let mut session = self.session.write().await;
            let step = session.current;
            if !step.policy().optional {
                return Err(WizardError::StepNotSkippable(step));
            }
            let Some(next) = step.next() else {
                return Err(WizardError::AtTerminalStep);
            };
            session.advance_to(next);
            next
        };
        self.persist().await?;
        Ok(next)
    }

    /// Finish onboarding at the terminal step and discard the stored
    /// session.
    pub async fn complete(&self) -> Result<(), WizardError> {
        let id = {
            let mut session = self.session.write().await;
            if !session.current.is_terminal() {
                return Err(WizardError::NotAtFinalStep);
            }
            session.completed = true;
            session.id
        };
        self.store.delete(id).await?;
        Ok(())
    }

    /// Explicitly abandon the session and discard it from the store.
    pub async fn abandon(&self) -> Result<(), WizardError> {
        let id = self.session.read().await.id;
        self.store.delete(id).await?;
        Ok(())
    }

    async fn persist(&self) -> Result<(), WizardError> {
        let session = self.session.read().await;
        self.store.save(&session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::*;
    use crate::error::ApiError;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted backend: records calls, fails endpoints on demand.
    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<String>>,
        failing: Mutex<HashSet<String>>,
        /// When set, questionnaire submissions block until released.
        gate: Option<Arc<Notify>>,
        entered_gate: Option<Arc<Notify>>,
    }

    impl MockApi {
        fn record(&self, endpoint: &str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(endpoint.to_string());
            if self.failing.lock().unwrap().contains(endpoint) {
                return Err(ApiError::Remote {
                    status: 400,
                    message: format!("{endpoint} rejected"),
                });
            }
            Ok(())
        }

        fn fail(&self, endpoint: &str) {
            self.failing.lock().unwrap().insert(endpoint.to_string());
        }

        fn heal(&self, endpoint: &str) {
            self.failing.lock().unwrap().remove(endpoint);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl OnboardingApi for MockApi {
        async fn update_profile(&self, info: &PersonalInfo) -> Result<UserProfile, ApiError> {
            self.record("profile")?;
            Ok(UserProfile {
                id: 42,
                email: "user@example.com".to_string(),
                first_name: info.first_name.clone(),
                last_name: info.last_name.clone(),
                phone: info.phone.clone(),
            })
        }

        async fn submit_questionnaire(
            &self,
            _request: &QuestionnaireRequest,
        ) -> Result<QuestionnaireResponse, ApiError> {
            if let Some(entered) = &self.entered_gate {
                entered.notify_one();
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.record("questionnaire")?;
            Ok(QuestionnaireResponse {
                q_score: 72.0,
                risk_score: 58.0,
                message: "Questionnaire scored".to_string(),
            })
        }

        async fn submit_demographics(
            &self,
            _request: &Demographics,
        ) -> Result<DemographicsResponse, ApiError> {
            self.record("demographics")?;
            Ok(DemographicsResponse {
                base_modifier: 1.0,
                regional_factor: 0.9,
                demographic_factor: 1.1,
                tradition_factor: 1.0,
                cultural_modifier: 0.95,
            })
        }

        async fn submit_behavioral(
            &self,
            _data: &BehavioralData,
        ) -> Result<BehavioralResponse, ApiError> {
            self.record("behavioral")?;
            Ok(BehavioralResponse {
                b_score: 55.0,
                behavioral_insights: vec!["Checks portfolio weekly".to_string()],
            })
        }

        async fn calculate_risk_profile(&self) -> Result<CalculateResponse, ApiError> {
            self.record("calculate")?;
            Ok(CalculateResponse {
                risk_score: 58.4,
                risk_category: RiskCategory::Moderate,
                confidence: 0.82,
                factors: RiskFactors {
                    q_score: 72.0,
                    g_score: 48.0,
                    b_score: 55.0,
                    cultural_modifier: 0.95,
                    base_score: 60.0,
                },
            })
        }

        async fn get_risk_profile(&self, user_id: i64) -> Result<RiskProfile, ApiError> {
            self.record("get_profile")?;
            Err(ApiError::NotFound(format!(
                "/risk-profiling/profile/{user_id}"
            )))
        }

        async fn upload_kyc(&self, upload: &KycUpload) -> Result<KycDocument, ApiError> {
            self.record("kyc")?;
            Ok(KycDocument {
                id: 7,
                user_id: upload.user_id,
                document_type: upload.document_type,
                document_url: upload.document_url.clone(),
                status: KycStatus::Pending,
                verified_at: None,
                created_at: Utc::now(),
            })
        }

        async fn list_kyc_documents(&self, _user_id: i64) -> Result<Vec<KycDocument>, ApiError> {
            self.record("kyc_list")?;
            Ok(Vec::new())
        }
    }

    fn personal_info() -> StepPayload {
        StepPayload::PersonalInfo(PersonalInfo {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            phone: Some("9876543210".to_string()),
        })
    }

    fn demographics() -> StepPayload {
        StepPayload::Demographics(Demographics {
            region: "karnataka".to_string(),
            age: 34,
            income: dec!(1200000),
            occupation: "engineer".to_string(),
            joint_family_status: false,
            language_preference: "english".to_string(),
            religious_event_participation: true,
            festival_spending: dec!(40000),
            gold_investment_ratio: 10.0,
            real_estate_allocation: 20.0,
        })
    }

    fn behavioral() -> StepPayload {
        StepPayload::Behavioral(BehavioralData {
            portfolio_check_frequency: CheckFrequency::Weekly,
            portfolio_turnover_rate: 0.2,
            major_life_event_occurred: false,
            investment_experience_years: 2,
            risk_tolerance_self_assessment: 5,
            emotional_reaction_to_losses: LossReaction::Concerned,
            decision_making_style: DecisionStyle::Analytical,
        })
    }

    fn controller_at(
        api: Arc<MockApi>,
        store: Arc<MemoryStore>,
        step: WizardStep,
    ) -> WizardController {
        let mut session = WizardSession::new(42);
        session.advance_to(step);
        WizardController::new(api, store, session)
    }

    fn setup() -> (Arc<MockApi>, Arc<MemoryStore>) {
        (Arc::new(MockApi::default()), Arc::new(MemoryStore::new()))
    }

    /// Walk a fresh controller through steps 1–7 with valid payloads.
    async fn walk_to_completion(controller: &WizardController) {
        controller.enter_draft(personal_info()).await.expect("draft");
        controller.advance().await.expect("personal info");
        controller.skip().await.expect("mobile verification");
        controller.advance().await.expect("kyc without document");
        controller.advance().await.expect("questionnaire");
        controller.enter_draft(demographics()).await.expect("draft");
        controller.advance().await.expect("demographics");
        controller.enter_draft(behavioral()).await.expect("draft");
        controller.advance().await.expect("behavioral");
        controller.advance().await.expect("calculate");
    }

    #[tokio::test]
    async fn local_only_step_never_issues_a_call() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store, WizardStep::MobileVerification);

        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::KycUpload));
        assert!(api.calls().is_empty());

        let session = controller.snapshot().await;
        assert_eq!(
            session.status(WizardStep::MobileVerification),
            StepStatus::Valid
        );
    }

    #[tokio::test]
    async fn validation_failure_stays_put_without_network() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store, WizardStep::PersonalInfo);
        controller
            .enter_draft(StepPayload::PersonalInfo(PersonalInfo::default()))
            .await
            .expect("draft");

        let err = controller.advance().await.expect_err("invalid");
        match err {
            WizardError::Validation(errors) => {
                assert!(errors.message_for("first_name").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(api.calls().is_empty());
        assert_eq!(controller.current_step().await, WizardStep::PersonalInfo);
        // The entered values were not cleared.
        let session = controller.snapshot().await;
        assert!(session.payload(WizardStep::PersonalInfo).is_some());
    }

    #[tokio::test]
    async fn remote_step_advances_only_on_success() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store, WizardStep::PersonalInfo);
        controller.enter_draft(personal_info()).await.expect("draft");

        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::MobileVerification));
        assert_eq!(api.calls(), vec!["profile"]);

        let session = controller.snapshot().await;
        assert_eq!(session.status(WizardStep::PersonalInfo), StepStatus::Submitted);
        assert!(session.scores.profile.is_some());
    }

    #[tokio::test]
    async fn questionnaire_submits_defaults_and_records_scores() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store, WizardStep::Questionnaire);

        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::Demographics));
        assert_eq!(api.calls(), vec!["questionnaire"]);

        let session = controller.snapshot().await;
        assert_eq!(session.status(WizardStep::Questionnaire), StepStatus::Submitted);
        let scored = session.scores.questionnaire.expect("recorded");
        assert_eq!(scored.q_score, 72.0);
        assert_eq!(scored.risk_score, 58.0);
    }

    #[tokio::test]
    async fn failed_demographics_submission_keeps_payload_and_position() {
        let (api, store) = setup();
        api.fail("demographics");
        let controller = controller_at(api.clone(), store, WizardStep::Demographics);
        controller.enter_draft(demographics()).await.expect("draft");

        let err = controller.advance().await.expect_err("rejected");
        assert!(matches!(
            err,
            WizardError::Submission(ApiError::Remote { status: 400, .. })
        ));

        let session = controller.snapshot().await;
        assert_eq!(session.current, WizardStep::Demographics);
        assert_eq!(session.status(WizardStep::Demographics), StepStatus::Failed);
        assert!(session.last_error.as_deref().unwrap().contains("demographics"));
        // The entered age/income/region remain populated for the retry.
        match session.payload(WizardStep::Demographics) {
            Some(StepPayload::Demographics(demo)) => {
                assert_eq!(demo.age, 34);
                assert_eq!(demo.income, dec!(1200000));
                assert_eq!(demo.region, "karnataka");
            }
            other => panic!("payload missing after failure: {other:?}"),
        }

        // Unlimited retry of the same step, without touching earlier steps.
        api.heal("demographics");
        let advance = controller.advance().await.expect("retry");
        assert_eq!(advance, Advance::Moved(WizardStep::Behavioral));
        assert_eq!(api.calls(), vec!["demographics", "demographics"]);
    }

    #[tokio::test]
    async fn retreat_then_advance_does_not_resubmit() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store, WizardStep::Questionnaire);

        controller.advance().await.expect("submit");
        assert_eq!(controller.current_step().await, WizardStep::Demographics);

        controller.retreat().await.expect("retreat");
        assert_eq!(controller.current_step().await, WizardStep::Questionnaire);

        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::Demographics));
        // Still exactly one submission.
        assert_eq!(api.calls(), vec!["questionnaire"]);
    }

    #[tokio::test]
    async fn retreat_from_first_step_errors_and_keeps_drafts() {
        let (api, store) = setup();
        let controller = controller_at(api, store, WizardStep::PersonalInfo);
        controller.enter_draft(personal_info()).await.expect("draft");

        let err = controller.retreat().await.expect_err("first step");
        assert!(matches!(err, WizardError::AtFirstStep));
        assert!(
            controller
                .snapshot()
                .await
                .payload(WizardStep::PersonalInfo)
                .is_some()
        );
    }

    #[tokio::test]
    async fn skip_only_allowed_on_optional_steps() {
        let (api, store) = setup();
        let controller = controller_at(api.clone(), store.clone(), WizardStep::Demographics);
        let err = controller.skip().await.expect_err("not optional");
        assert!(matches!(
            err,
            WizardError::StepNotSkippable(WizardStep::Demographics)
        ));

        let controller = controller_at(api.clone(), store, WizardStep::KycUpload);
        let next = controller.skip().await.expect("optional");
        assert_eq!(next, WizardStep::Questionnaire);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn kyc_submits_when_document_attached_and_skips_otherwise() {
        let (api, store) = setup();

        // No document attached: advance is a pure local move.
        let controller = controller_at(api.clone(), store.clone(), WizardStep::KycUpload);
        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::Questionnaire));
        assert!(api.calls().is_empty());

        // Document attached: exactly one upload call.
        let controller = controller_at(api.clone(), store, WizardStep::KycUpload);
        controller
            .enter_draft(StepPayload::KycUpload(KycUpload {
                user_id: 42,
                document_type: KycDocumentType::Pan,
                document_url: "https://cdn.example.com/pan-42.pdf".to_string(),
            }))
            .await
            .expect("draft");
        let advance = controller.advance().await.expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::Questionnaire));
        assert_eq!(api.calls(), vec!["kyc"]);
        let session = controller.snapshot().await;
        assert_eq!(
            session.scores.kyc.expect("document").status,
            KycStatus::Pending
        );
    }

    #[tokio::test]
    async fn full_flow_reaches_completion_and_completes() {
        let (api, store) = setup();
        let controller = WizardController::new(
            api.clone(),
            store.clone(),
            WizardSession::new(42),
        );

        walk_to_completion(&controller).await;
        assert_eq!(controller.current_step().await, WizardStep::Completion);
        assert_eq!(
            api.calls(),
            vec!["profile", "questionnaire", "demographics", "behavioral", "calculate"]
        );

        let session = controller.snapshot().await;
        let profile = session.scores.risk_profile.expect("risk profile");
        assert_eq!(profile.risk_category, RiskCategory::Moderate);

        controller.complete().await.expect("complete");
        assert!(controller.is_complete().await);
        // The stored session is discarded on completion.
        assert!(store.load(session.id).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn complete_rejected_before_final_step() {
        let (api, store) = setup();
        let controller = controller_at(api, store, WizardStep::Calculate);
        assert!(matches!(
            controller.complete().await,
            Err(WizardError::NotAtFinalStep)
        ));
    }

    #[tokio::test]
    async fn resumption_restores_highest_step_without_resubmitting() {
        let (api, store) = setup();
        {
            let controller =
                WizardController::new(api.clone(), store.clone(), WizardSession::new(42));
            walk_to_completion(&controller).await;
            // User closes the app before the final step; retreat first to
            // prove resume uses the high-water mark, not the last position.
            controller.retreat().await.expect("retreat");
        }
        let calls_before = api.calls().len();

        let controller = WizardController::resume_or_start(api.clone(), store, 42)
            .await
            .expect("resume");
        assert_eq!(controller.current_step().await, WizardStep::Completion);
        // Steps 1–7 were not re-submitted.
        assert_eq!(api.calls().len(), calls_before);

        let session = controller.snapshot().await;
        assert!(session.is_submitted(WizardStep::Questionnaire));
        assert!(session.scores.risk_profile.is_some());
    }

    #[tokio::test]
    async fn fresh_start_when_no_stored_session() {
        let (api, store) = setup();
        let controller = WizardController::resume_or_start(api, store, 7)
            .await
            .expect("start");
        assert_eq!(controller.current_step().await, WizardStep::PersonalInfo);
        assert!(!controller.is_complete().await);
    }

    #[tokio::test]
    async fn second_advance_rejected_while_submission_in_flight() {
        let (_, store) = setup();
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            gate: Some(gate.clone()),
            entered_gate: Some(entered.clone()),
            ..MockApi::default()
        });

        let controller = Arc::new(controller_at(api, store, WizardStep::Questionnaire));
        let background = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.advance().await })
        };
        entered.notified().await;

        let err = controller.advance().await.expect_err("guarded");
        assert!(matches!(err, WizardError::SubmissionInFlight));

        gate.notify_one();
        let advance = background.await.expect("join").expect("advance");
        assert_eq!(advance, Advance::Moved(WizardStep::Demographics));
    }

    #[tokio::test]
    async fn late_response_does_not_mutate_a_moved_session() {
        let (_, store) = setup();
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            gate: Some(gate.clone()),
            entered_gate: Some(entered.clone()),
            ..MockApi::default()
        });

        let controller = Arc::new(controller_at(api, store, WizardStep::Questionnaire));
        let background = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.advance().await })
        };
        entered.notified().await;

        // User navigates away while the submission is outstanding.
        controller.retreat().await.expect("retreat");
        assert_eq!(controller.current_step().await, WizardStep::KycUpload);

        gate.notify_one();
        let advance = background.await.expect("join").expect("advance");
        assert_eq!(advance, Advance::Stale);

        // The late acknowledgment did not move the session or mark the step
        // submitted. The step is no longer shown as in flight either: it is
        // normalized to failed so a re-render offers a retry, not a spinner.
        let session = controller.snapshot().await;
        assert_eq!(session.current, WizardStep::KycUpload);
        assert_eq!(session.status(WizardStep::Questionnaire), StepStatus::Failed);
        assert!(session.scores.questionnaire.is_none());
    }

    #[tokio::test]
    async fn advance_rejected_at_terminal_step() {
        let (api, store) = setup();
        let controller = controller_at(api, store, WizardStep::Completion);
        assert!(matches!(
            controller.advance().await,
            Err(WizardError::AtTerminalStep)
        ));
    }
}
