//! Backend API surface for the onboarding flow.
//!
//! The wizard depends on the [`OnboardingApi`] trait, not on HTTP: the
//! production implementation is [`HttpApi`] (reqwest, bearer auth with
//! refresh-once-on-401), and tests substitute a scripted mock.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{TokenPair, TokenStore};
pub use client::HttpApi;

use async_trait::async_trait;

use crate::error::ApiError;

use types::{
    BehavioralData, BehavioralResponse, CalculateResponse, Demographics, DemographicsResponse,
    KycDocument, KycUpload, PersonalInfo, QuestionnaireRequest, QuestionnaireResponse, RiskProfile,
    UserProfile,
};

/// The slice of the advisory backend the wizard talks to.
///
/// Request/response shapes only; the scoring logic behind each endpoint is
/// opaque to this crate.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// `PUT /auth/profile` — echoes the updated profile.
    async fn update_profile(&self, info: &PersonalInfo) -> Result<UserProfile, ApiError>;

    /// `POST /risk-profiling/questionnaire` — returns the Q-score.
    async fn submit_questionnaire(
        &self,
        request: &QuestionnaireRequest,
    ) -> Result<QuestionnaireResponse, ApiError>;

    /// `POST /risk-profiling/demographics` — returns the cultural-modifier
    /// breakdown.
    async fn submit_demographics(
        &self,
        request: &Demographics,
    ) -> Result<DemographicsResponse, ApiError>;

    /// `POST /risk-profiling/behavioral` — returns the B-score and insights.
    async fn submit_behavioral(
        &self,
        data: &BehavioralData,
    ) -> Result<BehavioralResponse, ApiError>;

    /// `POST /risk-profiling/calculate` — aggregates Q/G/B into the final
    /// risk score and category. No payload.
    async fn calculate_risk_profile(&self) -> Result<CalculateResponse, ApiError>;

    /// `GET /risk-profiling/profile/{user_id}` — the stored profile, for
    /// re-display on resume.
    async fn get_risk_profile(&self, user_id: i64) -> Result<RiskProfile, ApiError>;

    /// `POST /kyc` — registers a document reference for verification.
    async fn upload_kyc(&self, upload: &KycUpload) -> Result<KycDocument, ApiError>;

    /// `GET /kyc/{user_id}` — previously uploaded documents.
    async fn list_kyc_documents(&self, user_id: i64) -> Result<Vec<KycDocument>, ApiError>;
}
