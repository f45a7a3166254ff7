//! Request/response types for the advisory backend.
//!
//! The scoring engines behind these endpoints are opaque: this crate only
//! ships payloads out and records the acknowledged sub-scores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ── Profile ─────────────────────────────────────────────────────────

/// Personal details captured on the first wizard step and submitted as a
/// profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Stored user profile, echoed back by a profile update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

// ── Questionnaire ───────────────────────────────────────────────────

/// Question-id to answer-score mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireRequest {
    pub answers: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireResponse {
    pub q_score: f64,
    pub risk_score: f64,
    #[serde(default)]
    pub message: String,
}

// ── Demographics ────────────────────────────────────────────────────

/// Demographic and cultural profile submitted to obtain the cultural
/// modifier (the G-score factor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub region: String,
    pub age: u32,
    pub income: Decimal,
    pub occupation: String,
    pub joint_family_status: bool,
    pub language_preference: String,
    pub religious_event_participation: bool,
    pub festival_spending: Decimal,
    /// Share of the portfolio held in gold, 0–100.
    pub gold_investment_ratio: f64,
    /// Share of the portfolio held in real estate, 0–100.
    pub real_estate_allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsResponse {
    pub base_modifier: f64,
    pub regional_factor: f64,
    pub demographic_factor: f64,
    pub tradition_factor: f64,
    pub cultural_modifier: f64,
}

// ── Behavioral ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFrequency {
    Daily,
    Weekly,
    Monthly,
    Rarely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReaction {
    Calm,
    Concerned,
    Anxious,
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStyle {
    Analytical,
    Intuitive,
    Emotional,
}

/// Behavioral inputs for the B-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralData {
    pub portfolio_check_frequency: CheckFrequency,
    /// Annual turnover as a fraction, 0.0–1.0.
    pub portfolio_turnover_rate: f64,
    pub major_life_event_occurred: bool,
    pub investment_experience_years: u32,
    /// Self-assessed tolerance on a 1–10 scale.
    pub risk_tolerance_self_assessment: u8,
    pub emotional_reaction_to_losses: LossReaction,
    pub decision_making_style: DecisionStyle,
}

/// Wire wrapper; the backend expects the inputs under `behavioral_data`.
#[derive(Debug, Clone, Serialize)]
pub struct BehavioralRequest<'a> {
    pub behavioral_data: &'a BehavioralData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralResponse {
    pub b_score: f64,
    #[serde(default)]
    pub behavioral_insights: Vec<String>,
}

// ── Risk profile ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Conservative,
    Moderate,
    Aggressive,
    VeryAggressive,
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
            Self::VeryAggressive => "very_aggressive",
        };
        write!(f, "{s}")
    }
}

/// Sub-score breakdown returned by the aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub q_score: f64,
    pub g_score: f64,
    pub b_score: f64,
    pub cultural_modifier: f64,
    pub base_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub confidence: f64,
    pub factors: RiskFactors,
}

/// Stored risk profile, as returned by `GET /risk-profiling/profile/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub id: i64,
    pub user_id: i64,
    pub q_score: f64,
    pub g_score: f64,
    pub b_score: f64,
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub confidence: f64,
    pub cultural_modifier: f64,
    pub base_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── KYC ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycDocumentType {
    Aadhaar,
    Pan,
    BankStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// A KYC document reference to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycUpload {
    pub user_id: i64,
    pub document_type: KycDocumentType,
    pub document_url: String,
}

/// A stored KYC document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycDocument {
    pub id: i64,
    pub user_id: i64,
    pub document_type: KycDocumentType,
    pub document_url: String,
    pub status: KycStatus,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
