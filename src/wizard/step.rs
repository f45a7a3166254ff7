//! The fixed step table and per-step advance policy.

use serde::{Deserialize, Serialize};

/// The eight onboarding steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PersonalInfo,
    MobileVerification,
    KycUpload,
    Questionnaire,
    Demographics,
    Behavioral,
    Calculate,
    Completion,
}

impl WizardStep {
    /// All steps in walk order.
    pub const ALL: [WizardStep; 8] = [
        Self::PersonalInfo,
        Self::MobileVerification,
        Self::KycUpload,
        Self::Questionnaire,
        Self::Demographics,
        Self::Behavioral,
        Self::Calculate,
        Self::Completion,
    ];

    /// 1-based position, as shown in the "Step N of 8" header.
    pub fn number(&self) -> usize {
        match self {
            Self::PersonalInfo => 1,
            Self::MobileVerification => 2,
            Self::KycUpload => 3,
            Self::Questionnaire => 4,
            Self::Demographics => 5,
            Self::Behavioral => 6,
            Self::Calculate => 7,
            Self::Completion => 8,
        }
    }

    pub fn from_number(n: usize) -> Option<WizardStep> {
        Self::ALL.get(n.checked_sub(1)?).copied()
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(&self) -> Option<WizardStep> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    /// Whether this is the terminal step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion)
    }

    /// The fixed advance policy for this step.
    pub fn policy(&self) -> StepPolicy {
        match self {
            Self::PersonalInfo => StepPolicy {
                submission: Submission::Required,
                optional: false,
                has_payload: true,
            },
            Self::MobileVerification => StepPolicy {
                submission: Submission::None,
                optional: true,
                has_payload: false,
            },
            Self::KycUpload => StepPolicy {
                submission: Submission::IfAttached,
                optional: true,
                has_payload: true,
            },
            Self::Questionnaire => StepPolicy {
                submission: Submission::Required,
                optional: false,
                has_payload: true,
            },
            Self::Demographics => StepPolicy {
                submission: Submission::Required,
                optional: false,
                has_payload: true,
            },
            Self::Behavioral => StepPolicy {
                submission: Submission::Required,
                optional: false,
                has_payload: true,
            },
            Self::Calculate => StepPolicy {
                submission: Submission::Required,
                optional: false,
                has_payload: false,
            },
            Self::Completion => StepPolicy {
                submission: Submission::None,
                optional: false,
                has_payload: false,
            },
        }
    }

    /// Human-readable title for form headers.
    pub fn title(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal Information",
            Self::MobileVerification => "Mobile Verification",
            Self::KycUpload => "KYC Document Upload",
            Self::Questionnaire => "Risk Questionnaire",
            Self::Demographics => "Demographics",
            Self::Behavioral => "Behavioral Assessment",
            Self::Calculate => "Risk Profile Calculation",
            Self::Completion => "Review & Complete",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PersonalInfo => "personal_info",
            Self::MobileVerification => "mobile_verification",
            Self::KycUpload => "kyc_upload",
            Self::Questionnaire => "questionnaire",
            Self::Demographics => "demographics",
            Self::Behavioral => "behavioral",
            Self::Calculate => "calculate",
            Self::Completion => "completion",
        };
        write!(f, "{s}")
    }
}

/// What `advance` must do for a step once local validation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Advance on local state alone; never touches the network.
    None,
    /// A remote submission must succeed before the step advances.
    Required,
    /// Submit only when the user attached a payload; otherwise behaves
    /// like `None`.
    IfAttached,
}

/// Fixed advance rules for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    pub submission: Submission,
    /// The step may be skipped outright, without payload or validation.
    pub optional: bool,
    /// The step collects form data at all.
    pub has_payload: bool,
}
