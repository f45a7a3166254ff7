//! Onboarding wizard — the fixed eight-step flow.
//!
//! The wizard walks a user through profile, KYC, questionnaire,
//! demographics, and behavioral capture, submitting each step to the
//! advisory backend per its policy and recording the acknowledged
//! sub-scores. Partial completion is a first-class state: every mutation is
//! persisted, and a resumed session lands on the furthest step reached.

pub mod controller;
pub mod payload;
pub mod session;
pub mod step;
pub mod validate;

pub use controller::{Advance, WizardController};
pub use payload::{StepPayload, default_questionnaire_answers};
pub use session::{ScoreBook, StepStatus, WizardSession};
pub use step::{StepPolicy, Submission, WizardStep};
pub use validate::validate;
