//! Error types for the onboarding core.

use serde::{Deserialize, Serialize};

use crate::wizard::step::WizardStep;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-keyed validation failures for one step.
///
/// Produced by the pure step validators; rendered inline next to the form
/// fields and never sent over the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("validation failed on {} field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when no field failed, otherwise `Err(self)`.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Message for a specific field, if that field failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Errors from the remote advisory backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A 401 that persisted past the single transparent refresh attempt.
    /// Forces re-login; wizard progress is persisted before this propagates.
    #[error("Authentication expired, re-login required")]
    AuthExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    /// A 4xx/5xx on a step submission. Retryable; the session keeps the
    /// entered payload so the user never re-types it.
    #[error("Request rejected ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    NotFound(uuid::Uuid),
}

/// Controller-level errors, consumed uniformly by the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Submission failed: {0}")]
    Submission(#[from] ApiError),

    #[error("A submission is already in flight for this session")]
    SubmissionInFlight,

    #[error("Already at the terminal step")]
    AtTerminalStep,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("The wizard has not reached its final step")]
    NotAtFinalStep,

    #[error("Step {0} cannot be skipped")]
    StepNotSkippable(WizardStep),

    #[error("No payload entered for step {0}")]
    PayloadMissing(WizardStep),

    #[error("Step {0} is already submitted; its payload is immutable")]
    PayloadLocked(WizardStep),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
