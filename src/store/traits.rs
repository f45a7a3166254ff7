//! Backend-agnostic session store trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::wizard::session::WizardSession;

/// Persistence for wizard sessions.
///
/// The controller saves after every mutation, so a crash or forced re-login
/// loses at most the in-flight submission, never entered payloads.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session.
    async fn save(&self, session: &WizardSession) -> Result<(), StoreError>;

    /// Load a session by id.
    async fn load(&self, id: Uuid) -> Result<Option<WizardSession>, StoreError>;

    /// Most recently updated unfinished session, if any. This is the resume
    /// entry point.
    async fn load_latest(&self) -> Result<Option<WizardSession>, StoreError>;

    /// Discard a session (completion or explicit abandonment).
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
