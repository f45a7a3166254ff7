//! In-memory session store, used in tests and one-shot runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::wizard::session::WizardSession;

use super::traits::SessionStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<Uuid, WizardSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, session: &WizardSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<WizardSession>, StoreError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn load_latest(&self) -> Result<Option<WizardSession>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.completed)
            .max_by_key(|s| s.updated_at)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }
}
