//! JSON-file session store — one file per session under a data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::wizard::session::WizardSession;

use super::traits::SessionStore;

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the session directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_session(path: &Path) -> Result<WizardSession, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn save(&self, session: &WizardSession) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(session)?;
        // Write-then-rename so a crash mid-write never corrupts the session.
        let tmp = self.dir.join(format!("{}.json.tmp", session.id));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, self.path_for(session.id)).await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<WizardSession>, StoreError> {
        let path = self.path_for(id);
        match Self::read_session(&path).await {
            Ok(session) => Ok(Some(session)),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn load_latest(&self) -> Result<Option<WizardSession>, StoreError> {
        let mut latest: Option<WizardSession> = None;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let session = match Self::read_session(&path).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                    continue;
                }
            };
            if session.completed {
                continue;
            }
            if latest
                .as_ref()
                .is_none_or(|l| session.updated_at > l.updated_at)
            {
                latest = Some(session);
            }
        }
        Ok(latest)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::step::WizardStep;

    #[tokio::test]
    async fn save_and_reload_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).await.expect("open");

        let mut session = WizardSession::new(9);
        session.advance_to(WizardStep::Questionnaire);
        store.save(&session).await.expect("save");

        // Reopen to prove nothing was cached.
        let store = FileStore::open(dir.path()).await.expect("reopen");
        let loaded = store
            .load(session.id)
            .await
            .expect("load")
            .expect("present");
        assert_eq!(loaded.current, WizardStep::Questionnaire);
        assert_eq!(loaded.user_id, 9);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).await.expect("open");
        assert!(store.load(Uuid::new_v4()).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn load_latest_picks_most_recent_and_skips_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).await.expect("open");

        let older = WizardSession::new(1);
        store.save(&older).await.expect("save");
        let mut newer = WizardSession::new(1);
        newer.advance_to(WizardStep::Behavioral);
        store.save(&newer).await.expect("save");

        tokio::fs::write(dir.path().join("junk.json"), b"not a session")
            .await
            .expect("write junk");

        let latest = store.load_latest().await.expect("load").expect("present");
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).await.expect("open");
        let session = WizardSession::new(1);
        store.save(&session).await.expect("save");
        store.delete(session.id).await.expect("delete");
        store.delete(session.id).await.expect("delete again");
        assert!(store.load(session.id).await.expect("load").is_none());
    }
}
