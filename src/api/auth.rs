//! Bearer-token storage with single-flight refresh.
//!
//! Every request reads the access token from a shared [`TokenStore`]. When a
//! request hits a 401, it retries once after refreshing; concurrent requests
//! that race into a 401 queue behind a single in-flight refresh instead of
//! each calling the refresh endpoint. The generation counter is how a queued
//! caller discovers that someone else already refreshed while it waited.

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, RwLock};

use crate::error::ApiError;

use super::types::RefreshResponse;

/// An access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: refresh.map(SecretString::from),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tokens: Option<TokenPair>,
    /// Bumped on every successful refresh or install.
    generation: u64,
}

/// Shared token state for all API calls of one client.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<Inner>,
    /// Serializes refresh attempts; queued callers re-check the generation
    /// after acquiring it.
    refresh_gate: Mutex<()>,
}

impl TokenStore {
    pub fn new(pair: TokenPair) -> Self {
        Self {
            inner: RwLock::new(Inner {
                tokens: Some(pair),
                generation: 0,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current access token, exposed for an `Authorization: Bearer` header.
    pub async fn bearer(&self) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .tokens
            .as_ref()
            .map(|t| t.access.expose_secret().to_string())
    }

    /// Generation observed before issuing a request. Passed back to
    /// [`TokenStore::refresh_with`] so a stale 401 does not trigger a second
    /// refresh after another caller already rotated the tokens.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Replace the stored tokens (e.g. after login).
    pub async fn install(&self, pair: TokenPair) {
        let mut inner = self.inner.write().await;
        inner.tokens = Some(pair);
        inner.generation += 1;
    }

    /// Drop all tokens (logout / forced re-auth).
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.tokens = None;
        inner.generation += 1;
    }

    /// Refresh the tokens via `refresh_fn` unless another caller already did
    /// so since `observed_generation`. Single-flight: at most one refresh
    /// runs at a time; the rest wait and then reuse its result.
    pub async fn refresh_with<F, Fut>(
        &self,
        observed_generation: u64,
        refresh_fn: F,
    ) -> Result<(), ApiError>
    where
        F: FnOnce(SecretString) -> Fut,
        Fut: Future<Output = Result<RefreshResponse, ApiError>>,
    {
        let _gate = self.refresh_gate.lock().await;

        let refresh_token = {
            let inner = self.inner.read().await;
            if inner.generation != observed_generation {
                // Someone else refreshed while we waited on the gate.
                return Ok(());
            }
            inner
                .tokens
                .as_ref()
                .and_then(|t| t.refresh.clone())
                .ok_or(ApiError::AuthExpired)?
        };

        let response = refresh_fn(refresh_token).await?;

        let mut inner = self.inner.write().await;
        let kept_refresh = inner.tokens.take().and_then(|t| t.refresh);
        inner.tokens = Some(TokenPair {
            access: SecretString::from(response.access_token),
            // The backend may rotate the refresh token; keep the old one
            // when it does not.
            refresh: response.refresh_token.map(SecretString::from).or(kept_refresh),
        });
        inner.generation += 1;
        tracing::debug!("Access token refreshed");
        Ok(())
    }
}
