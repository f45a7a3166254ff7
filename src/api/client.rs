//! HTTP client for the advisory backend.
//!
//! Every call carries the bearer token from the shared [`TokenStore`]. A 401
//! triggers exactly one transparent refresh-and-retry; if the retry still
//! fails the call surfaces [`ApiError::AuthExpired`] and the caller redirects
//! to re-authentication.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::ApiError;

use super::OnboardingApi;
use super::auth::TokenStore;
use super::types::{
    BehavioralData, BehavioralRequest, BehavioralResponse, CalculateResponse, Demographics,
    DemographicsResponse, KycDocument, KycUpload, PersonalInfo, QuestionnaireRequest,
    QuestionnaireResponse, RefreshRequest, RefreshResponse, RiskProfile, UserProfile,
};

/// reqwest-backed implementation of [`OnboardingApi`].
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// One request with at most one transparent refresh-and-retry on 401.
    async fn send<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let generation = self.tokens.generation().await;
        match self.send_once(method.clone(), path, body).await {
            Err(ApiError::AuthExpired) => {
                tracing::debug!(path, "401 received, attempting token refresh");
                self.refresh_tokens(generation).await?;
                self.send_once(method, path, body).await
            }
            other => other,
        }
    }

    async fn send_once<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.request(method, self.url(path));
        if let Some(bearer) = self.tokens.bearer().await {
            request = request.bearer_auth(bearer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthExpired),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
            s if !s.is_success() => {
                let text = response.text().await.unwrap_or_default();
                let message = error_message_from_body(&text).unwrap_or(text);
                tracing::warn!(path, status = status.as_u16(), %message, "Request rejected");
                Err(ApiError::Remote {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Ok(response.json::<R>().await?),
        }
    }

    /// Single-flight refresh through the token store. Refresh failures of any
    /// kind force re-login, so they collapse into `AuthExpired`.
    async fn refresh_tokens(&self, observed_generation: u64) -> Result<(), ApiError> {
        let client = self.client.clone();
        let url = self.url("/auth/refresh");
        self.tokens
            .refresh_with(observed_generation, |refresh_token| async move {
                let response = client
                    .post(&url)
                    .json(&RefreshRequest {
                        refresh_token: refresh_token.expose_secret().to_string(),
                    })
                    .send()
                    .await
                    .map_err(|_| ApiError::AuthExpired)?;
                if !response.status().is_success() {
                    tracing::warn!(status = response.status().as_u16(), "Token refresh rejected");
                    return Err(ApiError::AuthExpired);
                }
                response
                    .json::<RefreshResponse>()
                    .await
                    .map_err(|_| ApiError::AuthExpired)
            })
            .await
    }
}

/// Extract the human-readable message from a backend error body, which comes
/// as `{"error": ...}` or `{"message": ...}`.
fn error_message_from_body(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
}

#[async_trait]
impl OnboardingApi for HttpApi {
    async fn update_profile(&self, info: &PersonalInfo) -> Result<UserProfile, ApiError> {
        self.send(Method::PUT, "/auth/profile", Some(info)).await
    }

    async fn submit_questionnaire(
        &self,
        request: &QuestionnaireRequest,
    ) -> Result<QuestionnaireResponse, ApiError> {
        self.send(Method::POST, "/risk-profiling/questionnaire", Some(request))
            .await
    }

    async fn submit_demographics(
        &self,
        request: &Demographics,
    ) -> Result<DemographicsResponse, ApiError> {
        self.send(Method::POST, "/risk-profiling/demographics", Some(request))
            .await
    }

    async fn submit_behavioral(
        &self,
        data: &BehavioralData,
    ) -> Result<BehavioralResponse, ApiError> {
        self.send(
            Method::POST,
            "/risk-profiling/behavioral",
            Some(&BehavioralRequest {
                behavioral_data: data,
            }),
        )
        .await
    }

    async fn calculate_risk_profile(&self) -> Result<CalculateResponse, ApiError> {
        self.send::<(), _>(Method::POST, "/risk-profiling/calculate", None)
            .await
    }

    async fn get_risk_profile(&self, user_id: i64) -> Result<RiskProfile, ApiError> {
        self.send::<(), _>(Method::GET, &format!("/risk-profiling/profile/{user_id}"), None)
            .await
    }

    async fn upload_kyc(&self, upload: &KycUpload) -> Result<KycDocument, ApiError> {
        self.send(Method::POST, "/kyc", Some(upload)).await
    }

    async fn list_kyc_documents(&self, user_id: i64) -> Result<Vec<KycDocument>, ApiError> {
        self.send::<(), _>(Method::GET, &format!("/kyc/{user_id}"), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::TokenPair;
    use std::time::Duration;

    #[test]
    fn url_joins_base_and_path() {
        let config = ApiConfig::new("https://api.example.com/api/", Duration::from_secs(5))
            .expect("valid config");
        let api = HttpApi::new(
            &config,
            Arc::new(TokenStore::new(TokenPair::new("t", None))),
        )
        .expect("client");
        assert_eq!(
            api.url("/risk-profiling/calculate"),
            "https://api.example.com/api/risk-profiling/calculate"
        );
    }

    #[test]
    fn error_message_prefers_error_key() {
        assert_eq!(
            error_message_from_body(r#"{"error": "Invalid demographics"}"#).as_deref(),
            Some("Invalid demographics")
        );
        assert_eq!(
            error_message_from_body(r#"{"message": "Server exploded"}"#).as_deref(),
            Some("Server exploded")
        );
        assert_eq!(
            error_message_from_body(r#"{"error": "boom", "message": "ignored"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_message_from_body("<html>502</html>"), None);
        assert_eq!(error_message_from_body(r#"{"error": 42}"#), None);
    }
}
