//! `reqwest`-backed Registry client.

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use pollcheck_types::{
    AuthResponse, Credentials, Registration, ToggleResult, User, Voter, VoterKey, VoterQuery,
    VoterStats, VotersPage,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::registry::{AuthService, VoterRegistry};
use crate::session::TokenStore;

/// Error body the Registry sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the Registry's REST API.
///
/// Holds one reusable connection pool and the token store shared with the
/// rest of the application.
#[derive(Clone)]
pub struct HttpRegistry {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl HttpRegistry {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeouts(
            &config.api_url,
            config.request_timeout(),
            config.connect_timeout(),
            tokens,
        )
    }

    pub fn with_timeouts(
        api_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(api_url)
            .map_err(|e| ApiError::Config(format!("invalid api_url {api_url:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token when one is stored; omit the header otherwise.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(match self.tokens.load()? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Send an authenticated voter/stats request and decode the body.
    ///
    /// A 401 clears the stored token before `Unauthorized` is returned.
    async fn send_authorized<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.authorize(request)?.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("registry rejected the session token, clearing it");
            // The session is over either way; callers must still see the 401.
            if let Err(e) = self.tokens.clear() {
                tracing::error!("failed to clear rejected session token: {e}");
            }
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(rejection(response, "Request failed").await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Shared body of login and register: parse, then persist the token.
    async fn authenticate(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<AuthResponse, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ApiError::Network(format!(
                    "Cannot connect to server at {}. Make sure the backend is running.",
                    self.base_url
                ))
            } else {
                ApiError::from(e)
            }
        })?;
        let status = response.status();
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ApiError::EmptyResponse);
        }

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error_message(&text).unwrap_or_else(|| fallback.to_string()),
            });
        }

        let auth: AuthResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid auth response: {e}")))?;
        self.tokens.save(&auth.token)?;
        tracing::info!(username = %auth.user.username, "session established");
        Ok(auth)
    }
}

impl VoterRegistry for HttpRegistry {
    async fn list_voters(&self, query: &VoterQuery) -> Result<VotersPage, ApiError> {
        let url = self.endpoint(&["api", "voters"])?;
        tracing::debug!(page = query.page, filter = %query.vote_filter, "listing voters");
        self.send_authorized(self.http.get(url).query(&query.list_params()))
            .await
    }

    async fn search_voters(&self, text: &str, query: &VoterQuery) -> Result<VotersPage, ApiError> {
        let url = self.endpoint(&["api", "voters", "search"])?;
        tracing::debug!(page = query.page, filter = %query.vote_filter, "searching voters");
        self.send_authorized(self.http.get(url).query(&query.search_params(text)))
            .await
    }

    async fn voter_by_id(&self, voter_id: &str) -> Result<Voter, ApiError> {
        let url = self.endpoint(&["api", "voters", "by-id", voter_id])?;
        self.send_authorized(self.http.get(url)).await
    }

    async fn stats(&self) -> Result<VoterStats, ApiError> {
        let url = self.endpoint(&["api", "voters", "stats"])?;
        self.send_authorized(self.http.get(url)).await
    }

    async fn toggle_vote(&self, id: &VoterKey) -> Result<ToggleResult, ApiError> {
        let url = self.endpoint(&["api", "voters", id.as_str(), "vote"])?;
        self.send_authorized(
            self.http
                .patch(url)
                .header(CONTENT_TYPE, "application/json"),
        )
        .await
    }
}

impl AuthService for HttpRegistry {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["api", "login"])?;
        self.authenticate(self.http.post(url).json(credentials), "Login failed")
            .await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["api", "register"])?;
        self.authenticate(self.http.post(url).json(registration), "Registration failed")
            .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        if let Some(token) = self.tokens.load()? {
            let url = self.endpoint(&["api", "logout"])?;
            if let Err(e) = self.http.post(url).bearer_auth(token).send().await {
                tracing::debug!("ignoring logout request failure: {e}");
            }
        }
        self.tokens.clear()?;
        tracing::info!("session cleared");
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let Some(token) = self.tokens.load()? else {
            return Ok(None);
        };
        let url = self.endpoint(&["api", "me"])?;
        let response = match self.http.get(url).bearer_auth(token).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("could not confirm session: {e}");
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            if let Err(e) = self.tokens.clear() {
                tracing::error!("failed to clear unusable session token: {e}");
            }
            return Ok(None);
        }
        match response.json::<User>().await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("unreadable /api/me response: {e}");
                Ok(None)
            }
        }
    }

    fn has_session(&self) -> bool {
        matches!(self.tokens.load(), Ok(Some(_)))
    }
}

/// Pull the `error` field out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

async fn rejection(response: Response, fallback: &str) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Rejected {
        status,
        message: error_message(&body).unwrap_or_else(|| fallback.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;

    fn registry(url: &str) -> HttpRegistry {
        HttpRegistry::with_timeouts(
            url,
            Duration::from_secs(5),
            Duration::from_secs(1),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let r = registry("http://localhost:4000");
        let url = r.endpoint(&["api", "voters", "by-id", "AB/12 3"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/voters/by-id/AB%2F12%203");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let r = registry("https://example.org/pollcheck/");
        let url = r.endpoint(&["api", "voters"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/pollcheck/api/voters");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = HttpRegistry::with_timeouts(
            "::nope::",
            Duration::from_secs(1),
            Duration::from_secs(1),
            Arc::new(MemoryTokenStore::new()),
        );
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": "Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(error_message(r#"{"error": ""}"#), None);
        assert_eq!(error_message("<html>"), None);
    }
}
