use http::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{LoginReq, LoginResp};

/// Authenticated handle on the platform API.
///
/// Built once by [`Session::login`] and passed by reference into every
/// reconciler call. The token is never refreshed; an expired or rejected
/// token shows up as `ProviderError::Auth` on the next request.
#[derive(Clone)]
pub struct Session {
    api_url: String,
    token: String,
    revoke_ack: Option<String>,
    http: reqwest::Client,
}

impl Session {
    pub async fn login(cfg: &ProviderConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::new();
        let login_url = format!("{}/auth/login", cfg.main_api_url);
        tracing::debug!(url = %login_url, username = %cfg.username, "logging in");

        let resp = http
            .post(&login_url)
            .json(&LoginReq {
                username: &cfg.username,
                password: &cfg.password,
            })
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Auth {
                reason: format!("login returned status {status}"),
            });
        }

        let body = resp.text().await?;
        let parsed: LoginResp = serde_json::from_str(&body).map_err(|e| ProviderError::Auth {
            reason: format!("login response is not valid JSON: {e}"),
        })?;
        let token = parsed
            .access
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::Auth {
                reason: "login response has no access token".into(),
            })?;

        tracing::info!(api_url = %cfg.api_url, "authenticated");
        Ok(Self {
            api_url: cfg.api_url.clone(),
            token,
            revoke_ack: cfg.revoke_ack.clone(),
            http,
        })
    }

    /// Wraps an already issued bearer token.
    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            revoke_ack: None,
            http: reqwest::Client::new(),
        }
    }

    /// Requires revoke responses to carry exactly this `message`.
    pub fn with_revoke_ack(mut self, message: impl Into<String>) -> Self {
        self.revoke_ack = Some(message.into());
        self
    }

    pub fn revoke_ack(&self) -> Option<&str> {
        self.revoke_ack.as_deref()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
    }

    async fn expect(
        &self,
        operation: &'static str,
        rb: reqwest::RequestBuilder,
        expected: StatusCode,
    ) -> ProviderResult<String> {
        let resp = rb.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(operation, status = %status, "api response");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth {
                reason: format!("{operation} rejected the session token ({status}): {body}"),
            });
        }
        if status != expected {
            return Err(ProviderError::UnexpectedStatus {
                operation,
                expected: expected.as_u16(),
                actual: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> ProviderResult<T> {
        let body = self
            .expect(operation, self.request(Method::GET, path), StatusCode::OK)
            .await?;
        decode(operation, &body)
    }

    /// Sends a JSON body and returns the raw response text on `expected`.
    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        operation: &'static str,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> ProviderResult<String> {
        self.expect(operation, self.request(method, path).json(body), expected)
            .await
    }

    pub(crate) async fn delete(
        &self,
        operation: &'static str,
        path: &str,
        expected: StatusCode,
    ) -> ProviderResult<()> {
        self.expect(operation, self.request(Method::DELETE, path), expected)
            .await
            .map(|_| ())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("revoke_ack", &self.revoke_ack)
            .finish()
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    operation: &'static str,
    body: &str,
) -> ProviderResult<T> {
    serde_json::from_str(body).map_err(|source| ProviderError::Decode { operation, source })
}
