use std::env;
use std::fmt;

use crate::error::{ProviderError, ProviderResult};

pub const MAIN_API_URL_VAR: &str = "MAIN_API_URL";
pub const API_URL_VAR: &str = "API_URL";
pub const USERNAME_VAR: &str = "ADINUSA_USERNAME";
pub const PASSWORD_VAR: &str = "ADINUSA_PASSWORD";
pub const REVOKE_ACK_VAR: &str = "ADINUSA_REVOKE_ACK";

/// Connection settings for the learning platform.
///
/// `main_api_url` hosts the login exchange, `api_url` hosts everything else.
#[derive(Clone)]
pub struct ProviderConfig {
    pub main_api_url: String,
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Literal `message` the revoke endpoint must answer with, when set.
    pub revoke_ack: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        main_api_url: impl Into<String>,
        api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ProviderResult<Self> {
        let cfg = Self {
            main_api_url: trim_url(main_api_url.into()),
            api_url: trim_url(api_url.into()),
            username: username.into(),
            password: password.into(),
            revoke_ack: None,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> ProviderResult<Self> {
        let mut cfg = Self::new(
            required(MAIN_API_URL_VAR)?,
            required(API_URL_VAR)?,
            required(USERNAME_VAR)?,
            required(PASSWORD_VAR)?,
        )?;
        cfg.revoke_ack = env::var(REVOKE_ACK_VAR).ok().filter(|s| !s.is_empty());
        Ok(cfg)
    }

    pub fn with_revoke_ack(mut self, message: impl Into<String>) -> Self {
        self.revoke_ack = Some(message.into());
        self
    }

    fn validate(&self) -> ProviderResult<()> {
        for (name, value) in [
            ("main_api_url", &self.main_api_url),
            ("api_url", &self.api_url),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(ProviderError::Config(format!("{name} must not be empty")));
            }
        }
        for (name, url) in [("main_api_url", &self.main_api_url), ("api_url", &self.api_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProviderError::Config(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("main_api_url", &self.main_api_url)
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("revoke_ack", &self.revoke_ack)
            .finish()
    }
}

fn required(var: &str) -> ProviderResult<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ProviderError::Config(format!("{var} is not set"))),
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
