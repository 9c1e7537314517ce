// Service-account authorization through `gcp_auth`.
//
// Nothing is cached. Each invocation builds a fresh token provider from the
// key, asks it for one scoped token, then drops both.

use std::fmt::{Debug, Formatter};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{IntoUrl, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::error::BridgeError;

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Non-secret view of a service-account key, after the key has been
/// accepted by the token provider.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    client_email: String,
    #[serde(default)]
    private_key_id: Option<String>,
    token_uri: String,
}

impl Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, BridgeError> {
        token_provider(raw)?;
        let key: Self = serde_json::from_str(raw).map_err(|error| {
            BridgeError::Credentials(format!("service account key is not valid JSON: {error}"))
        })?;

        if key.client_email.trim().is_empty() {
            return Err(BridgeError::Credentials("service account key has no client_email".into()));
        }
        Ok(key)
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }
}

fn token_provider(key_json: &str) -> Result<CustomServiceAccount, BridgeError> {
    CustomServiceAccount::from_json(key_json).map_err(|error| {
        BridgeError::Credentials(format!("service account key is invalid: {}", error_chain(&error)))
    })
}

fn error_chain(error: &gcp_auth::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Scoped HTTP client for one invocation.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    scope: String,
    access_token: String,
}

impl Debug for AuthorizedClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("scope", &self.scope)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl AuthorizedClient {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }
}

/// Exchange the service-account key for a client carrying `scope`.
pub async fn authorize(
    http: &reqwest::Client,
    key_json: &str,
    scope: &str,
) -> Result<AuthorizedClient, BridgeError> {
    let provider = token_provider(key_json)?;
    let token = provider.token(&[scope]).await.map_err(|error| {
        BridgeError::Credentials(format!("token exchange failed: {}", error_chain(&error)))
    })?;

    debug!(scope, "obtained scoped access token");

    Ok(AuthorizedClient {
        http: http.clone(),
        scope: scope.to_string(),
        access_token: token.as_str().to_string(),
    })
}
