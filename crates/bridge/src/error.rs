use std::future::Future;

use axum::{
    http::{header::HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::git::ssh::SshMaterialError;
use crate::git::worker::GitWorkerError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Terminal failure of one invocation. The display text is the response body.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("service account authorization failed: {0}")]
    Credentials(String),

    /// Non-success reply from a Google API. Displays the body verbatim.
    #[error("{body}")]
    Api { operation: &'static str, status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    SshMaterial(#[from] SshMaterialError),

    #[error(transparent)]
    Git(#[from] GitWorkerError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("publish task did not complete: {0}")]
    Task(String),
}

impl BridgeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub fn api(operation: &'static str, status: u16, body: &[u8]) -> Self {
        Self::Api { operation, status, body: String::from_utf8_lossy(body).into_owned() }
    }

    /// Short machine-friendly label used in logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Credentials(_) => "credentials",
            Self::Api { .. } => "api",
            Self::Transport(_) => "transport",
            Self::SshMaterial(_) => "ssh_material",
            Self::Git(_) => "git",
            Self::Io { .. } => "io",
            Self::Task(_) => "task",
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response();

        if let Some(request_id) = current_request_id() {
            attach_request_id_header(&mut response, &request_id);
        }

        response
    }
}

pub async fn with_request_id_scope<F>(request_id: String, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(request_id, future).await
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

pub fn request_id_from_headers_or_generate(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn attach_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(header) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
}
