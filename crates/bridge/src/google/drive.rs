// Drive v3 client: channel registration and HTML export for one document.

use std::time::Duration;

use docpush_common::subscription::{registration_outcome, SubscriptionStatus, WatchRequest};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use super::credentials::{authorize, DRIVE_READONLY_SCOPE};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

pub const EXPORT_MIME_TYPE: &str = "text/html";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw export of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    api_base: String,
    service_account_key: String,
    document_id: String,
    watch: WatchRequest,
}

impl std::fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveClient")
            .field("api_base", &self.api_base)
            .field("document_id", &self.document_id)
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}

impl DriveClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        service_account_key: impl Into<String>,
        document_id: impl Into<String>,
        watch: WatchRequest,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            service_account_key: service_account_key.into(),
            document_id: document_id.into(),
            watch,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self::new(
            http,
            config.drive_api_base.clone(),
            config.service_account_key.clone(),
            config.document_id.clone(),
            WatchRequest::web_hook(config.channel_id.clone(), config.callback_url.clone()),
        ))
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    fn watch_url(&self) -> String {
        format!("{}/files/{}/watch", self.api_base, self.document_id)
    }

    fn export_url(&self) -> String {
        format!("{}/files/{}/export", self.api_base, self.document_id)
    }

    /// Register the push channel, or confirm it is already live.
    pub async fn register_channel(&self) -> Result<SubscriptionStatus, BridgeError> {
        let client = authorize(&self.http, &self.service_account_key, DRIVE_READONLY_SCOPE).await?;

        let response = client.post(self.watch_url()).json(&self.watch).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        match registration_outcome(status, &body) {
            Some(outcome) => {
                info!(
                    document_id = %self.document_id,
                    channel_id = %self.watch.id,
                    outcome = outcome.as_str(),
                    "push channel confirmed"
                );
                Ok(outcome)
            }
            None => {
                warn!(document_id = %self.document_id, status, "push channel registration failed");
                Err(BridgeError::api("watch", status, &body))
            }
        }
    }

    /// Fetch the document rendered as HTML. Bytes are returned unmodified.
    pub async fn export_html(&self) -> Result<DocumentSnapshot, BridgeError> {
        let client = authorize(&self.http, &self.service_account_key, DRIVE_READONLY_SCOPE).await?;

        let response =
            client.get(self.export_url()).query(&[("mimeType", EXPORT_MIME_TYPE)]).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.bytes().await?;

        if status != 200 {
            warn!(document_id = %self.document_id, status, "document export failed");
            return Err(BridgeError::api("export", status, &body));
        }

        info!(document_id = %self.document_id, bytes = body.len(), "fetched document export");
        Ok(DocumentSnapshot { bytes: body.to_vec(), content_type })
    }
}
