// Webhook orchestration: renew the channel, filter the event, fetch, patch, publish.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::post, Router};
use docpush_common::subscription::SubscriptionStatus;
use docpush_common::transform::transform;
use docpush_common::webhook::{classify, EventClass, WebhookEvent};
use tracing::info;

use crate::config::BridgeConfig;
use crate::error::{current_request_id, BridgeError};
use crate::git::publisher::{GitPublisher, PublishOutcome, PublisherSettings};
use crate::git::worker::CommandExecutor;
use crate::google::drive::{DocumentSnapshot, DriveClient};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BridgeError>> + Send + 'a>>;

/// Where the document and its change channel live.
///
/// In production this is the Drive API. Tests inject fakes that count calls.
pub trait DocumentSource: Send + Sync {
    fn ensure_subscription(&self) -> BoxFuture<'_, SubscriptionStatus>;

    fn fetch_export(&self) -> BoxFuture<'_, DocumentSnapshot>;
}

impl DocumentSource for DriveClient {
    fn ensure_subscription(&self) -> BoxFuture<'_, SubscriptionStatus> {
        Box::pin(self.register_channel())
    }

    fn fetch_export(&self) -> BoxFuture<'_, DocumentSnapshot> {
        Box::pin(self.export_html())
    }
}

/// Writes published content somewhere durable. Blocking.
pub trait Publisher: Send + Sync {
    fn publish(&self, content: &[u8]) -> Result<PublishOutcome, BridgeError>;
}

impl<E> Publisher for GitPublisher<E>
where
    E: CommandExecutor + Clone,
{
    fn publish(&self, content: &[u8]) -> Result<PublishOutcome, BridgeError> {
        GitPublisher::publish(self, content)
    }
}

/// Result of one successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Heartbeat,
    Published(PublishOutcome),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Heartbeat => "heartbeat",
            Self::Published(outcome) => outcome.as_str(),
        }
    }
}

#[derive(Clone)]
pub struct Bridge {
    source: Arc<dyn DocumentSource>,
    publisher: Arc<dyn Publisher>,
    channel_id: String,
}

impl Bridge {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        publisher: Arc<dyn Publisher>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self { source, publisher, channel_id: channel_id.into() }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let source = Arc::new(DriveClient::from_config(config)?);
        let publisher = Arc::new(GitPublisher::new(PublisherSettings::from_config(config)));
        Ok(Self::new(source, publisher, config.channel_id.clone()))
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub async fn renew_subscription(&self) -> Result<SubscriptionStatus, BridgeError> {
        info!(channel_id = %self.channel_id, "subscribing to document channel");
        self.source.ensure_subscription().await
    }

    /// Run one invocation for a webhook delivery.
    pub async fn handle(&self, event: &WebhookEvent) -> Result<Outcome, BridgeError> {
        self.renew_subscription().await?;

        match classify(event, &self.channel_id) {
            EventClass::Irrelevant => {
                info!(channel_id = ?event.channel_id, "event is not for this channel");
                Ok(Outcome::Ignored)
            }
            EventClass::Heartbeat => {
                info!(resource_state = ?event.resource_state.as_ref().map(|s| s.as_str()), "heartbeat");
                Ok(Outcome::Heartbeat)
            }
            EventClass::Actionable => {
                info!(
                    resource_state = ?event.resource_state.as_ref().map(|s| s.as_str()),
                    resource_id = ?event.resource_id,
                    message_number = ?event.message_number,
                    "document changed"
                );
                self.sync_now().await.map(Outcome::Published)
            }
        }
    }

    /// Fetch, patch and publish regardless of any event.
    pub async fn sync_now(&self) -> Result<PublishOutcome, BridgeError> {
        info!("fetching document export");
        let snapshot = self.source.fetch_export().await?;
        let content = transform(&snapshot.bytes);

        let publisher = Arc::clone(&self.publisher);
        tokio::task::spawn_blocking(move || publisher.publish(&content))
            .await
            .map_err(|error| BridgeError::Task(error.to_string()))?
    }
}

pub fn router(bridge: Bridge) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/webhook", post(handle_webhook))
        .with_state(bridge)
}

async fn handle_webhook(
    State(bridge): State<Bridge>,
    headers: HeaderMap,
) -> Result<&'static str, BridgeError> {
    let event = WebhookEvent::from_lookup(|name| {
        headers.get(name).and_then(|value| value.to_str().ok())
    });

    match bridge.handle(&event).await {
        Ok(outcome) => {
            info!(request_id = ?current_request_id(), outcome = outcome.as_str(), "invocation finished");
            Ok("OK")
        }
        Err(error) => {
            tracing::error!(
                request_id = ?current_request_id(),
                kind = error.kind(),
                error = %error,
                "invocation failed"
            );
            Err(error)
        }
    }
}
