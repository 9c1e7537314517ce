// Push-channel registration payloads and the recognized-error table.
//
// Registering a channel id that is already live is expected on every
// invocation. The registration API reports it as a 400 with a structured
// reason; the table below turns such reasons into outcomes instead of errors.

use serde::{Deserialize, Serialize};

/// Channel type accepted by the Drive watch endpoint.
pub const WEB_HOOK_CHANNEL_TYPE: &str = "web_hook";

/// Body of `POST /files/{id}/watch`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub address: String,
}

impl WatchRequest {
    pub fn web_hook(channel_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: channel_id.into(),
            channel_type: WEB_HOOK_CHANNEL_TYPE.to_string(),
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// The channel was created by this call.
    Registered,
    /// The channel id is already live; nothing changed.
    AlreadyRegistered,
}

impl SubscriptionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::AlreadyRegistered => "already_registered",
        }
    }
}

/// Error reasons from the registration API that count as success.
pub const RECOGNIZED_REGISTRATION_ERRORS: &[(&str, SubscriptionStatus)] =
    &[("channelIdNotUnique", SubscriptionStatus::AlreadyRegistered)];

#[derive(Debug, Default, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

/// First error reason of a Google API error body, if it has one.
pub fn first_error_reason(body: &[u8]) -> Option<String> {
    let envelope: ApiErrorEnvelope = serde_json::from_slice(body).ok()?;
    envelope
        .error
        .errors
        .into_iter()
        .next()
        .map(|item| item.reason)
        .filter(|reason| !reason.is_empty())
}

/// Map a registration response to an outcome.
///
/// `Some` for 200 and for 400 responses whose first reason is in
/// [`RECOGNIZED_REGISTRATION_ERRORS`]; `None` means the response is a failure
/// and the caller surfaces the raw body.
pub fn registration_outcome(status: u16, body: &[u8]) -> Option<SubscriptionStatus> {
    match status {
        200 => Some(SubscriptionStatus::Registered),
        400 => {
            let reason = first_error_reason(body)?;
            RECOGNIZED_REGISTRATION_ERRORS
                .iter()
                .find(|(code, _)| *code == reason)
                .map(|(_, status)| *status)
        }
        _ => None,
    }
}
