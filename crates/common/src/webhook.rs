// Drive push-notification classification: irrelevant, heartbeat, or actionable.

use std::fmt::{Display, Formatter};

pub const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";
pub const RESOURCE_STATE_HEADER: &str = "x-goog-resource-state";
pub const RESOURCE_ID_HEADER: &str = "x-goog-resource-id";
pub const MESSAGE_NUMBER_HEADER: &str = "x-goog-message-number";

/// Value of the `x-goog-resource-state` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Handshake sent once when a channel is created. Carries no change.
    Sync,
    Add,
    Remove,
    Update,
    Trash,
    Untrash,
    Change,
    Other(String),
}

impl ResourceState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "sync" => Self::Sync,
            "add" => Self::Add,
            "remove" => Self::Remove,
            "update" => Self::Update,
            "trash" => Self::Trash,
            "untrash" => Self::Untrash,
            "change" => Self::Change,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sync => "sync",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Trash => "trash",
            Self::Untrash => "untrash",
            Self::Change => "change",
            Self::Other(raw) => raw,
        }
    }
}

impl Display for ResourceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The headers of one webhook delivery. Absent headers stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookEvent {
    pub channel_id: Option<String>,
    pub resource_state: Option<ResourceState>,
    pub resource_id: Option<String>,
    pub message_number: Option<u64>,
}

impl WebhookEvent {
    /// Build an event from a case-insensitive header lookup.
    pub fn from_lookup<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Self {
            channel_id: lookup(CHANNEL_ID_HEADER).map(ToOwned::to_owned),
            resource_state: lookup(RESOURCE_STATE_HEADER).map(ResourceState::parse),
            resource_id: lookup(RESOURCE_ID_HEADER).map(ToOwned::to_owned),
            message_number: lookup(MESSAGE_NUMBER_HEADER).and_then(|raw| raw.trim().parse().ok()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Not addressed to this deployment's channel.
    Irrelevant,
    /// Channel handshake or keepalive.
    Heartbeat,
    /// A content change worth publishing.
    Actionable,
}

impl EventClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Irrelevant => "irrelevant",
            Self::Heartbeat => "heartbeat",
            Self::Actionable => "actionable",
        }
    }
}

/// Classify a delivery against the configured channel id.
///
/// The channel check runs first, so a foreign `sync` message is reported as
/// irrelevant rather than as a heartbeat. Both short-circuit the pipeline.
pub fn classify(event: &WebhookEvent, expected_channel_id: &str) -> EventClass {
    match event.channel_id.as_deref() {
        Some(channel_id) if channel_id == expected_channel_id => {}
        _ => return EventClass::Irrelevant,
    }

    match event.resource_state {
        None | Some(ResourceState::Sync) => EventClass::Heartbeat,
        Some(_) => EventClass::Actionable,
    }
}
