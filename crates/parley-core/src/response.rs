//! Interaction response payloads.
//!
//! Only the envelope is modelled. `data` stays an opaque JSON value so rich
//! payloads (embeds, components, modals) built elsewhere pass through as-is.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::EPHEMERAL_FLAG;
use crate::error::ConfigurationError;

/// Callback type of an interaction response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ResponseType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
    AutocompleteResult,
    Modal,
}

impl TryFrom<u8> for ResponseType {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            6 => Ok(Self::DeferredUpdateMessage),
            7 => Ok(Self::UpdateMessage),
            8 => Ok(Self::AutocompleteResult),
            9 => Ok(Self::Modal),
            code => Err(ConfigurationError::UnknownCode { what: "response type", code }),
        }
    }
}

impl From<ResponseType> for u8 {
    fn from(kind: ResponseType) -> Self {
        match kind {
            ResponseType::Pong => 1,
            ResponseType::ChannelMessageWithSource => 4,
            ResponseType::DeferredChannelMessageWithSource => 5,
            ResponseType::DeferredUpdateMessage => 6,
            ResponseType::UpdateMessage => 7,
            ResponseType::AutocompleteResult => 8,
            ResponseType::Modal => 9,
        }
    }
}

/// Body returned to the platform for a handled interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    pub fn new(kind: ResponseType, data: Option<Value>) -> Self {
        Self { kind, data }
    }

    /// Answer to a liveness ping: `{"type": 1}`.
    pub fn pong() -> Self {
        Self::new(ResponseType::Pong, None)
    }

    /// Public channel message.
    pub fn message(content: impl Into<String>) -> Self {
        Self::new(
            ResponseType::ChannelMessageWithSource,
            Some(json!({ "content": content.into() })),
        )
    }

    /// Message only the invoking user can see.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::new(
            ResponseType::ChannelMessageWithSource,
            Some(json!({ "content": content.into(), "flags": EPHEMERAL_FLAG })),
        )
    }

    /// Message with a caller-built `data` object (embeds, components, ...).
    pub fn message_with(data: Value) -> Self {
        Self::new(ResponseType::ChannelMessageWithSource, Some(data))
    }

    /// "Thinking..." placeholder; the real message follows via the REST API.
    pub fn deferred_message(ephemeral: bool) -> Self {
        let data = ephemeral.then(|| json!({ "flags": EPHEMERAL_FLAG }));
        Self::new(ResponseType::DeferredChannelMessageWithSource, data)
    }

    /// Acknowledge a component click, editing the message later.
    pub fn deferred_update() -> Self {
        Self::new(ResponseType::DeferredUpdateMessage, None)
    }

    /// Edit the message the component is attached to.
    pub fn update_message(data: Value) -> Self {
        Self::new(ResponseType::UpdateMessage, Some(data))
    }

    /// Autocomplete suggestions as `(name, value)` pairs.
    pub fn autocomplete<I, N, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        let choices: Vec<Value> = choices
            .into_iter()
            .map(|(name, value)| json!({ "name": name.into(), "value": value.into() }))
            .collect();
        Self::new(ResponseType::AutocompleteResult, Some(json!({ "choices": choices })))
    }

    /// Open a modal dialog.
    pub fn modal(custom_id: impl Into<String>, title: impl Into<String>, components: Vec<Value>) -> Self {
        Self::new(
            ResponseType::Modal,
            Some(json!({
                "custom_id": custom_id.into(),
                "title": title.into(),
                "components": components,
            })),
        )
    }
}
