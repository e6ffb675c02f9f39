use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One contributed stroke segment.
///
/// The relay never interprets a draw payload: the fields are stored and
/// replayed as received, in their original order. Only `clientId` is read,
/// so participants can recognise their own echoes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawEvent(Map<String, Value>);

impl DrawEvent {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Originating participant, if the payload names one
    pub fn client_id(&self) -> Option<&str> {
        self.0.get("clientId").and_then(Value::as_str)
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.0
            .insert("clientId".to_string(), Value::String(client_id.into()));
    }

    /// Whether this event was submitted by the participant with `client_id`
    pub fn is_from(&self, client_id: &str) -> bool {
        self.client_id() == Some(client_id)
    }
}

/// Messages exchanged between the relay and participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    // Participant <-> Relay
    Draw { data: DrawEvent },
    Clear,

    // Participant -> Relay
    Ping,

    // Relay -> Participant
    Pong,
    History { data: Vec<DrawEvent> },
    UserCount { count: usize },
}

/// Discriminants accepted on the wire, in declaration order
pub const KNOWN_TYPES: [&str; 6] = ["draw", "clear", "ping", "pong", "history", "userCount"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("unrecognized message type `{0}`")]
    UnknownType(String),

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: String,
        source: serde_json::Error,
    },
}

impl Message {
    pub fn draw(event: DrawEvent) -> Self {
        Message::Draw { data: event }
    }

    pub fn history(events: Vec<DrawEvent>) -> Self {
        Message::History { data: events }
    }

    pub fn user_count(count: usize) -> Self {
        Message::UserCount { count }
    }

    /// Wire name of this message's discriminant
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Draw { .. } => "draw",
            Message::Clear => "clear",
            Message::Ping => "ping",
            Message::Pong => "pong",
            Message::History { .. } => "history",
            Message::UserCount { .. } => "userCount",
        }
    }

    /// Only draw, clear and ping may be sent by a participant
    pub fn is_inbound(&self) -> bool {
        matches!(self, Message::Draw { .. } | Message::Clear | Message::Ping)
    }

    /// Decode one text frame.
    ///
    /// The discriminant is checked before the body so that an unknown type can be
    /// told apart from a known type with a broken payload.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?
            .to_string();

        if !KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(DecodeError::UnknownType(kind));
        }

        serde_json::from_value(value).map_err(|source| DecodeError::InvalidPayload { kind, source })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
