//! WebSocket signaling messages.
//!
//! Every frame is a JSON envelope `{ "type": ..., "payload": ... }`. Inbound
//! envelopes are decoded in two steps: the type tag first, then the payload
//! against the shape that tag expects.
//!
//! Relay payloads (`offer`, `answer`, `ice-candidate`) are never re-encoded:
//! each field is kept as the exact bytes the client sent, because WebRTC
//! stacks on some mobile platforms reject SDP that went through a lossy
//! JSON round trip.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::domain::{MessagePushError, SignalKind};

const TARGET_FIELD: &str = "target";
const SENDER_FIELD: &str = "sender";

/// Client-visible protocol errors. The display string is what the client receives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid payload")]
    InvalidPayload,

    #[error("missing target")]
    MissingTarget,

    #[error("invalid target")]
    InvalidTarget,

    #[error("unknown type")]
    UnknownType(String),
}

/// Raw inbound envelope
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// `None` only when the field is absent; an explicit `null` is kept as raw `null`
    #[serde(default, deserialize_with = "present_payload")]
    pub payload: Option<Box<RawValue>>,
}

fn present_payload<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// Payload JSON to decode. Absent is an error, `null` reads as an empty object.
fn payload_json(payload: Option<&RawValue>) -> Result<&str, ProtocolError> {
    match payload.map(RawValue::get) {
        None => Err(ProtocolError::InvalidPayload),
        Some("null") => Ok("{}"),
        Some(json) => Ok(json),
    }
}

impl Envelope {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Decoded client request
#[derive(Debug)]
pub enum ClientMessage {
    GetOnlineUsers,
    JoinRoom(JoinRoomPayload),
    Relay(RelayRequest),
    LeaveRoom,
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match envelope.kind.as_str() {
            "get-online-users" => Ok(ClientMessage::GetOnlineUsers),
            "join-room" => {
                let payload = payload_json(envelope.payload.as_deref())?;
                serde_json::from_str(payload)
                    .map(ClientMessage::JoinRoom)
                    .map_err(|_| ProtocolError::InvalidPayload)
            }
            "leave-room" => Ok(ClientMessage::LeaveRoom),
            tag => match SignalKind::from_tag(tag) {
                Some(kind) => RelayRequest::parse(kind, envelope.payload.as_deref())
                    .map(ClientMessage::Relay),
                None => Err(ProtocolError::UnknownType(tag.to_string())),
            },
        }
    }
}

/// Payload of `join-room`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinRoomPayload {
    /// A missing name decodes as empty and fails name validation
    #[serde(rename = "userName", default)]
    pub user_name: String,
}

/// An `offer` / `answer` / `ice-candidate` addressed to another peer
#[derive(Debug)]
pub struct RelayRequest {
    pub kind: SignalKind,
    /// Target peer id as sent by the client; not validated here
    pub target: String,
    /// Remaining payload fields, `target` and any client-supplied `sender` removed
    pub fields: RawFields,
}

impl RelayRequest {
    fn parse(kind: SignalKind, payload: Option<&RawValue>) -> Result<Self, ProtocolError> {
        let payload = payload_json(payload)?;
        let mut fields: RawFields =
            serde_json::from_str(payload).map_err(|_| ProtocolError::InvalidPayload)?;

        let raw_target = fields.remove(TARGET_FIELD).ok_or(ProtocolError::MissingTarget)?;
        let target: String =
            serde_json::from_str(raw_target.get()).map_err(|_| ProtocolError::InvalidTarget)?;
        fields.remove(SENDER_FIELD);

        Ok(Self {
            kind,
            target,
            fields,
        })
    }
}

/// JSON object fields kept as unparsed raw JSON, in their original order.
///
/// A repeated key keeps the last value, at the position of its first occurrence.
#[derive(Debug, Default)]
pub struct RawFields(Vec<(String, Box<RawValue>)>);

impl RawFields {
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_ref())
    }

    pub fn remove(&mut self, key: &str) -> Option<Box<RawValue>> {
        let index = self.0.iter().position(|(name, _)| name == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, key: String, value: Box<RawValue>) {
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }
}

impl<'de> Deserialize<'de> for RawFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawFieldsVisitor;

        impl<'de> Visitor<'de> for RawFieldsVisitor {
            type Value = RawFields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = RawFields::default();
                while let Some((key, value)) = map.next_entry::<String, Box<RawValue>>()? {
                    fields.insert(key, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(RawFieldsVisitor)
    }
}

/// Payload forwarded to the target of a relay: `sender` first, then the original fields
#[derive(Debug)]
pub struct RelayPayload {
    pub sender: String,
    pub fields: RawFields,
}

impl Serialize for RelayPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(SENDER_FIELD, &self.sender)?;
        for (key, value) in &self.fields.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A joined peer as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// Server -> client messages
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    Connected { id: String },
    OnlineUsersList(Vec<UserInfo>),
    CurrentUsers(Vec<UserInfo>),
    UserJoined(UserInfo),
    /// Bare id string, not an object
    UserLeft(String),
    Offer(RelayPayload),
    Answer(RelayPayload),
    IceCandidate(RelayPayload),
    Error { message: String },
}

impl ServerMessage {
    pub fn relay(kind: SignalKind, payload: RelayPayload) -> Self {
        match kind {
            SignalKind::Offer => ServerMessage::Offer(payload),
            SignalKind::Answer => ServerMessage::Answer(payload),
            SignalKind::IceCandidate => ServerMessage::IceCandidate(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, MessagePushError> {
        serde_json::to_string(self).map_err(|e| MessagePushError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn decode(text: &str) -> Result<ClientMessage, ProtocolError> {
        ClientMessage::try_from(Envelope::from_json(text).unwrap())
    }

    #[test]
    fn test_decode_get_online_users_ignores_payload() {
        // Test: get-online-users needs no payload
        assert!(matches!(
            decode(r#"{"type":"get-online-users"}"#),
            Ok(ClientMessage::GetOnlineUsers)
        ));
        assert!(matches!(
            decode(r#"{"type":"get-online-users","payload":[1,2]}"#),
            Ok(ClientMessage::GetOnlineUsers)
        ));
    }

    #[test]
    fn test_decode_join_room() {
        // Test: join-room carries the requested name
        // when:
        let message = decode(r#"{"type":"join-room","payload":{"userName":"Alice"}}"#);

        // then:
        match message {
            Ok(ClientMessage::JoinRoom(payload)) => assert_eq!(payload.user_name, "Alice"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_join_room_without_name_yields_empty_name() {
        // Test: a missing userName decodes as an empty name
        match decode(r#"{"type":"join-room","payload":{}}"#) {
            Ok(ClientMessage::JoinRoom(payload)) => assert!(payload.user_name.is_empty()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_join_room_with_malformed_payload() {
        // Test: a payload of the wrong shape is an invalid payload
        assert!(matches!(
            decode(r#"{"type":"join-room","payload":{"userName":42}}"#),
            Err(ProtocolError::InvalidPayload)
        ));
        assert!(matches!(
            decode(r#"{"type":"join-room","payload":"Alice"}"#),
            Err(ProtocolError::InvalidPayload)
        ));
        assert!(matches!(
            decode(r#"{"type":"join-room"}"#),
            Err(ProtocolError::InvalidPayload)
        ));
    }

    #[test]
    fn test_decode_null_payload_reads_as_empty_object() {
        // Test: an explicit null payload behaves like {} rather than a missing payload
        // when:
        let join = decode(r#"{"type":"join-room","payload":null}"#);
        let offer = decode(r#"{"type":"offer","payload":null}"#);

        // then:
        match join {
            Ok(ClientMessage::JoinRoom(payload)) => assert!(payload.user_name.is_empty()),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(offer, Err(ProtocolError::MissingTarget)));
        assert!(matches!(
            decode(r#"{"type":"offer"}"#),
            Err(ProtocolError::InvalidPayload)
        ));
    }

    #[test]
    fn test_decode_leave_room() {
        assert!(matches!(
            decode(r#"{"type":"leave-room","payload":null}"#),
            Ok(ClientMessage::LeaveRoom)
        ));
    }

    #[test]
    fn test_decode_unknown_type() {
        // Test: unrecognized tags are rejected explicitly
        let result = decode(r#"{"type":"chat","payload":{"text":"hi"}}"#);
        assert!(matches!(result, Err(ProtocolError::UnknownType(ref t)) if t == "chat"));
        assert_eq!(result.unwrap_err().to_string(), "unknown type");
    }

    #[test]
    fn test_decode_relay_strips_target_and_sender() {
        // Test: target is extracted and a spoofed sender is dropped
        // when:
        let message = decode(
            r#"{"type":"offer","payload":{"target":"abc","sender":"mallory","sdp":"v=0"}}"#,
        );

        // then:
        match message {
            Ok(ClientMessage::Relay(relay)) => {
                assert_eq!(relay.kind, SignalKind::Offer);
                assert_eq!(relay.target, "abc");
                assert_eq!(relay.fields.len(), 1);
                assert!(relay.fields.get("sender").is_none());
                assert_eq!(relay.fields.get("sdp").map(RawValue::get), Some(r#""v=0""#));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_relay_target_errors() {
        // Test: missing, non-string and non-object payloads map to distinct errors
        assert!(matches!(
            decode(r#"{"type":"answer","payload":{"sdp":"v=0"}}"#),
            Err(ProtocolError::MissingTarget)
        ));
        assert!(matches!(
            decode(r#"{"type":"answer","payload":{"target":7}}"#),
            Err(ProtocolError::InvalidTarget)
        ));
        assert!(matches!(
            decode(r#"{"type":"ice-candidate","payload":["target"]}"#),
            Err(ProtocolError::InvalidPayload)
        ));
        assert!(matches!(
            decode(r#"{"type":"ice-candidate"}"#),
            Err(ProtocolError::InvalidPayload)
        ));
    }

    #[test]
    fn test_envelope_requires_type() {
        // Test: frames that are not envelopes fail at the first decoding step
        assert!(Envelope::from_json(r#"{"payload":{}}"#).is_err());
        assert!(Envelope::from_json("not json").is_err());
    }

    #[test]
    fn test_relay_payload_preserves_field_bytes() {
        // Test: forwarded fields keep their exact bytes, order and formatting
        // given:
        let candidate = r#"{ "candidate" : "candidate:1 1 UDP 2122252543 192.168.1.2 54321 typ host",
            "sdpMid":"0", "sdpMLineIndex" : 0, "usernameFragment":null, "ratio": 1.50 }"#;
        let text = format!(
            r#"{{"type":"ice-candidate","payload":{{"target":"peer-b","candidate":{},"seq":1e3}}}}"#,
            candidate
        );
        let relay = match decode(&text) {
            Ok(ClientMessage::Relay(relay)) => relay,
            other => panic!("unexpected: {:?}", other),
        };

        // when:
        let json = ServerMessage::relay(
            relay.kind,
            RelayPayload {
                sender: "peer-a".to_string(),
                fields: relay.fields,
            },
        )
        .to_json()
        .unwrap();

        // then:
        assert_eq!(
            json,
            format!(
                r#"{{"type":"ice-candidate","payload":{{"sender":"peer-a","candidate":{},"seq":1e3}}}}"#,
                candidate
            )
        );
    }

    #[test]
    fn test_server_message_shapes() {
        // Test: outbound messages follow the envelope format
        let user = UserInfo {
            user_id: "id-1".to_string(),
            user_name: "Alice".to_string(),
        };
        let cases = vec![
            (
                ServerMessage::Connected {
                    id: "id-1".to_string(),
                },
                json!({"type": "connected", "payload": {"id": "id-1"}}),
            ),
            (
                ServerMessage::OnlineUsersList(vec![user.clone()]),
                json!({"type": "online-users-list", "payload": [{"userId": "id-1", "userName": "Alice"}]}),
            ),
            (
                ServerMessage::CurrentUsers(vec![]),
                json!({"type": "current-users", "payload": []}),
            ),
            (
                ServerMessage::UserJoined(user),
                json!({"type": "user-joined", "payload": {"userId": "id-1", "userName": "Alice"}}),
            ),
            (
                ServerMessage::UserLeft("id-1".to_string()),
                json!({"type": "user-left", "payload": "id-1"}),
            ),
            (
                ServerMessage::error("target not online"),
                json!({"type": "error", "payload": {"message": "target not online"}}),
            ),
        ];

        for (message, expected) in cases {
            let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
            assert_eq!(value, expected);
        }
    }
}
