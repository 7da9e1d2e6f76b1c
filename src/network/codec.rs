//! Socket.IO v5 packets carried in Engine.IO v4 text frames.
//!
//! Only the default namespace is used. A frame is one Engine.IO packet type
//! digit, and for Engine.IO `message` packets a Socket.IO packet type digit
//! follows, then an optional `/namespace,`, an optional ack id and JSON data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Parameters the server announces in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace connect. Sent bare by the client, answered with a payload by the server.
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(Value),
}

impl Packet {
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Self::Event {
            name: name.into(),
            payload,
        }
    }
}

pub fn decode(frame: &str) -> Result<Packet, ClientError> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ClientError::Protocol("empty frame".to_string()))?;
    let body = chars.as_str();

    match kind {
        '0' => Ok(Packet::Open(serde_json::from_str(body)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket_packet(body),
        '6' => Ok(Packet::Noop),
        other => Err(ClientError::Protocol(format!(
            "unknown engine packet type `{other}`"
        ))),
    }
}

fn decode_socket_packet(body: &str) -> Result<Packet, ClientError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ClientError::Protocol("message packet without socket type".to_string()))?;
    let data = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect(parse_optional(data)?)),
        '1' => Ok(Packet::Disconnect),
        '2' => {
            let data = data.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut items: Vec<Value> = serde_json::from_str(data)?;
            if items.is_empty() {
                return Err(ClientError::Protocol("event without a name".to_string()));
            }
            let name = match items.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(ClientError::Protocol(format!(
                        "event name is not a string: {other}"
                    )));
                }
            };
            let payload = items.into_iter().next().unwrap_or(Value::Null);
            Ok(Packet::Event { name, payload })
        }
        '4' => Ok(Packet::ConnectError(
            parse_optional(data)?.unwrap_or(Value::Null),
        )),
        other => Err(ClientError::Protocol(format!(
            "unsupported socket packet type `{other}`"
        ))),
    }
}

fn strip_namespace(data: &str) -> &str {
    if !data.starts_with('/') {
        return data;
    }
    match data.find(',') {
        Some(index) => &data[index + 1..],
        None => "",
    }
}

fn parse_optional(data: &str) -> Result<Option<Value>, ClientError> {
    if data.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::from_str(data)?))
    }
}

pub fn encode(packet: &Packet) -> Result<String, ClientError> {
    let frame = match packet {
        Packet::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
        Packet::Close => "1".to_string(),
        Packet::Ping => "2".to_string(),
        Packet::Pong => "3".to_string(),
        Packet::Noop => "6".to_string(),
        Packet::Connect(None) => "40".to_string(),
        Packet::Connect(Some(data)) => format!("40{data}"),
        Packet::Disconnect => "41".to_string(),
        Packet::Event { name, payload } => {
            format!("42{}", serde_json::to_string(&(name, payload))?)
        }
        Packet::ConnectError(data) => format!("44{data}"),
    };
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let packet = decode(frame).unwrap();
        assert_eq!(
            packet,
            Packet::Open(Handshake {
                sid: "abc".to_string(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn decodes_namespace_connect_ack() {
        assert_eq!(
            decode(r#"40{"sid":"xyz"}"#).unwrap(),
            Packet::Connect(Some(json!({"sid": "xyz"})))
        );
        assert_eq!(decode("40").unwrap(), Packet::Connect(None));
    }

    #[test]
    fn decodes_event_with_payload() {
        let frame = r#"42["notification",{"msg":"alice joined lobby"}]"#;
        assert_eq!(
            decode(frame).unwrap(),
            Packet::event("notification", json!({"msg": "alice joined lobby"}))
        );
    }

    #[test]
    fn decodes_event_with_namespace_and_ack_id() {
        let frame = r#"42/chat,17["receive_message",{"sender":"bob"}]"#;
        assert_eq!(
            decode(frame).unwrap(),
            Packet::event("receive_message", json!({"sender": "bob"}))
        );
    }

    #[test]
    fn event_without_payload_carries_null() {
        assert_eq!(
            decode(r#"42["ping_me"]"#).unwrap(),
            Packet::event("ping_me", Value::Null)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("9").is_err());
        assert!(decode("42[]").is_err());
        assert!(decode("42[1,2]").is_err());
        assert!(decode("42not-json").is_err());
    }

    #[test]
    fn encodes_client_frames() {
        assert_eq!(encode(&Packet::Pong).unwrap(), "3");
        assert_eq!(encode(&Packet::Connect(None)).unwrap(), "40");
        assert_eq!(encode(&Packet::Disconnect).unwrap(), "41");
        assert_eq!(
            encode(&Packet::event("join_room", json!({"room": "lobby", "user": "alice"}))).unwrap(),
            r#"42["join_room",{"room":"lobby","user":"alice"}]"#
        );
    }
}
