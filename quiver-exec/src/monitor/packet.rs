//! Minimal engine.io v4 / socket.io framing over a WebSocket text transport.
//!
//! An engine.io text frame starts with a packet-type digit; a `4` (message)
//! frame carries a socket.io packet, which is its own type digit, an optional
//! `/namespace,` prefix, an optional ack id, and a JSON payload. Only the
//! packets a passive monitor needs are modeled.

use quiver_core::types::AnyValue;

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake payload (sid, ping interval, ...). Sent by the server first.
    Open(AnyValue),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        payload: Option<AnyValue>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        event: String,
        payload: AnyValue,
    },
    Ack {
        namespace: String,
        payload: AnyValue,
    },
    ConnectError {
        namespace: String,
        payload: Option<AnyValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine.io packet type `{0}`")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type `{0}`")]
    UnknownSocketType(char),
    #[error("invalid JSON payload: {0}")]
    BadJson(String),
    #[error("event payload must be a JSON array starting with the event name")]
    BadEvent,
}

pub fn decode(frame: &str) -> Result<EnginePacket, PacketError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(EnginePacket::Open(parse_json(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => Ok(EnginePacket::Message(decode_socket(rest)?)),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(PacketError::UnknownEngineType(other)),
    }
}

fn decode_socket(input: &str) -> Result<SocketPacket, PacketError> {
    let mut chars = input.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();

    let (namespace, rest) = split_namespace(rest);
    // Ack ids are numeric and precede the payload; the monitor never acks,
    // so the id itself is dropped.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => Ok(SocketPacket::Connect {
            namespace,
            payload: parse_optional_json(rest)?,
        }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let value = parse_json(rest)?;
            let AnyValue::Array(items) = value else {
                return Err(PacketError::BadEvent);
            };
            let mut items = items.into_iter();
            let event = match items.next() {
                Some(AnyValue::String(name)) => name,
                _ => return Err(PacketError::BadEvent),
            };
            let payload = items.next().unwrap_or(AnyValue::Null);
            Ok(SocketPacket::Event {
                namespace,
                event,
                payload,
            })
        }
        '3' => Ok(SocketPacket::Ack {
            namespace,
            payload: parse_json(rest)?,
        }),
        '4' => Ok(SocketPacket::ConnectError {
            namespace,
            payload: parse_optional_json(rest)?,
        }),
        other => Err(PacketError::UnknownSocketType(other)),
    }
}

fn split_namespace(input: &str) -> (String, &str) {
    if let Some(rest) = input.strip_prefix('/') {
        if let Some(comma) = rest.find(',') {
            return (format!("/{}", &rest[..comma]), &rest[comma + 1..]);
        }
        return (format!("/{rest}"), "");
    }
    ("/".to_string(), input)
}

fn parse_json(input: &str) -> Result<AnyValue, PacketError> {
    if input.is_empty() {
        return Ok(AnyValue::Null);
    }
    serde_json::from_str(input).map_err(|e| PacketError::BadJson(e.to_string()))
}

fn parse_optional_json(input: &str) -> Result<Option<AnyValue>, PacketError> {
    if input.is_empty() {
        return Ok(None);
    }
    Ok(Some(parse_json(input)?))
}

pub fn encode_pong() -> String {
    "3".to_string()
}

/// The socket.io namespace-connect packet, sent after the engine.io open.
pub fn encode_connect(namespace: &str) -> String {
    if namespace.is_empty() || namespace == "/" {
        "40".to_string()
    } else {
        format!("40{namespace},")
    }
}

pub fn encode_event(namespace: &str, event: &str, payload: &AnyValue) -> String {
    let array = AnyValue::Array(vec![AnyValue::String(event.to_string()), payload.clone()]);
    let json = serde_json::to_string(&array).unwrap_or_else(|_| "[]".to_string());
    if namespace.is_empty() || namespace == "/" {
        format!("42{json}")
    } else {
        format!("42{namespace},{json}")
    }
}
