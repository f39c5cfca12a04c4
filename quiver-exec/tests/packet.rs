use quiver_exec::monitor::packet::{
    decode, encode_connect, encode_event, encode_pong, EnginePacket, PacketError, SocketPacket,
};
use serde_json::json;

#[test]
fn decodes_the_engine_open_handshake() {
    let packet = decode(r#"0{"sid":"abc","pingInterval":25000,"pingTimeout":20000}"#).unwrap();
    match packet {
        EnginePacket::Open(payload) => assert_eq!(payload["sid"], "abc"),
        other => panic!("expected open, got {other:?}"),
    }
}

#[test]
fn decodes_ping_and_encodes_pong() {
    assert_eq!(decode("2").unwrap(), EnginePacket::Ping);
    assert_eq!(encode_pong(), "3");
}

#[test]
fn decodes_a_default_namespace_event() {
    let packet = decode(r#"42["price_update",{"product":7,"price":"3.50"}]"#).unwrap();
    assert_eq!(
        packet,
        EnginePacket::Message(SocketPacket::Event {
            namespace: "/".to_string(),
            event: "price_update".to_string(),
            payload: json!({"product": 7, "price": "3.50"}),
        })
    );
}

#[test]
fn decodes_a_namespaced_event() {
    let packet = decode(r#"42/feed,["tick",3]"#).unwrap();
    assert_eq!(
        packet,
        EnginePacket::Message(SocketPacket::Event {
            namespace: "/feed".to_string(),
            event: "tick".to_string(),
            payload: json!(3),
        })
    );
}

#[test]
fn drops_ack_ids_before_the_payload() {
    let packet = decode(r#"42514["tock"]"#).unwrap();
    assert_eq!(
        packet,
        EnginePacket::Message(SocketPacket::Event {
            namespace: "/".to_string(),
            event: "tock".to_string(),
            payload: json!(null),
        })
    );
}

#[test]
fn event_without_payload_defaults_to_null() {
    let packet = decode(r#"42["ping_me"]"#).unwrap();
    match packet {
        EnginePacket::Message(SocketPacket::Event { payload, .. }) => {
            assert_eq!(payload, json!(null))
        }
        other => panic!("expected event, got {other:?}"),
    }
}

#[test]
fn decodes_the_namespace_connect_ack() {
    let packet = decode(r#"40{"sid":"s1"}"#).unwrap();
    match packet {
        EnginePacket::Message(SocketPacket::Connect { namespace, payload }) => {
            assert_eq!(namespace, "/");
            assert_eq!(payload.unwrap()["sid"], "s1");
        }
        other => panic!("expected connect, got {other:?}"),
    }
}

#[test]
fn decodes_a_connect_error() {
    let packet = decode(r#"44{"message":"denied"}"#).unwrap();
    match packet {
        EnginePacket::Message(SocketPacket::ConnectError { payload, .. }) => {
            assert_eq!(payload.unwrap()["message"], "denied");
        }
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[test]
fn rejects_non_array_event_payloads() {
    assert_eq!(
        decode(r#"42{"not":"an array"}"#).unwrap_err(),
        PacketError::BadEvent
    );
}

#[test]
fn rejects_unknown_packet_types() {
    assert_eq!(decode("9").unwrap_err(), PacketError::UnknownEngineType('9'));
    assert_eq!(decode("").unwrap_err(), PacketError::Empty);
}

#[test]
fn encodes_namespace_connects() {
    assert_eq!(encode_connect("/"), "40");
    assert_eq!(encode_connect(""), "40");
    assert_eq!(encode_connect("/feed"), "40/feed,");
}

#[test]
fn encodes_events_with_and_without_namespace() {
    assert_eq!(
        encode_event("/", "subscribe", &json!({"channel": "prices"})),
        r#"42["subscribe",{"channel":"prices"}]"#
    );
    assert_eq!(
        encode_event("/feed", "subscribe", &json!(null)),
        r#"42/feed,["subscribe",null]"#
    );
}
