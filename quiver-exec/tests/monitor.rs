use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use quiver_exec::{
    LogRecord, MonitorConfig, MonitorPhase, MonitorState, RecordSink, SocketMonitor,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const OPEN_FRAME: &str = r#"0{"sid":"test","pingInterval":25000,"pingTimeout":20000}"#;

struct CollectSink {
    records: Mutex<Vec<LogRecord>>,
}

impl CollectSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
        })
    }

    fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::SocketEvent(e) => Some(e.event),
                _ => None,
            })
            .collect()
    }

    fn phases(&self) -> Vec<MonitorPhase> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::MonitorStatus { phase, .. } => Some(phase),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for CollectSink {
    async fn append(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    (listener, endpoint)
}

/// Accepts one connection and walks it through the engine.io open and the
/// namespace connect ack.
async fn accept_and_handshake(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    ws.send(Message::Text(OPEN_FRAME.to_string())).await.unwrap();
    loop {
        let message = ws.next().await.unwrap().unwrap();
        if let Message::Text(text) = message {
            assert!(text.starts_with("40"), "expected namespace connect, got {text}");
            break;
        }
    }
    ws.send(Message::Text(r#"40{"sid":"s1"}"#.to_string()))
        .await
        .unwrap();
    ws
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within the test window");
}

#[tokio::test]
async fn delivers_events_to_the_sink_and_stops_cleanly() {
    let (listener, endpoint) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(&listener).await;
        ws.send(Message::Text(r#"42["price_update",{"price":"3.50"}]"#.to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"42["stock_update",{"left":4}]"#.to_string()))
            .await
            .unwrap();
        // Hold the connection open until the client goes away.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let sink = CollectSink::new();
    let handle = SocketMonitor::start(MonitorConfig::new(endpoint), sink.clone());

    wait_for(|| sink.events().len() == 2).await;
    assert_eq!(sink.events(), vec!["price_update", "stock_update"]);
    assert_eq!(handle.state(), MonitorState::Connected);
    assert_eq!(sink.phases(), vec![MonitorPhase::Connected]);

    handle.stop().await.unwrap();
    assert!(sink.phases().contains(&MonitorPhase::Stopped));
    server.await.unwrap();
}

#[tokio::test]
async fn reconnects_once_after_the_server_drops() {
    let (listener, endpoint) = bind().await;
    let server = tokio::spawn(async move {
        // First connection: handshake, one event, then drop.
        let mut ws = accept_and_handshake(&listener).await;
        ws.send(Message::Text(r#"42["tick",1]"#.to_string()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        drop(ws);

        // Second connection: handshake again and stay up.
        let mut ws = accept_and_handshake(&listener).await;
        ws.send(Message::Text(r#"42["tick",2]"#.to_string()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let sink = CollectSink::new();
    let handle = SocketMonitor::start(MonitorConfig::new(endpoint), sink.clone());

    wait_for(|| sink.events().len() == 2).await;
    let phases = sink.phases();
    assert!(phases.contains(&MonitorPhase::Disconnected));
    assert!(phases.contains(&MonitorPhase::Reconnecting));
    assert_eq!(
        phases.iter().filter(|p| **p == MonitorPhase::Connected).count(),
        2
    );
    assert_eq!(handle.state(), MonitorState::Connected);

    handle.stop().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn answers_engine_pings_with_pongs() {
    let (listener, endpoint) = bind().await;
    let (pong_tx, pong_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(&listener).await;
        ws.send(Message::Text("2".to_string())).await.unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) if text == "3" => {
                    pong_tx.send(()).unwrap();
                    break;
                }
                Some(Ok(_)) => continue,
                _ => panic!("connection ended before the pong arrived"),
            }
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let sink = CollectSink::new();
    let handle = SocketMonitor::start(MonitorConfig::new(endpoint), sink.clone());

    tokio::time::timeout(Duration::from_secs(5), pong_rx)
        .await
        .expect("no pong within the test window")
        .unwrap();

    handle.stop().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn emits_the_configured_event_after_connecting() {
    let (listener, endpoint) = bind().await;
    let (emit_tx, emit_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(&listener).await;
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) if text.starts_with("42") => {
                    emit_tx.send(text).unwrap();
                    break;
                }
                Some(Ok(_)) => continue,
                _ => panic!("connection ended before the emit arrived"),
            }
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut config = MonitorConfig::new(endpoint);
    config.emit_on_connect = Some((
        "subscribe".to_string(),
        serde_json::json!({"channel": "prices"}),
    ));
    let sink = CollectSink::new();
    let handle = SocketMonitor::start(config, sink.clone());

    let frame = tokio::time::timeout(Duration::from_secs(5), emit_rx)
        .await
        .expect("no emit within the test window")
        .unwrap();
    assert_eq!(frame, r#"42["subscribe",{"channel":"prices"}]"#);

    handle.stop().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn ignores_events_from_other_namespaces() {
    let (listener, endpoint) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(&listener).await;
        ws.send(Message::Text(r#"42/other,["noise",1]"#.to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"42["signal",1]"#.to_string()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let sink = CollectSink::new();
    let handle = SocketMonitor::start(MonitorConfig::new(endpoint), sink.clone());

    wait_for(|| !sink.events().is_empty()).await;
    assert_eq!(sink.events(), vec!["signal"]);

    handle.stop().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn gives_up_after_a_failed_reconnect() {
    let (listener, endpoint) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_and_handshake(&listener).await;
        ws.close(None).await.unwrap();
        drop(ws);
        // No second accept: the reconnect attempt must fail.
        drop(listener);
    });

    let sink = CollectSink::new();
    let handle = SocketMonitor::start(MonitorConfig::new(endpoint), sink.clone());

    wait_for(|| handle.state() == MonitorState::Disconnected && sink.phases().len() >= 3).await;
    server.await.unwrap();
}
