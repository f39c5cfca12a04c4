pub mod packet;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use quiver_core::types::AnyValue;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

use crate::monitor::packet::{
    decode, encode_connect, encode_event, encode_pong, EnginePacket, SocketPacket,
};
use crate::sink::{LogRecord, MonitorPhase, RecordSink, SocketEvent};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base endpoint, `http(s)://` or `ws(s)://`; the `/socket.io/` engine.io
    /// path is appended here.
    pub endpoint: String,
    pub namespace: String,
    pub params: BTreeMap<String, String>,
    /// Optional event to emit once, right after the namespace connect.
    pub emit_on_connect: Option<(String, AnyValue)>,
}

impl MonitorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: "/".to_string(),
            params: BTreeMap::new(),
            emit_on_connect: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("monitor task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Disconnected,
    Connecting,
    Connected,
    Stopped,
}

/// Passive Socket.IO listener. Runs as an independent task, shares nothing
/// with the request executor but the record sink, and never touches the
/// variable store.
pub struct SocketMonitor;

pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<MonitorState>,
    task: tokio::task::JoinHandle<Result<(), MonitorError>>,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        *self.state_rx.borrow()
    }

    /// Signals the monitor to stop and waits for the task to finish.
    pub async fn stop(self) -> Result<(), MonitorError> {
        let _ = self.stop_tx.send(true);
        self.task
            .await
            .map_err(|e| MonitorError::Task(e.to_string()))?
    }
}

impl SocketMonitor {
    /// Spawns the monitor task. Every received event and every lifecycle
    /// change is appended to `sink`; errors end the task but never the host.
    pub fn start(config: MonitorConfig, sink: Arc<dyn RecordSink>) -> MonitorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(MonitorState::Disconnected);
        let task = tokio::spawn(run(config, sink, stop_rx, state_tx));
        MonitorHandle {
            stop_tx,
            state_rx,
            task,
        }
    }
}

enum ListenEnd {
    Stopped,
    Lost(String),
}

/// Connect and engine.io/socket.io handshake must finish within this window;
/// the steady-state listen loop itself has no timeout.
const HANDSHAKE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

async fn with_handshake_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, MonitorError>>,
) -> Result<T, MonitorError> {
    tokio::time::timeout(HANDSHAKE_TIMEOUT, fut)
        .await
        .map_err(|_| MonitorError::Handshake("handshake timed out".to_string()))?
}

async fn run(
    config: MonitorConfig,
    sink: Arc<dyn RecordSink>,
    mut stop: watch::Receiver<bool>,
    state: watch::Sender<MonitorState>,
) -> Result<(), MonitorError> {
    let url = websocket_url(&config)?;
    let mut reconnected = false;

    loop {
        match connect_and_listen(&config, &url, &sink, &mut stop, &state).await {
            Ok(ListenEnd::Stopped) => {
                let _ = state.send(MonitorState::Stopped);
                status(&sink, &config, MonitorPhase::Stopped, None).await;
                return Ok(());
            }
            Ok(ListenEnd::Lost(detail)) => {
                let _ = state.send(MonitorState::Disconnected);
                status(&sink, &config, MonitorPhase::Disconnected, Some(detail.clone())).await;
                if reconnected {
                    return Err(MonitorError::ConnectionLost(detail));
                }
                reconnected = true;
                status(&sink, &config, MonitorPhase::Reconnecting, None).await;
            }
            Err(e) => {
                let _ = state.send(MonitorState::Disconnected);
                status(&sink, &config, MonitorPhase::Disconnected, Some(e.to_string())).await;
                if reconnected {
                    return Err(e);
                }
                reconnected = true;
                status(&sink, &config, MonitorPhase::Reconnecting, None).await;
            }
        }
    }
}

fn websocket_url(config: &MonitorConfig) -> Result<url::Url, MonitorError> {
    let mut url = url::Url::parse(&config.endpoint)
        .map_err(|_| MonitorError::InvalidEndpoint(config.endpoint.clone()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(MonitorError::InvalidEndpoint(config.endpoint.clone())),
    };
    url.set_scheme(scheme)
        .map_err(|_| MonitorError::InvalidEndpoint(config.endpoint.clone()))?;
    url.set_path("/socket.io/");
    let mut query = String::from("EIO=4&transport=websocket");
    for (k, v) in &config.params {
        query.push('&');
        query.push_str(&urlencoding::encode(k));
        query.push('=');
        query.push_str(&urlencoding::encode(v));
    }
    url.set_query(Some(&query));
    Ok(url)
}

async fn connect_and_listen(
    config: &MonitorConfig,
    url: &url::Url,
    sink: &Arc<dyn RecordSink>,
    stop: &mut watch::Receiver<bool>,
    state: &watch::Sender<MonitorState>,
) -> Result<ListenEnd, MonitorError> {
    let _ = state.send(MonitorState::Connecting);
    let (mut ws, _) = with_handshake_timeout(async {
        tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| MonitorError::Connect(e.to_string()))
    })
    .await?;

    // Engine.io handshake: wait for the open frame, then request the
    // namespace connect and wait for its ack.
    with_handshake_timeout(wait_for_open(&mut ws)).await?;
    ws.send(Message::Text(encode_connect(&config.namespace)))
        .await
        .map_err(|e| MonitorError::Handshake(e.to_string()))?;
    with_handshake_timeout(wait_for_connect_ack(&mut ws)).await?;

    let _ = state.send(MonitorState::Connected);
    status(sink, config, MonitorPhase::Connected, None).await;

    if let Some((event, payload)) = &config.emit_on_connect {
        ws.send(Message::Text(encode_event(&config.namespace, event, payload)))
            .await
            .map_err(|e| MonitorError::ConnectionLost(e.to_string()))?;
    }

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    let _ = ws.close(None).await;
                    return Ok(ListenEnd::Stopped);
                }
            }
            frame = ws.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return Ok(ListenEnd::Lost(e.to_string())),
                    None => return Ok(ListenEnd::Lost("server closed the connection".to_string())),
                };
                match message {
                    Message::Text(text) => {
                        match decode(&text) {
                            Ok(EnginePacket::Ping) => {
                                if ws.send(Message::Text(encode_pong())).await.is_err() {
                                    return Ok(ListenEnd::Lost("failed to answer ping".to_string()));
                                }
                            }
                            Ok(EnginePacket::Close) => {
                                return Ok(ListenEnd::Lost("server sent close".to_string()));
                            }
                            Ok(EnginePacket::Message(SocketPacket::Event { namespace, event, payload })) => {
                                if namespace == config.namespace {
                                    sink.append(LogRecord::SocketEvent(SocketEvent {
                                        event,
                                        payload,
                                        endpoint: config.endpoint.clone(),
                                        timestamp: Utc::now(),
                                    })).await;
                                }
                            }
                            Ok(EnginePacket::Message(SocketPacket::Disconnect { .. })) => {
                                return Ok(ListenEnd::Lost("namespace disconnected".to_string()));
                            }
                            // Pongs, acks, upgrades, and malformed frames are
                            // not the monitor's problem.
                            _ => {}
                        }
                    }
                    Message::Close(_) => {
                        return Ok(ListenEnd::Lost("server closed the connection".to_string()));
                    }
                    _ => {}
                }
            }
        }
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn wait_for_open(ws: &mut WsStream) -> Result<(), MonitorError> {
    while let Some(frame) = ws.next().await {
        let message = frame.map_err(|e| MonitorError::Handshake(e.to_string()))?;
        if let Message::Text(text) = message {
            if let Ok(EnginePacket::Open(_)) = decode(&text) {
                return Ok(());
            }
        }
    }
    Err(MonitorError::Handshake(
        "connection closed before engine.io open".to_string(),
    ))
}

async fn wait_for_connect_ack(ws: &mut WsStream) -> Result<(), MonitorError> {
    while let Some(frame) = ws.next().await {
        let message = frame.map_err(|e| MonitorError::Handshake(e.to_string()))?;
        if let Message::Text(text) = message {
            match decode(&text) {
                Ok(EnginePacket::Message(SocketPacket::Connect { .. })) => return Ok(()),
                Ok(EnginePacket::Message(SocketPacket::ConnectError { payload, .. })) => {
                    return Err(MonitorError::Handshake(format!(
                        "namespace connect rejected: {}",
                        payload
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    )));
                }
                _ => {}
            }
        }
    }
    Err(MonitorError::Handshake(
        "connection closed before namespace ack".to_string(),
    ))
}

async fn status(
    sink: &Arc<dyn RecordSink>,
    config: &MonitorConfig,
    phase: MonitorPhase,
    detail: Option<String>,
) {
    sink.append(LogRecord::MonitorStatus {
        phase,
        endpoint: config.endpoint.clone(),
        detail,
        timestamp: Utc::now(),
    })
    .await;
}
