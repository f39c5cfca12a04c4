use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiver_core::types::AnyValue;

use crate::executor::record::ExecutionRecord;

/// An event received from the Socket.IO monitor. Logged through the same
/// sink as execution records, with an independent lifecycle.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SocketEvent {
    pub event: String,
    pub payload: AnyValue,
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Connected,
    Disconnected,
    Reconnecting,
    Stopped,
}

/// Everything the sink accepts. `MonitorStatus` entries are the monitor's
/// observability trail (connects, disconnects, reconnect attempts).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    Execution(ExecutionRecord),
    SocketEvent(SocketEvent),
    MonitorStatus {
        phase: MonitorPhase,
        endpoint: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

/// Append-only record sink. The one cross-task shared resource: the request
/// loop and the socket monitor both write here, so each `append` must be
/// atomic at the record level — appends never split a record.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: LogRecord);
}

pub struct StdoutSink;

#[async_trait]
impl RecordSink for StdoutSink {
    async fn append(&self, record: LogRecord) {
        if let Ok(json) = serde_json::to_string(&record) {
            println!("{json}");
        }
    }
}

/// One JSON record per line, appended to a file. The mutex makes each line
/// write atomic with respect to concurrent writers.
pub struct JsonlSink {
    file: Mutex<std::fs::File>,
}

impl JsonlSink {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn append(&self, record: LogRecord) {
        let Ok(json) = serde_json::to_string(&record) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{json}");
        }
    }
}

#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl RecordSink for CompositeSink {
    async fn append(&self, record: LogRecord) {
        for sink in &self.sinks {
            sink.append(record.clone()).await;
        }
    }
}
