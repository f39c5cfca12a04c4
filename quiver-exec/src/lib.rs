#![forbid(unsafe_code)]

//! Runtime engine for quiver projects: resolves request templates against the
//! session's variable store, performs the HTTP calls, applies named callbacks,
//! and appends every outcome to an append-only record sink. The Socket.IO
//! monitor lives here too, sharing nothing with the executor but the sink.

pub mod callback;
pub mod executor;
pub mod monitor;
pub mod sink;

pub use crate::callback::{Callback, CallbackError, CallbackRegistry, CaptureField, IncrementVar};
pub use crate::executor::{
    ExecutionError, ExecutionRecord, ExecutionReport, HttpClient, HttpError, HttpOutcome,
    HttpRequestParts, HttpResponseParts, Outcome, ReqwestHttpClient, ResolvedRequest, Session,
    SessionConfig,
};
pub use crate::monitor::{MonitorConfig, MonitorError, MonitorHandle, MonitorState, SocketMonitor};
pub use crate::sink::{
    CompositeSink, JsonlSink, LogRecord, MonitorPhase, RecordSink, SocketEvent, StdoutSink,
};
