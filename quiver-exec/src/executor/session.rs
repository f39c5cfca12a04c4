use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use quiver_core::store::VariableStore;
use quiver_core::template::ResolveError;
use quiver_core::types::{Project, RequestDefinition};
use quiver_core::validate_project;
use uuid::Uuid;

use crate::callback::{CallbackError, CallbackRegistry};
use crate::executor::http::{HttpClient, HttpRequestParts};
use crate::executor::record::{ExecutionRecord, HttpOutcome, Outcome};
use crate::executor::request::{build_url, resolve_request};

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Per-request timeout. None by default: requests wait as long as the
    /// operator is willing to.
    pub timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Config(#[from] quiver_core::ValidationError),
    #[error("request not found: {0}")]
    RequestNotFound(String),
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("failed to serialize request body: {0}")]
    BodySerialize(#[from] serde_json::Error),
}

/// What one execution produced: the record to log, plus the callback failure
/// if the callback ran and failed. A callback failure never demotes the HTTP
/// outcome — the call succeeded and its mutations were rolled back.
#[derive(Debug)]
pub struct ExecutionReport {
    pub record: ExecutionRecord,
    pub callback_error: Option<CallbackError>,
}

/// One operator session over one project: the project definition (immutable),
/// its live variable store, and the callback registry.
///
/// `execute` takes `&mut self`, so two executions against the same session
/// can never interleave — store mutation is race-free by construction, no
/// locking involved.
pub struct Session {
    project: Arc<Project>,
    store: VariableStore,
    callbacks: CallbackRegistry,
    http: Arc<dyn HttpClient>,
    config: SessionConfig,
    session_id: Uuid,
}

impl Session {
    /// Validates the project against the registered callbacks and seeds the
    /// store from the project's initial variables. Fails fast on an
    /// unregistered callback name.
    pub fn new(
        project: Project,
        callbacks: CallbackRegistry,
        http: Arc<dyn HttpClient>,
        config: SessionConfig,
    ) -> Result<Self, ExecutionError> {
        validate_project(&project, &callbacks.names())?;
        let store = VariableStore::from(project.variables.clone());
        Ok(Self {
            project: Arc::new(project),
            store,
            callbacks,
            http,
            config,
            session_id: Uuid::new_v4(),
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Executes the request at `index` in the project's request list.
    pub async fn execute(&mut self, index: usize) -> Result<ExecutionReport, ExecutionError> {
        let definition = self
            .project
            .requests
            .get(index)
            .cloned()
            .ok_or_else(|| ExecutionError::RequestNotFound(format!("index {index}")))?;
        self.execute_request(&definition).await
    }

    /// Runs one definition to completion: snapshot → resolve → send →
    /// callback → record. The caller appends the record to the sink.
    pub async fn execute_request(
        &mut self,
        definition: &RequestDefinition,
    ) -> Result<ExecutionReport, ExecutionError> {
        let snapshot = self.store.snapshot();

        let resolved = match resolve_request(definition, &self.project.api_base, &snapshot) {
            Ok(resolved) => resolved,
            Err(ResolveError::UnboundVariable { variable, path }) => {
                // No HTTP call is attempted from a partially resolved request.
                return Ok(ExecutionReport {
                    record: ExecutionRecord {
                        session_id: self.session_id,
                        desc: definition.desc.clone(),
                        method: definition.method.to_string(),
                        url: definition.endpoint.clone(),
                        outcome: Outcome::ResolutionFailed { variable, path },
                        timestamp: Utc::now(),
                    },
                    callback_error: None,
                });
            }
        };

        let url = build_url(&resolved).map_err(ExecutionError::InvalidUrl)?;
        let body_bytes = match &resolved.body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let desc = if resolved.desc.is_empty() {
            format!("{} {}", resolved.method, resolved.endpoint)
        } else {
            resolved.desc.clone()
        };

        let parts = HttpRequestParts {
            method: resolved.method.as_str().to_string(),
            url: url.clone(),
            headers: resolved.headers.clone(),
            body: body_bytes,
        };

        let timestamp = Utc::now();
        let started = Instant::now();
        let outcome = match self.http.send(parts, self.config.timeout).await {
            Ok(parts) => Outcome::Http(HttpOutcome::from_parts(
                &parts,
                started.elapsed().as_millis() as u64,
            )),
            // Not retried; the operator re-triggers if they want.
            Err(e) => Outcome::TransportFailed {
                error: e.to_string(),
            },
        };

        // The callback runs on any received response (4xx/5xx included) and
        // mutates the live store, not the snapshot, so subsequent requests
        // see its writes.
        let mut callback_error = None;
        if let (Some(name), Some(http)) = (&definition.callback, outcome.http()) {
            if let Err(e) = self.callbacks.invoke(name, &resolved, http, &mut self.store) {
                callback_error = Some(e);
            }
        }

        Ok(ExecutionReport {
            record: ExecutionRecord {
                session_id: self.session_id,
                desc,
                method: resolved.method.to_string(),
                url: url.to_string(),
                outcome,
                timestamp,
            },
            callback_error,
        })
    }
}
