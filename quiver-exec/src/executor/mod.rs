pub mod http;
pub mod record;
mod request;
mod session;

pub use http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use record::{ExecutionRecord, HttpOutcome, Outcome};
pub use request::{build_url, resolve_request, ResolvedRequest};
pub use session::{ExecutionError, ExecutionReport, Session, SessionConfig};
