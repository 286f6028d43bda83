//! Sending images to external hosts with ordered failover
//!
//! One attempt is `encode` -> [`Transport::send`] -> `interpret`; the
//! [`FailoverOrchestrator`] runs attempts over the registry's candidates and
//! [`UploadService`] wraps it with local validation and the ingest paths.

mod encoder;
mod error;
pub mod field_path;
mod interpreter;
mod orchestrator;
mod payload;
mod service;
mod transport;

pub use encoder::{FilePart, HOST_REPLY_LIMIT, OutboundRequest, RequestBody, encode};
pub use error::{AttemptError, ProviderError, TransportError, UploadError};
pub use interpreter::{interpret, normalize_url};
pub use orchestrator::{
    FailoverOrchestrator, HostFailure, MSG_ALL_FAILED, MSG_NO_HOSTS, UploadOutcome,
};
pub use payload::{ImagePayload, TEST_IMAGE_PNG};
pub use service::UploadService;
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportConfig};
