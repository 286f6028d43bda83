use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::error::UploadError;
use super::orchestrator::{FailoverOrchestrator, HostFailure, UploadOutcome};
use super::payload::ImagePayload;
use crate::humanize::ByteSize;
use crate::ingest::{DecodeError, RemoteImageFetcher, decode_data_url};
use crate::observability::Metrics;

/// Caller-facing upload operations.
///
/// Local validation happens here; anything that reaches a host is reported
/// through [`UploadOutcome`] rather than an error.
#[derive(Clone)]
pub struct UploadService {
    orchestrator: FailoverOrchestrator,
    fetcher: RemoteImageFetcher,
    metrics: Arc<Metrics>,
    max_upload: ByteSize,
}

impl UploadService {
    pub fn new(
        orchestrator: FailoverOrchestrator,
        fetcher: RemoteImageFetcher,
        metrics: Arc<Metrics>,
        max_upload: ByteSize,
    ) -> Self {
        Self {
            orchestrator,
            fetcher,
            metrics,
            max_upload,
        }
    }

    pub fn orchestrator(&self) -> &FailoverOrchestrator {
        &self.orchestrator
    }

    pub fn max_upload(&self) -> ByteSize {
        self.max_upload
    }

    pub async fn upload_single(&self, payload: ImagePayload) -> Result<UploadOutcome, UploadError> {
        self.check_local(&payload)?;
        Ok(self.orchestrator.upload(&payload).await)
    }

    /// One outcome per file, in input order. A bad file does not stop the rest.
    pub async fn upload_batch(&self, payloads: Vec<ImagePayload>) -> Vec<UploadOutcome> {
        let total = payloads.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, payload) in payloads.into_iter().enumerate() {
            let filename = payload.filename.clone();
            let outcome = match self.upload_single(payload).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(index, filename = %filename, error = %e, "Batch file rejected");
                    self.metrics.upload_failed();
                    UploadOutcome::failed(e.to_string(), Vec::new())
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(total, succeeded, "Batch upload finished");
        outcomes
    }

    pub async fn upload_from_base64(&self, data_url: &str) -> Result<UploadOutcome, UploadError> {
        let payload = decode_data_url(data_url, self.max_upload.as_u64()).map_err(|e| match e {
            DecodeError::TooLarge { size, limit } => UploadError::PayloadTooLarge { size, limit },
            other => UploadError::InvalidInput(other.to_string()),
        })?;
        self.upload_single(payload).await
    }

    #[instrument(skip(self))]
    pub async fn upload_from_remote_url(&self, url: &str) -> Result<UploadOutcome, UploadError> {
        let payload = self.fetcher.fetch(url).await?;
        self.metrics.remote_fetched();
        self.upload_single(payload).await
    }

    /// Push the builtin test image to exactly one host, enabled or not
    pub async fn test_host(&self, host_id: u64) -> Result<UploadOutcome, UploadError> {
        let host = self
            .orchestrator
            .registry()
            .get(host_id)?
            .ok_or(UploadError::HostNotFound(host_id))?;

        info!(host_id, host_name = %host.name, "Testing image host");
        let outcome = match self.orchestrator.attempt(&host, &ImagePayload::test_image()).await {
            Ok(url) => UploadOutcome::succeeded(&host, url, Vec::new()),
            Err(e) => UploadOutcome::failed(
                format!("test upload to {} failed", host.name),
                vec![HostFailure {
                    host_id: Some(host.id),
                    host_name: host.name.clone(),
                    message: e.to_string(),
                }],
            ),
        };
        Ok(outcome)
    }

    fn check_local(&self, payload: &ImagePayload) -> Result<(), UploadError> {
        if payload.is_empty() {
            return Err(UploadError::InvalidInput(format!(
                "image '{}' is empty",
                payload.filename
            )));
        }
        if self.max_upload.is_exceeded_by(payload.len()) {
            return Err(UploadError::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_upload.as_u64(),
            });
        }
        Ok(())
    }
}
