use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::encoder::encode;
use super::error::AttemptError;
use super::interpreter::interpret;
use super::payload::ImagePayload;
use super::transport::Transport;
use crate::hosts::{HostDefinition, HostRegistry};
use crate::observability::Metrics;

pub const MSG_NO_HOSTS: &str = "no image hosts configured";
pub const MSG_ALL_FAILED: &str = "all image hosts failed";

/// One host that was tried and did not produce a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFailure {
    pub host_id: Option<u64>,
    pub host_name: String,
    pub message: String,
}

/// Result of pushing one image through the failover chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_host_name: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<HostFailure>,
}

impl UploadOutcome {
    pub fn succeeded(host: &HostDefinition, url: String, errors: Vec<HostFailure>) -> Self {
        Self {
            success: true,
            url: Some(url),
            used_host_name: Some(host.name.clone()),
            message: format!("uploaded via {}", host.name),
            errors,
        }
    }

    pub fn failed(message: impl Into<String>, errors: Vec<HostFailure>) -> Self {
        Self {
            success: false,
            url: None,
            used_host_name: None,
            message: message.into(),
            errors,
        }
    }
}

/// Tries enabled hosts one after another until one returns a URL
#[derive(Clone)]
pub struct FailoverOrchestrator {
    registry: HostRegistry,
    transport: Arc<dyn Transport>,
    metrics: Arc<Metrics>,
}

impl FailoverOrchestrator {
    pub fn new(registry: HostRegistry, transport: Arc<dyn Transport>, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            transport,
            metrics,
        }
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    #[instrument(skip_all, fields(filename = %payload.filename, size = payload.len()))]
    pub async fn upload(&self, payload: &ImagePayload) -> UploadOutcome {
        let candidates = match self.registry.list_candidates() {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Could not load upload candidates");
                let failure = HostFailure {
                    host_id: None,
                    host_name: "registry".to_string(),
                    message: e.to_string(),
                };
                return self.finish(UploadOutcome::failed(MSG_ALL_FAILED, vec![failure]));
            }
        };

        if candidates.is_empty() {
            warn!("No enabled image hosts");
            return self.finish(UploadOutcome::failed(MSG_NO_HOSTS, Vec::new()));
        }

        let mut errors = Vec::with_capacity(candidates.len());
        for host in &candidates {
            match self.attempt(host, payload).await {
                Ok(url) => {
                    return self.finish(UploadOutcome::succeeded(host, url, errors));
                }
                Err(e) => errors.push(HostFailure {
                    host_id: Some(host.id),
                    host_name: host.name.clone(),
                    message: e.to_string(),
                }),
            }
        }

        warn!(attempts = errors.len(), "All image hosts failed");
        self.finish(UploadOutcome::failed(MSG_ALL_FAILED, errors))
    }

    /// Single encode, send, interpret cycle against `host`
    pub async fn attempt(
        &self,
        host: &HostDefinition,
        payload: &ImagePayload,
    ) -> Result<String, AttemptError> {
        self.metrics.host_attempted();

        let result = self.send_to(host, payload).await;
        match &result {
            Ok(url) => {
                info!(host_id = host.id, host_name = %host.name, url = %url, "Host accepted image");
            }
            Err(e) => {
                self.metrics.host_failed();
                warn!(host_id = host.id, host_name = %host.name, error = %e, "Host attempt failed");
            }
        }
        result
    }

    async fn send_to(
        &self,
        host: &HostDefinition,
        payload: &ImagePayload,
    ) -> Result<String, AttemptError> {
        let request = encode(host, payload)?;
        let response = self.transport.send(request).await?;
        Ok(interpret(host, response.status, &response.body)?)
    }

    fn finish(&self, outcome: UploadOutcome) -> UploadOutcome {
        if outcome.success {
            self.metrics.upload_succeeded();
        } else {
            self.metrics.upload_failed();
        }
        outcome
    }
}
