use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::hosts::{HostRegistry, RegistryError};
use crate::ingest::RemoteImageFetcher;
use crate::observability::Metrics;
use crate::store::{FjallHostStore, HostStore, StoreError};
use crate::upload::{
    FailoverOrchestrator, ReqwestTransport, Transport, TransportConfig, TransportError,
    UploadService,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open host store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to seed host store: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to build HTTP client: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: HostRegistry,
    pub service: UploadService,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the upload pipeline over an already opened store and transport,
    /// seeding the store if it is empty
    pub fn new(
        config: Config,
        store: Arc<dyn HostStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RegistryError> {
        let metrics = Arc::new(Metrics::new());
        let registry = HostRegistry::new(store);
        registry.seed_if_empty(config.hosts.seed_hosts())?;

        let orchestrator =
            FailoverOrchestrator::new(registry.clone(), transport.clone(), metrics.clone());
        let fetcher = RemoteImageFetcher::new(transport, config.fetcher.clone());
        let service = UploadService::new(
            orchestrator,
            fetcher,
            metrics.clone(),
            config.server.max_upload_bytes,
        );

        Ok(Self {
            config: Arc::new(config),
            registry,
            service,
            metrics,
        })
    }

    /// Production wiring: fjall store at `server.store_path`, reqwest transport
    pub fn open(config: Config) -> Result<Self, BootstrapError> {
        info!(path = %config.server.store_path.display(), "Opening host store");
        let store = FjallHostStore::open(&config.server.store_path)?;
        let transport = ReqwestTransport::new(TransportConfig::default())?;
        Ok(Self::new(config, Arc::new(store), Arc::new(transport))?)
    }
}
