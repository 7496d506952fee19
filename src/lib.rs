pub mod config;
pub mod error;
pub mod facade;
pub mod pipeline;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

pub use config::Config;

use facade::ReportFacade;
use pipeline::outbound::{HttpCloudStore, LocalFileStore, LogMailTransport};
use pipeline::{DeliveryDefaults, Outbound, ReportOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub facade: ReportFacade,
}

impl AppState {
    pub fn new(orchestrator: Arc<ReportOrchestrator>) -> Self {
        Self {
            facade: ReportFacade::new(orchestrator),
        }
    }

    /// Wires the default collaborators and configured delivery targets.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let outbound = Outbound {
            mail: Arc::new(LogMailTransport),
            files: Arc::new(LocalFileStore::new(&config.download_dir)),
            cloud: Arc::new(HttpCloudStore::new()?),
        };
        let defaults = DeliveryDefaults::default()
            .with_target("email", config.email_recipient.clone())
            .with_target("cloud", config.cloud_url.clone());

        Ok(Self::new(Arc::new(ReportOrchestrator::new(
            outbound, defaults,
        ))))
    }
}
