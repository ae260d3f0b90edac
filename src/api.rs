//! HTTP API for the booking assistant

mod handlers;
mod types;

pub use handlers::create_router;

use crate::clinic::ClinicBackend;
use crate::llm::ModelRegistry;
use crate::runtime::{AssistantConfig, ProductionAssistant};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<ProductionAssistant>,
}

impl AppState {
    pub fn new(
        config: AssistantConfig,
        llm_registry: Arc<ModelRegistry>,
        clinic: Arc<dyn ClinicBackend>,
    ) -> Self {
        Self {
            assistant: Arc::new(ProductionAssistant::production(config, llm_registry, clinic)),
        }
    }
}
