//! Model registry for the configured gateway

use super::openai::OpenAIService;
use super::{LlmService, LoggingService};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Cheap models preferred for auxiliary calls (date fallback)
const CHEAP_MODELS: &[&str] = &["gpt-4o-mini", "gpt-5-mini"];

/// Configuration for the model gateway
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// `OpenAI`-compatible base URL (e.g., `http://localhost:11434/v1`)
    pub base_url: Option<String>,
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
            default_model: std::env::var("DEFAULT_MODEL").ok(),
        }
    }
}

/// Registry of available models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    /// Create an empty registry for testing purposes
    pub fn new_empty() -> Self {
        Self {
            services: HashMap::new(),
            default_model: "test-model".to_string(),
        }
    }

    pub fn new(config: &LlmConfig) -> Self {
        let default_model = config
            .default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mut registry = Self {
            services: HashMap::new(),
            default_model,
        };

        let Some(api_key) = config.openai_api_key.as_ref().filter(|k| !k.is_empty()) else {
            tracing::warn!("OPENAI_API_KEY not set, no models available");
            return registry;
        };

        let mut ids = vec![registry.default_model.clone()];
        if registry.default_model != DEFAULT_MODEL {
            ids.push(DEFAULT_MODEL.to_string());
        }
        for id in ids {
            match OpenAIService::new(api_key.clone(), id.clone(), config.base_url.as_deref()) {
                Ok(service) => registry.register(&id, Arc::new(service)),
                Err(e) => tracing::warn!(model = %id, error = %e, "Failed to create model service"),
            }
        }
        registry
    }

    /// Register a service under an id, wrapped with logging
    pub fn register(&mut self, model_id: &str, service: Arc<dyn LlmService>) {
        self.services
            .insert(model_id.to_string(), Arc::new(LoggingService::new(service)));
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LlmService>> {
        self.services.get(model_id).cloned()
    }

    /// Get the default model
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.default_model)
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }

    pub fn has_models(&self) -> bool {
        !self.services.is_empty()
    }

    /// Get a cheap/fast model for auxiliary tasks, falling back to the default
    pub fn get_cheap_model(&self) -> Option<Arc<dyn LlmService>> {
        CHEAP_MODELS
            .iter()
            .find_map(|id| self.get(id))
            .or_else(|| self.default())
    }
}
