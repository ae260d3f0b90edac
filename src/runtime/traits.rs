//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the dispatch loop with mock implementations.

use crate::clinic::ClinicBackend;
use crate::llm::{LlmError, LlmRequest, LlmResponse, ModelRegistry, ToolDefinition};
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

/// Client for making model requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a model request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Executor for named operations
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute an operation by name on behalf of a thread.
    /// `None` when no operation has that name.
    async fn execute(
        &self,
        thread_id: &str,
        today: NaiveDate,
        name: &str,
        input: Value,
    ) -> Option<ToolOutput>;

    /// Get operation definitions for the model
    fn definitions(&self) -> Vec<ToolDefinition>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(
        &self,
        thread_id: &str,
        today: NaiveDate,
        name: &str,
        input: Value,
    ) -> Option<ToolOutput> {
        (**self).execute(thread_id, today, name, input).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use `ModelRegistry` as `LlmClient`
pub struct RegistryLlmClient {
    registry: Arc<ModelRegistry>,
    model_id: String,
}

impl RegistryLlmClient {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        let model_id = registry.default_model_id().to_string();
        Self { registry, model_id }
    }
}

#[async_trait]
impl LlmClient for RegistryLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let llm = self
            .registry
            .get(&self.model_id)
            .or_else(|| self.registry.default())
            .ok_or_else(|| LlmError::network("No LLM available"))?;
        llm.complete(request).await
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Adapter to use `ToolRegistry` as `ToolExecutor`
pub struct ToolRegistryExecutor {
    registry: ToolRegistry,
    clinic: Arc<dyn ClinicBackend>,
    llm_registry: Arc<ModelRegistry>,
}

impl ToolRegistryExecutor {
    pub fn new(
        registry: ToolRegistry,
        clinic: Arc<dyn ClinicBackend>,
        llm_registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            registry,
            clinic,
            llm_registry,
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistryExecutor {
    async fn execute(
        &self,
        thread_id: &str,
        today: NaiveDate,
        name: &str,
        input: Value,
    ) -> Option<ToolOutput> {
        let ctx = ToolContext::new(
            thread_id.to_string(),
            today,
            self.clinic.clone(),
            self.llm_registry.clone(),
        );
        self.registry.execute(name, input, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }
}
