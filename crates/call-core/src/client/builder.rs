//! Orchestrator builder

use std::sync::Arc;

use crate::backend::{CredentialStore, SignalingBackend};
use crate::client::{CallOrchestrator, OrchestratorConfig};
use crate::error::{CallError, CallResult};

/// Builder for creating a call orchestrator
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    backend: Option<Arc<dyn SignalingBackend>>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            backend: None,
            store: None,
        }
    }

    /// Set the signaling backend adapter
    pub fn backend(mut self, backend: Arc<dyn SignalingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the secure credential store
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the secure-store key names
    pub fn credential_keys(mut self, auth_token_key: impl Into<String>, signaling_uid_key: impl Into<String>) -> Self {
        self.config = self.config.with_credential_keys(auth_token_key, signaling_uid_key);
        self
    }

    /// Build the orchestrator
    ///
    /// The orchestrator is returned idle; call
    /// [`start`](CallOrchestrator::start) to connect it to the backend.
    pub fn build(self) -> CallResult<Arc<CallOrchestrator>> {
        let backend = self
            .backend
            .ok_or_else(|| CallError::invalid_configuration("backend", "a signaling backend is required"))?;
        let store = self
            .store
            .ok_or_else(|| CallError::invalid_configuration("credential_store", "a credential store is required"))?;
        CallOrchestrator::new(backend, store, self.config)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
