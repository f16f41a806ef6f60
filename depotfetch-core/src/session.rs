//! Per-run context handed to every adapter: transport, artifact store, tokens.

use std::sync::Arc;

use crate::config::{Endpoints, ResolveConfig};
use crate::contract::{CredentialProvider, Transport};
use crate::store::ArtifactStore;

#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    store: ArtifactStore,
    github_token: Option<String>,
    endpoints: Endpoints,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, store: ArtifactStore) -> Self {
        Self {
            transport,
            store,
            github_token: None,
            endpoints: Endpoints::default(),
            credentials: None,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &ResolveConfig) -> Self {
        Self::new(transport, ArtifactStore::new(config.output_dir.clone()))
            .with_github_token(config.github_token.clone())
            .with_endpoints(config.endpoints.clone())
    }

    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn credentials(&self) -> Option<&dyn CredentialProvider> {
        self.credentials.as_deref()
    }
}
