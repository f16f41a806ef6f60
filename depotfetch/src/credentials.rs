//! API key holder for the gated manifest service.

use async_trait::async_trait;
use depotfetch_core::contract::CredentialProvider;
use tokio::sync::Mutex;
use tracing::warn;

/// Key taken from config or environment. Once the service rejects it, it is
/// forgotten for the rest of the run and the gated source reports unauthorized.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    key: Mutex<Option<String>>,
}

impl StaticCredentials {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: Mutex::new(key.filter(|k| !k.trim().is_empty())),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn api_key(&self) -> Option<String> {
        self.key.lock().await.clone()
    }

    async fn invalidate(&self) {
        if self.key.lock().await.take().is_some() {
            warn!("[AUTH] Gated service rejected the API key; update gated_api_key or DEPOTFETCH_API_KEY");
        }
    }
}
