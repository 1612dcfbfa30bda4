//! In-memory credential store

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    core::error::{StoreError, StoreResult},
    store::{CredentialStore, StoredCredential},
};

#[derive(Debug, Default)]
struct MemoryState {
    writes: Vec<StoredCredential>,
    should_fail: bool,
}

/// Credential store keeping every write in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write so far, in order
    pub async fn writes(&self) -> Vec<StoredCredential> {
        self.inner.lock().await.writes.clone()
    }

    /// Configure writes to fail
    pub async fn set_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail = should_fail;
    }
}

impl CredentialStore for MemoryStore {
    async fn add_or_update(&self, ssid: &[u8], password: &[u8]) -> StoreResult<()> {
        let mut state = self.inner.lock().await;
        if state.should_fail {
            return Err(StoreError::Io(std::io::Error::other("Mock store failure")));
        }
        state.writes.push(StoredCredential::new(ssid, password));
        Ok(())
    }
}
