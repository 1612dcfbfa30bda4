//! JSON file backed credential store

use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::{
    core::error::{StoreError, StoreResult},
    store::{CredentialStore, StoredCredential},
};

/// Default number of remembered networks
pub const DEFAULT_MAX_NETWORKS: usize = 10;

/// Credential store persisting a most-recent-first list in a JSON file
///
/// Known SSIDs keep their position and get the new password. New SSIDs are
/// inserted at the front; the oldest entry is dropped when the list is full.
/// The file holds plaintext passwords and is written owner-only.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    max_networks: usize,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, max_networks: usize) -> Self {
        Self {
            path: path.into(),
            max_networks: max_networks.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all stored credentials; a missing file is an empty list
    pub async fn load(&self) -> StoreResult<Vec<StoredCredential>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but an unreadable list is started over
    async fn load_or_reset(&self) -> StoreResult<Vec<StoredCredential>> {
        match self.load().await {
            Err(StoreError::Serialization(e)) => {
                warn!(path = %self.path.display(), "Discarding corrupt credential file: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn save(&self, entries: &[StoredCredential]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        // A leftover temp file keeps the mode it was created with
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl CredentialStore for JsonFileStore {
    async fn add_or_update(&self, ssid: &[u8], password: &[u8]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_or_reset().await?;
        let name = String::from_utf8_lossy(ssid);

        if let Some(entry) = entries.iter_mut().find(|e| e.ssid == ssid) {
            debug!(ssid = %name, "Updating stored credential");
            entry.password = password.to_vec();
        } else {
            debug!(ssid = %name, "Adding stored credential");
            entries.insert(0, StoredCredential::new(ssid, password));
            entries.truncate(self.max_networks);
        }

        self.save(&entries).await
    }
}
