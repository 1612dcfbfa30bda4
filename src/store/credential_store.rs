//! Credential store trait definition

use serde::{Deserialize, Serialize};
use trait_variant::make;

use crate::core::{error::StoreResult, types::hex_bytes};

/// A persisted network credential
///
/// SSIDs and passwords are arbitrary bytes and are kept hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(with = "hex_bytes")]
    pub ssid: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub password: Vec<u8>,
}

impl StoredCredential {
    pub fn new(ssid: &[u8], password: &[u8]) -> Self {
        Self {
            ssid: ssid.to_vec(),
            password: password.to_vec(),
        }
    }

    /// SSID for display, replacing invalid UTF-8 sequences
    pub fn ssid_lossy(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }
}

/// Key/value store for joined network credentials
#[make(Send)]
pub trait CredentialStore: Send + Sync + 'static {
    /// Add a credential, or replace the password of an existing SSID
    async fn add_or_update(&self, ssid: &[u8], password: &[u8]) -> StoreResult<()>;
}
