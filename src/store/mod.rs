//! Credential persistence

pub mod credential_store;
pub mod json_store;
pub mod memory_store;

pub use {
    credential_store::{CredentialStore, StoredCredential},
    json_store::JsonFileStore,
    memory_store::MemoryStore,
};
