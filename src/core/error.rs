//! Error types for the smartconfig provisioner

use thiserror::Error;

/// Result type for radio driver operations
pub type RadioResult<T> = Result<T, RadioError>;

/// Result type for credential store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for event loop operations
pub type EventResult<T> = Result<T, EventError>;

/// Result type for provisioning operations
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Errors reported by the radio driver
#[derive(Error, Debug, Clone)]
pub enum RadioError {
    #[error("Radio driver error: {0}")]
    Driver(String),

    #[error("Radio not initialized")]
    NotInitialized,

    #[error("Invalid radio state: {0}")]
    InvalidState(String),

    #[error("Radio request timed out")]
    Timeout,

    #[error("Radio bridge error: {0}")]
    Bridge(String),
}

/// Errors reported by the credential store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors related to the radio bridge transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid message format")]
    InvalidMessageFormat,
}

impl From<TransportError> for RadioError {
    fn from(e: TransportError) -> Self {
        RadioError::Bridge(e.to_string())
    }
}

/// Errors related to the event loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Event loop closed")]
    LoopClosed,
}

/// Errors of the provisioning coordinator
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Startup failed at {step}: {source}")]
    Startup {
        step: &'static str,
        source: RadioError,
    },

    #[error("Event handler registration failed: {0}")]
    Registration(#[from] EventError),

    #[error("Failed to start provisioning protocol: {0}")]
    ProtocolStart(RadioError),

    #[error("Failed to fetch reserved data: {0}")]
    ReservedData(RadioError),

    #[error("Failed to apply station configuration: {0}")]
    ApplyConfig(RadioError),

    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl ProvisioningError {
    /// Fatal errors terminate the execution context that hit them
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProvisioningError::Radio(_) | ProvisioningError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let startup = ProvisioningError::Startup {
            step: "radio init",
            source: RadioError::Driver("no memory".into()),
        };
        assert!(startup.is_fatal());
        assert!(ProvisioningError::ReservedData(RadioError::NotInitialized).is_fatal());
        assert!(ProvisioningError::ProtocolStart(RadioError::Timeout).is_fatal());
        assert!(ProvisioningError::Registration(EventError::LoopClosed).is_fatal());

        assert!(!ProvisioningError::Radio(RadioError::Timeout).is_fatal());
        let store = ProvisioningError::Store(StoreError::Io(std::io::Error::other("disk full")));
        assert!(!store.is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = ProvisioningError::Startup {
            step: "set mode",
            source: RadioError::Driver("busy".into()),
        };
        assert_eq!(
            err.to_string(),
            "Startup failed at set mode: Radio driver error: busy"
        );
        assert_eq!(
            RadioError::from(TransportError::SessionClosed).to_string(),
            "Radio bridge error: Session closed"
        );
    }
}
