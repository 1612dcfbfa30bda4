//! Radio driver trait definition

use trait_variant::make;

use crate::core::{
    error::RadioResult,
    types::{RadioMode, SmartConfigStartConfig, SmartConfigType, StationConfig},
};

/// Control surface of the radio / link-layer driver
///
/// Calls only issue commands: their outcome (link up, address acquired,
/// decoded credentials) arrives later as events on the event loop.
#[make(Send)]
pub trait RadioDriver: Send + Sync + 'static {
    /// Create the default station network interface
    async fn init_interface(&self) -> RadioResult<()>;

    /// Initialize the radio subsystem with default parameters
    async fn init(&self) -> RadioResult<()>;

    /// Select the operating mode
    async fn set_mode(&self, mode: RadioMode) -> RadioResult<()>;

    /// Bring the radio up; a station-start event follows
    async fn start(&self) -> RadioResult<()>;

    /// Start connecting with the current station configuration
    async fn connect(&self) -> RadioResult<()>;

    /// Drop the current association
    async fn disconnect(&self) -> RadioResult<()>;

    /// Apply a station configuration
    async fn set_config(&self, config: &StationConfig) -> RadioResult<()>;

    /// Select the provisioning protocol flavour
    async fn set_smartconfig_type(&self, kind: SmartConfigType) -> RadioResult<()>;

    /// Start listening for provisioning broadcasts
    async fn start_smartconfig(&self, config: &SmartConfigStartConfig) -> RadioResult<()>;

    /// Stop listening for provisioning broadcasts
    async fn stop_smartconfig(&self) -> RadioResult<()>;

    /// Copy the reserved vendor data of the last extended broadcast into `buf`
    async fn fetch_reserved_data(&self, buf: &mut [u8]) -> RadioResult<()>;
}
