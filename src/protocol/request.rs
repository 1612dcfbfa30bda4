//! Request message types

use serde::{Deserialize, Serialize};

use crate::core::types::{RadioMode, SmartConfigStartConfig, SmartConfigType, StationConfig};

/// Radio commands sent to the bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Create the default station interface
    InitInterface,

    /// Initialize the radio
    Init,

    /// Select the operating mode
    SetMode { mode: RadioMode },

    /// Bring the radio up
    Start,

    /// Connect with the current station configuration
    Connect,

    /// Drop the current association
    Disconnect,

    /// Apply a station configuration
    SetConfig(StationConfig),

    /// Select the provisioning protocol flavour
    SetSmartConfigType { kind: SmartConfigType },

    /// Start listening for provisioning broadcasts
    StartSmartConfig(SmartConfigStartConfig),

    /// Stop listening for provisioning broadcasts
    StopSmartConfig,

    /// Read the reserved vendor data of the last extended broadcast
    GetReservedData { len: usize },
}
