//! Response message types

use serde::{Deserialize, Serialize};

use crate::core::types::hex_bytes;

/// Results returned by the bridge
///
/// Variants are tried in order, so the one with the most fields comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    /// Reserved data read back from the radio
    ReservedData(ReservedDataResponse),

    /// Plain command acknowledgement
    Ack(AckResponse),
}

/// Acknowledgement of a radio command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResponse {
    pub status: String,
}

/// Response for get_reserved_data request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservedDataResponse {
    pub status: String,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

impl ReservedDataResponse {
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}
