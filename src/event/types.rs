//! System event definitions

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::core::types::DecodedCredentials;

/// Event category a handler subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Wifi,
    Ip,
    SmartConfig,
}

/// Radio link-layer events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", content = "data", rename_all = "snake_case")]
pub enum WifiEvent {
    StaStart,
    StaStop,
    StaConnected,
    StaDisconnected { reason: u8 },
}

/// Address acquisition events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", content = "data", rename_all = "snake_case")]
pub enum IpEvent {
    StaGotIp { ip: Ipv4Addr },
    StaLostIp,
}

/// Provisioning protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", content = "data", rename_all = "snake_case")]
pub enum SmartConfigEvent {
    ScanDone,
    FoundChannel,
    GotSsidPswd(DecodedCredentials),
    SendAckDone,
}

/// Event posted to the event loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "base", content = "event", rename_all = "snake_case")]
pub enum SystemEvent {
    Wifi(WifiEvent),
    Ip(IpEvent),
    SmartConfig(SmartConfigEvent),
}

impl SystemEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            SystemEvent::Wifi(_) => EventCategory::Wifi,
            SystemEvent::Ip(_) => EventCategory::Ip,
            SystemEvent::SmartConfig(_) => EventCategory::SmartConfig,
        }
    }
}

impl From<WifiEvent> for SystemEvent {
    fn from(event: WifiEvent) -> Self {
        SystemEvent::Wifi(event)
    }
}

impl From<IpEvent> for SystemEvent {
    fn from(event: IpEvent) -> Self {
        SystemEvent::Ip(event)
    }
}

impl From<SmartConfigEvent> for SystemEvent {
    fn from(event: SmartConfigEvent) -> Self {
        SystemEvent::SmartConfig(event)
    }
}
