//! Smartconfig Provisioner
//!
//! Learns WiFi credentials from a smartconfig broadcast, joins the network
//! they describe and remembers them:
//! - radio commands and events travel over a Unix socket bridge (JSON-RPC 2.0)
//! - joined networks are kept in a JSON credential file

pub mod backend;
pub mod config;
pub mod core;
pub mod event;
pub mod protocol;
pub mod store;
pub mod transport;

pub use crate::core::{
    coordinator::ProvisioningCoordinator,
    error::{ProvisioningError, RadioError, StoreError, TransportError},
    types::{ListenerState, SessionSnapshot},
};
