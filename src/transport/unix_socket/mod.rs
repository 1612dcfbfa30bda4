//! Unix domain socket transport layer

pub mod session;

pub use session::{BridgeSession, SessionReader};
