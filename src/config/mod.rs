//! Configuration module

pub mod cli;
pub mod settings;

pub use cli::{CliArgs, ProtocolArg};
pub use settings::{ProvisioningSettings, Settings};
