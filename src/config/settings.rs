//! Runtime settings

use std::time::Duration;

use crate::{
    config::CliArgs,
    core::types::{SmartConfigStartConfig, SmartConfigType},
};

/// Settings consumed by the provisioning coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningSettings {
    pub smartconfig_type: SmartConfigType,
    /// Apply the access point address carried by the broadcast as a connection hint
    pub honor_target_bssid: bool,
    pub esptouch_v2_key: Option<String>,
    /// None waits for the handshake forever
    pub attempt_timeout: Option<Duration>,
}

impl ProvisioningSettings {
    /// Protocol start parameters
    pub fn start_config(&self) -> SmartConfigStartConfig {
        SmartConfigStartConfig {
            esptouch_v2_crypt_key: self.esptouch_v2_key.clone(),
            ..Default::default()
        }
    }
}

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub radio_socket: String,
    pub credentials_file: String,
    pub max_networks: usize,
    pub provisioning: ProvisioningSettings,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        Settings {
            radio_socket: args.radio_socket,
            credentials_file: args.credentials_file,
            max_networks: args.max_networks,
            provisioning: ProvisioningSettings {
                smartconfig_type: args.protocol.into(),
                honor_target_bssid: args.honor_target_bssid,
                esptouch_v2_key: args.esptouch_v2_key,
                attempt_timeout: args.attempt_timeout.map(Duration::from_secs),
            },
        }
    }
}
