//! Command-line argument parsing

use clap::{Parser, ValueEnum};

use crate::core::types::SmartConfigType;

/// Length of the EspTouch v2 AES key in bytes
pub const ESPTOUCH_V2_KEY_LEN: usize = 16;

/// Provisioning protocol selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolArg {
    Esptouch,
    Airkiss,
    EsptouchAirkiss,
    EsptouchV2,
}

impl From<ProtocolArg> for SmartConfigType {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Esptouch => SmartConfigType::EspTouch,
            ProtocolArg::Airkiss => SmartConfigType::AirKiss,
            ProtocolArg::EsptouchAirkiss => SmartConfigType::EspTouchAirKiss,
            ProtocolArg::EsptouchV2 => SmartConfigType::EspTouchV2,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(name = "smartconfig-provisioner", version, author)]
#[clap(about = "Learns WiFi credentials from a smartconfig broadcast and joins the network")]
pub struct CliArgs {
    /// Unix socket of the radio daemon
    #[clap(long, default_value = "/run/smartconfig-radio.sock")]
    pub radio_socket: String,

    /// File the joined network credentials are stored in
    #[clap(long, default_value = "/var/lib/smartconfig/ssids.json")]
    pub credentials_file: String,

    /// Maximum number of remembered networks
    #[clap(long, default_value = "10")]
    pub max_networks: usize,

    /// Provisioning protocol to listen for
    #[clap(long, value_enum, default_value = "esptouch-airkiss")]
    pub protocol: ProtocolArg,

    /// Restrict the join to the access point address sent by the app
    #[clap(long)]
    pub honor_target_bssid: bool,

    /// AES key (16 characters) for encrypted EspTouch v2 broadcasts
    #[clap(long, value_parser = parse_esptouch_v2_key)]
    pub esptouch_v2_key: Option<String>,

    /// Give up a provisioning attempt after this many seconds (default: wait forever)
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub attempt_timeout: Option<u64>,
}

fn parse_esptouch_v2_key(key: &str) -> Result<String, String> {
    if key.len() != ESPTOUCH_V2_KEY_LEN {
        return Err(format!(
            "key must be {} bytes long, got {}",
            ESPTOUCH_V2_KEY_LEN,
            key.len()
        ));
    }
    Ok(key.to_string())
}
