//! Notification message types (bridge-to-service events)

use serde::{Deserialize, Serialize};

use crate::event::SystemEvent;

/// Bridge-to-service notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// Radio, address or provisioning event
    Event(SystemEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::types::{CredentialVariant, DecodedCredentials},
        event::{IpEvent, SmartConfigEvent, WifiEvent},
    };
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn test_unit_event_notification() {
        let notif = Notification::Event(WifiEvent::StaStart.into());
        let json = serde_json::to_string(&notif).unwrap();
        assert_eq!(
            json,
            r#"{"method":"event","params":{"base":"wifi","event":{"id":"sta_start"}}}"#
        );

        let deserialized: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, notif);
    }

    #[test]
    fn test_got_ip_notification() {
        let json = r#"{"method":"event","params":{"base":"ip","event":{"id":"sta_got_ip","data":{"ip":"192.168.4.2"}}}}"#;
        let notif: Notification = serde_json::from_str(json).unwrap();

        assert_eq!(
            notif,
            Notification::Event(
                IpEvent::StaGotIp {
                    ip: Ipv4Addr::new(192, 168, 4, 2)
                }
                .into()
            )
        );
    }

    #[test]
    fn test_credentials_notification() {
        let json = r#"{"method":"event","params":{"base":"smart_config","event":{"id":"got_ssid_pswd","data":{"ssid":"486f6d654e6574","password":"736563726574","variant":"extended"}}}}"#;
        let notif: Notification = serde_json::from_str(json).unwrap();

        assert_eq!(
            notif,
            Notification::Event(
                SmartConfigEvent::GotSsidPswd(DecodedCredentials::new(
                    "HomeNet",
                    "secret",
                    CredentialVariant::Extended
                ))
                .into()
            )
        );
    }

    #[test]
    fn test_unknown_method_rejected() {
        let json = r#"{"method":"scan_state_changed","params":{}}"#;
        assert!(serde_json::from_str::<Notification>(json).is_err());
    }
}
