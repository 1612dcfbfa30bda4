//! Event handler: turns radio, address and smartconfig events into flag
//! changes and radio commands

use tracing::{debug, info, warn};

use crate::{
    backend::RadioDriver,
    core::{
        coordinator::ProvisioningCoordinator,
        error::{ProvisioningError, ProvisioningResult},
        event_group::EventBits,
        types::{
            CredentialVariant, DecodedCredentials, PasswordBuffer, RESERVED_DATA_LEN,
            SsidBuffer, StationConfig,
        },
    },
    event::{EventHandler, IpEvent, SmartConfigEvent, SystemEvent, WifiEvent},
    store::CredentialStore,
};

impl<R: RadioDriver, S: CredentialStore> EventHandler for ProvisioningCoordinator<R, S> {
    async fn handle_event(&self, event: SystemEvent) -> ProvisioningResult<()> {
        match event {
            SystemEvent::Wifi(WifiEvent::StaStart) => {
                // Guard held across the spawn to order it against stop()
                let session = self.session.read().await;
                if session.running {
                    self.spawn_listener();
                } else {
                    debug!("Radio started without an active provisioning attempt");
                }
            }
            SystemEvent::Wifi(WifiEvent::StaDisconnected { reason }) => {
                info!(reason, "Disconnected, reconnecting");
                self.reconnect().await;
                self.event_bits.clear(EventBits::NETWORK_JOINED);
            }
            SystemEvent::Ip(IpEvent::StaGotIp { ip }) => {
                info!(%ip, "Got IP address");
                self.event_bits.set(EventBits::NETWORK_JOINED);
            }
            SystemEvent::SmartConfig(SmartConfigEvent::ScanDone) => info!("Scan done"),
            SystemEvent::SmartConfig(SmartConfigEvent::FoundChannel) => info!("Found channel"),
            SystemEvent::SmartConfig(SmartConfigEvent::GotSsidPswd(credentials)) => {
                self.apply_credentials(credentials).await?;
            }
            SystemEvent::SmartConfig(SmartConfigEvent::SendAckDone) => {
                debug!("Acknowledgment sent");
                self.event_bits.set(EventBits::HANDSHAKE_DONE);
            }
            other => debug!(?other, "Ignoring event"),
        }

        Ok(())
    }
}

impl<R: RadioDriver, S: CredentialStore> ProvisioningCoordinator<R, S> {
    /// Stage decoded credentials and rejoin with them
    async fn apply_credentials(&self, credentials: DecodedCredentials) -> ProvisioningResult<()> {
        let ssid = SsidBuffer::from_padded(&credentials.ssid);
        let password = PasswordBuffer::from_padded(&credentials.password);
        info!(
            ssid = %ssid.to_string_lossy(),
            password_len = password.len(),
            variant = ?credentials.variant,
            "Got SSID and password"
        );

        let mut config = StationConfig::new(ssid.clone(), password.clone());
        if self.settings.honor_target_bssid {
            if let Some(bssid) = credentials.bssid {
                info!(%bssid, "Set MAC address of target AP");
                config.bssid = Some(bssid);
            }
        }

        {
            let mut session = self.session.write().await;
            session.ssid = ssid;
            session.password = password;
        }

        if credentials.variant == CredentialVariant::Extended {
            let mut reserved = [0u8; RESERVED_DATA_LEN];
            self.radio
                .fetch_reserved_data(&mut reserved)
                .await
                .map_err(ProvisioningError::ReservedData)?;
            info!(reserved_data = %hex::encode(reserved), "Got reserved data");
        }

        self.radio
            .disconnect()
            .await
            .map_err(ProvisioningError::ApplyConfig)?;
        self.radio
            .set_config(&config)
            .await
            .map_err(ProvisioningError::ApplyConfig)?;
        self.reconnect().await;

        Ok(())
    }

    /// Fire-and-forget connect; the outcome arrives as an event
    async fn reconnect(&self) {
        if let Err(e) = self.radio.connect().await {
            warn!("Connect request failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{
        backend::mock_radio::{RadioCall, RadioOp},
        config::ProvisioningSettings,
        core::{
            error::ProvisioningError,
            event_group::EventBits,
            types::{
                CredentialVariant, DecodedCredentials, MacAddress, PASSWORD_MAX_LEN,
                PasswordBuffer, SSID_MAX_LEN, SsidBuffer, StationConfig,
            },
        },
    };
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn credentials(variant: CredentialVariant) -> SmartConfigEvent {
        SmartConfigEvent::GotSsidPswd(DecodedCredentials::new("HomeNet", "secret123", variant))
    }

    #[tokio::test]
    async fn test_basic_credentials_are_staged_and_applied() {
        let fx = Fixture::new(ProvisioningSettings::default());

        fx.coordinator
            .handle_event(credentials(CredentialVariant::Basic).into())
            .await
            .unwrap();

        let session = fx.coordinator.session().await;
        assert_eq!(session.ssid.as_bytes(), b"HomeNet");
        assert_eq!(session.password.as_bytes(), b"secret123");

        let calls = fx.radio.calls().await;
        assert_eq!(
            calls,
            vec![
                RadioCall::Disconnect,
                RadioCall::SetConfig(StationConfig::new(
                    SsidBuffer::from_padded(b"HomeNet"),
                    PasswordBuffer::from_padded(b"secret123"),
                )),
                RadioCall::Connect,
            ]
        );
        assert_eq!(fx.radio.count(RadioOp::FetchReservedData).await, 0);
    }

    #[tokio::test]
    async fn test_extended_credentials_fetch_reserved_data_once() {
        let fx = Fixture::new(ProvisioningSettings::default());

        fx.coordinator
            .handle_event(credentials(CredentialVariant::Extended).into())
            .await
            .unwrap();

        let calls = fx.radio.calls().await;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], RadioCall::FetchReservedData { len: 33 });
        assert_eq!(calls[1], RadioCall::Disconnect);
        assert!(matches!(calls[2], RadioCall::SetConfig(_)));
        assert_eq!(calls[3], RadioCall::Connect);
    }

    #[tokio::test]
    async fn test_reserved_data_failure_is_fatal() {
        let fx = Fixture::new(ProvisioningSettings::default());
        fx.radio.set_failure(RadioOp::FetchReservedData, true).await;

        let err = fx
            .coordinator
            .handle_event(credentials(CredentialVariant::Extended).into())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::ReservedData(_)));
        assert!(err.is_fatal());
        assert_eq!(fx.radio.count(RadioOp::Connect).await, 0);
    }

    #[tokio::test]
    async fn test_apply_config_failure_is_fatal() {
        let fx = Fixture::new(ProvisioningSettings::default());
        fx.radio.set_failure(RadioOp::SetConfig, true).await;

        let err = fx
            .coordinator
            .handle_event(credentials(CredentialVariant::Basic).into())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::ApplyConfig(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_connect_failure_is_absorbed() {
        let fx = Fixture::new(ProvisioningSettings::default());
        fx.radio.set_failure(RadioOp::Connect, true).await;

        fx.coordinator
            .handle_event(credentials(CredentialVariant::Basic).into())
            .await
            .unwrap();
        fx.coordinator
            .handle_event(WifiEvent::StaDisconnected { reason: 15 }.into())
            .await
            .unwrap();

        assert_eq!(fx.radio.count(RadioOp::Connect).await, 2);
    }

    #[tokio::test]
    async fn test_padded_and_overlong_credentials() {
        let fx = Fixture::new(ProvisioningSettings::default());
        let mut ssid = b"Padded".to_vec();
        ssid.resize(SSID_MAX_LEN, 0);
        let password = vec![b'x'; PASSWORD_MAX_LEN + 8];

        fx.coordinator
            .handle_event(
                SmartConfigEvent::GotSsidPswd(DecodedCredentials {
                    ssid,
                    password,
                    bssid: None,
                    variant: CredentialVariant::Basic,
                })
                .into(),
            )
            .await
            .unwrap();

        let session = fx.coordinator.session().await;
        assert_eq!(session.ssid.as_bytes(), b"Padded");
        assert_eq!(session.password.as_bytes(), vec![b'x'; PASSWORD_MAX_LEN].as_slice());
    }

    #[tokio::test]
    async fn test_bssid_hint_ignored_by_default() {
        let fx = Fixture::new(ProvisioningSettings::default());
        let bssid = MacAddress([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

        fx.coordinator
            .handle_event(
                SmartConfigEvent::GotSsidPswd(
                    DecodedCredentials::new("HomeNet", "secret123", CredentialVariant::Basic)
                        .with_bssid(bssid),
                )
                .into(),
            )
            .await
            .unwrap();

        assert_eq!(fx.radio.station_config().await.unwrap().bssid, None);
    }

    #[tokio::test]
    async fn test_bssid_hint_applied_when_enabled() {
        let fx = Fixture::new(ProvisioningSettings {
            honor_target_bssid: true,
            ..Default::default()
        });
        let bssid = MacAddress([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

        fx.coordinator
            .handle_event(
                SmartConfigEvent::GotSsidPswd(
                    DecodedCredentials::new("HomeNet", "secret123", CredentialVariant::Basic)
                        .with_bssid(bssid),
                )
                .into(),
            )
            .await
            .unwrap();

        assert_eq!(fx.radio.station_config().await.unwrap().bssid, Some(bssid));
    }

    #[tokio::test]
    async fn test_got_ip_sets_network_joined() {
        let fx = Fixture::new(ProvisioningSettings::default());

        fx.coordinator
            .handle_event(
                IpEvent::StaGotIp {
                    ip: Ipv4Addr::new(192, 168, 1, 50),
                }
                .into(),
            )
            .await
            .unwrap();

        assert!(
            fx.coordinator
                .event_bits
                .get()
                .contains(EventBits::NETWORK_JOINED)
        );
    }

    #[tokio::test]
    async fn test_disconnect_reconnects_and_clears_network_joined() {
        let fx = Fixture::new(ProvisioningSettings::default());
        fx.coordinator.event_bits.set(EventBits::NETWORK_JOINED);

        fx.coordinator
            .handle_event(WifiEvent::StaDisconnected { reason: 8 }.into())
            .await
            .unwrap();

        assert_eq!(fx.radio.calls().await, vec![RadioCall::Connect]);
        assert!(fx.coordinator.event_bits.get().is_empty());
    }

    #[tokio::test]
    async fn test_ack_sets_handshake_done() {
        let fx = Fixture::new(ProvisioningSettings::default());

        fx.coordinator
            .handle_event(SmartConfigEvent::SendAckDone.into())
            .await
            .unwrap();

        assert!(
            fx.coordinator
                .event_bits
                .get()
                .contains(EventBits::HANDSHAKE_DONE)
        );
    }

    #[tokio::test]
    async fn test_informational_events_do_not_touch_state() {
        let fx = Fixture::new(ProvisioningSettings::default());

        for event in [SmartConfigEvent::ScanDone, SmartConfigEvent::FoundChannel] {
            fx.coordinator.handle_event(event.into()).await.unwrap();
        }
        fx.coordinator
            .handle_event(WifiEvent::StaStop.into())
            .await
            .unwrap();
        fx.coordinator
            .handle_event(IpEvent::StaLostIp.into())
            .await
            .unwrap();

        assert!(fx.radio.calls().await.is_empty());
        assert!(fx.coordinator.event_bits.get().is_empty());
        assert!(fx.coordinator.session().await.ssid.is_empty());
    }
}
