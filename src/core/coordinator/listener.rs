//! Background listener: runs the provisioning protocol and reports a joined
//! network and the final handshake to the application

use tokio::{sync::watch, time::Instant};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    backend::RadioDriver,
    core::{
        coordinator::{Callback, Callbacks, ProvisioningCoordinator},
        error::{ProvisioningError, ProvisioningResult},
        event_group::EventBits,
        types::{AttemptId, ListenerState},
    },
    store::CredentialStore,
};

impl<R: RadioDriver, S: CredentialStore> ProvisioningCoordinator<R, S> {
    /// Launch the listener task unless one is already listening
    pub(super) fn spawn_listener(&self) {
        let Some(coordinator) = self.this.upgrade() else {
            return;
        };

        // Reset under the state lock so a concurrent stop() sees either the
        // old state or a fully armed attempt
        let launched = self.listener.send_if_modified(|state| {
            if *state == ListenerState::Listening {
                return false;
            }
            self.event_bits
                .clear(EventBits::NETWORK_JOINED | EventBits::HANDSHAKE_DONE);
            self.cancel.send_replace(false);
            *state = ListenerState::Listening;
            true
        });
        if !launched {
            debug!("Listener already running");
            return;
        }

        let attempt = AttemptId::new();
        tokio::spawn(
            async move {
                let state = match coordinator.run_listener().await {
                    Ok(state) => state,
                    Err(e) => {
                        error!("Provisioning listener failed: {}", e);
                        ListenerState::Failed(e.to_string())
                    }
                };
                debug!(?state, "Listener finished");
                coordinator.listener.send_replace(state);
            }
            .instrument(info_span!("smartconfig", %attempt)),
        );
    }

    async fn run_listener(&self) -> ProvisioningResult<ListenerState> {
        let kind = self.settings.smartconfig_type;
        self.radio
            .set_smartconfig_type(kind)
            .await
            .map_err(ProvisioningError::ProtocolStart)?;
        self.radio
            .start_smartconfig(&self.settings.start_config())
            .await
            .map_err(ProvisioningError::ProtocolStart)?;
        info!(?kind, "Listening for provisioning broadcast");

        let mut cancel = self.cancel.subscribe();
        let deadline = self.settings.attempt_timeout.map(|t| Instant::now() + t);
        let mut joined_notified = false;

        loop {
            let bits = tokio::select! {
                bits = self
                    .event_bits
                    .wait_any(EventBits::NETWORK_JOINED | EventBits::HANDSHAKE_DONE) => bits,
                _ = cancelled(&mut cancel) => {
                    info!("Provisioning cancelled");
                    self.abort_attempt().await;
                    return Ok(ListenerState::Cancelled);
                }
                _ = expired(deadline) => {
                    warn!("Provisioning attempt timed out without handshake");
                    self.abort_attempt().await;
                    return Ok(ListenerState::TimedOut);
                }
            };

            if bits.contains(EventBits::NETWORK_JOINED) {
                info!("WiFi connected to access point");
                if !joined_notified {
                    joined_notified = true;
                    self.invoke(|c| c.on_network_joined.clone()).await;
                }
                self.persist_credentials().await;
            }

            if bits.contains(EventBits::HANDSHAKE_DONE) {
                info!("Smartconfig over");
                self.stop_protocol().await;
                self.session.write().await.running = false;
                self.invoke(|c| c.on_provisioning_complete.clone()).await;
                return Ok(ListenerState::Completed);
            }
        }
    }

    async fn persist_credentials(&self) {
        let (ssid, password) = {
            let session = self.session.read().await;
            (session.ssid.clone(), session.password.clone())
        };

        if let Err(e) = self
            .store
            .add_or_update(ssid.as_bytes(), password.as_bytes())
            .await
        {
            warn!(ssid = %ssid.to_string_lossy(), "Failed to store credentials: {}", e);
        }
    }

    async fn abort_attempt(&self) {
        self.stop_protocol().await;
        self.session.write().await.running = false;
    }

    async fn stop_protocol(&self) {
        if let Err(e) = self.radio.stop_smartconfig().await {
            warn!("Failed to stop smartconfig: {}", e);
        }
    }

    /// Run a callback on the listener task, outside the callbacks lock
    async fn invoke(&self, select: impl FnOnce(&Callbacks) -> Option<Callback>) {
        let callback = select(&*self.callbacks.read().await);
        if let Some(callback) = callback {
            callback();
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|cancel| *cancel).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
