//! Provisioning coordinator: lifecycle, callbacks and session state
//!
//! The coordinator listens to radio, address and smartconfig events on the
//! event loop, stages decoded credentials, and runs a background listener
//! task that reports a joined network and the final handshake to the
//! application.

mod handler;
mod listener;

#[cfg(test)]
mod test_util;

use std::sync::{Arc, Weak};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::{
    backend::RadioDriver,
    config::ProvisioningSettings,
    core::{
        error::{ProvisioningError, ProvisioningResult},
        event_group::EventGroup,
        types::{ListenerState, PasswordBuffer, RadioMode, SessionSnapshot, SsidBuffer},
    },
    event::{EventCategory, EventLoop},
    store::CredentialStore,
};

/// Application notification without arguments
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Event categories the coordinator subscribes to
const SUBSCRIBED_CATEGORIES: [EventCategory; 3] = [
    EventCategory::Wifi,
    EventCategory::Ip,
    EventCategory::SmartConfig,
];

#[derive(Debug, Default)]
struct ProvisioningSession {
    /// A provisioning attempt is active
    running: bool,
    /// Radio initialized and brought up
    radio_started: bool,
    /// Subscribed on the event loop
    registered: bool,
    ssid: SsidBuffer,
    password: PasswordBuffer,
}

#[derive(Default)]
struct Callbacks {
    on_network_joined: Option<Callback>,
    on_provisioning_complete: Option<Callback>,
}

/// Coordinates one device-wide smartconfig provisioning flow
///
/// Create exactly one per device with [`ProvisioningCoordinator::new`] and
/// share the returned handle.
pub struct ProvisioningCoordinator<R: RadioDriver, S: CredentialStore> {
    this: Weak<Self>,
    radio: Arc<R>,
    store: Arc<S>,
    events: EventLoop,
    settings: ProvisioningSettings,
    event_bits: EventGroup,
    session: RwLock<ProvisioningSession>,
    callbacks: RwLock<Callbacks>,
    listener: watch::Sender<ListenerState>,
    cancel: watch::Sender<bool>,
}

impl<R: RadioDriver, S: CredentialStore> ProvisioningCoordinator<R, S> {
    pub fn new(
        radio: Arc<R>,
        store: Arc<S>,
        events: EventLoop,
        settings: ProvisioningSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            radio,
            store,
            events,
            settings,
            event_bits: EventGroup::new(),
            session: RwLock::new(ProvisioningSession::default()),
            callbacks: RwLock::new(Callbacks::default()),
            listener: watch::Sender::new(ListenerState::NotStarted),
            cancel: watch::Sender::new(false),
        })
    }

    /// Start provisioning
    ///
    /// The first call brings the radio up in station mode and subscribes to
    /// its events; the listener starts once the radio reports it is up.
    /// Calling again while an attempt runs does nothing. Calling after an
    /// attempt ended starts a new attempt on the running radio, once the
    /// previous listener has finished.
    ///
    /// A failed startup leaves the session stopped, and the next call runs
    /// the radio bring-up again.
    pub async fn start(&self) -> ProvisioningResult<()> {
        loop {
            {
                let mut session = self.session.write().await;
                if session.running {
                    debug!("Provisioning already running");
                    return Ok(());
                }

                if !session.radio_started {
                    session.running = true;
                    break;
                }

                // A listener still winding down must finish first
                if *self.listener.borrow() != ListenerState::Listening {
                    session.running = true;
                    session.ssid = SsidBuffer::new();
                    session.password = PasswordBuffer::new();
                    info!("Starting new provisioning attempt");
                    self.spawn_listener();
                    return Ok(());
                }
            }
            self.wait_listener_idle().await;
        }

        info!("Starting smartconfig provisioning");
        if let Err(e) = self.bring_up_radio().await {
            self.session.write().await.running = false;
            return Err(e);
        }
        Ok(())
    }

    async fn bring_up_radio(&self) -> ProvisioningResult<()> {
        self.radio
            .init_interface()
            .await
            .map_err(|source| ProvisioningError::Startup {
                step: "create network interface",
                source,
            })?;

        self.radio
            .init()
            .await
            .map_err(|source| ProvisioningError::Startup {
                step: "radio init",
                source,
            })?;

        if !self.session.read().await.registered {
            if let Some(this) = self.this.upgrade() {
                self.events.register(&SUBSCRIBED_CATEGORIES, this).await?;
            }
            self.session.write().await.registered = true;
        }

        self.radio
            .set_mode(RadioMode::Station)
            .await
            .map_err(|source| ProvisioningError::Startup {
                step: "set station mode",
                source,
            })?;

        self.radio
            .start()
            .await
            .map_err(|source| ProvisioningError::Startup {
                step: "radio start",
                source,
            })?;

        self.session.write().await.radio_started = true;
        Ok(())
    }

    /// Cancel the running attempt without invoking the completion callback
    ///
    /// Returns once the listener is no longer listening.
    pub async fn stop(&self) {
        {
            let mut session = self.session.write().await;
            session.running = false;
            if *self.listener.borrow() == ListenerState::Listening {
                info!("Stopping provisioning");
                self.cancel.send_replace(true);
            }
        }
        self.wait_listener_idle().await;
    }

    async fn wait_listener_idle(&self) {
        let mut rx = self.listener.subscribe();
        // The sender is owned by self, so the channel stays open
        let _ = rx.wait_for(|state| *state != ListenerState::Listening).await;
    }

    /// Register the callback run when the device joined a network
    ///
    /// Replaces a previously registered callback.
    pub async fn on_network_joined<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.write().await.on_network_joined = Some(Arc::new(callback));
    }

    /// Register the callback run when the provisioning handshake completed
    ///
    /// Replaces a previously registered callback.
    pub async fn on_provisioning_complete<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.write().await.on_provisioning_complete = Some(Arc::new(callback));
    }

    /// Current session state
    pub async fn session(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        SessionSnapshot {
            running: session.running,
            ssid: session.ssid.clone(),
            password: session.password.clone(),
        }
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.borrow().clone()
    }

    /// Wait until the listener reaches a terminal state
    pub async fn wait_finished(&self) -> ListenerState {
        let mut rx = self.listener.subscribe();
        if let Ok(state) = rx.wait_for(ListenerState::is_terminal).await {
            return state.clone();
        }
        self.listener_state()
    }
}
