//! Smartconfig Provisioner - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use smartconfig_provisioner::{
    backend::SocketRadio,
    config::{CliArgs, Settings},
    core::{coordinator::ProvisioningCoordinator, types::ListenerState},
    event::EventLoop,
    store::JsonFileStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,smartconfig_provisioner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let settings = Settings::from(CliArgs::parse());
    info!(
        radio_socket = %settings.radio_socket,
        credentials_file = %settings.credentials_file,
        protocol = ?settings.provisioning.smartconfig_type,
        attempt_timeout = ?settings.provisioning.attempt_timeout,
        "Starting smartconfig provisioner"
    );

    let (events, dispatcher) = EventLoop::new();

    let radio = Arc::new(SocketRadio::connect(&settings.radio_socket, events.clone()).await?);
    let store = Arc::new(JsonFileStore::new(
        &settings.credentials_file,
        settings.max_networks,
    ));
    info!("Credentials are stored in {}", store.path().display());

    let coordinator = ProvisioningCoordinator::new(radio, store, events, settings.provisioning);
    coordinator
        .on_network_joined(|| info!("Device joined the provisioned network"))
        .await;
    coordinator
        .on_provisioning_complete(|| info!("Provisioning finished, app acknowledged"))
        .await;

    let mut dispatcher = tokio::spawn(dispatcher.run());

    if let Err(e) = coordinator.start().await {
        error!("Failed to start provisioning: {}", e);
        return Err(e.into());
    }

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }

    info!("Provisioning started, waiting for broadcast");

    // Wait for the attempt to end or a shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
            coordinator.stop().await;
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
            coordinator.stop().await;
        }
        result = &mut dispatcher => {
            match result {
                Ok(Ok(())) => warn!("Event loop closed"),
                Ok(Err(e)) => {
                    error!("Event handling failed: {}", e);
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        state = coordinator.wait_finished() => {
            if let ListenerState::Failed(reason) = &state {
                error!("Provisioning failed: {}", reason);
                return Err(reason.clone().into());
            }
            info!(?state, "Provisioning attempt ended");
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
