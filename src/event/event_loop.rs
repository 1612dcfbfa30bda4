//! In-process event loop delivering system events to registered handlers

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, warn};
use trait_variant::make;

use crate::{
    core::error::{EventError, EventResult, ProvisioningResult},
    event::types::{EventCategory, SystemEvent},
};

/// Receiver of system events
///
/// Handlers run on the shared dispatch task, one event at a time, so they
/// must not wait on anything that only a later event could release.
#[make(Send)]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle a single event
    ///
    /// A fatal error stops the dispatcher.
    async fn handle_event(&self, event: SystemEvent) -> ProvisioningResult<()>;
}

trait ErasedHandler: Send + Sync {
    fn dispatch(&self, event: SystemEvent) -> BoxFuture<'_, ProvisioningResult<()>>;
}

impl<H: EventHandler> ErasedHandler for H {
    fn dispatch(&self, event: SystemEvent) -> BoxFuture<'_, ProvisioningResult<()>> {
        Box::pin(self.handle_event(event))
    }
}

struct Registration {
    categories: Vec<EventCategory>,
    handler: Arc<dyn ErasedHandler>,
}

type Registry = Arc<RwLock<Vec<Registration>>>;

/// Handle for posting events and registering handlers
#[derive(Clone)]
pub struct EventLoop {
    tx: mpsc::UnboundedSender<SystemEvent>,
    handlers: Registry,
}

/// Delivers posted events in order; run it on its own task
pub struct EventDispatcher {
    rx: mpsc::UnboundedReceiver<SystemEvent>,
    handlers: Registry,
}

impl EventLoop {
    /// Create an event loop and the dispatcher that drains it
    pub fn new() -> (Self, EventDispatcher) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handlers: Registry = Arc::new(RwLock::new(Vec::new()));

        (
            Self {
                tx,
                handlers: handlers.clone(),
            },
            EventDispatcher { rx, handlers },
        )
    }

    /// Post an event; never blocks
    pub fn post(&self, event: impl Into<SystemEvent>) -> EventResult<()> {
        self.tx
            .send(event.into())
            .map_err(|_| EventError::LoopClosed)
    }

    /// Register a handler for the given categories
    pub async fn register<H: EventHandler>(
        &self,
        categories: &[EventCategory],
        handler: Arc<H>,
    ) -> EventResult<()> {
        if self.tx.is_closed() {
            return Err(EventError::LoopClosed);
        }

        self.handlers.write().await.push(Registration {
            categories: categories.to_vec(),
            handler,
        });

        debug!(?categories, "Event handler registered");
        Ok(())
    }
}

impl EventDispatcher {
    /// Dispatch events until every [`EventLoop`] handle is dropped
    ///
    /// Returns the first fatal handler error.
    pub async fn run(mut self) -> ProvisioningResult<()> {
        while let Some(event) = self.rx.recv().await {
            let category = event.category();
            let handlers: Vec<Arc<dyn ErasedHandler>> = self
                .handlers
                .read()
                .await
                .iter()
                .filter(|r| r.categories.contains(&category))
                .map(|r| r.handler.clone())
                .collect();

            for handler in handlers {
                if let Err(e) = handler.dispatch(event.clone()).await {
                    if e.is_fatal() {
                        error!("Fatal error while handling {:?}: {}", category, e);
                        return Err(e);
                    }
                    warn!("Error while handling {:?}: {}", category, e);
                }
            }
        }

        debug!("Event loop closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::error::{ProvisioningError, RadioError},
        event::types::{IpEvent, SmartConfigEvent, WifiEvent},
    };
    use pretty_assertions::assert_eq;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<SystemEvent>>,
    }

    impl EventHandler for RecordingHandler {
        async fn handle_event(&self, event: SystemEvent) -> ProvisioningResult<()> {
            self.seen.lock().await.push(event);
            Ok(())
        }
    }

    struct FailingHandler {
        fatal: bool,
    }

    impl EventHandler for FailingHandler {
        async fn handle_event(&self, _event: SystemEvent) -> ProvisioningResult<()> {
            if self.fatal {
                Err(ProvisioningError::ReservedData(RadioError::NotInitialized))
            } else {
                Err(ProvisioningError::Radio(RadioError::Timeout))
            }
        }
    }

    #[tokio::test]
    async fn test_events_delivered_in_order_to_subscribed_categories() {
        let (event_loop, dispatcher) = EventLoop::new();
        let handler = Arc::new(RecordingHandler::default());
        event_loop
            .register(&[EventCategory::Wifi, EventCategory::Ip], handler.clone())
            .await
            .unwrap();

        event_loop.post(WifiEvent::StaStart).unwrap();
        event_loop.post(SmartConfigEvent::ScanDone).unwrap();
        event_loop.post(IpEvent::StaLostIp).unwrap();
        event_loop.post(WifiEvent::StaDisconnected { reason: 2 }).unwrap();
        drop(event_loop);

        dispatcher.run().await.unwrap();

        assert_eq!(
            *handler.seen.lock().await,
            vec![
                SystemEvent::Wifi(WifiEvent::StaStart),
                SystemEvent::Ip(IpEvent::StaLostIp),
                SystemEvent::Wifi(WifiEvent::StaDisconnected { reason: 2 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_error_stops_dispatcher() {
        let (event_loop, dispatcher) = EventLoop::new();
        let recorder = Arc::new(RecordingHandler::default());
        event_loop
            .register(&[EventCategory::Wifi], Arc::new(FailingHandler { fatal: true }))
            .await
            .unwrap();
        event_loop
            .register(&[EventCategory::Wifi], recorder.clone())
            .await
            .unwrap();

        event_loop.post(WifiEvent::StaStart).unwrap();
        event_loop.post(WifiEvent::StaStop).unwrap();

        let result = dispatcher.run().await;
        assert!(matches!(result, Err(ProvisioningError::ReservedData(_))));
        assert!(recorder.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_recoverable_error_keeps_dispatching() {
        let (event_loop, dispatcher) = EventLoop::new();
        let recorder = Arc::new(RecordingHandler::default());
        event_loop
            .register(&[EventCategory::Wifi], Arc::new(FailingHandler { fatal: false }))
            .await
            .unwrap();
        event_loop
            .register(&[EventCategory::Wifi], recorder.clone())
            .await
            .unwrap();

        event_loop.post(WifiEvent::StaStart).unwrap();
        event_loop.post(WifiEvent::StaStop).unwrap();
        drop(event_loop);

        dispatcher.run().await.unwrap();
        assert_eq!(recorder.seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_post_after_dispatcher_dropped() {
        let (event_loop, dispatcher) = EventLoop::new();
        drop(dispatcher);

        assert_eq!(
            event_loop.post(WifiEvent::StaStart),
            Err(EventError::LoopClosed)
        );
        let handler = Arc::new(RecordingHandler::default());
        assert_eq!(
            event_loop.register(&[EventCategory::Wifi], handler).await,
            Err(EventError::LoopClosed)
        );
    }
}
