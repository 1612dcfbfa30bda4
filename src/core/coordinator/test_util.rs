//! Shared fixtures for coordinator tests

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    backend::MockRadio,
    config::ProvisioningSettings,
    core::{coordinator::ProvisioningCoordinator, types::ListenerState},
    event::{EventDispatcher, EventLoop, SystemEvent},
    store::MemoryStore,
};

pub(super) use crate::event::{EventHandler, IpEvent, SmartConfigEvent, WifiEvent};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub(super) type TestCoordinator = ProvisioningCoordinator<MockRadio, MemoryStore>;

pub(super) struct Fixture {
    pub coordinator: Arc<TestCoordinator>,
    pub radio: MockRadio,
    pub store: MemoryStore,
    pub events: EventLoop,
    dispatcher: Option<EventDispatcher>,
}

impl Fixture {
    /// Coordinator on a mock radio; events queue until `with_dispatcher`
    pub fn new(settings: ProvisioningSettings) -> Self {
        let (events, dispatcher) = EventLoop::new();
        let radio = MockRadio::new().with_event_loop(events.clone());
        let store = MemoryStore::new();
        let coordinator = ProvisioningCoordinator::new(
            Arc::new(radio.clone()),
            Arc::new(store.clone()),
            events.clone(),
            settings,
        );

        Self {
            coordinator,
            radio,
            store,
            events,
            dispatcher: Some(dispatcher),
        }
    }

    /// Coordinator whose event loop has no dispatcher
    pub fn without_dispatcher(settings: ProvisioningSettings) -> Self {
        let mut fixture = Self::new(settings);
        fixture.dispatcher = None;
        fixture
    }

    /// Run the event dispatcher on its own task
    pub fn with_dispatcher(mut self) -> Self {
        if let Some(dispatcher) = self.dispatcher.take() {
            tokio::spawn(dispatcher.run());
        }
        self
    }

    pub fn post(&self, event: impl Into<SystemEvent>) {
        self.events.post(event).unwrap();
    }

    pub async fn wait_for_listening(&self) {
        let coordinator = self.coordinator.clone();
        wait_until(move || {
            let coordinator = coordinator.clone();
            async move { coordinator.listener_state() == ListenerState::Listening }
        })
        .await;
    }
}

/// Poll `condition` until it holds, panicking after a timeout
pub(super) async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while !condition().await {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Callback counting its invocations
pub(super) fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let callback = {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    };
    (count, callback)
}

pub(super) fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
