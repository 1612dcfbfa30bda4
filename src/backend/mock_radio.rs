//! Mock radio driver for testing

use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    backend::RadioDriver,
    core::{
        error::{RadioError, RadioResult},
        types::{
            RESERVED_DATA_LEN, RadioMode, SmartConfigStartConfig, SmartConfigType, StationConfig,
        },
    },
    event::{EventLoop, WifiEvent},
};

/// Radio operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioOp {
    InitInterface,
    Init,
    SetMode,
    Start,
    Connect,
    Disconnect,
    SetConfig,
    SetSmartConfigType,
    StartSmartConfig,
    StopSmartConfig,
    FetchReservedData,
}

/// A recorded call on the mock radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    InitInterface,
    Init,
    SetMode(RadioMode),
    Start,
    Connect,
    Disconnect,
    SetConfig(StationConfig),
    SetSmartConfigType(SmartConfigType),
    StartSmartConfig(SmartConfigStartConfig),
    StopSmartConfig,
    FetchReservedData { len: usize },
}

impl RadioCall {
    fn op(&self) -> RadioOp {
        match self {
            RadioCall::InitInterface => RadioOp::InitInterface,
            RadioCall::Init => RadioOp::Init,
            RadioCall::SetMode(_) => RadioOp::SetMode,
            RadioCall::Start => RadioOp::Start,
            RadioCall::Connect => RadioOp::Connect,
            RadioCall::Disconnect => RadioOp::Disconnect,
            RadioCall::SetConfig(_) => RadioOp::SetConfig,
            RadioCall::SetSmartConfigType(_) => RadioOp::SetSmartConfigType,
            RadioCall::StartSmartConfig(_) => RadioOp::StartSmartConfig,
            RadioCall::StopSmartConfig => RadioOp::StopSmartConfig,
            RadioCall::FetchReservedData { .. } => RadioOp::FetchReservedData,
        }
    }
}

#[derive(Debug)]
struct MockState {
    calls: Vec<RadioCall>,
    failures: HashSet<RadioOp>,
    reserved_data: [u8; RESERVED_DATA_LEN],
    station_config: Option<StationConfig>,
}

/// Mock radio driver
///
/// Records every call in order and allows failing individual operations.
/// When attached to an event loop it posts a station-start event on `start`,
/// like a real driver does.
#[derive(Clone)]
pub struct MockRadio {
    inner: Arc<Mutex<MockState>>,
    events: Option<EventLoop>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                failures: HashSet::new(),
                reserved_data: [0u8; RESERVED_DATA_LEN],
                station_config: None,
            })),
            events: None,
        }
    }

    /// Post driver events to the given event loop
    pub fn with_event_loop(mut self, events: EventLoop) -> Self {
        self.events = Some(events);
        self
    }

    /// Configure an operation to fail
    pub async fn set_failure(&self, op: RadioOp, should_fail: bool) {
        let mut state = self.inner.lock().await;
        if should_fail {
            state.failures.insert(op);
        } else {
            state.failures.remove(&op);
        }
    }

    /// Configure the reserved data returned for extended broadcasts
    pub async fn set_reserved_data(&self, data: [u8; RESERVED_DATA_LEN]) {
        self.inner.lock().await.reserved_data = data;
    }

    /// All calls so far, in order
    pub async fn calls(&self) -> Vec<RadioCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Number of calls of the given operation
    pub async fn count(&self, op: RadioOp) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    /// Last applied station configuration
    pub async fn station_config(&self) -> Option<StationConfig> {
        self.inner.lock().await.station_config.clone()
    }

    async fn record(&self, call: RadioCall) -> RadioResult<()> {
        let mut state = self.inner.lock().await;
        let op = call.op();
        state.calls.push(call);
        if state.failures.contains(&op) {
            Err(RadioError::Driver(format!("Mock {:?} failure", op)))
        } else {
            Ok(())
        }
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioDriver for MockRadio {
    async fn init_interface(&self) -> RadioResult<()> {
        self.record(RadioCall::InitInterface).await
    }

    async fn init(&self) -> RadioResult<()> {
        self.record(RadioCall::Init).await
    }

    async fn set_mode(&self, mode: RadioMode) -> RadioResult<()> {
        self.record(RadioCall::SetMode(mode)).await
    }

    async fn start(&self) -> RadioResult<()> {
        self.record(RadioCall::Start).await?;
        if let Some(events) = &self.events {
            events
                .post(WifiEvent::StaStart)
                .map_err(|e| RadioError::Driver(e.to_string()))?;
        }
        Ok(())
    }

    async fn connect(&self) -> RadioResult<()> {
        self.record(RadioCall::Connect).await
    }

    async fn disconnect(&self) -> RadioResult<()> {
        self.record(RadioCall::Disconnect).await
    }

    async fn set_config(&self, config: &StationConfig) -> RadioResult<()> {
        self.record(RadioCall::SetConfig(config.clone())).await?;
        self.inner.lock().await.station_config = Some(config.clone());
        Ok(())
    }

    async fn set_smartconfig_type(&self, kind: SmartConfigType) -> RadioResult<()> {
        self.record(RadioCall::SetSmartConfigType(kind)).await
    }

    async fn start_smartconfig(&self, config: &SmartConfigStartConfig) -> RadioResult<()> {
        self.record(RadioCall::StartSmartConfig(config.clone()))
            .await
    }

    async fn stop_smartconfig(&self) -> RadioResult<()> {
        self.record(RadioCall::StopSmartConfig).await
    }

    async fn fetch_reserved_data(&self, buf: &mut [u8]) -> RadioResult<()> {
        self.record(RadioCall::FetchReservedData { len: buf.len() })
            .await?;
        let state = self.inner.lock().await;
        let len = buf.len().min(RESERVED_DATA_LEN);
        buf[..len].copy_from_slice(&state.reserved_data[..len]);
        Ok(())
    }
}
