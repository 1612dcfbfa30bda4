//! Radio driver bridged over a Unix socket
//!
//! Commands are JSON-RPC requests answered by the radio daemon. Radio events
//! arrive as `event` notifications on the same connection and are posted to
//! the event loop in the order they were received.

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::{
        UnixStream,
        unix::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    backend::RadioDriver,
    core::{
        error::{RadioError, RadioResult, TransportError},
        types::{RadioMode, SmartConfigStartConfig, SmartConfigType, StationConfig},
    },
    event::EventLoop,
    protocol::{
        JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, Notification, Request, RequestId,
        Response,
    },
    transport::unix_socket::{BridgeSession, SessionReader},
};

/// Time to wait for the bridge to answer a command
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

type PendingRequests = Arc<Mutex<HashMap<i64, oneshot::Sender<JsonRpcResponse>>>>;

/// Radio driver talking to an external radio daemon
pub struct SocketRadio {
    session: BridgeSession<OwnedWriteHalf>,
    pending: PendingRequests,
    next_id: AtomicI64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl SocketRadio {
    /// Connect to the bridge socket and start forwarding its events
    pub async fn connect(path: impl AsRef<Path>, events: EventLoop) -> RadioResult<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(TransportError::from)?;
        info!("Connected to radio bridge at {}", path.display());

        Ok(Self::from_stream(stream, events))
    }

    /// Use an already connected stream
    pub fn from_stream(stream: UnixStream, events: EventLoop) -> Self {
        let (read_half, write_half) = stream.into_split();
        let pending = PendingRequests::default();
        let reader = tokio::spawn(read_loop(
            SessionReader::new(read_half),
            pending.clone(),
            events,
        ));

        Self {
            session: BridgeSession::new(write_half),
            pending,
            next_id: AtomicI64::new(1),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            reader,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, request: Request) -> RadioResult<Response> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!(id, ?request, "Sending radio command");
        let request = JsonRpcRequest::new(request, RequestId::Number(id));
        if let Err(e) = self.session.send_request(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e.into());
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(TransportError::SessionClosed.into()),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(RadioError::Timeout);
            }
        };

        match response {
            JsonRpcResponse {
                error: Some(error), ..
            } => Err(error.into()),
            JsonRpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            _ => Err(TransportError::InvalidMessageFormat.into()),
        }
    }

    async fn command(&self, request: Request) -> RadioResult<()> {
        match self.call(request).await? {
            Response::Ack(ack) if !ack.is_ok() => Err(RadioError::Driver(ack.status)),
            _ => Ok(()),
        }
    }
}

impl Drop for SocketRadio {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut reader: SessionReader<OwnedReadHalf>,
    pending: PendingRequests,
    events: EventLoop,
) {
    loop {
        match reader.read_message().await {
            Ok(Some(JsonRpcMessage::Response(response))) => {
                let RequestId::Number(id) = response.id else {
                    warn!(id = ?response.id, "Response with unexpected id");
                    continue;
                };
                match pending.lock().await.remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!(id, "Late or unknown response dropped"),
                }
            }
            Ok(Some(JsonRpcMessage::Notification(notification))) => {
                let Notification::Event(event) = notification.notification;
                debug!(?event, "Radio event");
                if events.post(event).is_err() {
                    warn!("Event loop closed, stop reading radio events");
                    break;
                }
            }
            Ok(None) => {
                info!("Radio bridge closed the connection");
                break;
            }
            Err(TransportError::Serialization(e)) => {
                warn!("Invalid message from radio bridge: {}", e);
            }
            Err(e) => {
                error!("Error reading from radio bridge: {}", e);
                break;
            }
        }
    }

    // Fail every outstanding call
    pending.lock().await.clear();
}

impl RadioDriver for SocketRadio {
    async fn init_interface(&self) -> RadioResult<()> {
        self.command(Request::InitInterface).await
    }

    async fn init(&self) -> RadioResult<()> {
        self.command(Request::Init).await
    }

    async fn set_mode(&self, mode: RadioMode) -> RadioResult<()> {
        self.command(Request::SetMode { mode }).await
    }

    async fn start(&self) -> RadioResult<()> {
        self.command(Request::Start).await
    }

    async fn connect(&self) -> RadioResult<()> {
        self.command(Request::Connect).await
    }

    async fn disconnect(&self) -> RadioResult<()> {
        self.command(Request::Disconnect).await
    }

    async fn set_config(&self, config: &StationConfig) -> RadioResult<()> {
        self.command(Request::SetConfig(config.clone())).await
    }

    async fn set_smartconfig_type(&self, kind: SmartConfigType) -> RadioResult<()> {
        self.command(Request::SetSmartConfigType { kind }).await
    }

    async fn start_smartconfig(&self, config: &SmartConfigStartConfig) -> RadioResult<()> {
        self.command(Request::StartSmartConfig(config.clone())).await
    }

    async fn stop_smartconfig(&self) -> RadioResult<()> {
        self.command(Request::StopSmartConfig).await
    }

    async fn fetch_reserved_data(&self, buf: &mut [u8]) -> RadioResult<()> {
        let response = self
            .call(Request::GetReservedData { len: buf.len() })
            .await?;

        match response {
            Response::ReservedData(reserved) if reserved.data.len() == buf.len() => {
                buf.copy_from_slice(&reserved.data);
                Ok(())
            }
            Response::ReservedData(reserved) => Err(RadioError::InvalidState(format!(
                "expected {} bytes of reserved data, got {}",
                buf.len(),
                reserved.data.len()
            ))),
            Response::Ack(_) => Err(TransportError::Protocol(
                "reserved data missing from response".to_string(),
            )
            .into()),
        }
    }
}
