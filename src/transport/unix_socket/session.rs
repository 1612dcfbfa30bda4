//! Unix socket session with the radio bridge

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::Mutex,
};

use crate::{
    core::error::TransportResult,
    protocol::{JsonRpcMessage, JsonRpcRequest},
};

/// Writing half of a bridge session
#[derive(Debug)]
pub struct BridgeSession<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin> BridgeSession<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Send a JSON-RPC request as one line
    pub async fn send_request(&self, request: &JsonRpcRequest) -> TransportResult<()> {
        let mut json = serde_json::to_vec(request)?;
        json.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&json).await?;
        writer.flush().await?;

        Ok(())
    }
}

/// Session reader for processing incoming messages
pub struct SessionReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> SessionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next line from the socket
    pub async fn read_line(&mut self) -> TransportResult<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // EOF - connection closed
            return Ok(None);
        }

        // Remove trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Read the next non-empty message
    ///
    /// A malformed line yields a serialization error; the reader stays usable.
    pub async fn read_message(&mut self) -> TransportResult<Option<JsonRpcMessage>> {
        loop {
            match self.read_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(serde_json::from_str(&line)?)),
                None => return Ok(None),
            }
        }
    }
}
