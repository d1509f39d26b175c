//! Concrete send channel: newline-delimited JSON over TCP.
//!
//! The pipeline only ever sees the [`SendChannel`] trait; this implementation
//! exists so the binary has something real to stream over. A write error
//! closes the channel, and subsequent ticks are skipped until `reconnect`.

use crate::sender::SendChannel;
use log::{info, warn};
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

/// Transport errors, surfaced only at connect time.
#[derive(Debug)]
pub enum TransportError {
    Connect(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Connect(e) => write!(f, "Connect error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// TCP channel framing each message as one JSON line.
pub struct TcpSendChannel {
    server_addr: String,
    stream: Option<TcpStream>,
}

impl TcpSendChannel {
    /// Create a channel in the closed state.
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            stream: None,
        }
    }

    /// Open the connection.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        let stream = TcpStream::connect(&self.server_addr)
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        stream
            .set_write_timeout(Some(Duration::from_millis(100)))
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("connected to {}", self.server_addr);
        self.stream = Some(stream);
        Ok(())
    }

    /// Attempt to re-open a dropped connection.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        self.stream = None;
        self.connect()
    }

    /// Close the connection. Idempotent.
    pub fn close(&mut self) {
        self.stream = None;
    }
}

impl SendChannel for TcpSendChannel {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Some(ref mut stream) = self.stream {
            let result = stream.write_all(bytes).and_then(|_| stream.write_all(b"\n"));
            if let Err(e) = result {
                warn!("TCP write failed, closing channel: {e}");
                self.stream = None;
            }
        }
    }
}
