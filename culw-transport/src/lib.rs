//! Transport layer for CUL/CULW transceivers
//!
//! The transceiver speaks an ASCII line protocol over a byte stream. Two
//! transports are provided:
//! - [`TcpTransport`] for network-bridged transceivers (CUNO, ser2net)
//! - [`ChannelTransport`] for byte streams owned elsewhere, such as a serial
//!   port driven by the host application, and for tests
//!
//! Transports move bytes only. Splitting into lines happens in `culw-core`.

pub mod channel;
pub mod error;
pub mod tcp;

pub use channel::{ChannelPeer, ChannelTransport};
pub use error::{Error, Result};
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Byte stream to a transceiver
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the stream
    async fn connect(&mut self) -> Result<()>;

    /// Close the stream
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Write raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive the next chunk of bytes, waiting at most `timeout`
    ///
    /// Chunks carry no framing: a chunk may hold part of a line or several
    /// lines.
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Human readable peer description
    fn remote_addr(&self) -> String;
}
