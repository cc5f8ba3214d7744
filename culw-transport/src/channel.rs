//! In-memory channel transport
//!
//! Used when the byte stream is owned by someone else, e.g. a serial port
//! opened by the host application. The owner keeps the [`ChannelPeer`] and
//! pumps bytes between the port and the channels.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::{error::*, Transport};

/// Transport side of a channel pair
#[derive(Debug)]
pub struct ChannelTransport {
    name: String,
    inbound: mpsc::Receiver<Bytes>,
    outbound: mpsc::Sender<Bytes>,
    connected: bool,
}

/// Stream owner side of a channel pair
#[derive(Debug)]
pub struct ChannelPeer {
    /// Bytes read from the transceiver
    pub tx: mpsc::Sender<Bytes>,

    /// Bytes to write to the transceiver
    pub rx: mpsc::Receiver<Bytes>,
}

impl ChannelPeer {
    /// Feed bytes as if read from the transceiver
    pub async fn feed(&self, data: impl Into<Bytes>) -> Result<()> {
        self.tx.send(data.into()).await.map_err(|_| Error::ConnectionClosed)
    }

    /// Next write issued by the transport
    pub async fn written(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Write already issued by the transport, without waiting
    pub fn try_written(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

impl ChannelTransport {
    /// Create a connected transport and its peer, each channel holding up to
    /// `capacity` chunks
    pub fn pair(name: impl Into<String>, capacity: usize) -> (Self, ChannelPeer) {
        let (in_tx, in_rx) = mpsc::channel(capacity);
        let (out_tx, out_rx) = mpsc::channel(capacity);

        let transport = Self {
            name: name.into(),
            inbound: in_rx,
            outbound: out_tx,
            connected: true,
        };
        let peer = ChannelPeer { tx: in_tx, rx: out_rx };

        (transport, peer)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        if self.outbound.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        debug!(name = %self.name, "Closing channel transport");
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        trace!(name = %self.name, len = data.len(), "Channel send");

        self.outbound
            .send(Bytes::copy_from_slice(data))
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn receive(&mut self, wait: Duration) -> Result<BytesMut> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        match timeout(wait, self.inbound.recv()).await {
            Err(_) => Err(Error::ReadTimeout),
            Ok(None) => {
                self.connected = false;
                Err(Error::ConnectionClosed)
            }
            Ok(Some(chunk)) => {
                trace!(name = %self.name, len = chunk.len(), "Channel receive");
                Ok(BytesMut::from(&chunk[..]))
            }
        }
    }

    fn remote_addr(&self) -> String {
        self.name.clone()
    }
}
