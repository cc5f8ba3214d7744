//! TCP transport for network-bridged transceivers

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Port used by CUNO devices and the usual ser2net setups
pub const DEFAULT_PORT: u16 = 2323;

/// TCP transport to a CUNO or a serial-to-network bridge
pub struct TcpTransport {
    host: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Transport to `host` on [`DEFAULT_PORT`]
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let target = format!("{}:{}", self.host, self.port);

        let addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", target, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", target)))?;

        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;
        debug!(%addr, "Connecting to transceiver");

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)??;

        // Commands are short lines, send them right away
        stream.set_nodelay(true)?;

        debug!(%addr, "Connected to transceiver");
        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!(addr = %self.remote_addr(), "Disconnecting from transceiver");
            let _ = stream.shutdown().await;
        }

        self.socket_addr = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!(len = data.len(), data = %String::from_utf8_lossy(data).escape_debug(), "TCP send");

        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let mut buf = BytesMut::with_capacity(256);

        let n = timeout(wait, stream.read_buf(&mut buf))
            .await
            .map_err(|_| Error::ReadTimeout)??;

        if n == 0 {
            self.stream = None;
            return Err(Error::ConnectionClosed);
        }

        trace!(len = n, data = %String::from_utf8_lossy(&buf).escape_debug(), "TCP receive");
        Ok(buf)
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!(addr = %self.remote_addr(), "TCP transport dropped while still connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_transport_create() {
        let transport = TcpTransport::with_default_port("cuno.local");
        assert!(!transport.is_connected());
        assert_eq!(transport.remote_addr(), "cuno.local:2323");
    }

    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let mut transport = TcpTransport::new("invalid..address", DEFAULT_PORT)
            .with_connect_timeout(Duration::from_millis(100));

        assert!(transport.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_not_connected() {
        let mut transport = TcpTransport::new("127.0.0.1", DEFAULT_PORT);

        assert!(matches!(transport.send(b"V\n").await, Err(Error::NotConnected)));
        assert!(matches!(
            transport.receive(Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_exchange_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = [0u8; 4];
            socket.read_exact(&mut head).await.unwrap();
            socket.write_all(b"V 1.67 CUL868\r\n").await.unwrap();
            head
        });

        let mut transport = TcpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        assert!(matches!(transport.connect().await, Err(Error::AlreadyConnected)));

        transport.send(b"\n\nV\n").await.unwrap();

        let mut received = BytesMut::new();
        while !received.ends_with(b"\r\n") {
            received.extend_from_slice(&transport.receive(Duration::from_secs(1)).await.unwrap());
        }
        assert_eq!(&received[..], b"V 1.67 CUL868\r\n");
        assert_eq!(&server.await.unwrap(), b"\n\nV\n");

        // Server side is closed now
        assert!(transport.receive(Duration::from_secs(1)).await.unwrap_err().is_closed());
        assert!(!transport.is_connected());
    }
}
