//! Transceiver gateway

use std::time::Instant;

use culw_core::{
    encode_fht_command, Config, FrameRouter, LineBuffer, Outcome, ENABLE_REPORTING, VERSION_REQUEST,
};
use culw_transport::{TcpTransport, Transport};
use culw_types::{BusMessage, NormalizedEvent, CONTROL_BASIC};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::publisher::Publisher;

/// Gateway between a CUL/CULW transceiver and the bus
///
/// Reads lines from the transport, publishes the decoded events and writes
/// bus commands to the transceiver.
///
/// # Examples
///
/// ```no_run
/// use culw::{ChannelPublisher, Config, Gateway};
///
/// #[tokio::main]
/// async fn main() -> culw::Result<()> {
///     let (publisher, mut events) = ChannelPublisher::channel(64);
///     let mut gateway = Gateway::tcp("cuno.local", 2323, publisher, Config::default())?;
///
///     gateway.connect().await?;
///
///     tokio::spawn(async move {
///         while let Some(event) = events.recv().await {
///             println!("{}", event);
///         }
///     });
///
///     let (_commands_tx, mut commands) = tokio::sync::mpsc::channel(16);
///     gateway.run(&mut commands).await
/// }
/// ```
pub struct Gateway {
    transport: Box<dyn Transport>,
    publisher: Box<dyn Publisher>,
    router: FrameRouter,
    lines: LineBuffer,
    config: Config,
}

impl Gateway {
    /// Create a gateway, rejecting an invalid `config`
    pub fn new(
        transport: impl Transport + 'static,
        publisher: impl Publisher + 'static,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            transport: Box::new(transport),
            publisher: Box::new(publisher),
            router: FrameRouter::new(&config, now()),
            lines: LineBuffer::new(),
            config,
        })
    }

    /// Gateway to a network-bridged transceiver
    pub fn tcp(
        host: impl Into<String>,
        port: u16,
        publisher: impl Publisher + 'static,
        config: Config,
    ) -> Result<Self> {
        Self::new(TcpTransport::new(host, port), publisher, config)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn router(&self) -> &FrameRouter {
        &self.router
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the transport if needed and run the initialization handshake
    pub async fn connect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            info!(addr = %self.transport.remote_addr(), "Connecting to transceiver");
            self.transport.connect().await?;
        }

        self.initialize().await
    }

    /// Close the transport; pending programs are not flushed
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await?;
        self.lines.clear();
        Ok(())
    }

    /// Write the version request and enable reception reporting
    ///
    /// A write error aborts initialization.
    pub async fn initialize(&mut self) -> Result<()> {
        debug!("Sending version request");
        self.transport.send(VERSION_REQUEST.as_bytes()).await?;
        self.router.reset_handshake(now());

        debug!("Enabling reception reporting");
        self.transport.send(ENABLE_REPORTING.as_bytes()).await?;

        info!(addr = %self.transport.remote_addr(), "Transceiver initialized");
        Ok(())
    }

    /// Feed raw transport bytes and process every complete line
    pub async fn process_bytes(&mut self, data: &[u8]) {
        self.lines.push(data);

        while let Some(line) = self.lines.next_line() {
            self.process_line(&line).await;
        }
    }

    /// Route one line and act on the outcome
    pub async fn process_line(&mut self, line: &str) {
        trace!(line, "Line received");

        match self.router.handle_line(line, now()) {
            Outcome::Ignored | Outcome::Version(_) => {}
            Outcome::VersionRequestDue => {
                if let Err(e) = self.transport.send(VERSION_REQUEST.as_bytes()).await {
                    warn!(error = %e, "Failed to resend version request");
                }
            }
            Outcome::Events(events) => self.publish_all(&events).await,
        }
    }

    /// Publish the programs whose quiet period has ended
    pub async fn flush_due_schedules(&mut self) {
        let events = self.router.poll_timers(now());
        self.publish_all(&events).await;
    }

    /// Act on a message from the bus
    ///
    /// Bodies other than `control.basic` and devices of unknown families are
    /// ignored. A rejected command is returned as an error and nothing is
    /// written.
    pub async fn handle_bus_message(&mut self, message: &BusMessage) -> Result<()> {
        if message.body_name != CONTROL_BASIC {
            trace!(body = %message.body_name, "Bus message ignored");
            return Ok(());
        }

        let command = message.command()?;

        if command.device.starts_with("fs20 ") {
            warn!(device = %command.device, command = %command.command, "FS20 commands are not supported");
            return Err(Error::NotSupported(format!(
                "{} for {}",
                command.command, command.device
            )));
        }

        if !command.device.starts_with("fht ") {
            debug!(device = %command.device, "Command for unknown device family ignored");
            return Ok(());
        }

        let line = encode_fht_command(&command, &self.config.origin_code).inspect_err(|e| {
            warn!(device = %command.device, command = %command.command, error = %e, "Command rejected");
        })?;

        debug!(device = %command.device, line = %line.trim_end(), "Sending FHT command");
        self.transport.send(line.as_bytes()).await?;
        Ok(())
    }

    /// Process transport bytes, bus commands and program deadlines until the
    /// transport closes
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<BusMessage>) -> Result<()> {
        let mut commands_open = true;

        loop {
            let deadline = self.router.next_deadline().map(tokio::time::Instant::from_std);

            tokio::select! {
                received = self.transport.receive(self.config.read_timeout) => match received {
                    Ok(data) => self.process_bytes(&data).await,
                    Err(e) if e.is_timeout() => trace!("Transceiver quiet"),
                    Err(e) if e.is_closed() => {
                        info!(addr = %self.transport.remote_addr(), "Transport closed");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                },

                message = commands.recv(), if commands_open => match message {
                    Some(message) => {
                        if let Err(e) = self.handle_bus_message(&message).await {
                            warn!(error = %e, "Bus command failed");
                        }
                    }
                    None => {
                        debug!("Bus command channel closed");
                        commands_open = false;
                    }
                },

                _ = sleep_until(deadline), if deadline.is_some() => {
                    self.flush_due_schedules().await;
                }
            }
        }
    }

    async fn publish_all(&self, events: &[NormalizedEvent]) {
        for event in events {
            debug!(event = %event, "Publishing");
            if let Err(e) = self.publisher.publish(event).await {
                warn!(error = %e, "Failed to publish event");
            }
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::ChannelPublisher;
    use async_trait::async_trait;
    use bytes::{Bytes, BytesMut};
    use culw_core::HandshakeState;
    use culw_transport::{ChannelPeer, ChannelTransport};
    use culw_types::{EventKind, EventValue};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Harness {
        gateway: Gateway,
        peer: ChannelPeer,
        events: mpsc::Receiver<NormalizedEvent>,
    }

    async fn harness(config: Config) -> Harness {
        let (transport, mut peer) = ChannelTransport::pair("test", 64);
        let (publisher, events) = ChannelPublisher::channel(64);
        let mut gateway = Gateway::new(transport, publisher, config).unwrap();

        gateway.initialize().await.unwrap();
        assert_eq!(peer.written().await.unwrap(), Bytes::from_static(b"\n\nV\n"));
        assert_eq!(peer.written().await.unwrap(), Bytes::from_static(b"\nX61\n\n"));

        Harness { gateway, peer, events }
    }

    async fn ready(config: Config) -> Harness {
        let mut h = harness(config).await;
        h.gateway.process_bytes(b"V 1.67 CUL868\r\n").await;
        assert!(h.gateway.router().is_ready());
        h
    }

    fn fht(command: &str, current: &str) -> BusMessage {
        BusMessage::new(CONTROL_BASIC)
            .with_field("device", "fht 101")
            .with_field("command", command)
            .with_field("current", current)
    }

    /// Transport whose writes fail from the `fail_at`-th one on
    struct FailingTransport {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_at: usize,
    }

    #[async_trait]
    impl Transport for FailingTransport {
        async fn connect(&mut self) -> culw_transport::Result<()> {
            Ok(())
        }

        async fn disconnect(&mut self) -> culw_transport::Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn send(&mut self, data: &[u8]) -> culw_transport::Result<()> {
            let mut sent = self.sent.lock().unwrap();
            if sent.len() + 1 >= self.fail_at {
                return Err(culw_transport::Error::ConnectionClosed);
            }
            sent.push(data.to_vec());
            Ok(())
        }

        async fn receive(&mut self, _wait: Duration) -> culw_transport::Result<BytesMut> {
            Err(culw_transport::Error::ReadTimeout)
        }

        fn remote_addr(&self) -> String {
            "failing".into()
        }
    }

    #[tokio::test]
    async fn test_initialize_fails_without_peer() {
        let (transport, peer) = ChannelTransport::pair("test", 4);
        let (publisher, _events) = ChannelPublisher::channel(4);
        let mut gateway = Gateway::new(transport, publisher, Config::default()).unwrap();
        drop(peer);

        assert!(matches!(gateway.initialize().await, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_initialize_fails_on_enable_reporting() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = FailingTransport {
            sent: sent.clone(),
            fail_at: 2,
        };
        let (publisher, _events) = ChannelPublisher::channel(4);
        let mut gateway = Gateway::new(transport, publisher, Config::default()).unwrap();

        assert!(matches!(gateway.initialize().await, Err(Error::Transport(_))));
        assert_eq!(*sent.lock().unwrap(), vec![b"\n\nV\n".to_vec()]);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (transport, _peer) = ChannelTransport::pair("test", 4);
        let (publisher, _events) = ChannelPublisher::channel(4);
        let config = Config {
            read_timeout: Duration::ZERO,
            ..Config::default()
        };

        let result = Gateway::new(transport, publisher, config);
        assert!(matches!(
            result,
            Err(Error::Core(culw_core::Error::InvalidConfig(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_consumer_does_not_block_processing() {
        let (transport, mut peer) = ChannelTransport::pair("test", 8);
        let (publisher, mut events) = ChannelPublisher::channel(1);
        let mut gateway = Gateway::new(transport, publisher, Config::default()).unwrap();
        gateway.initialize().await.unwrap();
        gateway.process_line("V 1.67").await;

        // Nobody reads the events
        let processed = tokio::time::timeout(Duration::from_secs(60), async {
            gateway.process_line("F12340108").await;
            gateway.process_line("F12340110").await;
            gateway.handle_bus_message(&fht("manualTemp", "18")).await
        })
        .await;
        assert!(matches!(processed, Ok(Ok(()))));

        peer.written().await.unwrap();
        peer.written().await.unwrap();
        assert_eq!(peer.written().await.unwrap(), Bytes::from_static(b"T0101457736\n"));

        // Only the first event fit into the channel
        assert_eq!(events.recv().await.unwrap().kind, EventKind::State);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frames_before_version_dropped() {
        let mut h = harness(Config::default()).await;

        h.gateway.process_bytes(b"F12340108\r\n").await;
        assert!(h.events.try_recv().is_err());

        h.gateway.process_bytes(b"V 1.67\r\nF1234").await;
        h.gateway.process_bytes(b"0108\r\n").await;

        assert_eq!(h.events.recv().await.unwrap().kind, EventKind::State);
        let dim = h.events.recv().await.unwrap();
        assert_eq!(dim.kind, EventKind::Dim);
        assert_eq!(dim.current, EventValue::Integer(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_retry_resends_version_request() {
        let mut h = harness(Config::default()).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        h.gateway.process_line("F12340108").await;
        assert!(h.peer.try_written().is_none());

        tokio::time::advance(Duration::from_secs(3)).await;
        h.gateway.process_line("F12340108").await;
        assert_eq!(h.peer.written().await.unwrap(), Bytes::from_static(b"\n\nV\n"));
        assert!(matches!(
            h.gateway.router().state(),
            HandshakeState::AwaitingVersion { .. }
        ));
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_frames_do_not_stop_processing() {
        let mut h = ready(Config::default()).await;

        h.gateway.process_bytes(b"T09\r\nKxx\r\nT0903416922\r\n").await;

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.device, "fht 0903");
        assert_eq!(event.current, EventValue::Number(17.0));
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_fatal() {
        let mut h = ready(Config::default()).await;
        h.events.close();

        h.gateway.process_line("F12340108").await;
        h.gateway.handle_bus_message(&fht("manualTemp", "18")).await.unwrap();
        assert_eq!(h.peer.written().await.unwrap(), Bytes::from_static(b"T0101457736\n"));
    }

    #[tokio::test]
    async fn test_fht_commands() {
        let mut h = ready(Config::default()).await;

        h.gateway.handle_bus_message(&fht("manualTemp", "18")).await.unwrap();
        assert_eq!(h.peer.written().await.unwrap(), Bytes::from_static(b"T0101457736\n"));

        h.gateway.handle_bus_message(&fht("mode", "manual")).await.unwrap();
        assert_eq!(h.peer.written().await.unwrap(), Bytes::from_static(b"T01013E7701"));
    }

    #[tokio::test]
    async fn test_origin_code_from_config() {
        let config = Config::builder().origin_code("12").build().unwrap();
        let mut h = ready(config).await;

        h.gateway.handle_bus_message(&fht("comfortTemp", "21")).await.unwrap();
        assert_eq!(h.peer.written().await.unwrap(), Bytes::from_static(b"T0101821242\n"));
    }

    #[tokio::test]
    async fn test_rejected_commands() {
        let mut h = ready(Config::default()).await;

        let err = h.gateway.handle_bus_message(&fht("manualTemp", "2")).await.unwrap_err();
        assert!(err.is_rejection());
        assert!(matches!(err, Error::Core(culw_core::Error::TemperatureOutOfRange { .. })));

        let fs20 = BusMessage::new(CONTROL_BASIC)
            .with_field("device", "fs20 1234/01")
            .with_field("command", "on");
        assert!(matches!(
            h.gateway.handle_bus_message(&fs20).await,
            Err(Error::NotSupported(_))
        ));

        let missing = BusMessage::new(CONTROL_BASIC).with_field("device", "fht 0101");
        assert!(matches!(
            h.gateway.handle_bus_message(&missing).await,
            Err(Error::Types(_))
        ));

        assert!(h.peer.try_written().is_none());
    }

    #[tokio::test]
    async fn test_ignored_bus_messages() {
        let mut h = ready(Config::default()).await;

        let other = BusMessage::new("status.basic")
            .with_field("device", "fht 0101")
            .with_field("command", "manualTemp");
        h.gateway.handle_bus_message(&other).await.unwrap();

        let unknown = BusMessage::new(CONTROL_BASIC)
            .with_field("device", "hms 0101")
            .with_field("command", "on");
        h.gateway.handle_bus_message(&unknown).await.unwrap();

        assert!(h.peer.try_written().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_debounces_program() {
        let Harness {
            mut gateway,
            peer,
            mut events,
        } = harness(Config::default()).await;
        let (commands_tx, mut commands) = mpsc::channel(8);

        let task = tokio::spawn(async move { gateway.run(&mut commands).await });

        peer.feed(&b"V 1.67\r\n"[..]).await.unwrap();
        peer.feed(&b"T010114692A\r\n"[..]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        peer.feed(&b"T0101156942\r\n"[..]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        peer.feed(&b"T0101156942\r\n"[..]).await.unwrap();
        let last_change = tokio::time::Instant::now() - Duration::from_secs(10);

        let program = events.recv().await.unwrap();
        assert!(tokio::time::Instant::now() >= last_change + Duration::from_secs(20));
        assert_eq!(program.device, "fht 0101");
        assert_eq!(program.kind, EventKind::Program);
        assert_eq!(program.current, EventValue::Text("mon=07:00-11:00".into()));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(events.try_recv().is_err());

        drop(commands_tx);
        drop(peer);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forwards_bus_commands() {
        let Harness {
            mut gateway,
            mut peer,
            events: _events,
        } = harness(Config::default()).await;
        let (commands_tx, mut commands) = mpsc::channel(8);

        let task = tokio::spawn(async move { gateway.run(&mut commands).await });

        commands_tx.send(fht("manualTemp", "2")).await.unwrap();
        commands_tx.send(fht("economicTemp", "17")).await.unwrap();
        assert_eq!(peer.written().await.unwrap(), Bytes::from_static(b"T0101847734\n"));

        // Closed command channel does not end the loop
        drop(commands_tx);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!task.is_finished());

        drop(peer);
        assert!(task.await.unwrap().is_ok());
    }
}
