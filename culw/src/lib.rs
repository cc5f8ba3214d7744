//! # culw
//!
//! Gateway for CUL/CULW 868 MHz transceivers.
//!
//! ## Features
//!
//! - FHT thermostat telemetry, including weekly programs
//! - FS20 switch and dimmer reception
//! - EM energy meter readings
//! - FHT temperature and mode commands
//! - Async/await API using Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use culw::{ChannelPublisher, Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> culw::Result<()> {
//!     let (publisher, mut events) = ChannelPublisher::channel(64);
//!     let mut gateway = Gateway::tcp("192.168.1.50", 2323, publisher, Config::default())?;
//!     gateway.connect().await?;
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             println!("{}", event);
//!         }
//!     });
//!
//!     let (_tx, mut commands) = tokio::sync::mpsc::channel(16);
//!     gateway.run(&mut commands).await?;
//!
//!     gateway.disconnect().await
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod publisher;

// Re-exports
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use publisher::{ChannelPublisher, Publisher};

pub use culw_core::{Config, HandshakeState, Outcome};
pub use culw_transport::{ChannelPeer, ChannelTransport, TcpTransport, Transport};
pub use culw_types::{BusMessage, CONTROL_BASIC, EventKind, EventValue, NormalizedCommand, NormalizedEvent, Units};
