//! # culw-core
//!
//! Protocol engine for CUL/CULW 868 MHz transceivers.
//!
//! This crate turns the transceiver's ASCII lines into normalized events and
//! normalized commands back into transceiver lines:
//! - Line splitting of raw transport bytes
//! - Frame routing and the version handshake
//! - EM, FHT and FS20 decoders
//! - FHT weekly program reconstruction with debounce deadlines
//! - FHT command encoding
//!
//! Nothing here performs I/O or sleeps. Time is passed in as an [`Instant`]
//! and the caller is told when the next deadline falls due.
//!
//! [`Instant`]: std::time::Instant

pub mod config;
pub mod constants;
pub mod em;
pub mod encoder;
pub mod error;
pub mod fht;
pub mod frame;
pub mod fs20;
pub mod line;
pub mod router;

pub use config::Config;
pub use em::EmDecoder;
pub use encoder::encode_fht_command;
pub use error::{Error, Result};
pub use fht::{FhtDecoder, HouseCode};
pub use fs20::Fs20Decoder;
pub use line::LineBuffer;
pub use router::{Decoder, FrameRouter, HandshakeState, Outcome, Protocol};

/// Line sent to request the transceiver firmware version
pub const VERSION_REQUEST: &str = "\n\nV\n";

/// Line enabling reception reporting (`X61`) after the version request
pub const ENABLE_REPORTING: &str = "\nX61\n\n";
