//! Frame routing and the version handshake
//!
//! Every line from the transceiver starts with a one character selector
//! followed by the payload:
//!
//! ```text
//! V 1.67 CUL868     version reply
//! E 01...           EM meter reading
//! T 0903...         FHT thermostat frame
//! F 1234...         FS20 switch/dimmer frame
//! ```
//!
//! After the version request is written the router waits for the `V` reply and
//! drops every other frame. The wait is self-healing: once the retry interval
//! has passed the router asks its caller to write the request again.

use std::fmt;
use std::time::{Duration, Instant};

use culw_types::NormalizedEvent;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::selectors;
use crate::em::EmDecoder;
use crate::error::Result;
use crate::fht::{FhtDecoder, HouseCode};
use crate::fs20::Fs20Decoder;

/// Device sub-protocol addressed by a selector character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Em,
    Fht,
    Fs20,
}

impl Protocol {
    /// Look up the protocol of a frame selector
    pub fn from_selector(selector: char) -> Option<Self> {
        match selector {
            selectors::EM => Some(Self::Em),
            selectors::FHT => Some(Self::Fht),
            selectors::FS20 => Some(Self::Fs20),
            _ => None,
        }
    }

    pub fn selector(self) -> char {
        match self {
            Self::Em => selectors::EM,
            Self::Fht => selectors::FHT,
            Self::Fs20 => selectors::FS20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Em => "EM",
            Self::Fht => "FHT",
            Self::Fs20 => "FS20",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per protocol payload decoder
pub trait Decoder {
    fn protocol(&self) -> Protocol;

    /// Decode one payload (the line without its selector) received at `now`
    fn decode(&mut self, payload: &str, now: Instant) -> Result<Vec<NormalizedEvent>>;
}

/// Version handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Version request written, waiting for the `V` reply since `since`
    AwaitingVersion { since: Instant },

    /// Version received, frames are routed
    Ready,
}

/// Result of routing one line
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to do
    Ignored,

    /// Version reply received
    Version(String),

    /// Handshake timed out, the version request must be written again
    VersionRequestDue,

    /// Events decoded from the frame (may be empty)
    Events(Vec<NormalizedEvent>),
}

/// Routes lines to the EM, FHT and FS20 decoders
#[derive(Debug)]
pub struct FrameRouter {
    em: EmDecoder,
    fht: FhtDecoder,
    fs20: Fs20Decoder,
    state: HandshakeState,
    handshake_retry: Duration,
    version: Option<String>,
}

impl FrameRouter {
    /// Create a router that starts waiting for the version reply at `now`
    pub fn new(config: &Config, now: Instant) -> Self {
        Self {
            em: EmDecoder::new(),
            fht: FhtDecoder::new(config),
            fs20: Fs20Decoder::new(),
            state: HandshakeState::AwaitingVersion { since: now },
            handshake_retry: config.handshake_retry,
            version: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// Firmware version reported by the transceiver
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Restart the handshake, e.g. after the request was written again
    pub fn reset_handshake(&mut self, now: Instant) {
        self.state = HandshakeState::AwaitingVersion { since: now };
    }

    /// Route one raw line received at `now`
    ///
    /// Decode failures are logged here and never returned.
    pub fn handle_line(&mut self, raw: &str, now: Instant) -> Outcome {
        let line = raw.trim();
        if line.len() < 2 {
            return Outcome::Ignored;
        }

        let mut chars = line.chars();
        let Some(selector) = chars.next() else {
            return Outcome::Ignored;
        };
        let payload = chars.as_str();

        if selector == selectors::VERSION {
            info!(version = payload, "Transceiver version");
            self.state = HandshakeState::Ready;
            self.version = Some(payload.to_string());
            return Outcome::Version(payload.to_string());
        }

        if let HandshakeState::AwaitingVersion { since } = self.state {
            if now.saturating_duration_since(since) >= self.handshake_retry {
                warn!(
                    waited_ms = now.saturating_duration_since(since).as_millis() as u64,
                    "No version reply, requesting again"
                );
                self.state = HandshakeState::AwaitingVersion { since: now };
                return Outcome::VersionRequestDue;
            }

            debug!(line, "Awaiting version, frame dropped");
            return Outcome::Ignored;
        }

        let Some(protocol) = Protocol::from_selector(selector) else {
            debug!(selector = %selector, line, "Unknown selector");
            return Outcome::Ignored;
        };

        let decoder = self.decoder_mut(protocol);
        match decoder.decode(payload, now) {
            Ok(events) => Outcome::Events(events),
            Err(e) if e.is_malformed_frame() => {
                warn!(protocol = %decoder.protocol(), payload, error = %e, "Malformed frame");
                Outcome::Ignored
            }
            Err(e) => {
                debug!(protocol = %decoder.protocol(), payload, error = %e, "Frame not decoded");
                Outcome::Ignored
            }
        }
    }

    fn decoder_mut(&mut self, protocol: Protocol) -> &mut dyn Decoder {
        match protocol {
            Protocol::Em => &mut self.em,
            Protocol::Fht => &mut self.fht,
            Protocol::Fs20 => &mut self.fs20,
        }
    }

    /// Earliest pending timer (schedule commit)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fht.next_deadline()
    }

    /// Fire the timers due at `now`
    pub fn poll_timers(&mut self, now: Instant) -> Vec<NormalizedEvent> {
        self.fht.poll_schedules(now)
    }

    /// Emit the program of one thermostat without waiting for its quiet period
    pub fn commit_schedule(&mut self, house_code: &HouseCode) -> Option<NormalizedEvent> {
        self.fht.commit_schedule(house_code)
    }

    pub fn fht(&self) -> &FhtDecoder {
        &self.fht
    }
}
