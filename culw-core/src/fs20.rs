//! FS20 switch and dimmer decoding
//!
//! Frame format `hhhhaacc` or `hhhhaaccee`: house code, device address,
//! command byte and an optional extension byte.

use std::time::Instant;

use culw_types::{EventKind, NormalizedEvent, Units};
use tracing::debug;

use crate::constants::fs20::{DIM_MAX, MIN_PAYLOAD, ON_MAX};
use crate::error::Result;
use crate::frame::Payload;
use crate::router::{Decoder, Protocol};

/// One decoded FS20 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fs20Frame {
    /// House code, kept as received
    pub house_code: String,
    pub device: String,
    pub command: u8,
    pub extension: Option<String>,
}

impl Fs20Frame {
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = Payload::new(Protocol::Fs20, payload, MIN_PAYLOAD)?;

        let extension = payload.raw(10, 12);

        Ok(Self {
            house_code: payload.raw(0, 4).to_string(),
            device: payload.raw(4, 6).to_string(),
            command: payload.byte(6)?,
            extension: (!extension.is_empty()).then(|| extension.to_string()),
        })
    }

    /// Device identity on the bus, e.g. `"fs20 1234/01"`
    pub fn device_id(&self) -> String {
        format!("fs20 {}/{}", self.house_code, self.device)
    }

    /// Dim level in percent, `None` for commands that are not switch/dim
    pub fn dim_level(&self) -> Option<u8> {
        if self.command <= DIM_MAX {
            Some((u16::from(self.command) * 100 / u16::from(DIM_MAX)) as u8)
        } else if self.command <= ON_MAX {
            Some(100)
        } else {
            None
        }
    }
}

/// FS20 decoder, stateless
#[derive(Debug, Default, Clone, Copy)]
pub struct Fs20Decoder;

impl Fs20Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_payload(&self, payload: &str) -> Result<Vec<NormalizedEvent>> {
        let frame = Fs20Frame::parse(payload)?;
        let device = frame.device_id();

        let Some(level) = frame.dim_level() else {
            debug!(
                device = %device,
                command = %format!("0x{:02x}", frame.command),
                extension = ?frame.extension,
                "FS20: unsupported command"
            );
            return Ok(Vec::new());
        };

        debug!(device = %device, level, "FS20: on");

        Ok(vec![
            NormalizedEvent::new(device.clone(), EventKind::State, "on"),
            NormalizedEvent::new(device, EventKind::Dim, level).with_units(Units::Percent),
        ])
    }
}

impl Decoder for Fs20Decoder {
    fn protocol(&self) -> Protocol {
        Protocol::Fs20
    }

    fn decode(&mut self, payload: &str, _now: Instant) -> Result<Vec<NormalizedEvent>> {
        self.decode_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use culw_types::EventValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_frame() {
        let frame = Fs20Frame::parse("12340A11").unwrap();
        assert_eq!(frame.house_code, "1234");
        assert_eq!(frame.device, "0A");
        assert_eq!(frame.command, 0x11);
        assert_eq!(frame.extension, None);
        assert_eq!(frame.device_id(), "fs20 1234/0A");

        let frame = Fs20Frame::parse("12340A3900A0").unwrap();
        assert_eq!(frame.extension.as_deref(), Some("A0"));
    }

    #[test]
    fn test_dim_level() {
        let events = Fs20Decoder::new().decode_payload("12340108").unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::State);
        assert_eq!(events[0].current, EventValue::Text("on".into()));
        assert_eq!(events[1].kind, EventKind::Dim);
        assert_eq!(events[1].current, EventValue::Integer(50));
        assert_eq!(events[1].units, Some(Units::Percent));
        assert_eq!(events[1].device, "fs20 1234/01");
    }

    #[test]
    fn test_dim_boundaries() {
        let level = |cmd: &str| Fs20Frame::parse(&format!("123401{}", cmd)).unwrap().dim_level();

        assert_eq!(level("00"), Some(0));
        assert_eq!(level("01"), Some(6));
        assert_eq!(level("10"), Some(100));
        assert_eq!(level("11"), Some(100));
        assert_eq!(level("3A"), Some(100));
        assert_eq!(level("3B"), None);
    }

    #[test]
    fn test_unsupported_command() {
        let events = Fs20Decoder::new().decode_payload("123401FF").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_short_payload() {
        let result = Fs20Decoder::new().decode_payload("123401");
        assert!(matches!(result, Err(Error::FrameTooShort { .. })));
    }
}
