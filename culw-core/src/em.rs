//! EM energy meter decoding
//!
//! ```text
//! E 03 09 01 1800 1800 1800
//!   │  │  │  │    │    └─ maximum   (u16, low byte first)
//!   │  │  │  │    └────── current   (u16, low byte first)
//!   │  │  │  └─────────── cumulated (u16, low byte first)
//!   │  │  └────────────── counter
//!   │  └───────────────── address
//!   └──────────────────── meter type
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use culw_types::{EventKind, NormalizedEvent};
use tracing::debug;

use crate::constants::em::{MIN_PAYLOAD, TYPE_1000GZ, TYPE_EM100, TYPE_EM1000};
use crate::error::Result;
use crate::frame::Payload;
use crate::router::{Decoder, Protocol};

/// Meter family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeterType {
    Em1000,
    Em100,
    Gz1000,
    /// Unknown type code, kept verbatim
    Other(String),
}

impl MeterType {
    pub fn from_code(code: &str) -> Self {
        match code {
            TYPE_EM1000 => Self::Em1000,
            TYPE_EM100 => Self::Em100,
            TYPE_1000GZ => Self::Gz1000,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Em1000 => "EM-1000",
            Self::Em100 => "EM-100",
            Self::Gz1000 => "1000GZ",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One decoded EM frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmReading {
    pub meter: MeterType,
    pub address: String,
    pub counter: u8,
    pub cumulated: u16,
    pub current: u16,
    pub maximum: u16,
}

impl EmReading {
    /// Parse an EM payload
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = Payload::new(Protocol::Em, payload, MIN_PAYLOAD)?;

        Ok(Self {
            meter: MeterType::from_code(payload.raw(0, 2)),
            address: payload.raw(2, 4).to_string(),
            counter: payload.byte(4)?,
            cumulated: payload.swapped_u16(6)?,
            current: payload.swapped_u16(10)?,
            maximum: payload.swapped_u16(14)?,
        })
    }

    /// Device identity on the bus, e.g. `"em EM-1000 09"`
    pub fn device(&self) -> String {
        format!("em {} {}", self.meter, self.address)
    }

    fn key(&self) -> MeterKey {
        MeterKey {
            meter: self.meter.clone(),
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeterKey {
    meter: MeterType,
    address: String,
}

/// EM decoder
///
/// Remembers the last maximum of each meter so an unchanged maximum is not
/// re-published on every frame. Entries live as long as the decoder.
#[derive(Debug, Default)]
pub struct EmDecoder {
    maximums: HashMap<MeterKey, u16>,
}

impl EmDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one EM payload
    pub fn decode_payload(&mut self, payload: &str) -> Result<Vec<NormalizedEvent>> {
        let reading = EmReading::parse(payload)?;
        let device = reading.device();

        debug!(
            device = %device,
            counter = reading.counter,
            cumulated = reading.cumulated,
            current = reading.current,
            maximum = reading.maximum,
            "EM reading"
        );

        let mut events = vec![
            NormalizedEvent::new(device.clone(), EventKind::Cumulated, reading.cumulated),
            NormalizedEvent::new(device.clone(), EventKind::Current, reading.current),
        ];

        let previous = self.maximums.insert(reading.key(), reading.maximum);
        if previous != Some(reading.maximum) {
            events.push(NormalizedEvent::new(device, EventKind::Maximum, reading.maximum));
        }

        Ok(events)
    }
}

impl Decoder for EmDecoder {
    fn protocol(&self) -> Protocol {
        Protocol::Em
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

    fn kinds(events: &[NormalizedEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_parse_reading() {
        let reading = EmReading::parse("03090118001B001C00").unwrap();

        assert_eq!(reading.meter, MeterType::Gz1000);
        assert_eq!(reading.address, "09");
        assert_eq!(reading.counter, 1);
        assert_eq!(reading.cumulated, 0x18);
        assert_eq!(reading.current, 0x1b);
        assert_eq!(reading.maximum, 0x1c);
        assert_eq!(reading.device(), "em 1000GZ 09");
    }

    #[test]
    fn test_swapped_byte_order() {
        let reading = EmReading::parse("0105003412785600FF").unwrap();
        assert_eq!(reading.cumulated, 0x1234);
        assert_eq!(reading.current, 0x5678);
        assert_eq!(reading.maximum, 0xFF00);
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let reading = EmReading::parse("07050000000000000000").unwrap();
        assert_eq!(reading.meter, MeterType::Other("07".into()));
        assert_eq!(reading.device(), "em 07 05");
    }

    #[test]
    fn test_maximum_only_on_change() {
        let mut decoder = EmDecoder::new();

        let events = decoder.decode_payload("01050118001800180034").unwrap();
        assert_eq!(
            kinds(&events),
            vec![EventKind::Cumulated, EventKind::Current, EventKind::Maximum]
        );
        assert_eq!(events[0].device, "em EM-1000 05");
        assert_eq!(events[2].current, EventValue::Integer(0x18));

        let events = decoder.decode_payload("01050220001900180034").unwrap();
        assert_eq!(kinds(&events), vec![EventKind::Cumulated, EventKind::Current]);
        assert_eq!(events[0].current, EventValue::Integer(0x20));

        let events = decoder.decode_payload("01050320001900200034").unwrap();
        assert_eq!(
            kinds(&events),
            vec![EventKind::Cumulated, EventKind::Current, EventKind::Maximum]
        );
    }

    #[test]
    fn test_maximum_tracked_per_meter() {
        let mut decoder = EmDecoder::new();
        decoder.decode_payload("010501180018001800").unwrap();

        // Same address, different meter type
        let events = decoder.decode_payload("020501180018001800").unwrap();
        assert_eq!(events.len(), 3);

        // Same type, different address
        let events = decoder.decode_payload("010601180018001800").unwrap();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_short_payload() {
        let mut decoder = EmDecoder::new();
        let result = decoder.decode_payload("0105011800180018");
        assert!(matches!(result, Err(Error::FrameTooShort { expected: 18, .. })));
    }

    #[test]
    fn test_non_hex_counter_field() {
        let result = EmReading::parse("01050118G01800180034");
        assert!(matches!(result, Err(Error::InvalidHex { offset: 6, .. })));
    }
}
