//! Normalized events published to the bus

use std::fmt;

/// Kind of reading carried by a [`NormalizedEvent`]
///
/// The wire name (see [`EventKind::as_str`]) is what bus consumers match on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    // EM energy meters
    Cumulated,
    Current,
    Maximum,

    // FHT thermostats
    Valve,
    Mode,
    DesiredTemp,
    Temp,
    Battery,
    TemperatureLow,
    WindowSensorError,
    WindowOpen,
    ManualTemp,
    ComfortTemp,
    EconomicTemp,
    WindowOpenTemp,
    Program,

    // FS20 switches and dimmers
    State,
    Dim,
}

impl EventKind {
    /// Name used on the bus
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cumulated => "cumulated",
            Self::Current => "current",
            Self::Maximum => "maximum",
            Self::Valve => "valve",
            Self::Mode => "mode",
            Self::DesiredTemp => "desiredTemp",
            Self::Temp => "temp",
            Self::Battery => "battery",
            Self::TemperatureLow => "temperatureLow",
            Self::WindowSensorError => "windowSensorError",
            Self::WindowOpen => "windowOpen",
            Self::ManualTemp => "manualTemp",
            Self::ComfortTemp => "comfortTemp",
            Self::EconomicTemp => "economicTemp",
            Self::WindowOpenTemp => "windowOpenTemp",
            Self::Program => "program",
            Self::State => "state",
            Self::Dim => "dim",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit attached to a numeric reading
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Units {
    Percent,
    Celsius,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Celsius => "c",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a reading
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl EventValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EventValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u16> for EventValue {
    fn from(v: u16) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u8> for EventValue {
    fn from(v: u8) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for EventValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for EventValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EventValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Decoded reading, the only thing handed to the bus publisher
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    /// Device identity, e.g. `"fht 0903"` or `"em EM-1000 05"`
    pub device: String,

    /// Reading kind (`type` on the bus)
    pub kind: EventKind,

    /// Reading value
    pub current: EventValue,

    /// Optional unit
    pub units: Option<Units>,
}

impl NormalizedEvent {
    pub fn new(device: impl Into<String>, kind: EventKind, current: impl Into<EventValue>) -> Self {
        Self {
            device: device.into(),
            kind,
            current: current.into(),
            units: None,
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.device, self.kind, self.current)?;
        if let Some(units) = self.units {
            write!(f, "{}", units)?;
        }
        Ok(())
    }
}
