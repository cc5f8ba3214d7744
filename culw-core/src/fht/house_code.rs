//! FHT house codes

use std::fmt;

/// Address of one FHT thermostat
///
/// Thermostats are configured with two bytes of "decimal looking" values
/// (00..99 each). Such codes render as four decimal digits, e.g. `"0903"`.
/// A byte outside that range can only come from a raw address, which is
/// rendered as `"x"` followed by the four hex characters as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HouseCode(String);

impl HouseCode {
    /// Build from the two address bytes and their raw hex characters
    pub fn from_wire(high: u8, low: u8, raw: &str) -> Self {
        if high < 100 && low < 100 {
            Self(format!("{:02}{:02}", high, low))
        } else {
            Self(format!("x{}", raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Device identity on the bus, e.g. `"fht 0903"`
    pub fn device(&self) -> String {
        format!("fht {}", self.0)
    }
}

impl fmt::Display for HouseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HouseCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
