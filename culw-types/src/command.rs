//! Control commands received from the bus

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Body kind of the bus messages the gateway acts on
pub const CONTROL_BASIC: &str = "control.basic";

/// Raw message delivered by the bus subscriber
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusMessage {
    /// Body kind tag, e.g. `"control.basic"`
    pub body_name: String,

    /// Body fields
    pub body: BTreeMap<String, String>,
}

impl BusMessage {
    pub fn new(body_name: impl Into<String>) -> Self {
        Self {
            body_name: body_name.into(),
            body: BTreeMap::new(),
        }
    }

    /// Add a body field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    /// Extract the control command carried by this message
    ///
    /// Only `control.basic` bodies with non-empty `command` and `device`
    /// fields are accepted.
    pub fn command(&self) -> Result<NormalizedCommand> {
        if self.body_name != CONTROL_BASIC {
            return Err(Error::UnsupportedBody(self.body_name.clone()));
        }

        let command = self.field("command").ok_or(Error::MissingField("command"))?;
        let device = self.field("device").ok_or(Error::MissingField("device"))?;

        Ok(NormalizedCommand {
            device: device.to_string(),
            command: command.to_string(),
            current: self.field("current").map(str::to_string),
        })
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.body
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Normalized control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    /// Target device, e.g. `"fht 0101"`
    pub device: String,

    /// Command name, e.g. `"manualTemp"` or `"mode"`
    pub command: String,

    /// Requested value
    pub current: Option<String>,
}

impl NormalizedCommand {
    pub fn new(device: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            command: command.into(),
            current: None,
        }
    }

    pub fn with_current(mut self, current: impl Into<String>) -> Self {
        self.current = Some(current.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_from_message() {
        let message = BusMessage::new(CONTROL_BASIC)
            .with_field("device", "fht 0101")
            .with_field("command", "manualTemp")
            .with_field("current", "18");

        let command = message.command().unwrap();
        assert_eq!(
            command,
            NormalizedCommand::new("fht 0101", "manualTemp").with_current("18")
        );
    }

    #[test]
    fn test_other_body_kinds_rejected() {
        let message = BusMessage::new("sensor.basic").with_field("device", "fht 0101");
        assert_eq!(
            message.command(),
            Err(Error::UnsupportedBody("sensor.basic".into()))
        );
    }

    #[test]
    fn test_required_fields() {
        let message = BusMessage::new(CONTROL_BASIC).with_field("device", "fht 0101");
        assert_eq!(message.command(), Err(Error::MissingField("command")));

        let message = BusMessage::new(CONTROL_BASIC)
            .with_field("command", "mode")
            .with_field("device", "");
        assert_eq!(message.command(), Err(Error::MissingField("device")));
    }
}
