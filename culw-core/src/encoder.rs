//! FHT command encoding
//!
//! Outbound commands are plain text lines:
//!
//! ```text
//! T 0101 45 77 36 \n     set manual temperature to 18.0 degrees
//! │ │    │  │  └─ doubled temperature
//! │ │    │  └──── origin code
//! │ │    └─────── function code
//! │ └──────────── house code
//! └────────────── FHT selector
//!
//! T 0101 3E 77 01        set mode to manual (no terminator)
//! ```

use culw_types::NormalizedCommand;
use tracing::trace;

use crate::constants::fht::{MAX_TEMPERATURE, MIN_TEMPERATURE};
use crate::constants::selectors;
use crate::error::{Error, Result};
use crate::fht::FhtField;

/// Encode a bus command for an FHT thermostat
///
/// # Errors
///
/// Returns a rejection (see [`Error::is_rejection`]) when the command is
/// unknown, the temperature is missing, not a number or outside
/// 5.5..=30.5 degrees, or the mode is not one of auto/manual/holiday.
///
/// # Examples
///
/// ```
/// use culw_core::encode_fht_command;
/// use culw_types::NormalizedCommand;
///
/// let command = NormalizedCommand::new("fht 0101", "manualTemp").with_current("18");
/// let line = encode_fht_command(&command, "77").unwrap();
/// assert_eq!(line, "T0101457736\n");
/// ```
pub fn encode_fht_command(command: &NormalizedCommand, origin_code: &str) -> Result<String> {
    let house_code = house_code_of(&command.device);

    if let Some(field) = FhtField::settable_temperature(&command.command) {
        let doubled = doubled_temperature(command)?;

        let line = format!(
            "{}{}{:02x}{}{:02}\n",
            selectors::FHT,
            house_code,
            field.code(),
            origin_code,
            doubled
        )
        .to_uppercase();

        trace!(command = %command.command, line = %line.trim_end(), "Encoded FHT temperature");
        return Ok(line);
    }

    if command.command == "mode" {
        let current = command
            .current
            .as_deref()
            .ok_or_else(|| Error::MissingCurrent(command.command.clone()))?;
        let mode = mode_digit(current)?;

        let line = format!(
            "{}{}{:02x}{}0{}",
            selectors::FHT,
            house_code,
            FhtField::Mode.code(),
            origin_code,
            mode
        )
        .to_uppercase();

        trace!(line = %line, "Encoded FHT mode");
        return Ok(line);
    }

    Err(Error::UnsupportedCommand {
        device: command.device.clone(),
        command: command.command.clone(),
    })
}

/// House code from a device name like `"fht 101"`, padded to four characters
fn house_code_of(device: &str) -> String {
    let code = device.split_once(' ').map_or(device, |(_, rest)| rest);
    let padded = format!("{:0>4}", code);
    let skip = padded.chars().count().saturating_sub(4);
    padded.chars().skip(skip).collect()
}

fn doubled_temperature(command: &NormalizedCommand) -> Result<u32> {
    let current = command
        .current
        .as_deref()
        .ok_or_else(|| Error::MissingCurrent(command.command.clone()))?;

    let value: f64 = current
        .trim()
        .parse()
        .map_err(|_| Error::InvalidTemperature(current.to_string()))?;

    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) {
        return Err(Error::TemperatureOutOfRange { value });
    }

    Ok((value * 2.0).floor() as u32)
}

fn mode_digit(current: &str) -> Result<u8> {
    match current {
        "0" | "00" | "auto" => Ok(0),
        "1" | "01" | "manual" => Ok(1),
        "2" | "02" | "holiday" => Ok(2),
        other => Err(Error::InvalidMode(other.to_string())),
    }
}
