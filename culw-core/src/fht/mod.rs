//! FHT thermostat decoding
//!
//! Frame format `hhhhccss[vv]`: house code, function code, status and an
//! optional value byte. Per thermostat state (split temperature readings,
//! warning flags, weekly program fragments) lives in the decoder for the
//! lifetime of the process.

pub mod field;
pub mod house_code;
pub mod schedule;

use std::collections::HashMap;
use std::time::Instant;

use bitflags::bitflags;
use culw_types::{EventKind, NormalizedEvent, Units};
use tracing::debug;

use crate::config::Config;
use crate::constants::fht::{
    actuator, MIN_PAYLOAD, STATUS_LIME_PROTECTION, STATUS_SUMMER_SYNC, VALUE_OFFSET, WARNING_MASK,
};
use crate::error::{Error, Result};
use crate::frame::Payload;
use crate::router::{Decoder, Protocol};

pub use field::FhtField;
pub use house_code::HouseCode;
pub use schedule::{ScheduleReconstructor, WeeklySchedule};

bitflags! {
    /// Warning flags of function 0x44
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Warnings: u8 {
        const BATTERY_LOW = 0x01;
        const TEMPERATURE_LOW = 0x02;
        const WINDOW_SENSOR_ERROR = 0x10;
        const WINDOW_OPEN = 0x20;
    }
}

/// One parsed FHT frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FhtFrame {
    pub house_code: HouseCode,
    pub code: u8,
    pub status: u8,
    pub value: Option<u8>,
}

impl FhtFrame {
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = Payload::new(Protocol::Fht, payload, MIN_PAYLOAD)?;

        let high = payload.byte(0)?;
        let low = payload.byte(2)?;

        Ok(Self {
            house_code: HouseCode::from_wire(high, low, payload.raw(0, 4)),
            code: payload.byte(4)?,
            status: payload.byte(6)?,
            value: payload.optional_byte(VALUE_OFFSET)?,
        })
    }

    fn value(&self) -> Result<u8> {
        self.value.ok_or(Error::MissingValue { code: self.code })
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    /// Low byte of the measured temperature, waiting for the high byte
    pending_low_byte: Option<u8>,

    /// Last reported warning flags
    warnings: Option<Warnings>,
}

/// FHT decoder
#[derive(Debug)]
pub struct FhtDecoder {
    devices: HashMap<HouseCode, DeviceState>,
    schedules: ScheduleReconstructor,
    report_unchanged_warnings: bool,
}

impl FhtDecoder {
    pub fn new(config: &Config) -> Self {
        Self {
            devices: HashMap::new(),
            schedules: ScheduleReconstructor::new(config.schedule_quiet_period),
            report_unchanged_warnings: config.report_unchanged_warnings,
        }
    }

    /// Decode one FHT payload received at `now`
    pub fn decode_payload(&mut self, payload: &str, now: Instant) -> Result<Vec<NormalizedEvent>> {
        let frame = FhtFrame::parse(payload)?;

        let Some(field) = FhtField::from_code(frame.code) else {
            debug!(
                house_code = %frame.house_code,
                code = %format!("0x{:02x}", frame.code),
                value = ?frame.value,
                payload,
                "FHT: unsupported function"
            );
            return Ok(Vec::new());
        };

        let house_code = &frame.house_code;
        let device = house_code.device();

        match field {
            FhtField::Actuator => self.actuator(&frame),

            FhtField::SyncRequest => {
                debug!(house_code = %house_code, "FHT: thermostat requests sync");
                Ok(Vec::new())
            }

            FhtField::Program { day, period } => {
                let value = frame.value()?;
                if self.schedules.apply_fragment(house_code, day, period, value) {
                    self.schedules.arm(house_code, now);
                }
                Ok(Vec::new())
            }

            FhtField::Mode => {
                let mode = if frame.value()? == 1 { "manual" } else { "auto" };
                debug!(house_code = %house_code, mode, "FHT: mode");
                Ok(vec![NormalizedEvent::new(device, EventKind::Mode, mode)])
            }

            FhtField::MeasuredLow => {
                let value = frame.value()?;
                self.device_mut(house_code).pending_low_byte = Some(value);
                Ok(Vec::new())
            }

            FhtField::MeasuredHigh => {
                let value = frame.value()?;
                let Some(low) = self.device_mut(house_code).pending_low_byte.take() else {
                    debug!(house_code = %house_code, "FHT: measured-high without measured-low, dropped");
                    return Ok(Vec::new());
                };

                let temp = f64::from(u16::from(value) * 256 + u16::from(low)) / 10.0;
                debug!(house_code = %house_code, temp, "FHT: measured temperature");
                Ok(vec![
                    NormalizedEvent::new(device, EventKind::Temp, temp).with_units(Units::Celsius),
                ])
            }

            FhtField::Warnings => {
                let value = frame.value()?;
                Ok(self.warnings(house_code, value))
            }

            FhtField::DesiredTemp => temperature_setting(&frame, field, EventKind::DesiredTemp),
            FhtField::ManualTemp => temperature_setting(&frame, field, EventKind::ManualTemp),
            FhtField::ComfortTemp => temperature_setting(&frame, field, EventKind::ComfortTemp),
            FhtField::EconomicTemp => temperature_setting(&frame, field, EventKind::EconomicTemp),
            FhtField::WindowOpenTemp => {
                temperature_setting(&frame, field, EventKind::WindowOpenTemp)
            }
        }
    }

    fn actuator(&self, frame: &FhtFrame) -> Result<Vec<NormalizedEvent>> {
        let house_code = &frame.house_code;
        let percent = frame
            .value
            .map(|v| (f64::from(v) / 255.0 * 100.0 + 0.5).floor() as u8);

        if STATUS_LIME_PROTECTION.contains(&frame.status) {
            debug!(house_code = %house_code, value = ?percent, "FHT: lime protection");
            return Ok(Vec::new());
        }

        if STATUS_SUMMER_SYNC.contains(&frame.status) {
            debug!(house_code = %house_code, "FHT: sync in the summer");
            return Ok(Vec::new());
        }

        let valve = match frame.status & 0x0f {
            actuator::SYNC_NOW => {
                debug!(house_code = %house_code, value = ?percent, "FHT: sync now");
                return Ok(Vec::new());
            }
            actuator::VALVE_OPEN => 100,
            actuator::VALVE_CLOSED => 0,
            actuator::VALVE_POSITION => {
                let percent = percent.ok_or(Error::MissingValue { code: frame.code })?;
                percent.min(100)
            }
            actuator::OFFSET => {
                let value = i16::from(percent.ok_or(Error::MissingValue { code: frame.code })?);
                let offset = if value > 128 { 128 - value } else { value };
                debug!(house_code = %house_code, offset, "FHT: actuator offset");
                return Ok(Vec::new());
            }
            other => {
                debug!(
                    house_code = %house_code,
                    status = %format!("0x{:02x}", frame.status),
                    nibble = other,
                    "FHT: unsupported actuator status"
                );
                return Ok(Vec::new());
            }
        };

        debug!(house_code = %house_code, valve, "FHT: valve position");
        Ok(vec![
            NormalizedEvent::new(house_code.device(), EventKind::Valve, valve)
                .with_units(Units::Percent),
        ])
    }

    fn warnings(&mut self, house_code: &HouseCode, value: u8) -> Vec<NormalizedEvent> {
        let current = Warnings::from_bits_truncate(value & WARNING_MASK);
        let report_all = self.report_unchanged_warnings;
        let state = self.device_mut(house_code);

        let changed = match state.warnings {
            Some(previous) if !report_all => previous ^ current,
            _ => Warnings::all(),
        };

        debug!(
            house_code = %house_code,
            warnings = %format!("0x{:02x}", current.bits()),
            previous = ?state.warnings.map(|w| w.bits()),
            changed = %format!("0x{:02x}", changed.bits()),
            "FHT: warnings"
        );

        state.warnings = Some(current);

        let device = house_code.device();
        let on_off = |flag| if current.contains(flag) { "on" } else { "off" };
        let mut events = Vec::new();

        if changed.contains(Warnings::BATTERY_LOW) {
            let battery: u8 = if current.contains(Warnings::BATTERY_LOW) { 0 } else { 100 };
            events.push(
                NormalizedEvent::new(device.clone(), EventKind::Battery, battery)
                    .with_units(Units::Percent),
            );
        }
        if changed.contains(Warnings::TEMPERATURE_LOW) {
            events.push(NormalizedEvent::new(
                device.clone(),
                EventKind::TemperatureLow,
                on_off(Warnings::TEMPERATURE_LOW),
            ));
        }
        if changed.contains(Warnings::WINDOW_SENSOR_ERROR) {
            events.push(NormalizedEvent::new(
                device.clone(),
                EventKind::WindowSensorError,
                on_off(Warnings::WINDOW_SENSOR_ERROR),
            ));
        }
        if changed.contains(Warnings::WINDOW_OPEN) {
            events.push(NormalizedEvent::new(
                device,
                EventKind::WindowOpen,
                on_off(Warnings::WINDOW_OPEN),
            ));
        }

        events
    }

    fn device_mut(&mut self, house_code: &HouseCode) -> &mut DeviceState {
        self.devices.entry(house_code.clone()).or_default()
    }

    /// Earliest pending program commit
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedules.next_deadline()
    }

    /// Emit the programs whose quiet period ended at or before `now`
    pub fn poll_schedules(&mut self, now: Instant) -> Vec<NormalizedEvent> {
        self.schedules
            .poll(now)
            .into_iter()
            .map(|(code, program)| program_event(&code, program))
            .collect()
    }

    /// Emit the program of `house_code` immediately
    pub fn commit_schedule(&mut self, house_code: &HouseCode) -> Option<NormalizedEvent> {
        self.schedules
            .commit(house_code)
            .map(|program| program_event(house_code, program))
    }

    /// Program accumulation state
    pub fn schedules(&self) -> &ScheduleReconstructor {
        &self.schedules
    }
}

impl Decoder for FhtDecoder {
    fn protocol(&self) -> Protocol {
        Protocol::Fht
    }

    fn decode(&mut self, payload: &str, now: Instant) -> Result<Vec<NormalizedEvent>> {
        self.decode_payload(payload, now)
    }
}

/// Temperature settings are reported as `val / 2` degrees
fn temperature_setting(frame: &FhtFrame, field: FhtField, kind: EventKind) -> Result<Vec<NormalizedEvent>> {
    let temp = f64::from(frame.value()?) / 2.0;
    debug!(house_code = %frame.house_code, field = %field, temp, "FHT: temperature setting");
    Ok(vec![
        NormalizedEvent::new(frame.house_code.device(), kind, temp).with_units(Units::Celsius),
    ])
}

fn program_event(house_code: &HouseCode, program: String) -> NormalizedEvent {
    NormalizedEvent::new(house_code.device(), EventKind::Program, program)
}
