//! Weekly program reconstruction
//!
//! A thermostat transmits its weekly heating program as up to 28 separate
//! fragment frames (start/end of two periods for each day). Fragments are
//! accumulated per house code and rendered into one program string once no
//! new fragment has changed anything for the quiet period, e.g.
//!
//! ```text
//! mon=06:00-08:30,17:00-22:00 sat=08:00-23:00
//! ```

use std::collections::HashMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::constants::fht::PROGRAM_DELETE;

use super::house_code::HouseCode;

/// Day names, indexed from Sunday
pub const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Fragments of one thermostat's weekly program
///
/// Each day holds up to four minute offsets: start and end of the first
/// period, then start and end of the second. Slots may be unknown when
/// fragments arrive out of order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Vec<Option<u16>>; 7],
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fragment, returning whether anything changed
    ///
    /// `parameter` is the raw fragment value in units of 10 minutes. Values
    /// from 0x90 on delete: periods 0 and 1 clear the whole day, periods 2
    /// and 3 drop the second heating period.
    pub fn apply_fragment(&mut self, day: usize, period: usize, parameter: u8) -> bool {
        let slots = &mut self.days[day];

        if parameter >= PROGRAM_DELETE {
            if period < 2 {
                if slots.is_empty() {
                    return false;
                }
                slots.clear();
                return true;
            }

            if slots.len() < 3 {
                return false;
            }
            slots.truncate(2);
            return true;
        }

        let minutes = u16::from(parameter) * 10;

        if slots.get(period).copied().flatten() == Some(minutes) {
            return false;
        }

        if slots.len() <= period {
            slots.resize(period + 1, None);
        }
        slots[period] = Some(minutes);

        trace!(day = DAY_NAMES[day], period, minutes, "Program fragment stored");
        true
    }

    /// Minute offsets recorded for `day`
    pub fn day(&self, day: usize) -> &[Option<u16>] {
        &self.days[day]
    }

    /// Render complete days as `"<day>=HH:MM-HH:MM[,HH:MM-HH:MM]"`
    ///
    /// Days with no fragments or with a half-known period are left out.
    pub fn render(&self) -> String {
        let mut program = String::new();

        for (name, slots) in DAY_NAMES.iter().zip(&self.days) {
            let Some(periods) = complete_periods(slots) else {
                continue;
            };

            if !program.is_empty() {
                program.push(' ');
            }
            program.push_str(name);
            program.push('=');

            for (i, (start, end)) in periods.iter().enumerate() {
                if i > 0 {
                    program.push(',');
                }
                let _ = write!(program, "{}-{}", clock(*start), clock(*end));
            }
        }

        program
    }
}

/// Start/end pairs of a day, `None` unless every present pair is complete
fn complete_periods(slots: &[Option<u16>]) -> Option<Vec<(u16, u16)>> {
    if slots.is_empty() {
        return None;
    }

    slots
        .chunks(2)
        .map(|pair| match pair {
            [Some(start), Some(end)] => Some((*start, *end)),
            _ => None,
        })
        .collect()
}

fn clock(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Per house code program accumulation with debounce deadlines
///
/// At most one deadline exists per house code; re-arming replaces it.
#[derive(Debug)]
pub struct ScheduleReconstructor {
    schedules: HashMap<HouseCode, WeeklySchedule>,
    deadlines: HashMap<HouseCode, Instant>,
    quiet_period: Duration,
}

impl ScheduleReconstructor {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            schedules: HashMap::new(),
            deadlines: HashMap::new(),
            quiet_period,
        }
    }

    /// Apply a fragment for `house_code`, returning whether it changed state
    pub fn apply_fragment(
        &mut self,
        house_code: &HouseCode,
        day: usize,
        period: usize,
        parameter: u8,
    ) -> bool {
        self.schedules
            .entry(house_code.clone())
            .or_default()
            .apply_fragment(day, period, parameter)
    }

    /// (Re)start the quiet period of `house_code` at `now`
    pub fn arm(&mut self, house_code: &HouseCode, now: Instant) {
        let deadline = now + self.quiet_period;
        if self.deadlines.insert(house_code.clone(), deadline).is_some() {
            trace!(house_code = %house_code, "Program commit re-armed");
        }
    }

    /// Render and discard the accumulated program of `house_code`
    ///
    /// Returns `None` when nothing was accumulated.
    pub fn commit(&mut self, house_code: &HouseCode) -> Option<String> {
        self.deadlines.remove(house_code);

        let Some(schedule) = self.schedules.remove(house_code) else {
            debug!(house_code = %house_code, "FHT: no program to update");
            return None;
        };

        let program = schedule.render();
        debug!(house_code = %house_code, program = %program, "FHT: program updated");
        Some(program)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Commit every program whose deadline is at or before `now`
    pub fn poll(&mut self, now: Instant) -> Vec<(HouseCode, String)> {
        let mut due: Vec<(Instant, HouseCode)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(code, deadline)| (*deadline, code.clone()))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, code)| {
                let program = self.commit(&code)?;
                Some((code, program))
            })
            .collect()
    }

    /// Number of house codes waiting for their quiet period to end
    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    /// Accumulated fragments of `house_code`
    pub fn schedule(&self, house_code: &HouseCode) -> Option<&WeeklySchedule> {
        self.schedules.get(house_code)
    }
}
