//! Type definitions for culw
//!
//! The normalized model shared with the pub/sub bus: decoded events going
//! out, control commands coming in.

pub mod command;
pub mod error;
pub mod event;

pub use command::{BusMessage, NormalizedCommand, CONTROL_BASIC};
pub use error::{Error, Result};
pub use event::{EventKind, EventValue, NormalizedEvent, Units};
