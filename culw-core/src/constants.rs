//! Protocol constants

/// Default wait before the version request is re-sent (milliseconds)
pub const DEFAULT_HANDSHAKE_RETRY_MS: u64 = 5000;

/// Default quiet period before a weekly program is committed (seconds)
pub const DEFAULT_SCHEDULE_QUIET_SECS: u64 = 20;

/// Default read poll interval of the gateway (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Origin code embedded in outbound FHT commands
pub const DEFAULT_ORIGIN_CODE: &str = "77";

/// Leading command characters of transceiver lines
pub mod selectors {
    /// Firmware version reply
    pub const VERSION: char = 'V';

    /// EM energy meter frame
    pub const EM: char = 'E';

    /// FHT thermostat frame
    pub const FHT: char = 'T';

    /// FS20 switch/dimmer frame
    pub const FS20: char = 'F';
}

/// EM frame layout
pub mod em {
    /// `ttaacc111122223333`
    pub const MIN_PAYLOAD: usize = 18;

    pub const TYPE_EM1000: &str = "01";
    pub const TYPE_EM100: &str = "02";
    pub const TYPE_1000GZ: &str = "03";
}

/// FHT frame layout and status values
pub mod fht {
    /// `hhhhccss`, value byte optional
    pub const MIN_PAYLOAD: usize = 8;

    /// Offset of the value byte
    pub const VALUE_OFFSET: usize = 8;

    /// Program fragments at or above this value delete periods
    pub const PROGRAM_DELETE: u8 = 0x90;

    /// Lime protection runs of the actuator
    pub const STATUS_LIME_PROTECTION: [u8; 4] = [0x2a, 0x3a, 0xaa, 0xba];

    /// Summer time synchronisation
    pub const STATUS_SUMMER_SYNC: [u8; 2] = [0xa0, 0xb0];

    /// Actuator status, low nibble
    pub mod actuator {
        pub const SYNC_NOW: u8 = 0x0;
        pub const VALVE_OPEN: u8 = 0x1;
        pub const VALVE_CLOSED: u8 = 0x2;
        pub const VALVE_POSITION: u8 = 0x6;
        pub const OFFSET: u8 = 0x8;
    }

    /// Warning bits reported by function 0x44
    pub const WARNING_MASK: u8 = 0x33;

    /// Accepted temperature range for outbound commands (degrees Celsius)
    pub const MIN_TEMPERATURE: f64 = 5.5;
    pub const MAX_TEMPERATURE: f64 = 30.5;
}

/// FS20 frame layout and command ranges
pub mod fs20 {
    /// `hhhhaacc`, extension optional
    pub const MIN_PAYLOAD: usize = 8;

    /// Highest dim step; commands up to here carry a dim level
    pub const DIM_MAX: u8 = 0x10;

    /// Highest command treated as "on"
    pub const ON_MAX: u8 = 0x3a;
}
