use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

//
// Errors
//

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Hid(hidapi::HidError),
    Osc(rosc::OscError),
    Serialize(serde_json::Error),
    Config(String),
    Connect(ConnectError),
    Protocol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// No Wii Remote is paired or in discoverable mode.
    NotFound,
    /// A Wii Remote was found but its HID handle could not be opened.
    OpenFailed(String),
    /// The bounded retry budget ran out.
    GaveUp { attempts: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IO(e) => write!(f, "I/O error: {}", e),
            Error::Hid(e) => write!(f, "HID error: {}", e),
            Error::Osc(e) => write!(f, "OSC encoding error: {:?}", e),
            Error::Serialize(e) => write!(f, "Serialization error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Connect(e) => write!(f, "Connection error: {}", e),
            Error::Protocol(msg) => write!(f, "Wiimote protocol error: {}", msg),
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::NotFound => write!(f, "no Wii Remote found"),
            ConnectError::OpenFailed(reason) => write!(f, "could not open Wii Remote: {}", reason),
            ConnectError::GaveUp { attempts } => {
                write!(f, "gave up after {} connection attempts", attempts)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(e) => Some(e),
            Error::Hid(e) => Some(e),
            Error::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::IO(value)
    }
}

impl From<hidapi::HidError> for Error {
    fn from(value: hidapi::HidError) -> Self {
        Error::Hid(value)
    }
}

impl From<rosc::OscError> for Error {
    fn from(value: rosc::OscError) -> Self {
        Error::Osc(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialize(value)
    }
}

impl From<ConnectError> for Error {
    fn from(value: ConnectError) -> Self {
        Error::Connect(value)
    }
}

//
// Report modes & flags
//

/// Set of sensor streams the controller should include in each state update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ReportMode(u8);

impl ReportMode {
    pub const STATUS: ReportMode = ReportMode(0x01);
    pub const BUTTONS: ReportMode = ReportMode(0x02);
    pub const ACCEL: ReportMode = ReportMode(0x04);
    pub const IR: ReportMode = ReportMode(0x08);
    pub const NUNCHUK: ReportMode = ReportMode(0x10);
    pub const CLASSIC: ReportMode = ReportMode(0x20);
    pub const BALANCE: ReportMode = ReportMode(0x40);
    pub const MOTIONPLUS: ReportMode = ReportMode(0x80);
    /// Any extension controller.
    pub const EXT: ReportMode = ReportMode(0x10 | 0x20 | 0x40 | 0x80);

    pub const fn empty() -> Self {
        ReportMode(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: ReportMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: ReportMode) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ReportMode {
    type Output = ReportMode;

    fn bitor(self, rhs: ReportMode) -> ReportMode {
        ReportMode(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReportMode {
    fn bitor_assign(&mut self, rhs: ReportMode) {
        self.0 |= rhs.0;
    }
}

/// Optional controller features that need an explicit enable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerFlag {
    MotionPlus,
}

//
// LEDs & buttons
//

pub const LED_1: u8 = 0x01;
pub const LED_2: u8 = 0x02;
pub const LED_3: u8 = 0x04;
pub const LED_4: u8 = 0x08;

pub const BUTTON_2: u16 = 0x0001;
pub const BUTTON_1: u16 = 0x0002;
pub const BUTTON_B: u16 = 0x0004;
pub const BUTTON_A: u16 = 0x0008;
pub const BUTTON_MINUS: u16 = 0x0010;
pub const BUTTON_HOME: u16 = 0x0080;
pub const BUTTON_LEFT: u16 = 0x0100;
pub const BUTTON_RIGHT: u16 = 0x0200;
pub const BUTTON_DOWN: u16 = 0x0400;
pub const BUTTON_UP: u16 = 0x0800;
pub const BUTTON_PLUS: u16 = 0x1000;
pub const BUTTON_MASK: u16 = 0x1F9F;

//
// Sensor state
//

/// MotionPlus gyroscope readings. Axis order is phi, theta, psi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MotionPlusState {
    /// 14-bit angular rate per axis, centred around 8192.
    pub angle_rate: [u16; 3],
    /// 1 when the axis is reporting in low-speed (fine) mode.
    pub low_speed: [u8; 3],
}

/// The controller's most recently reported sensor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub rpt_mode: ReportMode,
    pub led: u8,
    /// Only present when the report mode includes buttons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<u16>,
    pub acc: [u16; 3],
    /// Absent until the controller has delivered a MotionPlus frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motionplus: Option<MotionPlusState>,
}
