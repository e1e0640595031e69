//
// Wii Remote HID reports
//
// Output reports are built as plain byte arrays (report id first) and input
// reports are decoded from the raw buffers returned by hidapi.
//

use crate::models::{Error, MotionPlusState, ReportMode, BUTTON_MASK};

pub const VENDOR_ID: u16 = 0x057e;
/// RVL-CNT-01 and RVL-CNT-01-TR (built-in MotionPlus).
pub const PRODUCT_IDS: [u16; 2] = [0x0306, 0x0330];

pub const OUT_LEDS: u8 = 0x11;
pub const OUT_REPORTING_MODE: u8 = 0x12;
pub const OUT_STATUS_REQUEST: u8 = 0x15;
pub const OUT_WRITE_MEMORY: u8 = 0x16;

pub const IN_STATUS: u8 = 0x20;
pub const IN_READ_DATA: u8 = 0x21;
pub const IN_ACK: u8 = 0x22;

pub const REPORTING_BUTTONS: u8 = 0x30;
pub const REPORTING_BUTTONS_ACCEL: u8 = 0x31;
pub const REPORTING_BUTTONS_ACCEL_EXT16: u8 = 0x35;

pub const MOTIONPLUS_INIT_REGISTER: u32 = 0xA6_00F0;
pub const MOTIONPLUS_ACTIVATE_REGISTER: u32 = 0xA6_00FE;
pub const MOTIONPLUS_INIT_VALUE: u8 = 0x55;
/// Standalone mode, no extension passthrough.
pub const MOTIONPLUS_ACTIVATE_VALUE: u8 = 0x04;

const ADDRESS_SPACE_REGISTERS: u8 = 0x04;
const CONTINUOUS_REPORTING: u8 = 0x04;
const STATUS_FLAG_EXTENSION: u8 = 0x02;

pub const MAX_WRITE_LEN: usize = 16;
pub const MAX_REPORT_LEN: usize = 22;

//
// Output reports
//

pub fn set_leds_report(led: u8) -> [u8; 2] {
    [OUT_LEDS, (led & 0x0F) << 4]
}

/// Picks the smallest data reporting type that carries every requested stream.
pub fn reporting_type_for(mode: ReportMode) -> u8 {
    if mode.intersects(ReportMode::EXT) {
        REPORTING_BUTTONS_ACCEL_EXT16
    } else if mode.contains(ReportMode::ACCEL) {
        REPORTING_BUTTONS_ACCEL
    } else {
        REPORTING_BUTTONS
    }
}

pub fn set_reporting_report(mode: ReportMode) -> [u8; 3] {
    [OUT_REPORTING_MODE, CONTINUOUS_REPORTING, reporting_type_for(mode)]
}

pub fn status_request_report() -> [u8; 2] {
    [OUT_STATUS_REQUEST, 0x00]
}

pub fn write_register_report(address: u32, data: &[u8]) -> Result<[u8; MAX_REPORT_LEN], Error> {
    if data.is_empty() || data.len() > MAX_WRITE_LEN {
        return Err(Error::Protocol(format!(
            "register writes carry 1 to {} bytes, got {}",
            MAX_WRITE_LEN,
            data.len()
        )));
    }
    let mut report = [0u8; MAX_REPORT_LEN];
    report[0] = OUT_WRITE_MEMORY;
    report[1] = ADDRESS_SPACE_REGISTERS;
    report[2] = (address >> 16) as u8;
    report[3] = (address >> 8) as u8;
    report[4] = address as u8;
    report[5] = data.len() as u8;
    report[6..6 + data.len()].copy_from_slice(data);
    Ok(report)
}

//
// Input reports
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataReport {
    pub buttons: Option<u16>,
    pub acc: Option<[u16; 3]>,
    /// First six extension bytes, enough for a MotionPlus frame.
    pub extension: Option<[u8; 6]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReport {
    Status {
        buttons: u16,
        extension_connected: bool,
        battery: u8,
    },
    Ack {
        report: u8,
        error: u8,
    },
    Data(DataReport),
    Other(u8),
}

/// Byte offsets of (buttons, accelerometer, extension) within a data report.
fn data_layout(id: u8) -> Option<(Option<usize>, Option<usize>, Option<usize>)> {
    match id {
        0x30 => Some((Some(1), None, None)),
        0x31 => Some((Some(1), Some(3), None)),
        0x32 => Some((Some(1), None, Some(3))),
        0x33 => Some((Some(1), Some(3), None)),
        0x34 => Some((Some(1), None, Some(3))),
        0x35 => Some((Some(1), Some(3), Some(6))),
        0x36 => Some((Some(1), None, Some(13))),
        0x37 => Some((Some(1), Some(3), Some(16))),
        0x3d => Some((None, None, Some(1))),
        _ => None,
    }
}

fn require(buf: &[u8], len: usize) -> Result<(), Error> {
    if buf.len() < len {
        return Err(Error::Protocol(format!(
            "report {:#04x} truncated: {} bytes, need {}",
            buf[0],
            buf.len(),
            len
        )));
    }
    Ok(())
}

fn buttons_at(buf: &[u8], offset: usize) -> u16 {
    ((u16::from(buf[offset]) << 8) | u16::from(buf[offset + 1])) & BUTTON_MASK
}

pub fn decode_input_report(buf: &[u8]) -> Result<InputReport, Error> {
    let Some(&id) = buf.first() else {
        return Err(Error::Protocol("empty input report".to_string()));
    };
    match id {
        IN_STATUS => {
            require(buf, 7)?;
            Ok(InputReport::Status {
                buttons: buttons_at(buf, 1),
                extension_connected: buf[3] & STATUS_FLAG_EXTENSION != 0,
                battery: buf[6],
            })
        }
        IN_ACK => {
            require(buf, 5)?;
            Ok(InputReport::Ack {
                report: buf[3],
                error: buf[4],
            })
        }
        _ => match data_layout(id) {
            Some((buttons, acc, extension)) => {
                let needed = [buttons.map(|o| o + 2), acc.map(|o| o + 3), extension.map(|o| o + 6)]
                    .into_iter()
                    .flatten()
                    .max()
                    .unwrap_or(1);
                require(buf, needed)?;
                Ok(InputReport::Data(DataReport {
                    buttons: buttons.map(|o| buttons_at(buf, o)),
                    acc: acc.map(|o| [buf[o], buf[o + 1], buf[o + 2]].map(u16::from)),
                    extension: extension.map(|o| {
                        let mut ext = [0u8; 6];
                        ext.copy_from_slice(&buf[o..o + 6]);
                        ext
                    }),
                }))
            }
            None => Ok(InputReport::Other(id)),
        },
    }
}

/// Decodes a six byte MotionPlus frame. Returns `None` for passthrough frames that
/// carry data of another extension.
pub fn decode_motionplus(ext: &[u8; 6]) -> Option<MotionPlusState> {
    if ext[5] & 0x02 == 0 {
        return None;
    }
    let rate = |high: u8, low: u8| (u16::from(high & 0xFC) << 6) | u16::from(low);
    Some(MotionPlusState {
        angle_rate: [
            rate(ext[5], ext[2]),
            rate(ext[4], ext[1]),
            rate(ext[3], ext[0]),
        ],
        low_speed: [ext[3] & 0x01, (ext[4] & 0x02) >> 1, (ext[3] & 0x02) >> 1],
    })
}
