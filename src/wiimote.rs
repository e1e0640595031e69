use std::time::{Duration, Instant};

use hidapi::{HidApi, HidDevice};
use log::{debug, info, warn};

use crate::connector::{Connector, Controller};
use crate::models::{ConnectError, ControllerFlag, Error, MotionPlusState, ReportMode, Snapshot};
use crate::protocol::{self, InputReport};

const ACK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Finds Wii Remotes among the HID devices known to the OS.
pub struct HidConnector {
    api: HidApi,
}

impl HidConnector {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            api: HidApi::new()?,
        })
    }
}

impl Connector for HidConnector {
    type Controller = Wiimote;

    fn connect(&mut self) -> Result<Wiimote, ConnectError> {
        self.api
            .refresh_devices()
            .map_err(|e| ConnectError::OpenFailed(e.to_string()))?;
        let info = self
            .api
            .device_list()
            .find(|d| {
                d.vendor_id() == protocol::VENDOR_ID
                    && protocol::PRODUCT_IDS.contains(&d.product_id())
            })
            .ok_or(ConnectError::NotFound)?;
        debug!(
            "Opening Wii Remote {:04x}:{:04x} at {:?}",
            info.vendor_id(),
            info.product_id(),
            info.path()
        );
        let device = info
            .open_device(&self.api)
            .map_err(|e| ConnectError::OpenFailed(e.to_string()))?;
        Ok(Wiimote::new(device))
    }
}

/// Latest known sensor values, folded from incoming reports.
#[derive(Debug, Default)]
pub(crate) struct StateCache {
    rpt_mode: ReportMode,
    led: u8,
    buttons: u16,
    acc: [u16; 3],
    motionplus: Option<MotionPlusState>,
}

impl StateCache {
    /// Folds one report into the cache. Returns true when the device has stopped
    /// streaming and the reporting mode must be sent again.
    pub(crate) fn apply(&mut self, report: InputReport) -> bool {
        match report {
            InputReport::Data(data) => {
                if let Some(buttons) = data.buttons {
                    self.buttons = buttons;
                }
                if let Some(acc) = data.acc {
                    self.acc = acc;
                }
                if let Some(ext) = data.extension {
                    if self.rpt_mode.contains(ReportMode::MOTIONPLUS) {
                        if let Some(mp) = protocol::decode_motionplus(&ext) {
                            self.motionplus = Some(mp);
                        }
                    }
                }
                false
            }
            InputReport::Status {
                buttons,
                extension_connected,
                battery,
            } => {
                debug!(
                    "Status report: extension={} battery={:#04x}",
                    extension_connected, battery
                );
                self.buttons = buttons;
                if !extension_connected {
                    self.motionplus = None;
                }
                true
            }
            InputReport::Ack { report, error } => {
                if error != 0 {
                    warn!("Wiimote rejected report {:#04x} (error {})", report, error);
                } else {
                    debug!("Wiimote acknowledged report {:#04x}", report);
                }
                false
            }
            InputReport::Other(id) => {
                debug!("Ignoring input report {:#04x}", id);
                false
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            rpt_mode: self.rpt_mode,
            led: self.led,
            buttons: self
                .rpt_mode
                .contains(ReportMode::BUTTONS)
                .then_some(self.buttons),
            acc: if self.rpt_mode.contains(ReportMode::ACCEL) {
                self.acc
            } else {
                [0; 3]
            },
            motionplus: if self.rpt_mode.contains(ReportMode::MOTIONPLUS) {
                self.motionplus
            } else {
                None
            },
        }
    }
}

/// An open Wii Remote.
pub struct Wiimote {
    device: HidDevice,
    cache: StateCache,
    buf: [u8; protocol::MAX_REPORT_LEN],
}

impl Wiimote {
    fn new(device: HidDevice) -> Self {
        Self {
            device,
            cache: StateCache::default(),
            buf: [0u8; protocol::MAX_REPORT_LEN],
        }
    }

    fn write(&self, report: &[u8]) -> Result<(), Error> {
        debug!("-> {:02x?}", report);
        self.device.write(report)?;
        Ok(())
    }

    /// Reads one report, waiting at most `timeout_ms` (0 never blocks).
    fn read_one(&mut self, timeout_ms: i32) -> Result<Option<InputReport>, Error> {
        let n = self.device.read_timeout(&mut self.buf, timeout_ms)?;
        if n == 0 {
            return Ok(None);
        }
        let report = protocol::decode_input_report(&self.buf[..n])?;
        if self.cache.apply(report) {
            self.write(&protocol::set_reporting_report(self.cache.rpt_mode))?;
        }
        Ok(Some(report))
    }

    fn drain(&mut self) -> Result<(), Error> {
        while self.read_one(0)?.is_some() {}
        Ok(())
    }

    /// Writes a register and waits for the matching acknowledgement.
    fn write_register(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        self.write(&protocol::write_register_report(address, data)?)?;
        await_write_ack(address, ACK_TIMEOUT, |timeout_ms| self.read_one(timeout_ms))
    }
}

/// Polls `read` until the register write at `address` is acknowledged. A missing
/// or negative acknowledgement is an error.
pub(crate) fn await_write_ack<F>(address: u32, timeout: Duration, mut read: F) -> Result<(), Error>
where
    F: FnMut(i32) -> Result<Option<InputReport>, Error>,
{
    let deadline = Instant::now() + timeout;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        let timeout_ms = remaining.as_millis().clamp(1, i32::MAX as u128) as i32;
        if let Some(InputReport::Ack { report, error }) = read(timeout_ms)? {
            if report == protocol::OUT_WRITE_MEMORY {
                if error != 0 {
                    return Err(Error::Protocol(format!(
                        "register write at {:#08x} failed with code {}",
                        address, error
                    )));
                }
                return Ok(());
            }
        }
    }
    Err(Error::Protocol(format!(
        "no acknowledgement for register write at {:#08x}",
        address
    )))
}

impl Controller for Wiimote {
    fn set_led(&mut self, led: u8) -> Result<(), Error> {
        self.write(&protocol::set_leds_report(led))?;
        self.cache.led = led & 0x0F;
        Ok(())
    }

    fn set_report_mode(&mut self, mode: ReportMode) -> Result<(), Error> {
        self.cache.rpt_mode = mode;
        self.write(&protocol::set_reporting_report(mode))
    }

    fn enable(&mut self, flag: ControllerFlag) -> Result<(), Error> {
        match flag {
            ControllerFlag::MotionPlus => {
                self.write_register(
                    protocol::MOTIONPLUS_INIT_REGISTER,
                    &[protocol::MOTIONPLUS_INIT_VALUE],
                )?;
                self.write_register(
                    protocol::MOTIONPLUS_ACTIVATE_REGISTER,
                    &[protocol::MOTIONPLUS_ACTIVATE_VALUE],
                )?;
                // The extension change is announced by a status report, which
                // re-arms the reporting mode when it arrives.
                self.write(&protocol::status_request_report())?;
                info!("MotionPlus activation sent");
                Ok(())
            }
        }
    }

    fn state(&mut self) -> Result<Snapshot, Error> {
        self.drain()?;
        Ok(self.cache.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DataReport;

    fn motionplus_ext() -> [u8; 6] {
        [0x40, 0x00, 0x00, 0x7C | 0x03, 0x80, 0x78 | 0x02]
    }

    fn cache(mode: ReportMode) -> StateCache {
        StateCache {
            rpt_mode: mode,
            led: 1,
            ..StateCache::default()
        }
    }

    #[test]
    fn motionplus_absent_until_first_frame() {
        let mut cache = cache(ReportMode::ACCEL | ReportMode::EXT | ReportMode::MOTIONPLUS);
        cache.apply(InputReport::Data(DataReport {
            buttons: Some(0),
            acc: Some([128, 128, 154]),
            extension: None,
        }));
        assert_eq!(cache.snapshot().motionplus, None);
        assert_eq!(cache.snapshot().acc, [128, 128, 154]);

        cache.apply(InputReport::Data(DataReport {
            buttons: Some(0),
            acc: Some([128, 128, 154]),
            extension: Some(motionplus_ext()),
        }));
        let mp = cache.snapshot().motionplus.unwrap();
        assert_eq!(mp.angle_rate, [0x1E00, 0x2000, 0x1F40]);
    }

    #[test]
    fn snapshot_hides_unrequested_streams() {
        let mut cache = cache(ReportMode::ACCEL);
        cache.apply(InputReport::Data(DataReport {
            buttons: Some(0x0008),
            acc: Some([1, 2, 3]),
            extension: Some(motionplus_ext()),
        }));
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.buttons, None);
        assert_eq!(snapshot.motionplus, None);
        assert_eq!(snapshot.acc, [1, 2, 3]);
        assert_eq!(snapshot.led, 1);
    }

    #[test]
    fn buttons_reported_when_requested() {
        let mut cache = cache(ReportMode::ACCEL | ReportMode::BUTTONS);
        cache.apply(InputReport::Data(DataReport {
            buttons: Some(0x0008),
            acc: Some([1, 2, 3]),
            extension: None,
        }));
        assert_eq!(cache.snapshot().buttons, Some(0x0008));
    }

    #[test]
    fn status_report_rearms_and_drops_lost_extension() {
        let mut cache = cache(ReportMode::ACCEL | ReportMode::EXT | ReportMode::MOTIONPLUS);
        cache.apply(InputReport::Data(DataReport {
            buttons: None,
            acc: None,
            extension: Some(motionplus_ext()),
        }));
        assert!(cache.snapshot().motionplus.is_some());

        let rearm = cache.apply(InputReport::Status {
            buttons: 0,
            extension_connected: false,
            battery: 0x60,
        });
        assert!(rearm);
        assert_eq!(cache.snapshot().motionplus, None);
    }

    #[test]
    fn register_write_ack_is_awaited() {
        let mut replies = vec![
            None,
            Some(InputReport::Ack {
                report: protocol::OUT_LEDS,
                error: 0,
            }),
            Some(InputReport::Ack {
                report: protocol::OUT_WRITE_MEMORY,
                error: 0,
            }),
        ]
        .into_iter();
        let result = await_write_ack(0xA600F0, Duration::from_secs(1), |_| {
            Ok(replies.next().flatten())
        });
        assert!(result.is_ok());
    }

    #[test]
    fn register_write_rejection_is_an_error() {
        let result = await_write_ack(0xA600FE, Duration::from_secs(1), |_| {
            Ok(Some(InputReport::Ack {
                report: protocol::OUT_WRITE_MEMORY,
                error: 7,
            }))
        });
        match result {
            Err(Error::Protocol(msg)) => assert!(msg.contains("failed with code 7")),
            other => panic!("expected a protocol error, got {:?}", other),
        }
    }

    #[test]
    fn missing_register_write_ack_is_an_error() {
        let mut polls = 0;
        let result = await_write_ack(0xA600F0, Duration::from_millis(20), |timeout_ms| {
            polls += 1;
            std::thread::sleep(Duration::from_millis(timeout_ms as u64));
            Ok(None)
        });
        match result {
            Err(Error::Protocol(msg)) => assert!(msg.contains("no acknowledgement")),
            other => panic!("expected a protocol error, got {:?}", other),
        }
        assert!(polls >= 1);
    }

    #[test]
    fn acks_do_not_rearm() {
        let mut cache = cache(ReportMode::ACCEL);
        assert!(!cache.apply(InputReport::Ack {
            report: 0x16,
            error: 0
        }));
        assert!(!cache.apply(InputReport::Other(0x21)));
    }
}
