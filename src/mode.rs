use log::debug;

use crate::config::Config;
use crate::connector::Controller;
use crate::models::{ControllerFlag, Error, ReportMode};

/// Accelerometer is always reported; buttons and MotionPlus follow the flags.
pub fn report_mode_for(config: &Config) -> ReportMode {
    let mut mode = ReportMode::ACCEL;
    if config.buttons {
        mode |= ReportMode::BUTTONS;
    }
    if config.use_motionplus {
        mode |= ReportMode::EXT | ReportMode::MOTIONPLUS;
    }
    mode
}

/// Applies the report mode and, when requested, switches on the MotionPlus extension.
pub fn configure<C: Controller>(controller: &mut C, config: &Config) -> Result<ReportMode, Error> {
    let mode = report_mode_for(config);
    debug!("Setting report mode {:#04x}", mode.bits());
    controller.set_report_mode(mode)?;
    if config.use_motionplus {
        controller.enable(ControllerFlag::MotionPlus)?;
    }
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Snapshot;

    #[derive(Debug, PartialEq)]
    enum Call {
        ReportMode(ReportMode),
        Enable(ControllerFlag),
    }

    #[derive(Default)]
    struct RecordingController {
        calls: Vec<Call>,
    }

    impl Controller for RecordingController {
        fn set_led(&mut self, _led: u8) -> Result<(), Error> {
            Ok(())
        }
        fn set_report_mode(&mut self, mode: ReportMode) -> Result<(), Error> {
            self.calls.push(Call::ReportMode(mode));
            Ok(())
        }
        fn enable(&mut self, flag: ControllerFlag) -> Result<(), Error> {
            self.calls.push(Call::Enable(flag));
            Ok(())
        }
        fn state(&mut self) -> Result<Snapshot, Error> {
            Ok(Snapshot::default())
        }
    }

    fn config(use_motionplus: bool, buttons: bool) -> Config {
        Config {
            use_motionplus,
            buttons,
            ..Config::default()
        }
    }

    #[test]
    fn accelerometer_is_always_requested() {
        for (mp, btn) in [(false, false), (true, false), (false, true), (true, true)] {
            assert!(report_mode_for(&config(mp, btn)).contains(ReportMode::ACCEL));
        }
        assert_eq!(report_mode_for(&config(false, false)), ReportMode::ACCEL);
    }

    #[test]
    fn flags_add_streams() {
        assert_eq!(
            report_mode_for(&config(false, true)),
            ReportMode::ACCEL | ReportMode::BUTTONS
        );
        let mode = report_mode_for(&config(true, true));
        assert!(mode.contains(ReportMode::BUTTONS));
        assert!(mode.contains(ReportMode::EXT));
        assert!(mode.contains(ReportMode::MOTIONPLUS));
    }

    #[test]
    fn motionplus_is_enabled_after_report_mode() {
        let mut controller = RecordingController::default();
        let mode = configure(&mut controller, &config(true, false)).unwrap();
        assert_eq!(
            controller.calls,
            vec![
                Call::ReportMode(mode),
                Call::Enable(ControllerFlag::MotionPlus)
            ]
        );
    }

    #[test]
    fn no_enable_without_motionplus() {
        let mut controller = RecordingController::default();
        configure(&mut controller, &config(false, true)).unwrap();
        assert_eq!(
            controller.calls,
            vec![Call::ReportMode(ReportMode::ACCEL | ReportMode::BUTTONS)]
        );
    }
}
