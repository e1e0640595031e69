use log::{debug, info};

use crate::models::{ConnectError, ControllerFlag, Error, ReportMode, Snapshot};

/// A live connection to a motion controller.
pub trait Controller {
    /// Sets the status LEDs (bit 0 is LED 1).
    fn set_led(&mut self, led: u8) -> Result<(), Error>;

    /// Selects which sensor streams the controller reports.
    fn set_report_mode(&mut self, mode: ReportMode) -> Result<(), Error>;

    /// Sends the enable command for an optional feature.
    fn enable(&mut self, flag: ControllerFlag) -> Result<(), Error>;

    /// Reads the latest sensor state without consuming it.
    fn state(&mut self) -> Result<Snapshot, Error>;
}

/// Opens controller connections. Every error is considered retryable.
pub trait Connector {
    type Controller: Controller;

    fn connect(&mut self) -> Result<Self::Controller, ConnectError>;
}

/// Keeps calling `connect` until it succeeds, printing pairing instructions after
/// each failure. Without `max_attempts` this never gives up.
///
/// Returns the controller together with the number of attempts made.
pub fn connect_with_retry<C: Connector>(
    connector: &mut C,
    max_attempts: Option<u32>,
) -> Result<(C::Controller, u32), Error> {
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        match connector.connect() {
            Ok(controller) => {
                info!("Connected after {} attempt(s)", attempts);
                return Ok((controller, attempts));
            }
            Err(e) => {
                debug!("Connection attempt {} failed: {}", attempts, e);
                println!("Cannot connect to WiiMote. Hold down 1+2 on the controller.");
                if let Some(max) = max_attempts {
                    if attempts >= max {
                        return Err(Error::Connect(ConnectError::GaveUp { attempts }));
                    }
                }
                println!("Trying again...");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullController;

    impl Controller for NullController {
        fn set_led(&mut self, _led: u8) -> Result<(), Error> {
            Ok(())
        }
        fn set_report_mode(&mut self, _mode: ReportMode) -> Result<(), Error> {
            Ok(())
        }
        fn enable(&mut self, _flag: ControllerFlag) -> Result<(), Error> {
            Ok(())
        }
        fn state(&mut self) -> Result<Snapshot, Error> {
            Ok(Snapshot::default())
        }
    }

    /// Fails a fixed number of times before handing out a controller.
    struct FlakyConnector {
        failures_left: u32,
        calls: u32,
    }

    impl Connector for FlakyConnector {
        type Controller = NullController;

        fn connect(&mut self) -> Result<NullController, ConnectError> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                if self.calls % 2 == 0 {
                    return Err(ConnectError::OpenFailed("busy".to_string()));
                }
                return Err(ConnectError::NotFound);
            }
            Ok(NullController)
        }
    }

    #[test]
    fn retries_until_connected() {
        let mut connector = FlakyConnector {
            failures_left: 7,
            calls: 0,
        };
        let (_, attempts) = connect_with_retry(&mut connector, None).unwrap();
        assert_eq!(attempts, 8);
        assert_eq!(connector.calls, 8);
    }

    #[test]
    fn first_attempt_success() {
        let mut connector = FlakyConnector {
            failures_left: 0,
            calls: 0,
        };
        let (_, attempts) = connect_with_retry(&mut connector, None).unwrap();
        assert_eq!(attempts, 1);
    }

    #[test]
    fn bounded_retry_gives_up() {
        let mut connector = FlakyConnector {
            failures_left: 10,
            calls: 0,
        };
        match connect_with_retry(&mut connector, Some(3)) {
            Err(Error::Connect(ConnectError::GaveUp { attempts })) => assert_eq!(attempts, 3),
            other => panic!("expected GaveUp, got {:?}", other.map(|(_, n)| n)),
        }
        assert_eq!(connector.calls, 3);
    }

    #[test]
    fn bounded_retry_can_still_succeed() {
        let mut connector = FlakyConnector {
            failures_left: 2,
            calls: 0,
        };
        let (_, attempts) = connect_with_retry(&mut connector, Some(3)).unwrap();
        assert_eq!(attempts, 3);
    }
}
