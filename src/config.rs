use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::{ArgAction, Parser};
use serde::Serialize;

use crate::Error;

/// Send wiimote data to an OSC receiver
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The destination IP of the OSC receiver
    #[arg(long, default_value = "127.0.0.1")]
    pub ip: String,

    /// The destination port of the OSC receiver
    #[arg(long, default_value_t = 6448)]
    pub port: u16,

    /// The message path to use for communication with the OSC receiver
    #[arg(long, default_value = "/wek/inputs")]
    pub message: String,

    /// Use the WiiMotion+ adapter
    #[arg(
        long = "use-motionplus",
        default_value_t = true,
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub use_motionplus: bool,

    /// Send the button status
    #[arg(
        long,
        default_value_t = false,
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub buttons: bool,

    /// The time (in seconds) between messages
    #[arg(long, default_value_t = 0.1)]
    pub delay: f64,

    /// Give up after this many failed connection attempts (retries forever when omitted)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub connect_attempts: Option<u32>,
}

/// Strict boolean parser: "false" means false.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!(
            "expected one of true/false, 1/0, yes/no, on/off (got \"{}\")",
            other
        )),
    }
}

/// Run parameters, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub ip: String,
    pub port: u16,
    pub message: String,
    pub use_motionplus: bool,
    pub buttons: bool,
    pub delay: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_attempts: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 6448,
            message: "/wek/inputs".to_string(),
            use_motionplus: true,
            buttons: false,
            delay: 0.1,
            connect_attempts: None,
        }
    }
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, Error> {
        let config = Config {
            ip: args.ip,
            port: args.port,
            message: args.message,
            use_motionplus: args.use_motionplus,
            buttons: args.buttons,
            delay: args.delay,
            connect_attempts: args.connect_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(Error::Config(format!(
                "--delay must be a non-negative number of seconds (got {})",
                self.delay
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.delay) {
            return Err(Error::Config(format!(
                "--delay of {} seconds is out of range: {}",
                self.delay, e
            )));
        }
        if !self.message.starts_with('/') {
            return Err(Error::Config(format!(
                "--message must be an OSC address starting with '/' (got \"{}\")",
                self.message
            )));
        }
        if self.ip.trim().is_empty() {
            return Err(Error::Config("--ip must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolves `ip:port` to the first matching socket address.
    pub fn destination(&self) -> Result<SocketAddr, Error> {
        let mut addrs = (self.ip.as_str(), self.port).to_socket_addrs().map_err(|e| {
            Error::Config(format!("cannot resolve {}:{}: {}", self.ip, self.port, e))
        })?;
        addrs.next().ok_or_else(|| {
            Error::Config(format!("{}:{} resolved to no addresses", self.ip, self.port))
        })
    }

    /// Out-of-range values saturate; `validate` rejects them up front.
    pub fn delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay).unwrap_or(if self.delay > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }
}
