pub mod bridge;
pub mod client;
pub mod config;
pub mod connector;
pub mod message;
pub mod mode;
pub mod models;
pub mod protocol;
pub mod wiimote;

pub use bridge::Bridge;
pub use client::OscClient;
pub use config::{Args, Config};
pub use connector::{connect_with_retry, Connector, Controller};
pub use message::{MotionFields, OutboundMessage};
pub use models::*;
pub use wiimote::{HidConnector, Wiimote};
