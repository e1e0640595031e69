use std::fmt;

use rosc::{OscMessage, OscPacket, OscType};
use serde::Serialize;

use crate::config::Config;
use crate::models::{MotionPlusState, Snapshot};

/// Gyroscope segment of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionFields {
    pub angle_rate: [f32; 3],
    pub low_speed: [f32; 3],
}

impl MotionFields {
    /// Placeholder sent while the MotionPlus has not reported yet.
    pub const ZERO: MotionFields = MotionFields {
        angle_rate: [0.0; 3],
        low_speed: [0.0; 3],
    };
}

impl From<MotionPlusState> for MotionFields {
    fn from(state: MotionPlusState) -> Self {
        MotionFields {
            angle_rate: state.angle_rate.map(f32::from),
            low_speed: state.low_speed.map(f32::from),
        }
    }
}

/// One outbound sample: `[buttons?] + acceleration(3) + [angle_rate(3) + low_speed(3)]?`.
///
/// The optional segments are decided by the configuration, not by what the
/// controller happened to report, so the argument count is fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub buttons: Option<f32>,
    pub acceleration: [f32; 3],
    pub motion: Option<MotionFields>,
}

impl OutboundMessage {
    pub fn assemble(snapshot: &Snapshot, config: &Config) -> Self {
        let buttons = config
            .buttons
            .then(|| f32::from(snapshot.buttons.unwrap_or_default()));
        let motion = config.use_motionplus.then(|| {
            snapshot
                .motionplus
                .map(MotionFields::from)
                .unwrap_or(MotionFields::ZERO)
        });
        OutboundMessage {
            buttons,
            acceleration: snapshot.acc.map(f32::from),
            motion,
        }
    }

    pub fn len(&self) -> usize {
        self.buttons.map_or(0, |_| 1) + 3 + self.motion.map_or(0, |_| 6)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the record into its wire order.
    pub fn to_args(&self) -> Vec<f32> {
        let mut args = Vec::with_capacity(self.len());
        args.extend(self.buttons);
        args.extend_from_slice(&self.acceleration);
        if let Some(motion) = &self.motion {
            args.extend_from_slice(&motion.angle_rate);
            args.extend_from_slice(&motion.low_speed);
        }
        args
    }

    pub fn to_packet(&self, path: &str) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: path.to_string(),
            args: self.to_args().into_iter().map(OscType::Float).collect(),
        })
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.to_args().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", value)?;
        }
        write!(f, ")")
    }
}
