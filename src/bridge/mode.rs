//! Processing modes and validated mode transitions.

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// What the per-frame callback does with the audio.
///
/// The numeric values are the wire representation used by the shared mode
/// atomic; `try_from` is the only way back, so an out-of-range request is
/// rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Input ignored, silence on every output channel.
    Mute = 0,
    /// Input channel copied to all output channels, no filtering.
    Pass = 1,
    /// Decode: decimate input, modem decode, interpolate speech out.
    Rx = 2,
    /// Encode: decimate input speech, modem encode, interpolate waveform out.
    Tx = 3,
}

impl Mode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Mute => "MUTE",
            Mode::Pass => "PASS",
            Mode::Rx => "RX",
            Mode::Tx => "TX",
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = BridgeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Mute),
            1 => Ok(Mode::Pass),
            2 => Ok(Mode::Rx),
            3 => Ok(Mode::Tx),
            other => Err(BridgeError::InvalidMode(other)),
        }
    }
}

impl FromStr for Mode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MUTE" => Ok(Mode::Mute),
            "PASS" => Ok(Mode::Pass),
            "RX" => Ok(Mode::Rx),
            "TX" => Ok(Mode::Tx),
            other => Err(BridgeError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
