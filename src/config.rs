//! Configuration for the bridge session.
//!
//! Every section has defaults matching a 48 kHz sound device feeding an
//! 8 kHz modem; an optional TOML file and the CLI can override them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BridgeError, Result};
use crate::signal_processing::Window;

/// System-wide bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Sound device configuration
    pub audio: AudioConfig,
    /// Decimation/interpolation filter configuration
    pub filter: FilterConfig,
    /// Modem-side configuration
    pub modem: ModemConfig,
    /// Initial squelch settings
    pub squelch: SquelchConfig,
}

/// Sound device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Device index as printed by `--list-devices`; default device when None
    pub device: Option<usize>,
    /// Device sample rate in Hz
    pub sample_rate: u32,
    /// Frames per callback
    pub buffer_size: usize,
    /// Input channels the device delivers per frame
    pub input_channels: u16,
    /// Output channels the device expects per frame
    pub output_channels: u16,
    /// Which input channel the bridge reads (0 = first)
    pub input_channel: usize,
}

/// Anti-aliasing / smoothing filter configuration.  The same design is used
/// for the decimation and interpolation low-passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// FIR length; even values are bumped to the next odd count
    pub taps: usize,
    /// Low-pass cutoff in Hz, below the modem Nyquist
    pub cutoff_hz: f64,
    /// Window applied to the ideal response
    pub window: Window,
}

/// Modem-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Modem engine sample rate in Hz
    pub sample_rate: u32,
    /// Speech block length in modem-rate samples
    pub speech_block: usize,
}

/// Initial squelch settings, forwarded to the modem engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquelchConfig {
    pub enabled: bool,
    pub threshold_db: f32,
}

impl BridgeConfig {
    /// Load from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        toml::from_str(&text).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Integer decimation/interpolation ratio between the device and modem
    /// rates.  Non-integer ratios are a configuration error.
    pub fn decimation_ratio(&self) -> Result<usize> {
        let device = self.audio.sample_rate;
        let modem = self.modem.sample_rate;
        if modem == 0 || device < modem || !device.is_multiple_of(modem) {
            return Err(BridgeError::Config(format!(
                "device rate {} is not an integer multiple of modem rate {}",
                device, modem
            )));
        }
        Ok((device / modem) as usize)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 48000,
            buffer_size: 512,
            input_channels: 2,
            output_channels: 2,
            input_channel: 0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            taps: 15,
            cutoff_hz: 2800.0,
            window: Window::Hamming,
        }
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            // 40 ms of speech at the modem rate.
            speech_block: 320,
        }
    }
}

impl Default for SquelchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_db: -100.0,
        }
    }
}
