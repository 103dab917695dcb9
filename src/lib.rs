pub mod audio;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod modem;
pub mod signal_processing;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
