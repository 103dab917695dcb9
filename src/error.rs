use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Filter design failed: {0}")]
    FilterDesign(String),

    #[error("Invalid mode value: {0}")]
    InvalidMode(u8),

    #[error("Unknown mode name: {0}")]
    UnknownMode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
