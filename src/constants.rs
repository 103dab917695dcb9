//! Numeric constants for the bridge pipeline.

/// Input magnitude at which the clip latch fires.  Checked both before and
/// after the decimation filter so hot inputs are caught even when the filter
/// rings past full scale.
pub const CLIP_LIMIT: f32 = 0.90;

/// Sample queue depth cap, as a multiple of the per-cycle block length.
/// Input beyond the cap is dropped rather than buffered so latency and
/// memory stay bounded.
pub const QUEUE_DEPTH_FACTOR: usize = 10;

/// Full-scale magnitude for converting normalized float samples to the
/// fixed-point representation the modem engine works in.
pub const FULL_SCALE: f32 = i16::MAX as f32;

/// Capacity of the TX text buffer in bytes.
pub const TX_TEXT_CAPACITY: usize = 128;

/// Byte handed to the modem text callback when the text buffer is briefly
/// contended by the command thread.
pub const TX_TEXT_FILLER: u8 = b' ';

/// Text transmitted over the modem side channel until the operator sets
/// their own string.
pub const DEFAULT_TX_TEXT: &str = concat!("dvbridge ", env!("CARGO_PKG_VERSION"), "\r");
