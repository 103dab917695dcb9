//! The modem engine boundary.
//!
//! The bridge drives an opaque block codec/modem through [`ModemEngine`].
//! Engines pull TX text and protocol bits back out of the session through
//! [`ModemCallbacks`], which [`LinkState`](crate::bridge::LinkState)
//! implements.

pub mod loopback;

pub use loopback::LoopbackModem;

use crate::bridge::LinkState;

/// Result of one decode call.
#[derive(Debug, Clone, Copy)]
pub struct DecodeStatus {
    /// Speech samples written to the output block.
    pub len: usize,
    pub sync: bool,
    pub snr: f32,
}

/// Callbacks an engine invokes while encoding: the next text byte for the
/// side channel, the protocol field, and the (unused) data channel.  All of
/// them must be safe to call from the real-time path.
pub trait ModemCallbacks: Send + Sync {
    /// Next TX text byte to weave into the transmission.
    fn next_tx_byte(&self) -> u8;

    /// Fill the two-byte protocol field for this call.
    fn next_protocol_bits(&self, out: &mut [u8; 2]);

    /// Data channel receive; unused, provided so engines always have a sink.
    fn data_rx(&self, _packet: &[u8]) {}

    /// Data channel transmit; returns the packet length, 0 meaning none.
    fn data_tx(&self, _packet: &mut [u8]) -> usize {
        0
    }
}

impl ModemCallbacks for LinkState {
    fn next_tx_byte(&self) -> u8 {
        LinkState::next_tx_byte(self)
    }

    fn next_protocol_bits(&self, out: &mut [u8; 2]) {
        LinkState::next_protocol_bits(self, out)
    }
}

/// A digital-voice modem/codec engine.
///
/// Block sizes are fixed per direction except `rx_block_len`, which real
/// engines derive from demodulator state and may change between cycles.
/// `encode`/`decode` must be allocation-free and bounded-time; the bridge
/// calls them from the audio callback.
pub trait ModemEngine: Send {
    /// The fixed sample rate the engine operates at, in Hz.  The bridge
    /// refuses to start when this disagrees with the configured modem rate.
    fn modem_rate(&self) -> u32;

    /// Speech samples consumed by one `encode` call.
    fn speech_block_len(&self) -> usize;

    /// Largest block either direction can produce; sizes the exchange
    /// buffers.
    fn max_block_len(&self) -> usize;

    /// Samples the decoder wants next; queried every RX cycle.
    fn rx_block_len(&mut self) -> usize;

    /// Encode one speech block into a modem waveform block.  Returns the
    /// number of samples written.
    fn encode(&mut self, speech: &[i16], waveform_out: &mut [i16]) -> usize;

    /// Decode one waveform block into speech.
    fn decode(&mut self, waveform: &[i16], speech_out: &mut [i16]) -> DecodeStatus;

    fn set_squelch_enabled(&mut self, enabled: bool);

    fn set_squelch_threshold(&mut self, threshold_db: f32);

    /// Estimated carrier frequency offset in Hz.
    fn freq_offset(&self) -> f32;
}
