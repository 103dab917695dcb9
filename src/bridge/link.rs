//! Shared link state between the audio callback and the command loop.
//!
//! Every field crossing the thread boundary is an atomic; the TX text buffer
//! is the one mutex, and the real-time side only ever `try_lock`s it.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use crate::config::SquelchConfig;
use crate::constants::{DEFAULT_TX_TEXT, TX_TEXT_CAPACITY, TX_TEXT_FILLER};
use crate::error::Result;

use super::mode::Mode;

/// The TX text string with its cyclic read cursor.
///
/// Owned bounded buffer: the modem pulls one byte per call and the cursor
/// wraps at the end of the string, so the text repeats for as long as the
/// transmission lasts.
pub struct TxText {
    buf: [u8; TX_TEXT_CAPACITY],
    len: usize,
    cursor: usize,
}

impl TxText {
    fn new() -> Self {
        let mut text = Self {
            buf: [0; TX_TEXT_CAPACITY],
            len: 0,
            cursor: 0,
        };
        text.set(DEFAULT_TX_TEXT);
        text
    }

    /// Replace the text and rewind the cursor.  Empty input restores the
    /// default banner; overlong input is truncated to the buffer capacity.
    pub fn set(&mut self, text: &str) {
        let text = if text.is_empty() { DEFAULT_TX_TEXT } else { text };
        let bytes = text.as_bytes();
        let len = bytes.len().min(TX_TEXT_CAPACITY);
        self.buf[..len].copy_from_slice(&bytes[..len]);
        self.len = len;
        self.cursor = 0;
    }

    pub fn get(&self) -> String {
        String::from_utf8_lossy(&self.buf[..self.len]).into_owned()
    }

    /// The next byte to transmit; advances cyclically.
    pub fn next_byte(&mut self) -> u8 {
        let byte = self.buf[self.cursor];
        self.cursor = (self.cursor + 1) % self.len;
        byte
    }
}

/// Cross-thread state for one device session: mode, squelch settings, clip
/// latch, counters, and the stats the bridge publishes after each decode.
pub struct LinkState {
    mode: AtomicU8,
    frames: AtomicU64,
    clipping: AtomicBool,
    protocol_calls: AtomicU64,

    squelch_enabled: AtomicBool,
    squelch_threshold: AtomicU32,
    squelch_dirty: AtomicBool,

    // Modem stats, published by the bridge, read by the command loop.
    snr: AtomicU32,
    sync: AtomicBool,
    freq_offset: AtomicU32,

    // Backpressure telemetry.
    input_drops: AtomicU64,
    output_drops: AtomicU64,

    tx_text: Mutex<TxText>,
}

impl LinkState {
    pub fn new(squelch: &SquelchConfig) -> Self {
        Self {
            mode: AtomicU8::new(Mode::Mute.as_u8()),
            frames: AtomicU64::new(0),
            clipping: AtomicBool::new(false),
            protocol_calls: AtomicU64::new(0),
            squelch_enabled: AtomicBool::new(squelch.enabled),
            squelch_threshold: AtomicU32::new(squelch.threshold_db.to_bits()),
            // Dirty so the bridge pushes the initial settings into the
            // engine on the first cycle.
            squelch_dirty: AtomicBool::new(true),
            snr: AtomicU32::new(0.0f32.to_bits()),
            sync: AtomicBool::new(false),
            freq_offset: AtomicU32::new(0.0f32.to_bits()),
            input_drops: AtomicU64::new(0),
            output_drops: AtomicU64::new(0),
            tx_text: Mutex::new(TxText::new()),
        }
    }

    // --- mode ---

    pub fn mode(&self) -> Mode {
        // Only `Mode` values are ever stored.
        Mode::try_from(self.mode.load(Ordering::Relaxed)).unwrap_or(Mode::Mute)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    /// Validated transition from a raw value; the state is untouched when
    /// the value is out of range.
    pub fn request_mode(&self, value: u8) -> Result<Mode> {
        let mode = Mode::try_from(value)?;
        self.set_mode(mode);
        Ok(mode)
    }

    // --- counters ---

    pub fn increment_frames(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    // --- clip latch ---

    pub fn latch_clip(&self) {
        self.clipping.store(true, Ordering::Relaxed);
    }

    /// One-shot read: returns the latch and clears it.
    pub fn take_clipped(&self) -> bool {
        self.clipping.swap(false, Ordering::Relaxed)
    }

    // --- squelch ---

    pub fn set_squelch_enabled(&self, enabled: bool) {
        self.squelch_enabled.store(enabled, Ordering::Relaxed);
        self.squelch_dirty.store(true, Ordering::Release);
    }

    pub fn set_squelch_threshold(&self, threshold_db: f32) {
        self.squelch_threshold
            .store(threshold_db.to_bits(), Ordering::Relaxed);
        self.squelch_dirty.store(true, Ordering::Release);
    }

    pub fn squelch_enabled(&self) -> bool {
        self.squelch_enabled.load(Ordering::Relaxed)
    }

    pub fn squelch_threshold(&self) -> f32 {
        f32::from_bits(self.squelch_threshold.load(Ordering::Relaxed))
    }

    /// Pending squelch settings for the bridge to apply to the modem engine,
    /// or None when nothing changed since the last call.
    pub fn take_squelch_update(&self) -> Option<(bool, f32)> {
        if self.squelch_dirty.swap(false, Ordering::Acquire) {
            Some((self.squelch_enabled(), self.squelch_threshold()))
        } else {
            None
        }
    }

    // --- modem stats ---

    pub fn publish_stats(&self, snr: f32, sync: bool) {
        self.snr.store(snr.to_bits(), Ordering::Relaxed);
        self.sync.store(sync, Ordering::Relaxed);
    }

    pub fn publish_freq_offset(&self, offset_hz: f32) {
        self.freq_offset.store(offset_hz.to_bits(), Ordering::Relaxed);
    }

    pub fn snr(&self) -> f32 {
        f32::from_bits(self.snr.load(Ordering::Relaxed))
    }

    pub fn sync(&self) -> bool {
        self.sync.load(Ordering::Relaxed)
    }

    pub fn freq_offset(&self) -> f32 {
        f32::from_bits(self.freq_offset.load(Ordering::Relaxed))
    }

    // --- drop telemetry ---

    pub fn count_input_drop(&self) {
        self.input_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_output_drop(&self) {
        self.output_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn input_drops(&self) -> u64 {
        self.input_drops.load(Ordering::Relaxed)
    }

    pub fn output_drops(&self) -> u64 {
        self.output_drops.load(Ordering::Relaxed)
    }

    // --- TX text / protocol callbacks ---

    pub fn set_text(&self, text: &str) {
        if let Ok(mut tx) = self.tx_text.lock() {
            tx.set(text);
        }
    }

    pub fn text(&self) -> String {
        self.tx_text
            .lock()
            .map(|tx| tx.get())
            .unwrap_or_default()
    }

    /// Next TX text byte for the modem side channel.  Called from the
    /// real-time path, so a contended lock yields a filler byte instead of
    /// blocking.
    pub fn next_tx_byte(&self) -> u8 {
        match self.tx_text.try_lock() {
            Ok(mut tx) => tx.next_byte(),
            Err(_) => TX_TEXT_FILLER,
        }
    }

    /// Fill `out` with the two-digit protocol field and bump the call
    /// counter.  Counts above 99 wrap within the field.
    pub fn next_protocol_bits(&self, out: &mut [u8; 2]) {
        let calls = self.protocol_calls.fetch_add(1, Ordering::Relaxed);
        let value = (calls % 100) as u8;
        out[0] = if value >= 10 {
            b'0' + value / 10
        } else {
            TX_TEXT_FILLER
        };
        out[1] = b'0' + value % 10;
    }

    pub fn protocol_calls(&self) -> u64 {
        self.protocol_calls.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> LinkState {
        LinkState::new(&SquelchConfig::default())
    }

    #[test]
    fn test_clip_latch_is_one_shot() {
        let link = link();
        link.latch_clip();
        assert!(link.take_clipped());
        assert!(!link.take_clipped());
    }

    #[test]
    fn test_mode_request_out_of_range_leaves_state() {
        let link = link();
        link.set_mode(Mode::Rx);
        assert!(link.request_mode(7).is_err());
        assert_eq!(link.mode(), Mode::Rx);
        assert_eq!(link.request_mode(3).unwrap(), Mode::Tx);
        assert_eq!(link.mode(), Mode::Tx);
    }

    #[test]
    fn test_squelch_update_taken_once() {
        let link = link();
        // Initial settings are pending.
        assert!(link.take_squelch_update().is_some());
        assert!(link.take_squelch_update().is_none());

        link.set_squelch_threshold(-12.5);
        let (enabled, threshold) = link.take_squelch_update().unwrap();
        assert!(enabled);
        assert_eq!(threshold, -12.5);
        assert!(link.take_squelch_update().is_none());
    }

    #[test]
    fn test_tx_text_cycles() {
        let link = link();
        link.set_text("AB");
        assert_eq!(link.next_tx_byte(), b'A');
        assert_eq!(link.next_tx_byte(), b'B');
        assert_eq!(link.next_tx_byte(), b'A');
    }

    #[test]
    fn test_empty_text_restores_default() {
        let link = link();
        link.set_text("CQ CQ");
        link.set_text("");
        assert_eq!(link.text(), DEFAULT_TX_TEXT);
    }

    #[test]
    fn test_overlong_text_truncated() {
        let link = link();
        let long = "x".repeat(TX_TEXT_CAPACITY + 40);
        link.set_text(&long);
        assert_eq!(link.text().len(), TX_TEXT_CAPACITY);
    }

    #[test]
    fn test_protocol_bits() {
        let link = link();
        let mut out = [0u8; 2];
        link.next_protocol_bits(&mut out);
        assert_eq!(&out, b" 0");
        for _ in 0..11 {
            link.next_protocol_bits(&mut out);
        }
        assert_eq!(&out, b"11");
        assert_eq!(link.protocol_calls(), 12);
    }

    #[test]
    fn test_frame_counter() {
        let link = link();
        for _ in 0..5 {
            link.increment_frames();
        }
        assert_eq!(link.frames(), 5);
    }
}
