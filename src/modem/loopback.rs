//! Pass-through modem engine.
//!
//! Copies speech blocks through unchanged and reports a synthetic SNR from
//! the block power.  It keeps the whole bridge path exercisable without a
//! waveform implementation; a real FreeDV-style engine plugs in through the
//! same [`ModemEngine`](super::ModemEngine) trait.

use std::sync::Arc;

use crate::constants::FULL_SCALE;

use super::{DecodeStatus, ModemCallbacks, ModemEngine};

/// SNR reported for a full-scale block; block power scales it down from
/// here.
const SNR_FULL_SCALE_DB: f32 = 20.0;

/// RMS below which the decoder reports loss of sync.
const SYNC_RMS_FLOOR: f32 = 1e-4;

pub struct LoopbackModem {
    callbacks: Arc<dyn ModemCallbacks>,
    block_len: usize,
    squelch_enabled: bool,
    squelch_threshold_db: f32,
    snr: f32,
    sync: bool,
    proto: [u8; 2],
}

impl LoopbackModem {
    pub fn new(callbacks: Arc<dyn ModemCallbacks>, block_len: usize) -> Self {
        Self {
            callbacks,
            block_len: block_len.max(1),
            squelch_enabled: false,
            squelch_threshold_db: -100.0,
            snr: 0.0,
            sync: false,
            proto: [0; 2],
        }
    }

    fn block_rms(block: &[i16]) -> f32 {
        if block.is_empty() {
            return 0.0;
        }
        let sum: f64 = block
            .iter()
            .map(|&s| {
                let v = s as f64 / FULL_SCALE as f64;
                v * v
            })
            .sum();
        (sum / block.len() as f64).sqrt() as f32
    }
}

impl ModemEngine for LoopbackModem {
    fn modem_rate(&self) -> u32 {
        8000
    }

    fn speech_block_len(&self) -> usize {
        self.block_len
    }

    fn max_block_len(&self) -> usize {
        self.block_len
    }

    fn rx_block_len(&mut self) -> usize {
        self.block_len
    }

    fn encode(&mut self, speech: &[i16], waveform_out: &mut [i16]) -> usize {
        let len = speech.len().min(waveform_out.len());
        waveform_out[..len].copy_from_slice(&speech[..len]);

        // Service the side channels once per block, like a real engine.
        let _ = self.callbacks.next_tx_byte();
        self.callbacks.next_protocol_bits(&mut self.proto);
        len
    }

    fn decode(&mut self, waveform: &[i16], speech_out: &mut [i16]) -> DecodeStatus {
        let len = waveform.len().min(speech_out.len());
        speech_out[..len].copy_from_slice(&waveform[..len]);

        let rms = Self::block_rms(&waveform[..len]);
        self.sync = rms > SYNC_RMS_FLOOR;
        self.snr = if self.sync {
            SNR_FULL_SCALE_DB + 20.0 * rms.log10()
        } else {
            0.0
        };

        if self.squelch_enabled && self.snr < self.squelch_threshold_db {
            speech_out[..len].fill(0);
        }

        DecodeStatus {
            len,
            sync: self.sync,
            snr: self.snr,
        }
    }

    fn set_squelch_enabled(&mut self, enabled: bool) {
        self.squelch_enabled = enabled;
    }

    fn set_squelch_threshold(&mut self, threshold_db: f32) {
        self.squelch_threshold_db = threshold_db;
    }

    fn freq_offset(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::LinkState;
    use crate::config::SquelchConfig;

    fn modem(block: usize) -> (LoopbackModem, Arc<LinkState>) {
        let link = Arc::new(LinkState::new(&SquelchConfig::default()));
        (LoopbackModem::new(link.clone(), block), link)
    }

    #[test]
    fn test_encode_copies_and_services_callbacks() {
        let (mut modem, link) = modem(4);
        let speech = [100i16, -200, 300, -400];
        let mut out = [0i16; 4];
        assert_eq!(modem.encode(&speech, &mut out), 4);
        assert_eq!(out, speech);
        assert_eq!(link.protocol_calls(), 1);
    }

    #[test]
    fn test_decode_reports_sync_on_signal() {
        let (mut modem, _) = modem(4);
        let waveform = [8000i16, -8000, 8000, -8000];
        let mut out = [0i16; 4];
        let status = modem.decode(&waveform, &mut out);
        assert!(status.sync);
        assert!(status.snr < SNR_FULL_SCALE_DB);
        assert_eq!(out, waveform);
    }

    #[test]
    fn test_decode_loses_sync_on_silence() {
        let (mut modem, _) = modem(4);
        let mut out = [0i16; 4];
        let status = modem.decode(&[0, 0, 0, 0], &mut out);
        assert!(!status.sync);
        assert_eq!(status.snr, 0.0);
    }

    #[test]
    fn test_squelch_mutes_weak_blocks() {
        let (mut modem, _) = modem(4);
        modem.set_squelch_enabled(true);
        modem.set_squelch_threshold(10.0);

        // Weak but non-silent block: sync holds, squelch mutes.
        let weak = [40i16, -40, 40, -40];
        let mut out = [0i16; 4];
        let status = modem.decode(&weak, &mut out);
        assert!(status.sync);
        assert_eq!(out, [0, 0, 0, 0]);
    }
}
