//! Rate bridging between the device stream and the modem engine.
//!
//! Input path: low-pass, keep every Nth sample, convert to fixed point,
//! queue.  When a full block is queued, one modem call runs.  Output path:
//! replicate each modem sample N times, low-pass, queue, and drain exactly
//! one device frame per callback (silence on underflow).  Nothing here
//! allocates or blocks; the queues are the only cross-cycle storage.

use std::sync::Arc;

use crate::config::{BridgeConfig, FilterConfig};
use crate::constants::{CLIP_LIMIT, FULL_SCALE, QUEUE_DEPTH_FACTOR};
use crate::error::{BridgeError, Result};
use crate::modem::ModemEngine;
use crate::signal_processing::{FilterKind, FilterSpec, FirCoefficients, FirFilter};

use super::link::LinkState;
use super::queue::SampleQueue;

/// Which way the modem runs this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Receive,
    Transmit,
}

/// Channel geometry of the device frames.
#[derive(Debug, Clone, Copy)]
pub struct ChannelLayout {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Index of the input channel the bridge reads.
    pub input_channel: usize,
}

pub struct SampleRateBridge {
    engine: Box<dyn ModemEngine>,
    link: Arc<LinkState>,

    dec_filter: FirFilter<f32>,
    int_filter: FirFilter<f32>,
    /// Device-rate samples per modem-rate sample.
    ratio: usize,
    /// Counts filtered samples between kept (decimated) ones.
    dec_ctr: usize,

    in_queue: SampleQueue,
    out_queue: SampleQueue,

    modem_in: Box<[i16]>,
    modem_out: Box<[i16]>,
}

impl SampleRateBridge {
    pub fn new(
        engine: Box<dyn ModemEngine>,
        link: Arc<LinkState>,
        config: &BridgeConfig,
    ) -> Result<Self> {
        if engine.modem_rate() != config.modem.sample_rate {
            return Err(BridgeError::Config(format!(
                "modem engine runs at {} Hz but the configuration says {} Hz",
                engine.modem_rate(),
                config.modem.sample_rate
            )));
        }
        let ratio = config.decimation_ratio()?;
        let dec_filter = Self::build_lowpass(&config.filter, config.audio.sample_rate)?;
        let int_filter = Self::build_lowpass(&config.filter, config.audio.sample_rate)?;

        let max_block = engine.max_block_len().max(1);
        let exchange = vec![0i16; max_block].into_boxed_slice();

        Ok(Self {
            engine,
            link,
            dec_filter,
            int_filter,
            ratio,
            dec_ctr: 0,
            // Hard capacities leave headroom past the per-cycle soft caps.
            in_queue: SampleQueue::with_capacity((QUEUE_DEPTH_FACTOR + 1) * max_block),
            out_queue: SampleQueue::with_capacity((QUEUE_DEPTH_FACTOR + 1) * max_block * ratio),
            modem_in: exchange.clone(),
            modem_out: exchange,
        })
    }

    fn build_lowpass(filter: &FilterConfig, sample_rate: u32) -> Result<FirFilter<f32>> {
        let spec = FilterSpec::single(
            FilterKind::LowPass,
            filter.taps,
            filter.cutoff_hz,
            sample_rate as f64,
            filter.window,
        )?;
        Ok(FirFilter::new(FirCoefficients::design(&spec)))
    }

    /// Run one full cycle: feed the frame in, exchange with the modem when a
    /// block is ready, and drain one frame out.
    pub fn process_frame(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        layout: ChannelLayout,
        direction: Direction,
    ) {
        if let Some((enabled, threshold)) = self.link.take_squelch_update() {
            self.engine.set_squelch_enabled(enabled);
            self.engine.set_squelch_threshold(threshold);
        }

        let nin = match direction {
            Direction::Receive => self.engine.rx_block_len(),
            Direction::Transmit => self.engine.speech_block_len(),
        }
        .min(self.modem_in.len())
        .max(1);

        self.feed_input(input, layout, nin);
        self.exchange(direction, nin);
        self.drain_output(output, layout);
    }

    /// Filter and decimate the designated input channel into the input
    /// queue.
    fn feed_input(&mut self, input: &[f32], layout: ChannelLayout, nin: usize) {
        let cap = QUEUE_DEPTH_FACTOR * nin;

        for frame in input.chunks_exact(layout.input_channels.max(1)) {
            let sample = frame[layout.input_channel.min(frame.len() - 1)];
            if sample.abs() >= CLIP_LIMIT {
                self.link.latch_clip();
            }

            let filtered = self.dec_filter.filter(sample);
            if filtered.abs() >= CLIP_LIMIT {
                self.link.latch_clip();
            }

            self.dec_ctr += 1;
            if self.dec_ctr == self.ratio {
                self.dec_ctr = 0;
                if self.in_queue.len() >= cap
                    || !self
                        .in_queue
                        .push((filtered * FULL_SCALE).clamp(-FULL_SCALE, FULL_SCALE) as i16)
                {
                    // Backpressure: newest samples lose.
                    self.link.count_input_drop();
                }
            }
        }
    }

    /// One modem call when a full input block is queued; skipped entirely
    /// otherwise.
    fn exchange(&mut self, direction: Direction, nin: usize) {
        if self.in_queue.len() < nin {
            log::trace!(
                "modem underflow: need {}, have {}",
                nin,
                self.in_queue.len()
            );
            return;
        }

        for slot in self.modem_in[..nin].iter_mut() {
            // Length was just checked.
            *slot = self.in_queue.pop().unwrap_or(0);
        }

        let nout = match direction {
            Direction::Receive => {
                let status = self
                    .engine
                    .decode(&self.modem_in[..nin], &mut self.modem_out);
                self.link.publish_stats(status.snr, status.sync);
                self.link.publish_freq_offset(self.engine.freq_offset());
                status.len
            }
            Direction::Transmit => self.engine.encode(&self.modem_in[..nin], &mut self.modem_out),
        };

        self.interpolate(nout);
    }

    /// Zero-order-hold upsample the modem output block through the
    /// smoothing filter into the output queue.
    fn interpolate(&mut self, nout: usize) {
        let cap = QUEUE_DEPTH_FACTOR * nout;

        for i in 0..nout.min(self.modem_out.len()) {
            if self.out_queue.len() > cap {
                self.link.count_output_drop();
                continue;
            }
            let sample = self.modem_out[i] as f32;
            for _ in 0..self.ratio {
                let smoothed = self.int_filter.filter(sample);
                if !self
                    .out_queue
                    .push(smoothed.clamp(-FULL_SCALE, FULL_SCALE) as i16)
                {
                    self.link.count_output_drop();
                }
            }
        }
    }

    /// Pop one device frame from the output queue into every output
    /// channel, or write silence when not enough is queued.
    fn drain_output(&mut self, output: &mut [f32], layout: ChannelLayout) {
        let channels = layout.output_channels.max(1);
        let frames = output.len() / channels;

        if self.out_queue.len() < frames {
            log::trace!(
                "output underflow: need {}, have {}",
                frames,
                self.out_queue.len()
            );
            output.fill(0.0);
            return;
        }

        for frame in output.chunks_exact_mut(channels) {
            let raw = self.out_queue.pop().unwrap_or(0);
            frame.fill(raw as f32 / FULL_SCALE);
        }
    }

    /// Device-rate samples currently waiting for the modem.
    pub fn input_backlog(&self) -> usize {
        self.in_queue.len()
    }

    /// Interpolated samples currently waiting for the device.
    pub fn output_backlog(&self) -> usize {
        self.out_queue.len()
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }
}
