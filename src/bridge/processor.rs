//! Per-frame mode dispatch.

use std::sync::Arc;

use super::link::LinkState;
use super::mode::Mode;
use super::rate_bridge::{ChannelLayout, Direction, SampleRateBridge};

/// Runs one audio frame through the path selected by the current mode.
///
/// Built once at session setup and handed to the audio transport as the
/// injected frame handler; the transport never needs to know what it does.
pub struct FrameProcessor {
    bridge: SampleRateBridge,
    link: Arc<LinkState>,
    layout: ChannelLayout,
}

impl FrameProcessor {
    pub fn new(bridge: SampleRateBridge, link: Arc<LinkState>, layout: ChannelLayout) -> Self {
        Self {
            bridge,
            link,
            layout,
        }
    }

    /// Process one interleaved input frame into one interleaved output
    /// frame.  `input` may be empty (transport hiccup); RX/TX still drain
    /// queued output in that case.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        self.link.increment_frames();

        match self.link.mode() {
            Mode::Mute => output.fill(0.0),
            Mode::Pass => self.pass_through(input, output),
            Mode::Rx => {
                self.bridge
                    .process_frame(input, output, self.layout, Direction::Receive)
            }
            Mode::Tx => {
                self.bridge
                    .process_frame(input, output, self.layout, Direction::Transmit)
            }
        }
    }

    /// Copy the designated input channel to every output channel,
    /// unfiltered.
    fn pass_through(&self, input: &[f32], output: &mut [f32]) {
        output.fill(0.0);
        let in_ch = self.layout.input_channels.max(1);
        let out_ch = self.layout.output_channels.max(1);

        for (in_frame, out_frame) in input
            .chunks_exact(in_ch)
            .zip(output.chunks_exact_mut(out_ch))
        {
            out_frame.fill(in_frame[self.layout.input_channel.min(in_ch - 1)]);
        }
    }

    pub fn link(&self) -> &Arc<LinkState> {
        &self.link
    }

    pub fn bridge(&self) -> &SampleRateBridge {
        &self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BridgeConfig, SquelchConfig};
    use crate::modem::LoopbackModem;

    fn processor(block: usize) -> (FrameProcessor, Arc<LinkState>) {
        let config = BridgeConfig::default();
        let link = Arc::new(LinkState::new(&SquelchConfig::default()));
        let engine = Box::new(LoopbackModem::new(link.clone(), block));
        let bridge = SampleRateBridge::new(engine, link.clone(), &config).unwrap();
        let layout = ChannelLayout {
            input_channels: 2,
            output_channels: 2,
            input_channel: 0,
        };
        (FrameProcessor::new(bridge, link.clone(), layout), link)
    }

    #[test]
    fn test_mute_zeroes_output() {
        let (mut proc, link) = processor(320);
        link.set_mode(Mode::Mute);
        let input = vec![0.7f32; 2 * 32];
        let mut output = vec![1.0f32; 2 * 32];
        proc.process(&input, &mut output);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_pass_copies_input_channel_to_all_outputs() {
        let (mut proc, link) = processor(320);
        link.set_mode(Mode::Pass);

        // Distinct channels: left ramp, right constant.
        let mut input = vec![0.0f32; 2 * 16];
        for (i, frame) in input.chunks_exact_mut(2).enumerate() {
            frame[0] = i as f32 / 16.0;
            frame[1] = 0.9;
        }
        let mut output = vec![0.0f32; 2 * 16];
        proc.process(&input, &mut output);

        for (i, frame) in output.chunks_exact(2).enumerate() {
            let expected = i as f32 / 16.0;
            assert_eq!(frame[0], expected);
            assert_eq!(frame[1], expected);
        }
    }

    #[test]
    fn test_frame_counter_increments_every_mode() {
        let (mut proc, link) = processor(320);
        let input = vec![0.0f32; 2 * 8];
        let mut output = vec![0.0f32; 2 * 8];
        for mode in [Mode::Mute, Mode::Pass, Mode::Rx, Mode::Tx] {
            link.set_mode(mode);
            proc.process(&input, &mut output);
        }
        assert_eq!(link.frames(), 4);
    }

    #[test]
    fn test_empty_input_keeps_output_sane() {
        let (mut proc, link) = processor(8);
        link.set_mode(Mode::Rx);
        let mut output = vec![1.0f32; 2 * 8];
        proc.process(&[], &mut output);
        // Queue is empty, so underflow silence.
        assert!(output.iter().all(|&s| s == 0.0));
    }
}
