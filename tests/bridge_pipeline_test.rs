//! End-to-end pipeline tests: interleaved device frames through the frame
//! processor and loopback modem engine, driven the way the audio transport
//! and the command loop drive the real session.

use std::f32::consts::PI;
use std::sync::Arc;

use dvbridge::bridge::{
    ChannelLayout, FrameProcessor, LinkState, Mode, SampleRateBridge,
};
use dvbridge::config::BridgeConfig;
use dvbridge::control::{self, Response};
use dvbridge::modem::LoopbackModem;

const FRAME_LEN: usize = 480;
const BLOCK_LEN: usize = 80;

fn make_processor() -> (FrameProcessor, Arc<LinkState>) {
    let config = BridgeConfig::default();
    let link = Arc::new(LinkState::new(&config.squelch));
    let engine = Box::new(LoopbackModem::new(link.clone(), BLOCK_LEN));
    let bridge = SampleRateBridge::new(engine, link.clone(), &config).unwrap();
    let layout = ChannelLayout {
        input_channels: 2,
        output_channels: 2,
        input_channel: 0,
    };
    (FrameProcessor::new(bridge, link.clone(), layout), link)
}

/// Interleaved stereo frame carrying a sine on the left channel.
fn sine_frame(frame_index: usize, freq_hz: f32, amplitude: f32) -> Vec<f32> {
    let mut frame = vec![0.0f32; 2 * FRAME_LEN];
    for (j, samples) in frame.chunks_exact_mut(2).enumerate() {
        let t = (frame_index * FRAME_LEN + j) as f32 / 48000.0;
        samples[0] = amplitude * (2.0 * PI * freq_hz * t).sin();
        samples[1] = 0.0;
    }
    frame
}

fn left_rms(interleaved: &[f32]) -> f32 {
    let samples: Vec<f32> = interleaved.chunks_exact(2).map(|f| f[0]).collect();
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn rx_round_trip_preserves_signal_level() {
    let (mut processor, link) = make_processor();
    link.set_mode(Mode::Rx);

    // 400 Hz sits well inside the 2.8 kHz passband, so the decimation and
    // interpolation filters pass it at roughly unit gain and the loopback
    // engine copies it through: output level tracks input level.
    let mut tail_rms = 0.0;
    for i in 0..100 {
        let input = sine_frame(i, 400.0, 0.5);
        let mut output = vec![0.0f32; 2 * FRAME_LEN];
        processor.process(&input, &mut output);
        if i >= 50 {
            tail_rms += left_rms(&output);
        }
    }
    tail_rms /= 50.0;

    // Input RMS is 0.35; allow for stopband images the short filter leaves.
    assert!(
        (0.15..=0.6).contains(&tail_rms),
        "unexpected RX output level: rms = {}",
        tail_rms
    );
    assert!(link.sync(), "loopback decode should report sync");
    assert!(link.snr() != 0.0);
}

#[test]
fn rx_output_fans_out_to_both_channels() {
    let (mut processor, link) = make_processor();
    link.set_mode(Mode::Rx);

    let mut saw_signal = false;
    for i in 0..20 {
        let input = sine_frame(i, 400.0, 0.5);
        let mut output = vec![0.0f32; 2 * FRAME_LEN];
        processor.process(&input, &mut output);
        for frame in output.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
            if frame[0] != 0.0 {
                saw_signal = true;
            }
        }
    }
    assert!(saw_signal);
}

#[test]
fn mode_switching_mid_stream() {
    let (mut processor, link) = make_processor();

    // Default mode is mute.
    let input = sine_frame(0, 400.0, 0.5);
    let mut output = vec![1.0f32; 2 * FRAME_LEN];
    processor.process(&input, &mut output);
    assert!(output.iter().all(|&s| s == 0.0));

    // Pass copies the left input channel verbatim.
    link.set_mode(Mode::Pass);
    let mut output = vec![0.0f32; 2 * FRAME_LEN];
    processor.process(&input, &mut output);
    for (in_frame, out_frame) in input.chunks_exact(2).zip(output.chunks_exact(2)) {
        assert_eq!(out_frame[0], in_frame[0]);
        assert_eq!(out_frame[1], in_frame[0]);
    }

    // Back to mute: silent again, frame counter still running.
    link.set_mode(Mode::Mute);
    let mut output = vec![1.0f32; 2 * FRAME_LEN];
    processor.process(&input, &mut output);
    assert!(output.iter().all(|&s| s == 0.0));
    assert_eq!(link.frames(), 3);
}

#[test]
fn tx_services_text_and_protocol_channels() {
    let (mut processor, link) = make_processor();
    link.set_mode(Mode::Tx);
    link.set_text("HELLO");

    for i in 0..10 {
        let input = sine_frame(i, 400.0, 0.5);
        let mut output = vec![0.0f32; 2 * FRAME_LEN];
        processor.process(&input, &mut output);
    }

    // One encode per frame once the input queue fills: the engine pulled
    // text and protocol bytes along the way.
    assert!(link.protocol_calls() > 0);
}

#[test]
fn control_loop_drives_pipeline() {
    let (mut processor, link) = make_processor();

    assert_eq!(
        control::handle_line("MODE=RX", &link),
        Response::Line("OK:MODE=RX".into())
    );

    for i in 0..20 {
        let input = sine_frame(i, 400.0, 0.5);
        let mut output = vec![0.0f32; 2 * FRAME_LEN];
        processor.process(&input, &mut output);
    }

    assert_eq!(
        control::handle_line("SYNC", &link),
        Response::Line("OK:SYNC=1".into())
    );
    assert_eq!(
        control::handle_line("FRAMES", &link),
        Response::Line("OK:FRAMES=20".into())
    );
    match control::handle_line("SNR", &link) {
        Response::Line(reply) => assert!(reply.starts_with("OK:SNR=")),
        other => panic!("unexpected response: {:?}", other),
    }

    // A bad command must not disturb the stream state.
    assert_eq!(control::handle_line("MODE=99", &link), Response::Err);
    assert_eq!(
        control::handle_line("MODE", &link),
        Response::Line("OK:MODE=RX".into())
    );
}

#[test]
fn sustained_overdrive_is_survivable_and_latched() {
    let (mut processor, link) = make_processor();
    link.set_mode(Mode::Tx);

    // Full-scale input for a long stretch: clip latches, queues stay
    // bounded, nothing panics.
    let input: Vec<f32> = (0..2 * FRAME_LEN)
        .map(|j| if j % 2 == 0 { 0.99 } else { 0.0 })
        .collect();
    for _ in 0..50 {
        let mut output = vec![0.0f32; 2 * FRAME_LEN];
        processor.process(&input, &mut output);
    }

    assert!(control::handle_line("CLIP", &link) == Response::Line("OK:CLIP=1".into()));
    assert!(control::handle_line("CLIP", &link) == Response::Line("OK:CLIP=0".into()));
    assert!(processor.bridge().input_backlog() <= 10 * BLOCK_LEN);
}
