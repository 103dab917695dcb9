//! Full-duplex device session over cpal.
//!
//! One input and one output stream on the chosen device.  The input
//! callback forwards interleaved frames through a bounded channel; the
//! output callback pairs the next pending input frame with its buffer and
//! runs the injected [`FrameProcessor`].  The processor is handed in at
//! construction, so the transport carries no knowledge of the pipeline and
//! no user-data indirection.

use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::bridge::FrameProcessor;
use crate::config::AudioConfig;
use crate::error::{BridgeError, Result};

/// Input frames queued between the two stream callbacks.  Small: anything
/// deeper only adds latency, and the bridge has its own buffering.
const FRAME_CHANNEL_DEPTH: usize = 4;

/// Fixed set of preallocated frame buffers cycled between the two stream
/// callbacks.  The input callback takes a free buffer, copies the device
/// frame into it and sends it across; the output callback hands the buffer
/// back after processing.  Once the pool is primed neither callback
/// allocates.
#[derive(Clone)]
struct FramePool {
    free_tx: Sender<Vec<f32>>,
    free_rx: Receiver<Vec<f32>>,
}

impl FramePool {
    fn new(count: usize, capacity: usize) -> Self {
        let (free_tx, free_rx) = crossbeam_channel::bounded(count);
        for _ in 0..count {
            let _ = free_tx.try_send(Vec::with_capacity(capacity));
        }
        Self { free_tx, free_rx }
    }

    fn take(&self) -> Option<Vec<f32>> {
        self.free_rx.try_recv().ok()
    }

    fn give(&self, buffer: Vec<f32>) {
        let _ = self.free_tx.try_send(buffer);
    }
}

pub struct DuplexSession {
    input_stream: cpal::Stream,
    output_stream: cpal::Stream,
    _rt_handle: Option<RtPriorityHandle>,
}

impl DuplexSession {
    /// Open both streams and start processing.
    pub fn new(config: &AudioConfig, mut processor: FrameProcessor) -> Result<Self> {
        let host = cpal::default_host();
        let input_device = input_device(&host, config.device)?;
        let output_device = output_device(&host, config.device)?;

        match input_device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }
        match output_device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        let input_config = cpal::StreamConfig {
            channels: config.input_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };
        let output_config = cpal::StreamConfig {
            channels: config.output_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };

        let (tx, rx): (Sender<Vec<f32>>, Receiver<Vec<f32>>) =
            crossbeam_channel::bounded(FRAME_CHANNEL_DEPTH);
        // One buffer per channel slot plus one in flight.  An oversized
        // device frame grows its buffer once and the pool keeps it.
        let pool = FramePool::new(
            FRAME_CHANNEL_DEPTH + 1,
            config.buffer_size * config.input_channels as usize,
        );
        let input_pool = pool.clone();

        let input_stream = input_device
            .build_input_stream(
                &input_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // try_send: a slow consumer must never stall the device.
                    let mut frame = match input_pool.take() {
                        Some(frame) => frame,
                        None => {
                            log::trace!("input frame dropped, no free buffer");
                            return;
                        }
                    };
                    frame.clear();
                    frame.extend_from_slice(data);
                    if let Err(unsent) = tx.try_send(frame) {
                        log::trace!("input frame dropped, processor behind");
                        input_pool.give(unsent.into_inner());
                    }
                },
                |err| log::error!("Input stream error: {}", err),
                None,
            )
            .map_err(|e| BridgeError::AudioStream(format!("{}", e)))?;

        let output_stream = output_device
            .build_output_stream(
                &output_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    match rx.try_recv() {
                        Ok(input) => {
                            processor.process(&input, data);
                            pool.give(input);
                        }
                        // No input pending: run the pipeline with an empty
                        // frame so RX/TX still drain queued output.
                        Err(_) => processor.process(&[], data),
                    }
                },
                |err| log::error!("Output stream error: {}", err),
                None,
            )
            .map_err(|e| BridgeError::AudioStream(format!("{}", e)))?;

        // Attempt to promote to real-time priority
        let rt_handle = audio_thread_priority::promote_current_thread_to_real_time(
            config.buffer_size as u32,
            config.sample_rate,
        );
        let rt_handle = match rt_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        };

        input_stream
            .play()
            .map_err(|e| BridgeError::AudioStream(format!("{}", e)))?;
        output_stream
            .play()
            .map_err(|e| BridgeError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            input_stream,
            output_stream,
            _rt_handle: rt_handle,
        })
    }

    /// Halt both streams.  The callback in flight finishes; nothing else
    /// runs afterwards.
    pub fn stop(&self) {
        let _ = self.input_stream.pause();
        let _ = self.output_stream.pause();
    }
}

impl Drop for DuplexSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn input_device(host: &cpal::Host, index: Option<usize>) -> Result<cpal::Device> {
    match index {
        None => host
            .default_input_device()
            .ok_or_else(|| BridgeError::AudioDevice("No input device found".into())),
        Some(index) => host
            .input_devices()
            .map_err(|e| BridgeError::AudioDevice(format!("{}", e)))?
            .nth(index)
            .ok_or_else(|| BridgeError::AudioDevice(format!("No input device {}", index))),
    }
}

fn output_device(host: &cpal::Host, index: Option<usize>) -> Result<cpal::Device> {
    match index {
        None => host
            .default_output_device()
            .ok_or_else(|| BridgeError::AudioDevice("No output device found".into())),
        Some(index) => host
            .output_devices()
            .map_err(|e| BridgeError::AudioDevice(format!("{}", e)))?
            .nth(index)
            .ok_or_else(|| BridgeError::AudioDevice(format!("No output device {}", index))),
    }
}

/// Print the available devices, with the indices `--device` accepts.
pub fn list_devices() -> Result<()> {
    let host = cpal::default_host();

    println!("Input devices:");
    let inputs = host
        .input_devices()
        .map_err(|e| BridgeError::AudioDevice(format!("{}", e)))?;
    for (index, device) in inputs.enumerate() {
        match device.description() {
            Ok(desc) => println!("  {}: {:?}", index, desc),
            Err(_) => println!("  {}: Unknown", index),
        }
    }

    println!("Output devices:");
    let outputs = host
        .output_devices()
        .map_err(|e| BridgeError::AudioDevice(format!("{}", e)))?;
    for (index, device) in outputs.enumerate() {
        match device.description() {
            Ok(desc) => println!("  {}: {:?}", index, desc),
            Err(_) => println!("  {}: Unknown", index),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_exhausts_and_recycles() {
        let pool = FramePool::new(2, 64);
        let a = pool.take().unwrap();
        let b = pool.take().unwrap();
        assert!(pool.take().is_none());

        pool.give(a);
        assert!(pool.take().is_some());
        pool.give(b);
    }

    #[test]
    fn test_pool_buffers_keep_capacity() {
        // Filling within capacity must not reallocate, so a returned buffer
        // still holds its original capacity.
        let pool = FramePool::new(1, 64);
        let mut frame = pool.take().unwrap();
        let ptr = frame.as_ptr();
        frame.extend_from_slice(&[0.0; 64]);
        assert_eq!(frame.as_ptr(), ptr);

        pool.give(frame);
        let frame = pool.take().unwrap();
        assert!(frame.capacity() >= 64);
    }
}
