//! Real-time audio output
//!
//! Streams synth output to the system audio device through a ring buffer:
//! a producer thread renders batches from the shared [`PolySynth`] and
//! writes them with backpressure, while the rodio-backed [`AudioDevice`]
//! pulls samples out on the audio callback side and emits silence on
//! underrun. The whole stack initializes lazily on the first play action;
//! if no device can be opened the app stays on the null emitter.
//!
//! [`PolySynth`]: crate::synth::PolySynth

mod audio_device;
mod engine;
mod realtime;
mod ring_buffer;

pub use audio_device::AudioDevice;
pub use engine::AudioEngine;
pub use realtime::{StreamStats, StreamWriter};
pub use ring_buffer::RingBuffer;

/// Backoff between producer retries when the ring buffer is full.
pub const BUFFER_BACKOFF_MICROS: u64 = 100;

/// Samples the producer renders per batch.
pub const PRODUCER_BATCH_SIZE: usize = 1024;

/// Configuration for streaming playback.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Ring buffer capacity in samples. Larger buffers add latency but
    /// tolerate scheduling hiccups better.
    pub ring_buffer_size: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: u16,
}

impl StreamConfig {
    /// Low-latency configuration: 4096 samples ≈ 93 ms at 44.1 kHz.
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 4096,
            sample_rate,
            channels: 1,
        }
    }

    /// Stability-first configuration: 16384 samples ≈ 372 ms at 44.1 kHz.
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 16384,
            sample_rate,
            channels: 1,
        }
    }

    /// Buffer latency in milliseconds.
    pub fn latency_ms(&self) -> f32 {
        ((self.ring_buffer_size as f32) / (self.sample_rate as f32)) * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::low_latency(crate::synth::DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_latency() {
        let config = StreamConfig::low_latency(44100);
        let latency = config.latency_ms();
        assert!(latency > 90.0 && latency < 95.0);

        let config = StreamConfig::stable(44100);
        assert!(config.latency_ms() > 300.0);
    }
}
