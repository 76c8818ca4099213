//! Audio device integration using rodio
//!
//! Plays samples from the shared ring buffer to the system audio device.
//! The consuming source never ends on its own: an empty buffer yields
//! silence so the stream stays alive while the sequencer is paused, until
//! [`AudioDevice::finish`] signals shutdown.

use super::RingBuffer;
use crate::Result;
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Size of the source's internal batch buffer (reduces lock contention).
const SOURCE_BATCH: usize = 4096;

/// Audio source that drains the ring buffer.
struct RingBufferSource {
    ring_buffer: Arc<RingBuffer>,
    sample_rate: u32,
    channels: u16,
    finished: Arc<AtomicBool>,
    /// Internal batch buffer refilled from the ring buffer
    buffer: Vec<f32>,
    buffer_pos: usize,
}

impl RingBufferSource {
    fn new(
        ring_buffer: Arc<RingBuffer>,
        sample_rate: u32,
        channels: u16,
        finished: Arc<AtomicBool>,
    ) -> Self {
        RingBufferSource {
            ring_buffer,
            sample_rate,
            channels,
            finished,
            buffer: vec![0.0f32; SOURCE_BATCH],
            // Force a refill on the first pull
            buffer_pos: SOURCE_BATCH,
        }
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        let available = self.ring_buffer.available_read();
        if available > 0 {
            Some(available)
        } else {
            Some(SOURCE_BATCH)
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        // Open-ended stream
        None
    }
}

impl Iterator for RingBufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.buffer_pos >= self.buffer.len() {
            let read = self.ring_buffer.read(&mut self.buffer);
            self.buffer_pos = 0;
            if read == 0 {
                // Underrun: emit silence to keep the stream alive
                self.buffer.fill(0.0);
            } else if read < self.buffer.len() {
                self.buffer[read..].fill(0.0);
            }
        }

        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(sample)
    }
}

/// Audio playback device using rodio.
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start pulling from `ring_buffer`.
    ///
    /// Fails with [`AudioDeviceError`](crate::PolygonomeError::AudioDeviceError)
    /// when no output device is available; callers are expected to fall back
    /// to silent operation rather than abort.
    pub fn new(sample_rate: u32, channels: u16, ring_buffer: Arc<RingBuffer>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            crate::PolygonomeError::AudioDeviceError(format!("failed to create audio stream: {e}"))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            crate::PolygonomeError::AudioDeviceError(format!("failed to create audio sink: {e}"))
        })?;

        let finished = Arc::new(AtomicBool::new(false));
        let source =
            RingBufferSource::new(ring_buffer, sample_rate, channels, Arc::clone(&finished));
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Pause device-side playback.
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume device-side playback.
    pub fn play(&self) {
        self.sink.play();
    }

    /// Signal that no more samples will be produced, letting the stream
    /// terminate instead of playing silence forever.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.pause();
        self.finished.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(samples: &[f32]) -> Arc<RingBuffer> {
        let ring = Arc::new(RingBuffer::new(4096).expect("ring buffer"));
        ring.write(samples);
        ring
    }

    #[test]
    fn test_source_reports_format() {
        let source = RingBufferSource::new(
            ring_with(&[]),
            44100,
            1,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(source.sample_rate(), 44100);
        assert_eq!(source.channels(), 1);
        assert!(source.current_frame_len().is_some());
        assert_eq!(source.total_duration(), None);
    }

    #[test]
    fn test_source_silence_on_underrun() {
        let mut source = RingBufferSource::new(
            ring_with(&[]),
            44100,
            1,
            Arc::new(AtomicBool::new(false)),
        );
        // Empty ring buffer: stream stays alive and yields silence
        assert_eq!(source.next(), Some(0.0));
    }

    #[test]
    fn test_source_drains_then_pads_with_silence() {
        let mut source = RingBufferSource::new(
            ring_with(&[0.5, 0.25]),
            44100,
            1,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(source.next(), Some(0.5));
        assert_eq!(source.next(), Some(0.25));
        assert_eq!(source.next(), Some(0.0));
    }

    #[test]
    fn test_source_ends_on_finished_signal() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut source =
            RingBufferSource::new(ring_with(&[0.1; 8]), 44100, 1, Arc::clone(&finished));
        assert!(source.next().is_some());
        finished.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_device_creation_when_backend_available() {
        match AudioDevice::new(44100, 1, ring_with(&[])) {
            Ok(device) => {
                device.pause();
                device.play();
                device.finish();
            }
            Err(err) => {
                eprintln!("Skipping audio device test (backend unavailable): {err}");
            }
        }
    }
}
