//! Producer-side stream writer
//!
//! Owns the ring buffer and pushes rendered batches into it with
//! backpressure, tracking samples written and overruns for the post-run
//! statistics line.

use super::{RingBuffer, StreamConfig, BUFFER_BACKOFF_MICROS};
use parking_lot::Mutex;
use std::sync::Arc;

/// Statistics for monitoring overruns and buffer health.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    /// Write attempts that hit a full buffer and had to back off
    pub overrun_count: usize,
    /// Samples pushed into the stream
    pub samples_written: usize,
    /// Buffer fill level at the last write
    pub fill_percentage: f32,
}

/// Writes synth output into the shared ring buffer.
pub struct StreamWriter {
    buffer: Arc<RingBuffer>,
    stats: Arc<Mutex<StreamStats>>,
    config: StreamConfig,
}

impl StreamWriter {
    /// Allocate the ring buffer for `config` and wrap it.
    pub fn new(config: StreamConfig) -> crate::Result<Self> {
        let buffer = Arc::new(RingBuffer::new(config.ring_buffer_size)?);
        Ok(StreamWriter {
            buffer,
            stats: Arc::new(Mutex::new(StreamStats::default())),
            config,
        })
    }

    /// Write samples with backpressure.
    ///
    /// Retries with a short backoff while the buffer is full, giving up
    /// after roughly 100 ms of no progress so shutdown can't deadlock.
    /// Returns the number of samples actually written.
    pub fn write_blocking(&self, samples: &[f32]) -> usize {
        const MAX_RETRIES: u32 = 1000; // ~100ms at 100µs backoff

        let mut total_written = 0;
        let mut remaining = samples;
        let mut retry_count = 0;

        while !remaining.is_empty() && retry_count < MAX_RETRIES {
            let written = self.buffer.write(remaining);

            {
                let mut stats = self.stats.lock();
                stats.samples_written += written;
                stats.fill_percentage = self.buffer.fill_percentage();
                if written == 0 {
                    stats.overrun_count += 1;
                }
            }

            total_written += written;

            if written == 0 {
                std::thread::sleep(std::time::Duration::from_micros(BUFFER_BACKOFF_MICROS));
                retry_count += 1;
            } else {
                remaining = &remaining[written..];
                retry_count = 0;
            }
        }

        total_written
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> StreamStats {
        *self.stats.lock()
    }

    /// Buffer fill level from 0.0 to ~1.0.
    pub fn fill_percentage(&self) -> f32 {
        self.buffer.fill_percentage()
    }

    /// Buffer latency in milliseconds.
    pub fn latency_ms(&self) -> f32 {
        self.config.latency_ms()
    }

    /// Shared handle to the ring buffer for the consuming audio device.
    pub fn buffer(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_updates_stats() {
        let writer = StreamWriter::new(StreamConfig::low_latency(44100)).unwrap();
        let written = writer.write_blocking(&[0.5; 256]);
        assert_eq!(written, 256);
        let stats = writer.stats();
        assert_eq!(stats.samples_written, 256);
        assert_eq!(stats.overrun_count, 0);
        assert!(stats.fill_percentage > 0.0);
    }

    #[test]
    fn test_full_buffer_gives_up_with_overruns() {
        let mut config = StreamConfig::low_latency(44100);
        config.ring_buffer_size = 64;
        let writer = StreamWriter::new(config).unwrap();
        // Capacity 64 with one slot reserved: 63 samples fit
        let written = writer.write_blocking(&[0.1; 128]);
        assert_eq!(written, 63);
        assert!(writer.stats().overrun_count > 0);
    }

    #[test]
    fn test_consumer_drains_through_shared_buffer() {
        let writer = StreamWriter::new(StreamConfig::low_latency(44100)).unwrap();
        writer.write_blocking(&[0.25; 100]);
        let buffer = writer.buffer();
        let mut dest = vec![0.0; 100];
        assert_eq!(buffer.read(&mut dest), 100);
        assert_eq!(dest, vec![0.25; 100]);
        assert_eq!(writer.fill_percentage(), 0.0);
    }
}
