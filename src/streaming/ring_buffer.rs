//! Sample ring buffer shared between the producer thread and the audio
//! callback.
//!
//! One producer (the synth render loop) and one consumer (the device source)
//! operate concurrently. Storage sits behind a `parking_lot` mutex; read and
//! write positions are atomics so availability checks stay lock-free.
//! Capacity is rounded to a power of two and one slot is kept free to
//! distinguish full from empty.

use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest allowed allocation: 512 MB of f32 samples.
const MAX_CAPACITY: usize = 512 * 1024 * 1024 / std::mem::size_of::<f32>();

/// Fixed-capacity circular sample buffer.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Mutex<Vec<f32>>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    capacity: usize,
    /// `pos & mask == pos % capacity`
    mask: usize,
}

impl RingBuffer {
    /// Create a ring buffer holding at least `requested_capacity` samples.
    ///
    /// # Errors
    /// Rejects zero capacity and capacities beyond the 512 MB safety cap.
    pub fn new(requested_capacity: usize) -> Result<Self> {
        if requested_capacity == 0 {
            return Err(crate::PolygonomeError::ConfigError(
                "ring buffer capacity must be greater than 0".into(),
            ));
        }
        let capacity = requested_capacity.next_power_of_two();
        if capacity > MAX_CAPACITY {
            return Err(crate::PolygonomeError::ConfigError(format!(
                "ring buffer capacity {capacity} exceeds maximum safe size {MAX_CAPACITY}"
            )));
        }

        Ok(RingBuffer {
            buffer: Mutex::new(vec![0.0; capacity]),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Actual (power-of-two) capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples available to read without blocking.
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        if write >= read {
            write - read
        } else {
            self.capacity - (read - write)
        }
    }

    /// Write samples (producer side). Returns how many were accepted;
    /// 0 means the buffer is full.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut buf = self.buffer.lock();

        // Compute free space under the lock so the consumer can't race us
        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = if write_pos >= read_pos {
            self.capacity - (write_pos - read_pos) - 1
        } else {
            (read_pos - write_pos) - 1
        };

        let to_write = samples.len().min(available);
        if to_write == 0 {
            return 0;
        }

        let write_idx = write_pos & self.mask;
        if write_idx + to_write <= self.capacity {
            buf[write_idx..write_idx + to_write].copy_from_slice(&samples[..to_write]);
        } else {
            // Wrap-around copy in two pieces
            let first = self.capacity - write_idx;
            buf[write_idx..].copy_from_slice(&samples[..first]);
            buf[..to_write - first].copy_from_slice(&samples[first..to_write]);
        }
        drop(buf);

        self.write_pos
            .store(write_pos + to_write, Ordering::Release);
        to_write
    }

    /// Read samples (consumer side). Returns how many were copied into
    /// `dest`; 0 means the buffer is empty.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let buf = self.buffer.lock();

        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = if write_pos >= read_pos {
            write_pos - read_pos
        } else {
            self.capacity - (read_pos - write_pos)
        };

        let to_read = dest.len().min(available);
        if to_read == 0 {
            return 0;
        }

        let read_idx = read_pos & self.mask;
        if read_idx + to_read <= self.capacity {
            dest[..to_read].copy_from_slice(&buf[read_idx..read_idx + to_read]);
        } else {
            let first = self.capacity - read_idx;
            dest[..first].copy_from_slice(&buf[read_idx..]);
            dest[first..to_read].copy_from_slice(&buf[..to_read - first]);
        }
        drop(buf);

        self.read_pos.store(read_pos + to_read, Ordering::Release);
        to_read
    }

    /// Discard all pending samples.
    pub fn flush(&self) {
        let write_pos = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(write_pos, Ordering::Release);
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.available_read() == 0
    }

    /// Fill level from 0.0 (empty) to ~1.0 (full).
    pub fn fill_percentage(&self) -> f32 {
        (self.available_read() as f32) / (self.capacity as f32)
    }
}
