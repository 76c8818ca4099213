//! Streaming engine
//!
//! Ties the shared synth, the stream writer and the audio device together:
//! a producer thread renders batches from the synth and pushes them into the
//! ring buffer for as long as the engine runs. Constructed lazily on the
//! first play action; construction failure means "no audio", never a crash.

use super::{AudioDevice, StreamConfig, StreamStats, StreamWriter, PRODUCER_BATCH_SIZE};
use crate::synth::{ChannelEmitter, PolySynth};
use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Running audio output: shared synth, producer thread and device.
pub struct AudioEngine {
    synth: Arc<Mutex<PolySynth>>,
    writer: Arc<StreamWriter>,
    device: AudioDevice,
    running: Arc<AtomicBool>,
    producer: Option<std::thread::JoinHandle<()>>,
}

impl AudioEngine {
    /// Open the audio device and start the producer thread.
    pub fn start(config: StreamConfig) -> Result<Self> {
        let writer = Arc::new(StreamWriter::new(config)?);
        let device = AudioDevice::new(config.sample_rate, config.channels, writer.buffer())?;

        let synth = Arc::new(Mutex::new(PolySynth::new(config.sample_rate)));
        let running = Arc::new(AtomicBool::new(true));

        let producer = {
            let synth = Arc::clone(&synth);
            let writer = Arc::clone(&writer);
            let running = Arc::clone(&running);
            std::thread::spawn(move || run_producer_loop(synth, writer, running))
        };

        Ok(AudioEngine {
            synth,
            writer,
            device,
            running,
            producer: Some(producer),
        })
    }

    /// Emitter handle that triggers voices into the shared synth.
    pub fn emitter(&self) -> ChannelEmitter {
        ChannelEmitter::new(Arc::clone(&self.synth))
    }

    /// Set the master volume (0.0 to 1.0).
    pub fn set_volume(&self, volume: f32) {
        self.synth.lock().set_volume(volume);
    }

    /// Decaying peak level of recent output, for the level gauge.
    pub fn peak(&self) -> f32 {
        self.synth.lock().peak()
    }

    /// Stream statistics so far.
    pub fn stats(&self) -> StreamStats {
        self.writer.stats()
    }

    /// Stop the producer thread, release the device and print the post-run
    /// statistics line.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.producer.take() {
            handle
                .join()
                .expect("producer thread panicked during shutdown");
        }
        self.device.finish();
        let stats = self.writer.stats();
        println!(
            "Playback complete: {} samples, {} overruns",
            stats.samples_written, stats.overrun_count
        );
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        // Safety net for non-shutdown drops (e.g. unwinds)
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
        self.device.finish();
    }
}

/// Render batches from the synth into the stream until shutdown.
///
/// Pacing comes from the ring buffer itself: `write_blocking` applies
/// backpressure once the buffer is full, so the loop settles at the
/// device's consumption rate. A silent synth renders zeros, which keeps
/// the stream warm while the sequencer is paused.
fn run_producer_loop(
    synth: Arc<Mutex<PolySynth>>,
    writer: Arc<StreamWriter>,
    running: Arc<AtomicBool>,
) {
    let mut batch = [0.0f32; PRODUCER_BATCH_SIZE];
    while running.load(Ordering::Relaxed) {
        synth.lock().render(&mut batch);
        writer.write_blocking(&batch);
    }
}
