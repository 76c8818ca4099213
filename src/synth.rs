//! Tone synthesis
//!
//! A small polyphonic sine synth. Each trigger starts an independent voice
//! shaped by an exponential attack/decay [`Envelope`]; voices mix additively
//! and overlapping tones are permitted by design, so rapid edge traversal
//! stacks tones instead of cutting them off. Emission is fire-and-forget
//! through the [`ToneEmitter`] capability trait, which lets tests record
//! calls and lets the app run without any audio backend at all.

use parking_lot::Mutex;
use std::f32::consts::PI;
use std::sync::Arc;

/// Default output sample rate (44.1 kHz).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Upper bound on simultaneously sounding voices. The oldest voice is
/// dropped when a trigger would exceed it.
pub const MAX_VOICES: usize = 32;

/// Near-silence floor the exponential ramps start and end at.
const ENVELOPE_FLOOR: f32 = 1e-4;

/// Exponential attack/decay amplitude envelope.
///
/// Mirrors a WebAudio-style `exponentialRampToValueAtTime` pair: the level
/// ramps from near-silence to `peak` over the attack, decays back to
/// near-silence over the decay, and the voice is culled at `total_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Peak amplitude reached at the end of the attack
    pub peak: f32,
    /// Attack length in milliseconds
    pub attack_ms: f64,
    /// Decay length in milliseconds, starting where the attack ends
    pub decay_ms: f64,
    /// Total voice lifetime in milliseconds
    pub total_ms: f64,
}

impl Default for Envelope {
    /// The stock pluck: 10 ms attack to 0.35, 340 ms decay, culled at 400 ms.
    fn default() -> Self {
        Envelope {
            peak: 0.35,
            attack_ms: 10.0,
            decay_ms: 340.0,
            total_ms: 400.0,
        }
    }
}

impl Envelope {
    /// Amplitude at `t_ms` milliseconds after the trigger.
    pub fn amplitude(&self, t_ms: f64) -> f32 {
        if t_ms < 0.0 || t_ms >= self.total_ms {
            return 0.0;
        }
        if t_ms < self.attack_ms {
            let frac = (t_ms / self.attack_ms) as f32;
            ENVELOPE_FLOOR * (self.peak / ENVELOPE_FLOOR).powf(frac)
        } else if t_ms < self.attack_ms + self.decay_ms {
            let frac = ((t_ms - self.attack_ms) / self.decay_ms) as f32;
            self.peak * (ENVELOPE_FLOOR / self.peak).powf(frac)
        } else {
            ENVELOPE_FLOOR
        }
    }

    /// True once the voice should be culled.
    pub fn is_finished(&self, t_ms: f64) -> bool {
        t_ms >= self.total_ms
    }
}

/// One sounding tone: a phase-accumulator sine shaped by its envelope.
#[derive(Debug, Clone)]
struct Voice {
    phase: f32,
    phase_inc: f32,
    clock_ms: f64,
    ms_per_sample: f64,
    envelope: Envelope,
}

impl Voice {
    fn new(frequency: f64, envelope: Envelope, sample_rate: u32) -> Self {
        let freq = frequency.max(0.0) as f32;
        Voice {
            phase: 0.0,
            phase_inc: 2.0 * PI * freq / sample_rate as f32,
            clock_ms: 0.0,
            ms_per_sample: 1000.0 / sample_rate as f64,
            envelope,
        }
    }

    fn advance(&mut self) -> f32 {
        let amp = self.envelope.amplitude(self.clock_ms);
        self.clock_ms += self.ms_per_sample;
        self.phase += self.phase_inc;
        if self.phase > 2.0 * PI {
            self.phase -= 2.0 * PI;
        }
        self.phase.sin() * amp
    }

    fn is_finished(&self) -> bool {
        self.envelope.is_finished(self.clock_ms)
    }
}

/// Additively mixed bank of sine voices.
///
/// Output is clamped to ±1.0 after the master volume. A decaying peak meter
/// feeds the level gauge in the terminal UI.
#[derive(Debug)]
pub struct PolySynth {
    voices: Vec<Voice>,
    sample_rate: u32,
    master_volume: f32,
    peak: f32,
}

impl PolySynth {
    /// Create a silent synth at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        PolySynth {
            voices: Vec::new(),
            sample_rate,
            master_volume: 1.0,
            peak: 0.0,
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start a new voice. Drops the oldest voice beyond [`MAX_VOICES`].
    pub fn trigger(&mut self, frequency: f64, envelope: Envelope) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices
            .push(Voice::new(frequency, envelope, self.sample_rate));
    }

    /// Number of currently sounding voices.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Set the master volume, clamped to [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Current master volume.
    pub fn volume(&self) -> f32 {
        self.master_volume
    }

    /// Decaying peak level of recent output, for metering.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Render the next batch of samples into `out`, advancing all voices and
    /// culling finished ones.
    pub fn render(&mut self, out: &mut [f32]) {
        // Let the meter fall between batches
        self.peak *= 0.8;
        for slot in out.iter_mut() {
            let mut mixed = 0.0f32;
            for voice in self.voices.iter_mut() {
                mixed += voice.advance();
            }
            let sample = (mixed * self.master_volume).clamp(-1.0, 1.0);
            if sample.abs() > self.peak {
                self.peak = sample.abs();
            }
            *slot = sample;
        }
        self.voices.retain(|v| !v.is_finished());
    }
}

/// Fire-and-forget tone emission capability.
///
/// `play` schedules an envelope and returns immediately; nothing waits for
/// the tone to finish and in-flight tones cannot be cancelled.
pub trait ToneEmitter {
    /// Schedule a tone at `frequency` Hz shaped by `envelope`.
    fn play(&mut self, frequency: f64, envelope: Envelope);
}

/// Emitter used when no audio backend is initialized: silently discards.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmitter;

impl ToneEmitter for NullEmitter {
    fn play(&mut self, _frequency: f64, _envelope: Envelope) {}
}

/// Emitter that triggers voices into a shared [`PolySynth`] while another
/// thread renders from it.
#[derive(Clone)]
pub struct ChannelEmitter {
    synth: Arc<Mutex<PolySynth>>,
}

impl ChannelEmitter {
    /// Wrap a shared synth.
    pub fn new(synth: Arc<Mutex<PolySynth>>) -> Self {
        ChannelEmitter { synth }
    }
}

impl ToneEmitter for ChannelEmitter {
    fn play(&mut self, frequency: f64, envelope: Envelope) {
        self.synth.lock().trigger(frequency, envelope);
    }
}
