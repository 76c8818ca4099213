//! Offline rendering
//!
//! Renders full loops of the polygon to a 16-bit WAV file by stepping the
//! same [`Session`] logic the interactive player uses, so triggers land
//! sample-accurately on the edge grid. Optionally writes a CSV trigger log
//! (time, edge, note, frequency) for inspecting the timing grid. This path
//! needs neither a terminal nor an audio device.

use crate::sequencer::Session;
use crate::synth::{Envelope, PolySynth, DEFAULT_SAMPLE_RATE};
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Configuration for offline rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Number of full traversals of the polygon to render
    pub loops: u32,
    /// Scale the output so the loudest sample hits full scale
    pub normalize: bool,
    /// Fade-out length in seconds applied to the tail (0 disables)
    pub fade_out_duration: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            loops: 4,
            normalize: false,
            fade_out_duration: 0.0,
        }
    }
}

impl RenderConfig {
    /// Stereo output (both channels carry the same signal).
    pub fn stereo() -> Self {
        RenderConfig {
            channels: 2,
            ..Default::default()
        }
    }

    /// Set the number of loops to render.
    pub fn loops(mut self, loops: u32) -> Self {
        self.loops = loops.max(1);
        self
    }

    /// Enable or disable peak normalization.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the fade-out length in seconds.
    pub fn fade_out(mut self, seconds: f32) -> Self {
        self.fade_out_duration = seconds.max(0.0);
        self
    }

    /// Set the output sample rate.
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate.max(1);
        self
    }
}

/// One row of the CSV trigger log.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerRecord {
    /// Trigger time in milliseconds from the start of the render
    pub time_ms: f64,
    /// Edge that was entered
    pub edge: usize,
    /// Note text at trigger time
    pub note: String,
    /// Resolved frequency in Hz
    pub frequency: f64,
}

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    /// Mono sample frames rendered (per channel)
    pub samples: usize,
    /// Trigger events fired
    pub triggers: usize,
    /// Rendered duration in seconds
    pub duration_secs: f32,
}

/// Render `config.loops` traversals of the session's polygon to a WAV file.
///
/// The session is reset before and after the render.
pub fn render_to_wav<P: AsRef<Path>>(
    session: &mut Session,
    output_path: P,
    config: RenderConfig,
) -> Result<RenderSummary> {
    render_to_wav_with_log(session, output_path, None::<&Path>, config)
}

/// Render to WAV and optionally write a CSV trigger log alongside.
pub fn render_to_wav_with_log<P: AsRef<Path>, Q: AsRef<Path>>(
    session: &mut Session,
    output_path: P,
    log_path: Option<Q>,
    config: RenderConfig,
) -> Result<RenderSummary> {
    session.reset();
    session.play();

    let rate = config.sample_rate;
    let ms_per_edge = session.ms_per_edge();
    // Whole samples per edge keeps every edge the same length on disk
    let samples_per_edge = ((ms_per_edge * rate as f64) / 1000.0).round().max(1.0) as usize;
    let edges_total = config.loops as usize * session.sides();

    let mut synth = PolySynth::new(rate);
    let mut samples = vec![0.0f32; edges_total * samples_per_edge];
    let mut records: Vec<TriggerRecord> = Vec::with_capacity(edges_total);

    for g in 0..edges_total {
        // The first tick anchors the timeline at zero; later ticks sample the
        // middle of each edge, since a tick exactly on the boundary can land a
        // float ulp short of it and recompute the previous edge
        let t = if g == 0 {
            0.0
        } else {
            (g as f64 + 0.5) * ms_per_edge
        };
        if let Some(event) = session.tick(t) {
            records.push(TriggerRecord {
                time_ms: g as f64 * ms_per_edge,
                edge: event.edge,
                note: event.note.clone(),
                frequency: event.frequency,
            });
            if !event.muted {
                synth.trigger(event.frequency, Envelope::default());
            }
        }
        let start = g * samples_per_edge;
        synth.render(&mut samples[start..start + samples_per_edge]);
    }
    session.reset();

    if config.normalize {
        normalize_samples(&mut samples);
    }
    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, config.fade_out_duration, rate);
    }

    let frames = samples.len();
    let final_samples = if config.channels == 2 {
        mono_to_stereo(&samples)
    } else {
        samples
    };
    write_wav_file(output_path.as_ref(), &final_samples, rate, config.channels)?;

    if let Some(path) = log_path {
        write_trigger_log(path.as_ref(), &records)?;
    }

    Ok(RenderSummary {
        samples: frames,
        triggers: records.len(),
        duration_secs: frames as f32 / rate as f32,
    })
}

/// Scale samples so the loudest peak hits full scale. Silence is untouched.
fn normalize_samples(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |p, s| p.max(s.abs()));
    if peak > 0.0 {
        let gain = 1.0 / peak;
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Linear fade over the last `duration` seconds.
fn apply_fade_out(samples: &mut [f32], duration: f32, sample_rate: u32) {
    let fade_len = ((duration * sample_rate as f32) as usize).min(samples.len());
    if fade_len == 0 {
        return;
    }
    let start = samples.len() - fade_len;
    for (i, sample) in samples[start..].iter_mut().enumerate() {
        let gain = 1.0 - (i as f32 + 1.0) / fade_len as f32;
        *sample *= gain;
    }
}

/// Convert mono samples to stereo (duplicate each sample).
fn mono_to_stereo(mono: &[f32]) -> Vec<f32> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        stereo.push(sample);
        stereo.push(sample);
    }
    stereo
}

/// Write samples to a 16-bit WAV file.
fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| crate::PolygonomeError::AudioFileError(format!("create WAV: {e}")))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| crate::PolygonomeError::AudioFileError(format!("write sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| crate::PolygonomeError::AudioFileError(format!("finalize WAV: {e}")))?;

    Ok(())
}

/// Write the trigger log as CSV with a header row.
fn write_trigger_log(path: &Path, records: &[TriggerRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| crate::PolygonomeError::AudioFileError(format!("create trigger log: {e}")))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| crate::PolygonomeError::AudioFileError(format!("write trigger log: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| crate::PolygonomeError::AudioFileError(format!("flush trigger log: {e}")))?;
    Ok(())
}
