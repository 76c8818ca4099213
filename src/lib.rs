//! Polygon rhythm sequencer
//!
//! A marker travels along the edges of a regular polygon at a configurable
//! tempo (edges per minute) and sounds a synthesized tone each time it enters
//! a new edge. Every vertex carries a user-editable note assignment, so the
//! polygon acts as a small step sequencer whose step count is its vertex count.
//!
//! # Features
//! - Pure polygon geometry with viewport fitting
//! - Note name resolution (note names, enharmonic aliases, raw frequencies)
//! - Deterministic edge clock driven by injected timestamps
//! - Polyphonic sine synth with exponential attack/decay envelopes
//! - Offline WAV rendering with optional CSV trigger log
//!
//! # Crate feature flags
//! - `visualization` (default): Interactive ratatui terminal UI (`tui`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Drive a session with synthetic timestamps
//! ```
//! use polygonome::{Session, Viewport};
//! let mut session = Session::new(4, 120, Viewport::new(200.0, 200.0));
//! session.play();
//! if let Some(event) = session.tick(0.0) {
//!     println!("edge {} -> {} ({:.1} Hz)", event.edge, event.note, event.frequency);
//! }
//! ```
//!
//! ## Render a few loops to WAV
//! ```no_run
//! use polygonome::{render_to_wav, RenderConfig, Session, Viewport};
//! let mut session = Session::new(6, 240, Viewport::new(200.0, 200.0));
//! let summary = render_to_wav(&mut session, "loops.wav", RenderConfig::default()).unwrap();
//! println!("{} samples, {} triggers", summary.samples, summary.triggers);
//! ```

#![warn(missing_docs)]

pub mod export; // Offline WAV/CSV rendering
pub mod geometry; // Polygon Geometry
pub mod notes; // Note Name Resolution
pub mod patch; // JSON Patch Configuration
pub mod sequencer; // Edge Clock & Session
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming
pub mod synth; // Tone Synthesis
#[cfg(feature = "visualization")]
pub mod tui; // Terminal UI

/// Error types for sequencer operations
#[derive(thiserror::Error, Debug)]
pub enum PolygonomeError {
    /// Error while parsing a patch file or note table
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error writing audio or trigger-log file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for PolygonomeError {
    /// Converts a String into `PolygonomeError::Other`.
    ///
    /// Convenience conversion for generic string errors. Prefer the specific
    /// variant constructors when the failure class is known:
    /// - `PolygonomeError::ParseError(msg)` for patch/note parsing failures
    /// - `PolygonomeError::ConfigError(msg)` for invalid configuration
    /// - `PolygonomeError::AudioFileError(msg)` for WAV/CSV output issues
    /// - `PolygonomeError::AudioDeviceError(msg)` for device initialization
    fn from(msg: String) -> Self {
        PolygonomeError::Other(msg)
    }
}

impl From<&str> for PolygonomeError {
    /// Converts a string slice into `PolygonomeError::Other`.
    fn from(msg: &str) -> Self {
        PolygonomeError::Other(msg.to_string())
    }
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, PolygonomeError>;

// Public API exports
pub use export::{render_to_wav, render_to_wav_with_log, RenderConfig, RenderSummary};
pub use geometry::{polygon_vertices, Polygon, Vertex, Viewport};
pub use notes::{default_note_table, frequency_to_note_label, resolve_note, PitchClass};
pub use patch::Patch;
pub use sequencer::{EdgeClock, PlaybackState, Session, TriggerEvent};
#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, AudioEngine, RingBuffer, StreamConfig, StreamWriter};
pub use synth::{ChannelEmitter, Envelope, NullEmitter, PolySynth, ToneEmitter};
