//! Playback session
//!
//! The single context object the front-ends drive: polygon, note table, mute
//! flags, tempo and the edge clock live here, with no ambient globals. One
//! [`Session::tick`] per frame advances the clock and runs the edge-trigger
//! watcher, so rendering and triggering always observe the same snapshot.

use crate::geometry::{Polygon, Vertex, Viewport, MIN_SIDES};
use crate::notes::{self, default_note_table};
use crate::sequencer::{EdgeClock, PlaybackState};

/// Fired once each time playback enters a new edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    /// Edge that was entered (index of its start vertex)
    pub edge: usize,
    /// Note text of the start vertex, trimmed, as read at trigger time
    pub note: String,
    /// Resolved frequency in Hz
    pub frequency: f64,
    /// Whether the vertex is muted; muted events still update the display
    /// but must not reach the tone emitter
    pub muted: bool,
}

/// Owns all mutable sequencer state and exposes the transport surface.
///
/// Time is injected: callers pass a monotonic millisecond timestamp into
/// [`tick`](Self::tick). Note text is re-read from the table at trigger time,
/// so edits during playback are picked up by the next trigger.
#[derive(Debug, Clone)]
pub struct Session {
    viewport: Viewport,
    polygon: Polygon,
    sides: usize,
    notes: Vec<String>,
    mutes: Vec<bool>,
    clock: EdgeClock,
    /// Edge the watcher last fired for; `None` is the invalid sentinel that
    /// makes the first playing tick always fire.
    last_triggered: Option<usize>,
    current_note: Option<String>,
}

impl Session {
    /// Create a stopped session with default note assignments.
    /// `sides` is clamped to 3 and `tempo` to 1.
    pub fn new(sides: usize, tempo: u32, viewport: Viewport) -> Self {
        let sides = sides.max(MIN_SIDES);
        Session {
            viewport,
            polygon: viewport.fit_polygon(sides),
            sides,
            notes: default_note_table(sides),
            mutes: vec![false; sides],
            clock: EdgeClock::new(sides, tempo),
            last_triggered: None,
            current_note: None,
        }
    }

    /// Engage playback. Resumes from the frozen position when paused.
    pub fn play(&mut self) {
        self.clock.play();
    }

    /// Freeze the clock at its last computed values.
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Stop and zero the clock, clear the trigger sentinel and the
    /// current-note display. Idempotent.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.last_triggered = None;
        self.current_note = None;
    }

    /// Toggle between Playing and Paused (Stopped counts as paused).
    pub fn toggle_playback(&mut self) {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Change the vertex count. Rebuilds the polygon and the default note
    /// table and forces a full reset. No-op if the count is unchanged.
    pub fn set_shape(&mut self, sides: usize) {
        let sides = sides.max(MIN_SIDES);
        if sides == self.sides {
            return;
        }
        self.sides = sides;
        self.polygon = self.viewport.fit_polygon(sides);
        self.notes = default_note_table(sides);
        self.mutes = vec![false; sides];
        self.clock.set_edge_count(sides);
        self.reset();
    }

    /// Change the tempo (edges per minute). Effective on the next tick;
    /// playback position is preserved.
    pub fn set_tempo(&mut self, tempo: u32) {
        self.clock.set_tempo(tempo);
    }

    /// Refit the polygon to a new viewport, preserving vertex count, note
    /// table and playback state.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
        self.polygon = self.viewport.fit_polygon(self.sides);
    }

    /// Replace the note text of vertex `i`. Ignored for out-of-range indices.
    pub fn set_note(&mut self, i: usize, text: impl Into<String>) {
        if let Some(slot) = self.notes.get_mut(i) {
            *slot = text.into();
        }
    }

    /// Replace the leading note assignments from `seed`, leaving the rest of
    /// the table at its defaults.
    pub fn seed_notes(&mut self, seed: &[String]) {
        for (slot, text) in self.notes.iter_mut().zip(seed) {
            *slot = text.clone();
        }
    }

    /// Note text of vertex `i`, or an empty string out of range.
    pub fn note(&self, i: usize) -> &str {
        self.notes.get(i).map(String::as_str).unwrap_or("")
    }

    /// Toggle the mute flag of vertex `i`.
    pub fn toggle_mute(&mut self, i: usize) {
        if let Some(m) = self.mutes.get_mut(i) {
            *m = !*m;
        }
    }

    /// Whether vertex `i` is muted.
    pub fn is_muted(&self, i: usize) -> bool {
        self.mutes.get(i).copied().unwrap_or(false)
    }

    /// Advance to `now_ms` and run the edge-trigger watcher.
    ///
    /// Returns `Some` exactly once per edge entry while playing. While not
    /// playing the sentinel is cleared on every tick, so re-entering Playing
    /// always fires the current edge again.
    pub fn tick(&mut self, now_ms: f64) -> Option<TriggerEvent> {
        self.clock.tick(now_ms);

        if !self.clock.is_playing() {
            self.last_triggered = None;
            return None;
        }

        let edge = self.clock.edge_index();
        if self.last_triggered == Some(edge) {
            return None;
        }
        self.last_triggered = Some(edge);

        let note = self.note(edge).trim().to_string();
        let frequency = notes::resolve_note(&note);
        self.current_note = Some(note.clone());

        Some(TriggerEvent {
            edge,
            note,
            frequency,
            muted: self.is_muted(edge),
        })
    }

    /// The fitted polygon.
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Vertex count.
    pub fn sides(&self) -> usize {
        self.sides
    }

    /// Tempo in edges per minute.
    pub fn tempo(&self) -> u32 {
        self.clock.tempo()
    }

    /// Milliseconds the marker spends on one edge.
    pub fn ms_per_edge(&self) -> f64 {
        self.clock.ms_per_edge()
    }

    /// Transport state.
    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    /// True while the clock advances.
    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Elapsed playback time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    /// Index of the active edge.
    pub fn edge_index(&self) -> usize {
        self.clock.edge_index()
    }

    /// Fractional position along the active edge.
    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    /// Interpolated marker position on the active edge.
    pub fn marker(&self) -> Vertex {
        self.polygon
            .point_on_edge(self.clock.edge_index(), self.clock.position())
    }

    /// Note text shown in the "current note" display, if any trigger fired
    /// since the last reset.
    pub fn current_note(&self) -> Option<&str> {
        self.current_note.as_deref()
    }
}
