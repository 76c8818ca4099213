//! Edge traversal clock
//!
//! A small state machine (Stopped / Playing / Paused) over an injected
//! millisecond timeline. The clock never reads a wall clock: callers pass
//! `now` into [`EdgeClock::tick`], which makes the whole timing model
//! deterministic under test. The interactive front-end feeds it
//! `Instant::elapsed` milliseconds; tests feed it synthetic values.

/// Transport state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Initial state; elapsed, edge and position are zeroed.
    #[default]
    Stopped,
    /// Clock advances on every tick.
    Playing,
    /// Elapsed, edge and position are frozen at their last computed values.
    Paused,
}

/// Lower bound for the tempo (edges per minute).
pub const MIN_TEMPO: u32 = 1;

/// Derives the active edge and the fractional position along it from elapsed
/// playback time, a tempo in edges per minute and an edge count.
///
/// Resume preserves elapsed time: `play()` after `pause()` clears the start
/// reference, and the next tick re-derives it as `now - elapsed`, so the
/// marker continues where it froze.
#[derive(Debug, Clone)]
pub struct EdgeClock {
    state: PlaybackState,
    /// Timestamp the current run started at, `None` until the first tick
    /// after a play() re-derives it.
    start_ref: Option<f64>,
    elapsed_ms: f64,
    tempo: u32,
    ms_per_edge: f64,
    edge_count: usize,
    edge_index: usize,
    position: f64,
}

impl EdgeClock {
    /// Create a stopped clock for `edge_count` edges at `tempo` edges/minute.
    /// Both parameters are clamped to their minimums (3 edges, tempo 1).
    pub fn new(edge_count: usize, tempo: u32) -> Self {
        let mut clock = EdgeClock {
            state: PlaybackState::Stopped,
            start_ref: None,
            elapsed_ms: 0.0,
            tempo: MIN_TEMPO,
            ms_per_edge: 60_000.0,
            edge_count: edge_count.max(crate::geometry::MIN_SIDES),
            edge_index: 0,
            position: 0.0,
        };
        clock.set_tempo(tempo);
        clock
    }

    /// Current transport state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True while the clock advances on ticks.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Elapsed playback time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Index of the currently active edge, in `[0, edge_count)`.
    pub fn edge_index(&self) -> usize {
        self.edge_index
    }

    /// Fractional position along the active edge, in `[0, 1)`.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Configured tempo in edges per minute.
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Milliseconds the marker spends on one edge.
    pub fn ms_per_edge(&self) -> f64 {
        self.ms_per_edge
    }

    /// Number of edges the clock cycles through.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Start or resume playback.
    ///
    /// From Stopped the elapsed time restarts at zero; from Paused it is
    /// preserved. No-op while already Playing.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Stopped => {
                self.elapsed_ms = 0.0;
                self.start_ref = None;
                self.state = PlaybackState::Playing;
            }
            PlaybackState::Paused => {
                // Keep elapsed; the next tick re-anchors start_ref.
                self.start_ref = None;
                self.state = PlaybackState::Playing;
            }
            PlaybackState::Playing => {}
        }
    }

    /// Freeze elapsed, edge and position. Only meaningful while Playing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.start_ref = None;
        }
    }

    /// Return to Stopped with elapsed, edge and position zeroed. Idempotent.
    pub fn reset(&mut self) {
        self.state = PlaybackState::Stopped;
        self.start_ref = None;
        self.elapsed_ms = 0.0;
        self.edge_index = 0;
        self.position = 0.0;
    }

    /// Change the tempo. Takes effect on the next tick; elapsed time is not
    /// reset, so the marker jumps to wherever the new grid places it.
    pub fn set_tempo(&mut self, tempo: u32) {
        self.tempo = tempo.max(MIN_TEMPO);
        self.ms_per_edge = 60_000.0 / self.tempo as f64;
    }

    /// Change the edge count. Callers that change shape are expected to wrap
    /// this in a [`reset`](Self::reset); the clamp and modulo here only keep
    /// the index in range if they do not.
    pub fn set_edge_count(&mut self, edge_count: usize) {
        self.edge_count = edge_count.max(crate::geometry::MIN_SIDES);
        self.edge_index %= self.edge_count;
    }

    /// Advance to timestamp `now_ms`. No-op unless Playing.
    ///
    /// `edge = floor(elapsed / ms_per_edge) mod edge_count`,
    /// `position = (elapsed mod ms_per_edge) / ms_per_edge`.
    pub fn tick(&mut self, now_ms: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let start = *self.start_ref.get_or_insert(now_ms - self.elapsed_ms);
        self.elapsed_ms = (now_ms - start).max(0.0);
        let steps = (self.elapsed_ms / self.ms_per_edge).floor() as u64;
        self.edge_index = (steps % self.edge_count as u64) as usize;
        self.position = (self.elapsed_ms % self.ms_per_edge) / self.ms_per_edge;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let clock = EdgeClock::new(4, 60);
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_eq!(clock.edge_index(), 0);
        assert_eq!(clock.position(), 0.0);
        assert_relative_eq!(clock.ms_per_edge(), 1000.0);
    }

    #[test]
    fn test_first_tick_anchors_timeline() {
        // The first tick after play() establishes the start reference, so
        // elapsed time is measured from it, not from an absolute zero
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(5000.0);
        assert_relative_eq!(clock.elapsed_ms(), 0.0);
        assert_eq!(clock.edge_index(), 0);
        clock.tick(6000.0);
        assert_relative_eq!(clock.elapsed_ms(), 1000.0);
        assert_eq!(clock.edge_index(), 1);
    }

    #[test]
    fn test_edge_and_position_at_2500ms() {
        // tempo=60 -> 1000ms per edge, n=4
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(2500.0);
        assert_eq!(clock.edge_index(), 2);
        assert_relative_eq!(clock.position(), 0.5);
        assert_relative_eq!(clock.elapsed_ms(), 2500.0);
    }

    #[test]
    fn test_hexagon_at_120_bpm() {
        // tempo=120 -> 500ms per edge, n=6
        let mut clock = EdgeClock::new(6, 120);
        clock.play();
        clock.tick(0.0);
        assert_eq!(clock.edge_index(), 0);
        assert_relative_eq!(clock.position(), 0.0);
        clock.tick(1250.0);
        assert_eq!(clock.edge_index(), 2);
        assert_relative_eq!(clock.position(), 0.5);
    }

    #[test]
    fn test_edge_index_wraps() {
        let mut clock = EdgeClock::new(3, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(3500.0);
        assert_eq!(clock.edge_index(), 0);
        assert_relative_eq!(clock.position(), 0.5);
    }

    #[test]
    fn test_tick_ignored_unless_playing() {
        let mut clock = EdgeClock::new(4, 60);
        clock.tick(5000.0);
        assert_eq!(clock.elapsed_ms(), 0.0);
        assert_eq!(clock.edge_index(), 0);
    }

    #[test]
    fn test_pause_freezes_snapshot() {
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(3200.0);
        assert_eq!(clock.edge_index(), 3);
        clock.pause();
        clock.tick(9000.0);
        assert_eq!(clock.edge_index(), 3);
        assert_relative_eq!(clock.position(), 0.2, epsilon = 1e-9);
        assert_relative_eq!(clock.elapsed_ms(), 3200.0);
    }

    #[test]
    fn test_resume_preserves_elapsed() {
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(1500.0);
        clock.pause();
        clock.play();
        // First tick after resume re-anchors; snapshot unchanged until time passes
        clock.tick(10_000.0);
        assert_relative_eq!(clock.elapsed_ms(), 1500.0);
        assert_eq!(clock.edge_index(), 1);
        clock.tick(10_500.0);
        assert_relative_eq!(clock.elapsed_ms(), 2000.0);
        assert_eq!(clock.edge_index(), 2);
    }

    #[test]
    fn test_play_from_stopped_restarts() {
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(2500.0);
        clock.reset();
        clock.play();
        clock.tick(5000.0);
        assert_relative_eq!(clock.elapsed_ms(), 0.0);
        assert_eq!(clock.edge_index(), 0);
    }

    #[test]
    fn test_reset_idempotent() {
        let mut clock = EdgeClock::new(5, 90);
        clock.play();
        clock.tick(4321.0);
        clock.reset();
        let first = (clock.state(), clock.edge_index(), clock.position());
        clock.reset();
        assert_eq!(first, (clock.state(), clock.edge_index(), clock.position()));
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert_eq!(clock.edge_index(), 0);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_tempo_change_keeps_elapsed() {
        let mut clock = EdgeClock::new(4, 60);
        clock.play();
        clock.tick(0.0);
        clock.tick(1000.0);
        clock.set_tempo(120);
        // Same elapsed, new grid: 1000ms at 500ms/edge -> edge 2
        clock.tick(1000.0);
        assert_relative_eq!(clock.elapsed_ms(), 1000.0);
        assert_eq!(clock.edge_index(), 2);
    }

    #[test]
    fn test_tempo_clamped() {
        let mut clock = EdgeClock::new(4, 0);
        assert_eq!(clock.tempo(), MIN_TEMPO);
        clock.set_tempo(0);
        assert_eq!(clock.tempo(), MIN_TEMPO);
        assert_relative_eq!(clock.ms_per_edge(), 60_000.0);
    }

    #[test]
    fn test_edge_count_clamped() {
        let mut clock = EdgeClock::new(1, 60);
        assert_eq!(clock.edge_count(), 3);
        clock.set_edge_count(0);
        assert_eq!(clock.edge_count(), 3);
    }
}
