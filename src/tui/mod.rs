//! Ratatui-based terminal UI for the sequencer.
//!
//! The interactive host of the animation loop: one frame every ~33 ms ticks
//! the session, routes trigger events to the tone emitter, and redraws the
//! polygon scene. The loop keeps running while paused or stopped so the
//! frozen scene stays rendered and responsive to resize and transport keys.

mod note_panel;
mod polygon_view;

use crate::notes::frequency_to_note_label;
use crate::sequencer::{PlaybackState, Session, TriggerEvent};
use crate::synth::{Envelope, NullEmitter, ToneEmitter};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io::{self, stdout};
use std::time::{Duration, Instant};

/// Minimum terminal width for TUI mode
pub const MIN_COLS: u16 = 60;
/// Minimum terminal height for TUI mode
pub const MIN_ROWS: u16 = 20;

/// Tempo adjustment step for the +/- keys, in edges per minute.
const TEMPO_STEP: u32 = 5;
/// Tempo range exposed through the UI.
const TEMPO_RANGE: (u32, u32) = (20, 600);
/// Trigger history lines kept for the note panel.
const HISTORY_LEN: usize = 6;

/// Check if the terminal is large enough for TUI mode.
pub fn terminal_supports_tui() -> bool {
    if let Ok((cols, rows)) = crossterm::terminal::size() {
        cols >= MIN_COLS && rows >= MIN_ROWS
    } else {
        false
    }
}

/// Options for the interactive run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TuiOptions {
    /// Never initialize the audio backend; triggers stay silent.
    pub no_audio: bool,
}

/// One line of the trigger history.
pub(crate) struct TriggerEntry {
    pub edge: usize,
    pub note: String,
    pub frequency: f64,
    /// Nearest note label for raw-frequency entries
    pub label: Option<String>,
    pub muted: bool,
}

/// TUI application state.
pub struct App {
    /// The sequencer session this UI drives
    pub session: Session,
    /// Vertex selected in the note panel
    pub selected: usize,
    /// In-place note editor buffer, `Some` while editing
    pub editing: Option<String>,
    /// Recent trigger history, newest first
    pub(crate) history: VecDeque<TriggerEntry>,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    /// One-line audio backend status for the footer
    pub audio_status: String,
    emitter: Box<dyn ToneEmitter>,
    audio_attempted: bool,
    no_audio: bool,
    #[cfg(feature = "streaming")]
    audio: Option<crate::streaming::AudioEngine>,
    /// Last canvas inner size, to refit the polygon only on change
    canvas_size: (u16, u16),
    started: Instant,
}

impl App {
    /// Wrap a session for interactive use.
    pub fn new(session: Session, options: TuiOptions) -> Self {
        App {
            session,
            selected: 0,
            editing: None,
            history: VecDeque::with_capacity(HISTORY_LEN),
            volume: 1.0,
            audio_status: if options.no_audio {
                "audio: off (--no-audio)".to_string()
            } else {
                "audio: starts on play".to_string()
            },
            emitter: Box::new(NullEmitter),
            audio_attempted: false,
            no_audio: options.no_audio,
            #[cfg(feature = "streaming")]
            audio: None,
            canvas_size: (0, 0),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the app started; the session's injected timeline.
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Lazily bring up the audio backend. Tied to the play action so the
    /// first sound follows a deliberate user gesture; failure downgrades to
    /// the null emitter instead of erroring.
    fn ensure_audio(&mut self) {
        if self.no_audio || self.audio_attempted {
            return;
        }
        self.audio_attempted = true;

        #[cfg(feature = "streaming")]
        {
            use crate::streaming::{AudioEngine, StreamConfig};
            match AudioEngine::start(StreamConfig::default()) {
                Ok(engine) => {
                    engine.set_volume(self.volume);
                    self.audio_status =
                        format!("audio: live ({:.0}ms buffer)", StreamConfig::default().latency_ms());
                    self.emitter = Box::new(engine.emitter());
                    self.audio = Some(engine);
                }
                Err(err) => {
                    self.audio_status = format!("audio unavailable: {err}");
                }
            }
        }

        #[cfg(not(feature = "streaming"))]
        {
            self.audio_status = "audio: built without streaming feature".to_string();
        }
    }

    /// Route a trigger event: sound the tone unless muted, record history.
    pub(crate) fn handle_trigger(&mut self, event: TriggerEvent) {
        if !event.muted {
            self.emitter.play(event.frequency, Envelope::default());
        }
        self.history.push_front(TriggerEntry {
            edge: event.edge,
            label: frequency_to_note_label(event.frequency),
            note: event.note,
            frequency: event.frequency,
            muted: event.muted,
        });
        self.history.truncate(HISTORY_LEN);
    }

    /// Increase volume by 5%.
    pub fn volume_up(&mut self) {
        self.volume = (self.volume + 0.05).min(1.0);
        self.apply_volume();
    }

    /// Decrease volume by 5%.
    pub fn volume_down(&mut self) {
        self.volume = (self.volume - 0.05).max(0.0);
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        #[cfg(feature = "streaming")]
        if let Some(engine) = &self.audio {
            engine.set_volume(self.volume);
        }
    }

    /// Peak output level for the gauge; 0 without a backend.
    pub(crate) fn output_peak(&self) -> f64 {
        #[cfg(feature = "streaming")]
        if let Some(engine) = &self.audio {
            return engine.peak() as f64;
        }
        0.0
    }

    fn nudge_tempo(&mut self, up: bool) {
        // A flag- or patch-set tempo may sit outside the UI range; the bound
        // then widens to the current value so a nudge never jumps across it
        let tempo = self.session.tempo();
        let tempo = if up {
            tempo
                .saturating_add(TEMPO_STEP)
                .min(TEMPO_RANGE.1.max(tempo))
        } else {
            tempo
                .saturating_sub(TEMPO_STEP)
                .max(TEMPO_RANGE.0.min(tempo))
        };
        self.session.set_tempo(tempo);
    }

    fn set_shape(&mut self, sides: usize) {
        self.session.set_shape(sides);
        self.selected = self.selected.min(self.session.sides() - 1);
    }

    /// Refit the polygon when the canvas cell size changed.
    pub(crate) fn fit_canvas(&mut self, cols: u16, rows: u16) {
        if self.canvas_size != (cols, rows) {
            self.canvas_size = (cols, rows);
            // Braille resolution: 2 dots per column, 4 per row
            self.session
                .set_viewport(cols.max(1) as f64 * 2.0, rows.max(1) as f64 * 4.0);
        }
    }

    /// Tear down the audio backend, printing the statistics line.
    fn shutdown_audio(&mut self) {
        self.emitter = Box::new(NullEmitter);
        #[cfg(feature = "streaming")]
        if let Some(engine) = self.audio.take() {
            engine.shutdown();
        }
    }
}

/// Restore terminal to normal state. Safe to call multiple times.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the interactive loop until the user quits.
pub fn run(session: Session, options: TuiOptions) -> crate::Result<()> {
    if !terminal_supports_tui() {
        return Err(crate::PolygonomeError::ConfigError(format!(
            "terminal too small for TUI mode (need at least {MIN_COLS}x{MIN_ROWS})"
        )));
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;

    // Restore the terminal even if a draw panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(session, options);

    let frame_duration = Duration::from_millis(33); // ~30 FPS
    loop {
        let frame_start = Instant::now();

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, key.code) {
                    break;
                }
            }
        }

        // Timing state first, then the watcher's event, then the draw,
        // so everything in this frame observes one snapshot
        let now = app.now_ms();
        if let Some(event) = app.session.tick(now) {
            app.handle_trigger(event);
        }

        terminal.draw(|f| draw_ui(f, &mut app))?;

        let frame_time = frame_start.elapsed();
        if frame_time < frame_duration {
            std::thread::sleep(frame_duration - frame_time);
        }
    }

    // Remove our panic hook, restore default
    let _ = std::panic::take_hook();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    app.shutdown_audio();
    Ok(())
}

/// Handle one key press. Returns true when the app should quit.
fn handle_key(app: &mut App, code: KeyCode) -> bool {
    // In-place note editing captures everything except commit/cancel
    if app.editing.is_some() {
        match code {
            KeyCode::Enter => {
                let text = app.editing.take().unwrap_or_default();
                app.session.set_note(app.selected, text);
            }
            KeyCode::Esc => {
                app.editing = None;
            }
            KeyCode::Backspace => {
                if let Some(buffer) = app.editing.as_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = app.editing.as_mut() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char(' ') => {
            if !app.session.is_playing() {
                app.ensure_audio();
            }
            app.session.toggle_playback();
        }
        KeyCode::Char('r') | KeyCode::Char('R') => {
            app.session.reset();
            app.history.clear();
        }
        KeyCode::Char(c @ '3'..='9') => {
            app.set_shape((c as u8 - b'0') as usize);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => app.nudge_tempo(true),
        KeyCode::Char('-') | KeyCode::Char('_') => app.nudge_tempo(false),
        KeyCode::Up => {
            let n = app.session.sides();
            app.selected = (app.selected + n - 1) % n;
        }
        KeyCode::Down => {
            app.selected = (app.selected + 1) % app.session.sides();
        }
        KeyCode::Enter => {
            app.editing = Some(app.session.note(app.selected).to_string());
        }
        KeyCode::Char('m') | KeyCode::Char('M') => {
            app.session.toggle_mute(app.selected);
        }
        KeyCode::Right => app.volume_up(),
        KeyCode::Left => app.volume_down(),
        _ => {}
    }
    false
}

/// Draw the main UI.
fn draw_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    draw_content(f, chunks[1], app);
    draw_footer(f, chunks[2], app);
}

fn draw_content(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Polygon canvas
            Constraint::Percentage(40), // Notes + level
        ])
        .split(area);

    polygon_view::draw_polygon(f, columns[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Note table + history
            Constraint::Length(3), // Output level
        ])
        .split(columns[1]);

    note_panel::draw_note_panel(f, side[0], app);
    draw_level(f, side[1], app);
}

/// Header with transport state, elapsed time, tempo and shape.
fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let status = match app.session.state() {
        PlaybackState::Playing => Span::styled("▶ Playing", Style::default().fg(Color::Green)),
        PlaybackState::Paused => Span::styled("⏸ Paused", Style::default().fg(Color::Yellow)),
        PlaybackState::Stopped => Span::styled("■ Stopped", Style::default().fg(Color::DarkGray)),
    };

    let header_text = vec![Line::from(vec![
        Span::raw(" "),
        status,
        Span::raw("  "),
        Span::styled(
            format_time(app.session.elapsed_ms()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} edges/min", app.session.tempo()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}-gon", app.session.sides()),
            Style::default().fg(Color::Magenta),
        ),
    ])];

    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title(" Polygonome "));
    f.render_widget(header, area);
}

/// Output level gauge fed by the synth's peak meter.
fn draw_level(f: &mut Frame, area: Rect, app: &App) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Output "))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(app.output_peak().clamp(0.0, 1.0))
        .label(format!("{:3.0}%", app.output_peak() * 100.0));
    f.render_widget(gauge, area);
}

/// Footer with key help, volume and audio status.
fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let controls = if app.editing.is_some() {
        "[Enter] Commit  [Esc] Cancel".to_string()
    } else {
        "[Space] Play/Pause  [r] Reset  [3-9] Sides  [+/-] Tempo  [↑↓] Vertex  [Enter] Edit  [m] Mute  [←→] Vol  [q] Quit"
            .to_string()
    };

    let volume_info = format!("  Vol: {}%", (app.volume * 100.0) as u32);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(controls, Style::default().fg(Color::DarkGray)),
        Span::styled(volume_info, Style::default().fg(Color::Green)),
        Span::styled(
            format!("  {}", app.audio_status),
            Style::default().fg(Color::Cyan).italic(),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}

/// Format milliseconds as MM:SS.
fn format_time(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return "--:--".to_string();
    }
    let seconds = (ms / 1000.0).min(5999.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Viewport;

    fn app() -> App {
        let session = Session::new(4, 120, Viewport::new(200.0, 200.0));
        App::new(session, TuiOptions { no_audio: true })
    }

    #[test]
    fn test_trigger_recorded_in_history() {
        let mut a = app();
        a.handle_trigger(TriggerEvent {
            edge: 2,
            note: "250".into(),
            frequency: 250.0,
            muted: false,
        });
        assert_eq!(a.history.len(), 1);
        let entry = &a.history[0];
        assert_eq!(entry.edge, 2);
        // Raw frequencies get annotated with the nearest note
        assert_eq!(entry.label.as_deref(), Some("B3"));
    }

    #[test]
    fn test_history_capped() {
        let mut a = app();
        for i in 0..20 {
            a.handle_trigger(TriggerEvent {
                edge: i % 4,
                note: "A4".into(),
                frequency: 440.0,
                muted: false,
            });
        }
        assert_eq!(a.history.len(), HISTORY_LEN);
    }

    #[test]
    fn test_tempo_nudges_clamped() {
        let mut a = app();
        for _ in 0..200 {
            a.nudge_tempo(true);
        }
        assert_eq!(a.session.tempo(), TEMPO_RANGE.1);
        for _ in 0..200 {
            a.nudge_tempo(false);
        }
        assert_eq!(a.session.tempo(), TEMPO_RANGE.0);
    }

    #[test]
    fn test_tempo_nudges_outside_ui_range() {
        let mut a = app();
        // Below the UI range: down holds, up steps back toward the range
        a.session.set_tempo(15);
        a.nudge_tempo(false);
        assert_eq!(a.session.tempo(), 15);
        a.nudge_tempo(true);
        assert_eq!(a.session.tempo(), 20);

        // Above the UI range: up holds, down steps back in
        a.session.set_tempo(700);
        a.nudge_tempo(true);
        assert_eq!(a.session.tempo(), 700);
        a.nudge_tempo(false);
        assert_eq!(a.session.tempo(), 695);
    }

    #[test]
    fn test_selection_clamped_on_shape_change() {
        let mut a = app();
        a.selected = 3;
        a.set_shape(3);
        assert_eq!(a.selected, 2);
    }

    #[test]
    fn test_edit_commit_and_cancel() {
        let mut a = app();
        a.selected = 1;
        handle_key(&mut a, KeyCode::Enter);
        assert_eq!(a.editing.as_deref(), Some("E4"));
        handle_key(&mut a, KeyCode::Backspace);
        handle_key(&mut a, KeyCode::Backspace);
        handle_key(&mut a, KeyCode::Char('F'));
        handle_key(&mut a, KeyCode::Char('3'));
        handle_key(&mut a, KeyCode::Enter);
        assert_eq!(a.session.note(1), "F3");

        handle_key(&mut a, KeyCode::Enter);
        handle_key(&mut a, KeyCode::Char('x'));
        handle_key(&mut a, KeyCode::Esc);
        assert_eq!(a.session.note(1), "F3", "cancel must discard edits");
        assert!(a.editing.is_none());
    }

    #[test]
    fn test_space_toggles_and_reset_clears_history() {
        let mut a = app();
        handle_key(&mut a, KeyCode::Char(' '));
        assert!(a.session.is_playing());
        handle_key(&mut a, KeyCode::Char(' '));
        assert!(!a.session.is_playing());
        a.handle_trigger(TriggerEvent {
            edge: 0,
            note: "C4".into(),
            frequency: 261.6,
            muted: false,
        });
        handle_key(&mut a, KeyCode::Char('r'));
        assert!(a.history.is_empty());
        assert_eq!(a.session.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_quit_key() {
        let mut a = app();
        assert!(!handle_key(&mut a, KeyCode::Char('x')));
        assert!(handle_key(&mut a, KeyCode::Char('q')));
    }

    #[test]
    fn test_fit_canvas_only_on_change() {
        let mut a = app();
        a.fit_canvas(40, 20);
        let poly = a.session.polygon().clone();
        a.fit_canvas(40, 20);
        assert_eq!(a.session.polygon(), &poly);
        a.fit_canvas(50, 20);
        assert_ne!(a.session.polygon(), &poly);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(83_500.0), "01:23");
        assert_eq!(format_time(-5.0), "--:--");
        assert_eq!(format_time(f64::NAN), "--:--");
    }
}
