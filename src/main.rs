//! Command-line entry point for the polygon sequencer.
//!
//! Two modes share one `Session`: the default interactive terminal UI, and
//! `--render`, which writes a deterministic WAV (plus optional CSV trigger
//! log) without touching the terminal or an audio device.

use anyhow::{Context, Result};
use polygonome::{render_to_wav_with_log, Patch, RenderConfig, Session, Viewport};
use std::env;

/// Initial viewport before the UI measures the real terminal size.
const DEFAULT_VIEWPORT: (f64, f64) = (200.0, 200.0);
const DEFAULT_SIDES: usize = 6;
const DEFAULT_TEMPO: u32 = 120;

/// Parsed command-line arguments.
#[derive(Debug, Default)]
struct CliArgs {
    /// Vertex count override
    sides: Option<usize>,
    /// Tempo override in edges per minute
    tempo: Option<u32>,
    /// Comma-separated note seed
    notes: Option<Vec<String>>,
    /// JSON patch file applied before the flag overrides
    patch: Option<String>,
    /// Offline render target; skips the UI entirely
    render: Option<String>,
    /// Loop count for offline rendering
    loops: Option<u32>,
    /// CSV trigger log written alongside an offline render
    trigger_log: Option<String>,
    /// Run the UI without initializing an audio backend
    no_audio: bool,
    /// Whether help was requested
    show_help: bool,
}

impl CliArgs {
    /// Parse arguments from the command line.
    fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl Iterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        let mut iter = args;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--sides" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(n) => parsed.sides = Some(n),
                    None => {
                        eprintln!("--sides requires a number (3-9 useful range)");
                        parsed.show_help = true;
                    }
                },
                "--tempo" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(t) => parsed.tempo = Some(t),
                    None => {
                        eprintln!("--tempo requires a number (edges per minute)");
                        parsed.show_help = true;
                    }
                },
                "--notes" => match iter.next() {
                    Some(list) => {
                        parsed.notes =
                            Some(list.split(',').map(|s| s.trim().to_string()).collect());
                    }
                    None => {
                        eprintln!("--notes requires a comma-separated list (e.g. C4,E4,G4)");
                        parsed.show_help = true;
                    }
                },
                "--patch" => match iter.next() {
                    Some(path) => parsed.patch = Some(path),
                    None => {
                        eprintln!("--patch requires a file path");
                        parsed.show_help = true;
                    }
                },
                "--render" => match iter.next() {
                    Some(path) => parsed.render = Some(path),
                    None => {
                        eprintln!("--render requires an output path (e.g. out.wav)");
                        parsed.show_help = true;
                    }
                },
                "--loops" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(n) => parsed.loops = Some(n),
                    None => {
                        eprintln!("--loops requires a number");
                        parsed.show_help = true;
                    }
                },
                "--trigger-log" => match iter.next() {
                    Some(path) => parsed.trigger_log = Some(path),
                    None => {
                        eprintln!("--trigger-log requires a file path (e.g. triggers.csv)");
                        parsed.show_help = true;
                    }
                },
                "--no-audio" => parsed.no_audio = true,
                "--help" | "-h" => parsed.show_help = true,
                _ => {
                    eprintln!("Unknown argument: {}", arg);
                    parsed.show_help = true;
                }
            }
        }

        parsed
    }

    /// Print help text to stderr.
    fn print_help() {
        eprintln!(
            "Usage:\n  polygonome [--sides <n>] [--tempo <epm>] [--notes <list>] [--patch <file>]\n\
             \x20            [--render <out.wav> [--loops <n>] [--trigger-log <file.csv>]] [--no-audio]\n\n\
             Flags:\n\
             \x20 --sides <n>          Polygon vertex count (minimum 3, default {DEFAULT_SIDES})\n\
             \x20 --tempo <epm>        Tempo in edges per minute (default {DEFAULT_TEMPO})\n\
             \x20 --notes <list>       Comma-separated notes for the first vertices (C4,E4,G4,250)\n\
             \x20 --patch <file>       JSON patch file; flags above override its values\n\
             \x20 --render <out.wav>   Render loops to a WAV file instead of running the UI\n\
             \x20 --loops <n>          Loops to render (default 4, with --render)\n\
             \x20 --trigger-log <csv>  Write a CSV trigger log (with --render)\n\
             \x20 --no-audio           Run the UI without audio output\n\
             \x20 -h, --help           Show this help\n\n\
             Keys (interactive mode):\n\
             \x20 Space play/pause, r reset, q quit, 3-9 shape, +/- tempo,\n\
             \x20 Up/Down select vertex, Enter edit note, m mute, Left/Right volume\n"
        );
    }
}

/// Build the session from defaults, patch file and flag overrides, in that
/// precedence order.
fn build_session(args: &CliArgs) -> Result<Session> {
    let (width, height) = DEFAULT_VIEWPORT;
    let mut session = Session::new(DEFAULT_SIDES, DEFAULT_TEMPO, Viewport::new(width, height));

    if let Some(path) = &args.patch {
        let patch = Patch::load(path).with_context(|| format!("failed to load patch {path}"))?;
        patch.apply(&mut session);
    }
    if let Some(sides) = args.sides {
        session.set_shape(sides);
    }
    if let Some(tempo) = args.tempo {
        session.set_tempo(tempo);
    }
    if let Some(notes) = &args.notes {
        session.seed_notes(notes);
    }

    Ok(session)
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }

    let mut session = build_session(&args)?;

    if let Some(output) = &args.render {
        let mut config = RenderConfig::default();
        if let Some(loops) = args.loops {
            config = config.loops(loops);
        }
        let summary =
            render_to_wav_with_log(&mut session, output, args.trigger_log.as_deref(), config)
                .with_context(|| format!("failed to render {output}"))?;
        println!(
            "Rendered {output}: {} samples, {} triggers, {:.2}s",
            summary.samples, summary.triggers, summary.duration_secs
        );
        if let Some(log) = &args.trigger_log {
            println!("Trigger log written to {log}");
        }
        return Ok(());
    }

    #[cfg(feature = "visualization")]
    {
        let options = polygonome::tui::TuiOptions {
            no_audio: args.no_audio,
        };
        polygonome::tui::run(session, options).context("terminal UI failed")?;
        Ok(())
    }

    #[cfg(not(feature = "visualization"))]
    {
        let _ = session;
        eprintln!(
            "Built without the visualization feature; use --render to produce audio offline."
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let args = parse(&[
            "--sides",
            "5",
            "--tempo",
            "240",
            "--notes",
            "C4, E4 ,250",
            "--no-audio",
        ]);
        assert_eq!(args.sides, Some(5));
        assert_eq!(args.tempo, Some(240));
        assert_eq!(
            args.notes,
            Some(vec!["C4".to_string(), "E4".to_string(), "250".to_string()])
        );
        assert!(args.no_audio);
        assert!(!args.show_help);
    }

    #[test]
    fn test_parse_render_flags() {
        let args = parse(&[
            "--render",
            "out.wav",
            "--loops",
            "8",
            "--trigger-log",
            "t.csv",
        ]);
        assert_eq!(args.render.as_deref(), Some("out.wav"));
        assert_eq!(args.loops, Some(8));
        assert_eq!(args.trigger_log.as_deref(), Some("t.csv"));
    }

    #[test]
    fn test_unknown_and_malformed_args_request_help() {
        assert!(parse(&["--frobnicate"]).show_help);
        assert!(parse(&["--sides"]).show_help);
        assert!(parse(&["--tempo", "fast"]).show_help);
        assert!(parse(&["-h"]).show_help);
    }

    #[test]
    fn test_build_session_applies_overrides() {
        let args = parse(&["--sides", "8", "--tempo", "300", "--notes", "A2,B2"]);
        let session = build_session(&args).unwrap();
        assert_eq!(session.sides(), 8);
        assert_eq!(session.tempo(), 300);
        assert_eq!(session.note(0), "A2");
        assert_eq!(session.note(1), "B2");
        assert_eq!(session.note(2), "G4");
    }

    #[test]
    fn test_build_session_flags_override_patch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.json");
        std::fs::write(&path, r#"{"sides": 4, "tempo": 90, "notes": ["D3"]}"#).unwrap();

        let mut args = parse(&["--tempo", "150"]);
        args.patch = Some(path.to_string_lossy().into_owned());
        let session = build_session(&args).unwrap();
        // Patch sets the shape, the flag wins on tempo
        assert_eq!(session.sides(), 4);
        assert_eq!(session.tempo(), 150);
        assert_eq!(session.note(0), "D3");
    }

    #[test]
    fn test_build_session_missing_patch_fails() {
        let mut args = CliArgs::default();
        args.patch = Some("/nonexistent/patch.json".to_string());
        assert!(build_session(&args).is_err());
    }
}
