//! Note name resolution
//!
//! Maps user-entered note text to a frequency in Hz. Resolution order:
//! raw finite numbers pass through unchanged (advanced users can type `432.5`),
//! then `<letter><optional # or b><octave digit>` note names are resolved in
//! twelve-tone equal temperament around A4 = 440 Hz, and anything else falls
//! back to [`DEFAULT_FREQUENCY`]. Unparseable text is never an error; the
//! sequencer keeps running on the fallback pitch.

use nom::character::complete::satisfy;
use nom::combinator::{all_consuming, map, opt};
use nom::sequence::tuple;
use nom::IResult;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

/// Fallback frequency for text that resolves neither as a number nor a note.
pub const DEFAULT_FREQUENCY: f64 = 440.0;

/// MIDI note number of the A4 = 440 Hz reference.
const A4_MIDI: i32 = 69;

/// One of the 12 equal-tempered pitch classes.
///
/// Enharmonic spellings collapse onto one variant (`C#` and `Db` both resolve
/// to [`PitchClass::CSharp`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum PitchClass {
    /// C
    C = 0,
    /// C# / Db
    CSharp = 1,
    /// D
    D = 2,
    /// D# / Eb
    DSharp = 3,
    /// E
    E = 4,
    /// F
    F = 5,
    /// F# / Gb
    FSharp = 6,
    /// G
    G = 7,
    /// G# / Ab
    GSharp = 8,
    /// A
    A = 9,
    /// A# / Bb
    ASharp = 10,
    /// B
    B = 11,
}

impl PitchClass {
    /// Semitone offset within the octave (C = 0 .. B = 11).
    pub fn semitone(self) -> i32 {
        self as i32
    }

    /// Canonical display name (sharp spelling).
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

/// Natural letter A-G (case-insensitive) as its semitone offset.
fn letter(input: &str) -> IResult<&str, i32> {
    map(
        satisfy(|c| c.is_ascii_alphabetic() && matches!(c.to_ascii_uppercase(), 'A'..='G')),
        |c| match c.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            _ => 11,
        },
    )(input)
}

/// Optional accidental: `#` raises, `b` lowers.
fn accidental(input: &str) -> IResult<&str, i32> {
    map(satisfy(|c| c == '#' || c == 'b' || c == 'B'), |c| {
        if c == '#' {
            1
        } else {
            -1
        }
    })(input)
}

/// Single octave digit 0-9.
fn octave_digit(input: &str) -> IResult<&str, i32> {
    map(satisfy(|c| c.is_ascii_digit()), |c| c as i32 - '0' as i32)(input)
}

/// Full note name grammar: letter, optional accidental, octave digit.
fn note_name(input: &str) -> IResult<&str, (i32, i32)> {
    map(tuple((letter, opt(accidental), octave_digit)), |(l, acc, oct)| {
        ((l + acc.unwrap_or(0)).rem_euclid(12), oct)
    })(input)
}

/// Parse a note name like `C4`, `f#3` or `Bb5` into pitch class and octave.
///
/// The whole input must match; trailing text fails the parse. Returns `None`
/// on any mismatch so callers can fall back.
pub fn parse_note(text: &str) -> Option<(PitchClass, u8)> {
    let (_, (semitone, octave)) = all_consuming(note_name)(text).ok()?;
    Some((PitchClass::from_i32(semitone)?, octave as u8))
}

/// Equal-tempered frequency of a pitch class in the given octave.
///
/// MIDI numbering: `(octave + 1) * 12 + semitone`, with MIDI 69 = A4 = 440 Hz.
pub fn note_frequency(pitch: PitchClass, octave: u8) -> f64 {
    let midi = (octave as i32 + 1) * 12 + pitch.semitone();
    440.0 * 2f64.powf((midi - A4_MIDI) as f64 / 12.0)
}

/// Resolve arbitrary note text to a frequency in Hz.
///
/// Input is trimmed first. Finite numbers are taken verbatim, note names go
/// through [`note_frequency`], everything else yields [`DEFAULT_FREQUENCY`].
pub fn resolve_note(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(freq) = text.parse::<f64>() {
        if freq.is_finite() {
            return freq;
        }
    }
    match parse_note(text) {
        Some((pitch, octave)) => note_frequency(pitch, octave),
        None => DEFAULT_FREQUENCY,
    }
}

/// Nearest note label for a frequency (e.g. `"A4"`), used to annotate raw
/// frequency entries in the trigger history. Returns `None` outside the MIDI
/// range or for non-positive input.
pub fn frequency_to_note_label(freq: f64) -> Option<String> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    let midi = A4_MIDI as f64 + 12.0 * (freq / 440.0).log2();
    let midi_rounded = midi.round();
    if !(0.0..=127.0).contains(&midi_rounded) {
        return None;
    }
    let midi_int = midi_rounded as i32;
    let pitch = PitchClass::from_i32(midi_int.rem_euclid(12))?;
    let octave = (midi_int / 12) - 1;
    Some(format!("{}{}", pitch.name(), octave))
}

/// Default note assignment for an `n`-vertex polygon.
///
/// The first six vertices cycle a C-major arpeggio over two octaves; vertices
/// beyond that get raw frequency strings stepping up 30 Hz from 440.
pub fn default_note_table(n: usize) -> Vec<String> {
    const PATTERN: [&str; 6] = ["C4", "E4", "G4", "C5", "E5", "G5"];
    (0..n)
        .map(|i| match PATTERN.get(i) {
            Some(name) => (*name).to_string(),
            None => (440 + i as u32 * 30).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_a4_is_exactly_440() {
        assert_eq!(resolve_note("A4"), 440.0);
    }

    #[test]
    fn test_c4_frequency() {
        assert_relative_eq!(resolve_note("C4"), 261.63, epsilon = 0.01);
    }

    #[test]
    fn test_enharmonic_aliases_match() {
        assert_eq!(resolve_note("C#4"), resolve_note("Db4"));
        assert_eq!(resolve_note("G#2"), resolve_note("Ab2"));
        assert_eq!(parse_note("D#5"), parse_note("Eb5"));
    }

    #[test]
    fn test_numeric_passthrough() {
        assert_eq!(resolve_note("250"), 250.0);
        assert_eq!(resolve_note("432.5"), 432.5);
    }

    #[test]
    fn test_fallback_on_junk() {
        assert_eq!(resolve_note("not-a-note"), DEFAULT_FREQUENCY);
        assert_eq!(resolve_note(""), DEFAULT_FREQUENCY);
        assert_eq!(resolve_note("H4"), DEFAULT_FREQUENCY);
        assert_eq!(resolve_note("NaN"), DEFAULT_FREQUENCY);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert_eq!(resolve_note("C4x"), DEFAULT_FREQUENCY);
        assert_eq!(resolve_note("C44"), DEFAULT_FREQUENCY);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve_note("a4"), 440.0);
        assert_eq!(resolve_note("f#3"), resolve_note("F#3"));
        assert_eq!(resolve_note("eB4"), resolve_note("Eb4"));
    }

    #[test]
    fn test_input_trimmed() {
        assert_eq!(resolve_note("  A4 "), 440.0);
        assert_eq!(resolve_note(" 250 "), 250.0);
    }

    #[test]
    fn test_octave_spacing_doubles() {
        assert_relative_eq!(resolve_note("A5"), 880.0, epsilon = 1e-9);
        assert_relative_eq!(resolve_note("A3"), 220.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frequency_to_note_label() {
        assert_eq!(frequency_to_note_label(440.0).as_deref(), Some("A4"));
        assert_eq!(frequency_to_note_label(261.63).as_deref(), Some("C4"));
        // Slight detune still snaps to the nearest note
        assert_eq!(frequency_to_note_label(442.0).as_deref(), Some("A4"));
        assert_eq!(frequency_to_note_label(0.0), None);
        assert_eq!(frequency_to_note_label(-10.0), None);
        assert_eq!(frequency_to_note_label(f64::NAN), None);
    }

    #[test]
    fn test_default_note_table() {
        let table = default_note_table(8);
        assert_eq!(
            table,
            vec!["C4", "E4", "G4", "C5", "E5", "G5", "620", "650"]
        );
        // Arithmetic extension entries resolve as raw frequencies
        assert_eq!(resolve_note(&table[6]), 620.0);
    }

    #[test]
    fn test_pitch_class_names() {
        assert_eq!(PitchClass::CSharp.name(), "C#");
        assert_eq!(PitchClass::B.semitone(), 11);
        assert_eq!(PitchClass::from_i32(3), Some(PitchClass::DSharp));
    }
}
