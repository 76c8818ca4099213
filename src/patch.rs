//! Patch file loading
//!
//! Optional JSON startup configuration: vertex count, tempo and note
//! assignments. A patch only seeds the session at startup; nothing is ever
//! written back. All fields are optional so partial patches compose with the
//! CLI flags, and out-of-range values go through the session's usual clamps.

use crate::sequencer::Session;
use crate::{PolygonomeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Startup configuration loaded from a JSON file.
///
/// ```json
/// { "sides": 5, "tempo": 180, "notes": ["C4", "D4", "E4"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Vertex count (clamped to >= 3 when applied)
    #[serde(default)]
    pub sides: Option<usize>,
    /// Tempo in edges per minute (clamped to >= 1 when applied)
    #[serde(default)]
    pub tempo: Option<u32>,
    /// Leading note assignments; shorter lists leave the rest at defaults
    #[serde(default)]
    pub notes: Option<Vec<String>>,
}

impl Patch {
    /// Load a patch from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a patch from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PolygonomeError::ParseError(format!("invalid patch file: {e}")))
    }

    /// Apply the patch to a session. Shape first, so the note table the
    /// notes land in already has the patched vertex count.
    pub fn apply(&self, session: &mut Session) {
        if let Some(sides) = self.sides {
            session.set_shape(sides);
        }
        if let Some(tempo) = self.tempo {
            session.set_tempo(tempo);
        }
        if let Some(notes) = &self.notes {
            session.seed_notes(notes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Viewport;

    fn session() -> Session {
        Session::new(4, 60, Viewport::new(200.0, 200.0))
    }

    #[test]
    fn test_full_patch_round_trip() {
        let patch = Patch {
            sides: Some(5),
            tempo: Some(180),
            notes: Some(vec!["A3".into(), "C4".into()]),
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(Patch::from_json(&json).unwrap(), patch);
    }

    #[test]
    fn test_partial_patch_defaults() {
        let patch = Patch::from_json(r#"{ "tempo": 240 }"#).unwrap();
        assert_eq!(patch.sides, None);
        assert_eq!(patch.tempo, Some(240));
        assert_eq!(patch.notes, None);
    }

    #[test]
    fn test_apply_sets_shape_before_notes() {
        let patch = Patch {
            sides: Some(6),
            tempo: Some(120),
            notes: Some(vec!["A2".into()]),
        };
        let mut s = session();
        patch.apply(&mut s);
        assert_eq!(s.sides(), 6);
        assert_eq!(s.tempo(), 120);
        assert_eq!(s.note(0), "A2");
        // Untouched slots keep the rebuilt defaults
        assert_eq!(s.note(5), "G5");
    }

    #[test]
    fn test_apply_clamps_bad_values() {
        let patch = Patch {
            sides: Some(1),
            tempo: Some(0),
            notes: None,
        };
        let mut s = session();
        patch.apply(&mut s);
        assert_eq!(s.sides(), 3);
        assert_eq!(s.tempo(), 1);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Patch::from_json("{ sides: }").unwrap_err();
        assert!(matches!(err, PolygonomeError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Patch::load("/nonexistent/patch.json").unwrap_err();
        assert!(matches!(err, PolygonomeError::Io(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.json");
        std::fs::write(&path, r#"{ "sides": 7, "notes": ["E2"] }"#).unwrap();
        let patch = Patch::load(&path).unwrap();
        assert_eq!(patch.sides, Some(7));
        assert_eq!(patch.notes.as_deref(), Some(&["E2".to_string()][..]));
    }
}
