//! Edge clock and playback session
//!
//! The timing core of the sequencer. [`EdgeClock`] turns injected millisecond
//! timestamps into an active edge index and a fractional position along that
//! edge; [`Session`] owns the clock together with the polygon, the note table
//! and the edge-trigger watcher, and exposes the transport operations the
//! front-ends drive.

mod clock;
mod session;

pub use clock::{EdgeClock, PlaybackState};
pub use session::{Session, TriggerEvent};
