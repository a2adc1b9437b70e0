// Data models for charts, notes, and gimmicks.

pub mod beat;
pub mod chart;
pub mod gimmick;
pub mod note;

pub use beat::{BeatPosition, TICKS_PER_MEASURE, TimeSignature};
pub use chart::{Chart, ChartMeta, ChartStore, NoteArena};
pub use gimmick::{Gimmick, GimmickKind};
pub use note::{Note, NoteId, NoteKind, RING_UNITS};
