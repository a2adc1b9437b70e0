use serde::{Deserialize, Serialize};

use super::beat::BeatPosition;

/// Number of discrete units around the ring.
pub const RING_UNITS: i32 = 60;

/// Kind of a note on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    Simple,
    HoldStart,
    HoldJoint,
    HoldEnd,
    Mask,
    EndOfChart,
}

impl NoteKind {
    /// True for any member of a hold chain.
    pub fn is_hold(self) -> bool {
        matches!(
            self,
            NoteKind::HoldStart | NoteKind::HoldJoint | NoteKind::HoldEnd
        )
    }
}

/// Stable index of a note inside the chart's note arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub(crate) usize);

impl NoteId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single note placed on the ring.
///
/// `position` is the leading edge in ring units and is normally inside
/// `[0, RING_UNITS)`; baked notes can drift outside that range, see
/// `Chart::normalize_positions`. `size` is the arc length in ring units.
/// Hold-chain membership is expressed through `prev_link`/`next_link` arena
/// indices; the chain owns the relation, not the note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub beat: BeatPosition,
    pub kind: NoteKind,
    pub position: i32,
    pub size: i32,
    pub prev_link: Option<NoteId>,
    pub next_link: Option<NoteId>,
}

impl Note {
    pub fn new(beat: BeatPosition, kind: NoteKind, position: i32, size: i32) -> Self {
        Self {
            beat,
            kind,
            position,
            size,
            prev_link: None,
            next_link: None,
        }
    }

    /// Create a simple tap note.
    pub fn simple(beat: BeatPosition, position: i32, size: i32) -> Self {
        Self::new(beat, NoteKind::Simple, position, size)
    }

    /// Create a hold chain start.
    pub fn hold_start(beat: BeatPosition, position: i32, size: i32) -> Self {
        Self::new(beat, NoteKind::HoldStart, position, size)
    }

    /// Create a hold chain joint.
    pub fn hold_joint(beat: BeatPosition, position: i32, size: i32) -> Self {
        Self::new(beat, NoteKind::HoldJoint, position, size)
    }

    /// Create a hold chain end.
    pub fn hold_end(beat: BeatPosition, position: i32, size: i32) -> Self {
        Self::new(beat, NoteKind::HoldEnd, position, size)
    }

    /// Create the end-of-chart marker.
    pub fn end_of_chart(beat: BeatPosition) -> Self {
        Self::new(beat, NoteKind::EndOfChart, 0, RING_UNITS)
    }

    /// True if the leading edge sits inside the ring's unit range.
    pub fn is_in_ring_range(&self) -> bool {
        (0..RING_UNITS).contains(&self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_kinds() {
        assert!(NoteKind::HoldStart.is_hold());
        assert!(NoteKind::HoldJoint.is_hold());
        assert!(NoteKind::HoldEnd.is_hold());
        assert!(!NoteKind::Simple.is_hold());
        assert!(!NoteKind::Mask.is_hold());
        assert!(!NoteKind::EndOfChart.is_hold());
    }

    #[test]
    fn new_note_has_no_links() {
        let note = Note::simple(BeatPosition::new(0, 0), 10, 4);
        assert_eq!(note.prev_link, None);
        assert_eq!(note.next_link, None);
    }

    #[test]
    fn ring_range_check() {
        assert!(Note::simple(BeatPosition::zero(), 0, 4).is_in_ring_range());
        assert!(Note::simple(BeatPosition::zero(), 59, 4).is_in_ring_range());
        assert!(!Note::simple(BeatPosition::zero(), 60, 4).is_in_ring_range());
        assert!(!Note::simple(BeatPosition::zero(), -1, 4).is_in_ring_range());
    }
}
