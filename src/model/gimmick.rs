use serde::{Deserialize, Serialize};

use super::beat::{BeatPosition, TimeSignature};

/// Kind of a non-note timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GimmickKind {
    BpmChange { bpm: f64 },
    TimeSignatureChange { sig: TimeSignature },
    HiSpeedChange { speed: f64 },
    ReverseStart,
    ReverseMiddle,
    ReverseEnd,
    StopStart,
    StopEnd,
    /// Placeholder for a loader event not yet assigned a kind.
    #[default]
    None,
}

/// A non-note timeline event altering tempo, meter, or visual speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gimmick {
    pub beat: BeatPosition,
    pub kind: GimmickKind,
}

impl Gimmick {
    pub fn new(beat: BeatPosition, kind: GimmickKind) -> Self {
        Self { beat, kind }
    }

    /// Create a BPM change at the given measure and tick.
    pub fn bpm_change(measure: i32, tick: i32, bpm: f64) -> Self {
        Self::new(BeatPosition::new(measure, tick), GimmickKind::BpmChange { bpm })
    }

    /// Create a time signature change at the given measure and tick.
    pub fn time_signature_change(measure: i32, tick: i32, upper: i32, lower: i32) -> Self {
        Self::new(
            BeatPosition::new(measure, tick),
            GimmickKind::TimeSignatureChange {
                sig: TimeSignature::new(upper, lower),
            },
        )
    }

    /// Create a hi-speed change at the given measure and tick.
    pub fn hi_speed_change(measure: i32, tick: i32, speed: f64) -> Self {
        Self::new(
            BeatPosition::new(measure, tick),
            GimmickKind::HiSpeedChange { speed },
        )
    }

    /// True if this event contributes to the scaled-position integral.
    pub fn affects_scale(&self) -> bool {
        matches!(
            self.kind,
            GimmickKind::BpmChange { .. }
                | GimmickKind::TimeSignatureChange { .. }
                | GimmickKind::HiSpeedChange { .. }
        )
    }
}
