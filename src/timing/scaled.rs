use crate::model::beat::BeatPosition;
use crate::model::gimmick::{Gimmick, GimmickKind};

/// One piecewise segment of the scaled-position function.
///
/// `partial_scaled_position` holds the accumulated contribution *beyond*
/// linear distance of every scale event before `gimmick_start_measure`;
/// the three multiplier fields are the values active at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledCacheEntry {
    pub gimmick_start_measure: f64,
    pub partial_scaled_position: f64,
    pub last_measure_position: f64,
    pub hi_speed_value: f64,
    pub time_sig_value: f64,
    pub bpm_ratio_value: f64,
}

/// Piecewise cache converting a measure position into a visually scaled
/// position reflecting cumulative hi-speed/tempo/time-signature effects.
///
/// Visual note speed must reflect the integral of every multiplier active
/// before a measure, not just the locally active one. Entries are sorted
/// ascending by `gimmick_start_measure` with a trailing sentinel at infinity.
/// Rebuild is quadratic in the number of scale events; charts carry at most
/// a few hundred.
#[derive(Debug, Clone, Default)]
pub struct ScaledPositionCache {
    entries: Vec<ScaledCacheEntry>,
}

impl ScaledPositionCache {
    /// Build the cache from a gimmick set.
    ///
    /// The BPM ratio compensates tempo changes implicitly altering elapsed
    /// real time per measure, relative to the chart's measure-zero BPM. A
    /// gimmick set without a measure-zero BPM change builds an empty cache
    /// and `query` degrades to the identity.
    pub fn build(gimmicks: &[Gimmick]) -> Self {
        let start_bpm = gimmicks.iter().find_map(|gimmick| match gimmick.kind {
            GimmickKind::BpmChange { bpm } if gimmick.beat == BeatPosition::zero() => Some(bpm),
            _ => None,
        });
        let Some(start_bpm) = start_bpm else {
            return Self::default();
        };

        let mut scale_events: Vec<&Gimmick> =
            gimmicks.iter().filter(|gimmick| gimmick.affects_scale()).collect();
        scale_events.sort_by(|a, b| a.beat.cmp(&b.beat));

        let mut measures: Vec<f64> = scale_events
            .iter()
            .map(|gimmick| gimmick.beat.measure_decimal())
            .collect();
        measures.dedup();

        let mut entries: Vec<ScaledCacheEntry> = measures
            .into_iter()
            .map(|measure| Self::entry_at(measure, &scale_events, start_bpm))
            .collect();
        entries.push(Self::entry_at(f64::INFINITY, &scale_events, start_bpm));

        Self { entries }
    }

    /// Accumulate every scale event strictly before `boundary`.
    fn entry_at(boundary: f64, scale_events: &[&Gimmick], start_bpm: f64) -> ScaledCacheEntry {
        let mut hi_speed = 1.0;
        let mut time_sig = 1.0;
        let mut bpm_ratio = 1.0;
        let mut scaled = 0.0;
        let mut last_measure = 0.0;

        for gimmick in scale_events {
            let measure = gimmick.beat.measure_decimal();
            if measure >= boundary {
                break;
            }
            let distance = measure - last_measure;
            scaled += distance * hi_speed * time_sig * bpm_ratio - distance;
            last_measure = measure;
            match gimmick.kind {
                GimmickKind::HiSpeedChange { speed } => hi_speed = speed,
                GimmickKind::TimeSignatureChange { sig } => time_sig = sig.ratio(),
                GimmickKind::BpmChange { bpm } => bpm_ratio = start_bpm / bpm,
                _ => {}
            }
        }

        ScaledCacheEntry {
            gimmick_start_measure: boundary,
            partial_scaled_position: scaled,
            last_measure_position: last_measure,
            hi_speed_value: hi_speed,
            time_sig_value: time_sig,
            bpm_ratio_value: bpm_ratio,
        }
    }

    /// Scaled position of a continuous measure position.
    ///
    /// Upper-bound binary search for the first entry strictly past the query;
    /// an empty cache returns the input unchanged.
    pub fn query(&self, measure_decimal: f64) -> f64 {
        let idx = self
            .entries
            .partition_point(|entry| entry.gimmick_start_measure <= measure_decimal);
        let Some(entry) = self.entries.get(idx) else {
            return measure_decimal;
        };
        let tail = measure_decimal - entry.last_measure_position;
        measure_decimal + entry.partial_scaled_position
            + tail * entry.hi_speed_value * entry.time_sig_value * entry.bpm_ratio_value
            - tail
    }

    pub fn entries(&self) -> &[ScaledCacheEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
