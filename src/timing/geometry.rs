use crate::model::beat::{BeatPosition, TICKS_PER_MEASURE};
use crate::model::gimmick::Gimmick;

use super::scaled::ScaledPositionCache;
use super::timeline::Timeline;

/// Measure↔beat↔time↔scaled-position query API.
///
/// Owns one [`Timeline`] and one [`ScaledPositionCache`], both rebuilt from
/// scratch whenever the gimmick set changes; there is no incremental update.
/// Degraded timing (no measure-zero tempo/meter) passes the underlying
/// sentinels through.
#[derive(Debug, Clone, Default)]
pub struct ChartGeometry {
    timeline: Timeline,
    scaled: ScaledPositionCache,
}

impl ChartGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct timeline and cache from the gimmick set.
    pub fn rebuild(&mut self, gimmicks: &[Gimmick], offset_ms: f64) {
        self.timeline = Timeline::build(gimmicks, offset_ms);
        self.scaled = ScaledPositionCache::build(gimmicks);
    }

    /// Drop all timing data; queries degrade to sentinels until `rebuild`.
    pub fn invalidate(&mut self) {
        self.timeline = Timeline::default();
        self.scaled = ScaledPositionCache::default();
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn scaled_cache(&self) -> &ScaledPositionCache {
        &self.scaled
    }

    pub fn beat_to_time(&self, beat: BeatPosition) -> f64 {
        self.timeline.beat_to_time(beat)
    }

    pub fn measure_to_time(&self, measure_decimal: f64) -> f64 {
        self.timeline.measure_to_time(measure_decimal)
    }

    pub fn time_to_beat(&self, time_ms: f64) -> BeatPosition {
        self.timeline.time_to_beat(time_ms)
    }

    pub fn time_to_measure(&self, time_ms: f64) -> f64 {
        self.timeline.time_to_measure(time_ms)
    }

    pub fn scaled_at_measure(&self, measure_decimal: f64) -> f64 {
        self.scaled.query(measure_decimal)
    }

    pub fn scaled_at_beat(&self, beat: BeatPosition) -> f64 {
        self.scaled.query(beat.measure_decimal())
    }

    /// Scaled position of a wall-clock time.
    pub fn scaled_at_time(&self, time_ms: f64) -> f64 {
        self.scaled.query(self.timeline.time_to_measure(time_ms))
    }

    /// Nearest discrete beat to a fractional measure.
    pub fn nearest_beat(&self, measure_decimal: f64) -> BeatPosition {
        BeatPosition::from_measure_decimal(measure_decimal)
    }

    /// Snap a fractional measure to the nearest `1/division` of a measure.
    ///
    /// `division` outside `[1, TICKS_PER_MEASURE]` falls back to the tick
    /// grid.
    pub fn quantize(&self, measure_decimal: f64, division: i32) -> BeatPosition {
        if !(1..=TICKS_PER_MEASURE).contains(&division) {
            return self.nearest_beat(measure_decimal);
        }
        let step = f64::from(division);
        let snapped = (measure_decimal * step).round() / step;
        BeatPosition::from_measure_decimal(snapped)
    }
}
