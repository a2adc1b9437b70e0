use serde::{Deserialize, Serialize};

/// Number of tick subdivisions in one measure.
pub const TICKS_PER_MEASURE: i32 = 1920;

/// A discrete position on the chart timeline: an integer measure plus a tick
/// offset inside that measure.
///
/// The tick is always normalized into `[0, TICKS_PER_MEASURE)`; overflow and
/// underflow carry into the measure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BeatPosition {
    measure: i32,
    tick: i32,
}

impl BeatPosition {
    /// Create a position, normalizing `tick` into range.
    pub fn new(measure: i32, tick: i32) -> Self {
        Self {
            measure: measure + tick.div_euclid(TICKS_PER_MEASURE),
            tick: tick.rem_euclid(TICKS_PER_MEASURE),
        }
    }

    /// Position of measure zero, tick zero.
    pub fn zero() -> Self {
        Self { measure: 0, tick: 0 }
    }

    pub fn measure(&self) -> i32 {
        self.measure
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    /// Continuous timeline position: `measure + tick / 1920`.
    pub fn measure_decimal(&self) -> f64 {
        f64::from(self.measure) + f64::from(self.tick) / f64::from(TICKS_PER_MEASURE)
    }

    /// Nearest discrete position to a fractional measure.
    pub fn from_measure_decimal(measure_decimal: f64) -> Self {
        let total_ticks = (measure_decimal * f64::from(TICKS_PER_MEASURE)).round() as i64;
        let per_measure = i64::from(TICKS_PER_MEASURE);
        Self {
            measure: total_ticks.div_euclid(per_measure) as i32,
            tick: total_ticks.rem_euclid(per_measure) as i32,
        }
    }
}

/// A musical time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub upper: i32,
    pub lower: i32,
}

impl TimeSignature {
    pub fn new(upper: i32, lower: i32) -> Self {
        Self { upper, lower }
    }

    /// Ratio of this signature to a whole measure: `upper / lower`.
    /// 4/4 has ratio 1.
    pub fn ratio(&self) -> f64 {
        f64::from(self.upper) / f64::from(self.lower)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { upper: 4, lower: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_overflow_carries_into_measure() {
        let beat = BeatPosition::new(2, TICKS_PER_MEASURE + 480);
        assert_eq!(beat.measure(), 3);
        assert_eq!(beat.tick(), 480);
    }

    #[test]
    fn negative_tick_borrows_from_measure() {
        let beat = BeatPosition::new(2, -480);
        assert_eq!(beat.measure(), 1);
        assert_eq!(beat.tick(), TICKS_PER_MEASURE - 480);
    }

    #[test]
    fn measure_decimal_is_measure_plus_fraction() {
        let beat = BeatPosition::new(3, 960);
        assert!((beat.measure_decimal() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn from_measure_decimal_rounds_to_nearest_tick() {
        let beat = BeatPosition::from_measure_decimal(1.0 / 64.0);
        assert_eq!(beat.measure(), 0);
        assert_eq!(beat.tick(), 30);

        // Just under half a tick away still snaps to the same grid point.
        let beat = BeatPosition::from_measure_decimal(1.0 / 64.0 + 0.0001);
        assert_eq!(beat.tick(), 30);
    }

    #[test]
    fn from_measure_decimal_handles_negative_positions() {
        let beat = BeatPosition::from_measure_decimal(-0.5);
        assert_eq!(beat.measure(), -1);
        assert_eq!(beat.tick(), 960);
        assert!((beat.measure_decimal() + 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ordering_is_by_measure_then_tick() {
        let a = BeatPosition::new(1, 1919);
        let b = BeatPosition::new(2, 0);
        let c = BeatPosition::new(2, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn time_signature_ratio() {
        assert!((TimeSignature::default().ratio() - 1.0).abs() < f64::EPSILON);
        assert!((TimeSignature::new(3, 4).ratio() - 0.75).abs() < f64::EPSILON);
        assert!((TimeSignature::new(7, 8).ratio() - 0.875).abs() < f64::EPSILON);
    }
}
