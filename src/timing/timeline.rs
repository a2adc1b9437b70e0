use std::collections::BTreeMap;

use tracing::warn;

use crate::model::beat::{BeatPosition, TimeSignature};
use crate::model::gimmick::{Gimmick, GimmickKind};

/// A resolved tempo/meter point with its wall-clock start time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEvent {
    pub beat: BeatPosition,
    pub bpm: f64,
    pub sig: TimeSignature,
    pub start_time_ms: f64,
}

/// Ordered tempo/time-signature events with wall-clock start times.
///
/// Built from the chart's gimmick set; the basis for all time math. A chart
/// without both a BPM change and a time signature change at measure zero has
/// an undefined timeline: `build` yields no events and every query returns a
/// sentinel value instead of raising.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
    offset_ms: f64,
}

/// Milliseconds spanned by one measure at the given tempo and meter.
fn measure_ms(bpm: f64, sig: TimeSignature) -> f64 {
    4.0 * sig.ratio() * (60000.0 / bpm)
}

impl Timeline {
    /// Build the timeline from a gimmick set.
    ///
    /// BPM and time signature changes sharing a beat merge into one event
    /// carrying both resolved values; unset fields inherit the most recent
    /// prior value while walking ascending.
    pub fn build(gimmicks: &[Gimmick], offset_ms: f64) -> Self {
        let mut merged: BTreeMap<BeatPosition, (Option<f64>, Option<TimeSignature>)> =
            BTreeMap::new();
        for gimmick in gimmicks {
            match gimmick.kind {
                GimmickKind::BpmChange { bpm } => {
                    merged.entry(gimmick.beat).or_default().0 = Some(bpm);
                }
                GimmickKind::TimeSignatureChange { sig } => {
                    merged.entry(gimmick.beat).or_default().1 = Some(sig);
                }
                _ => {}
            }
        }

        let defined = merged
            .get(&BeatPosition::zero())
            .is_some_and(|(bpm, sig)| bpm.is_some() && sig.is_some());
        if !defined {
            warn!("timeline undefined: no BPM and time signature change at measure 0");
            return Self {
                events: Vec::new(),
                offset_ms,
            };
        }

        let mut events: Vec<TimelineEvent> = Vec::with_capacity(merged.len());
        let mut bpm = 0.0;
        let mut sig = TimeSignature::default();
        for (beat, (event_bpm, event_sig)) in merged {
            if let Some(event_bpm) = event_bpm {
                bpm = event_bpm;
            }
            if let Some(event_sig) = event_sig {
                sig = event_sig;
            }
            let start_time_ms = match events.last() {
                None => offset_ms,
                Some(prev) => {
                    prev.start_time_ms
                        + (beat.measure_decimal() - prev.beat.measure_decimal())
                            * measure_ms(prev.bpm, prev.sig)
                }
            };
            events.push(TimelineEvent {
                beat,
                bpm,
                sig,
                start_time_ms,
            });
        }

        Self { events, offset_ms }
    }

    /// False when the gimmick set lacked measure-zero tempo/meter events.
    pub fn is_defined(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    /// Event governing the given time: greatest `start_time_ms <= time_ms`,
    /// defaulting to the first event when the query precedes it.
    fn event_at_time(&self, time_ms: f64) -> Option<&TimelineEvent> {
        let idx = self
            .events
            .partition_point(|event| event.start_time_ms <= time_ms);
        self.events.get(idx.saturating_sub(1))
    }

    /// Event governing the given measure position: greatest event measure
    /// `<= measure_decimal`, defaulting to the first event.
    fn event_at_measure(&self, measure_decimal: f64) -> Option<&TimelineEvent> {
        let idx = self
            .events
            .partition_point(|event| event.beat.measure_decimal() <= measure_decimal);
        self.events.get(idx.saturating_sub(1))
    }

    /// Continuous measure position of a wall-clock time.
    ///
    /// Returns `-1.0` when the timeline is undefined.
    pub fn time_to_measure(&self, time_ms: f64) -> f64 {
        let Some(event) = self.event_at_time(time_ms) else {
            return -1.0;
        };
        event.beat.measure_decimal()
            + (time_ms - event.start_time_ms) / measure_ms(event.bpm, event.sig)
    }

    /// Discrete beat of a wall-clock time, rounded to the tick grid.
    ///
    /// Returns measure -1 when the timeline is undefined.
    pub fn time_to_beat(&self, time_ms: f64) -> BeatPosition {
        if !self.is_defined() {
            return BeatPosition::new(-1, 0);
        }
        BeatPosition::from_measure_decimal(self.time_to_measure(time_ms))
    }

    /// Wall-clock time of a continuous measure position.
    ///
    /// Returns `0.0` when the timeline is undefined.
    pub fn measure_to_time(&self, measure_decimal: f64) -> f64 {
        let Some(event) = self.event_at_measure(measure_decimal) else {
            return 0.0;
        };
        event.start_time_ms
            + (measure_decimal - event.beat.measure_decimal()) * measure_ms(event.bpm, event.sig)
    }

    /// Wall-clock time of a discrete beat.
    pub fn beat_to_time(&self, beat: BeatPosition) -> f64 {
        self.measure_to_time(beat.measure_decimal())
    }

    /// Tempo active at the given beat.
    pub fn bpm_at(&self, beat: BeatPosition) -> Option<f64> {
        self.event_at_measure(beat.measure_decimal())
            .map(|event| event.bpm)
    }

    /// Time signature active at the given beat.
    pub fn time_signature_at(&self, beat: BeatPosition) -> Option<TimeSignature> {
        self.event_at_measure(beat.measure_decimal())
            .map(|event| event.sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::builders::baseline_gimmicks;

    #[test]
    fn first_event_starts_at_offset() {
        let timeline = Timeline::build(&baseline_gimmicks(), 250.0);
        assert!(timeline.is_defined());
        assert!((timeline.events()[0].start_time_ms - 250.0).abs() < 1e-9);
    }

    #[test]
    fn undefined_without_measure_zero_bpm() {
        let gimmicks = vec![
            Gimmick::bpm_change(1, 0, 120.0),
            Gimmick::time_signature_change(0, 0, 4, 4),
        ];
        let timeline = Timeline::build(&gimmicks, 0.0);
        assert!(!timeline.is_defined());
        assert_eq!(timeline.time_to_beat(1000.0), BeatPosition::new(-1, 0));
        assert!((timeline.beat_to_time(BeatPosition::new(1, 0)) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn undefined_without_measure_zero_time_signature() {
        let gimmicks = vec![Gimmick::bpm_change(0, 0, 120.0)];
        let timeline = Timeline::build(&gimmicks, 0.0);
        assert!(!timeline.is_defined());
    }

    #[test]
    fn merges_bpm_and_signature_at_same_beat() {
        let mut gimmicks = baseline_gimmicks();
        gimmicks.push(Gimmick::bpm_change(2, 0, 240.0));
        gimmicks.push(Gimmick::time_signature_change(2, 0, 3, 4));
        let timeline = Timeline::build(&gimmicks, 0.0);
        assert_eq!(timeline.events().len(), 2);

        let merged = timeline.events()[1];
        assert!((merged.bpm - 240.0).abs() < 1e-9);
        assert_eq!(merged.sig, TimeSignature::new(3, 4));
    }

    #[test]
    fn events_inherit_prior_values() {
        let mut gimmicks = baseline_gimmicks();
        gimmicks.push(Gimmick::time_signature_change(1, 0, 3, 4));
        gimmicks.push(Gimmick::bpm_change(2, 0, 60.0));
        let timeline = Timeline::build(&gimmicks, 0.0);

        // The signature-only event keeps the measure-zero BPM, and the
        // BPM-only event keeps the 3/4 signature.
        assert!((timeline.events()[1].bpm - 120.0).abs() < 1e-9);
        assert_eq!(timeline.events()[2].sig, TimeSignature::new(3, 4));
    }

    #[test]
    fn start_times_follow_recurrence() {
        // 120 BPM 4/4: one measure = 2000ms. After the change at measure 2,
        // 240 BPM halves the measure duration.
        let mut gimmicks = baseline_gimmicks();
        gimmicks.push(Gimmick::bpm_change(2, 0, 240.0));
        let timeline = Timeline::build(&gimmicks, 0.0);

        assert!((timeline.events()[1].start_time_ms - 4000.0).abs() < 1e-6);
        assert!((timeline.beat_to_time(BeatPosition::new(3, 0)) - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn time_sig_ratio_scales_measure_duration() {
        let gimmicks = vec![
            Gimmick::bpm_change(0, 0, 120.0),
            Gimmick::time_signature_change(0, 0, 3, 4),
        ];
        let timeline = Timeline::build(&gimmicks, 0.0);
        // 3/4 at 120 BPM: 1500ms per measure.
        assert!((timeline.beat_to_time(BeatPosition::new(1, 0)) - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn time_before_first_event_extrapolates_backwards() {
        let timeline = Timeline::build(&baseline_gimmicks(), 1000.0);
        let measure = timeline.time_to_measure(0.0);
        assert!((measure + 0.5).abs() < 1e-9);
    }

    #[test]
    fn conversions_are_inverses() {
        let mut gimmicks = baseline_gimmicks();
        gimmicks.push(Gimmick::bpm_change(2, 0, 200.0));
        gimmicks.push(Gimmick::time_signature_change(4, 960, 7, 8));
        let timeline = Timeline::build(&gimmicks, 30.0);

        for &time_ms in &[0.0, 30.0, 1999.0, 4000.0, 4001.0, 9500.0, 60000.0] {
            let measure = timeline.time_to_measure(time_ms);
            let back = timeline.measure_to_time(measure);
            assert!(
                (back - time_ms).abs() < 1e-6,
                "round trip failed for {time_ms}ms: got {back}ms"
            );
        }
    }

    #[test]
    fn active_value_lookups() {
        let mut gimmicks = baseline_gimmicks();
        gimmicks.push(Gimmick::bpm_change(2, 0, 240.0));
        let timeline = Timeline::build(&gimmicks, 0.0);

        assert_eq!(timeline.bpm_at(BeatPosition::new(1, 0)), Some(120.0));
        assert_eq!(timeline.bpm_at(BeatPosition::new(2, 0)), Some(240.0));
        assert_eq!(
            timeline.time_signature_at(BeatPosition::new(5, 0)),
            Some(TimeSignature::default())
        );
    }
}
