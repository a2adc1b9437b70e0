//! Hold baking: synthesizing joint notes between two hold-chain notes.

use tracing::debug;

use crate::model::chart::Chart;
use crate::model::note::{Note, NoteId, RING_UNITS};
use crate::timing::ChartGeometry;

use super::operation::EditOperation;

/// Measure step between joints generated by [`BakeMethod::LerpRound`].
const LERP_INTERVAL: f64 = 1.0 / 64.0;

/// Interpolation strategy for baking hold joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeMethod {
    /// The axis with the larger absolute delta advances two units per
    /// generated joint, the other one unit.
    SymmetricStep,
    /// Both axes advance one unit per generated joint.
    AsymmetricStep,
    /// Fixed 1/64-measure steps, shortest-arc interpolation of both ring
    /// edges with independent rounding.
    LerpRound,
}

/// Reversible record of one bake: the two endpoints and every generated
/// segment. `revert` re-links start↔end directly and removes the segments;
/// both directions are no-ops when the segment list is empty.
#[derive(Debug, Clone)]
pub struct BakeHoldEdit {
    start: NoteId,
    end: NoteId,
    segments: Vec<(NoteId, Note)>,
}

impl BakeHoldEdit {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.segments.iter().map(|(id, _)| *id)
    }
}

impl EditOperation for BakeHoldEdit {
    fn apply(&self, chart: &mut Chart) {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return;
        };
        for (id, note) in &self.segments {
            chart.restore_note(*id, *note);
        }
        if let Some(note) = chart.note_mut(self.start) {
            note.next_link = Some(first.0);
        }
        if let Some(note) = chart.note_mut(self.end) {
            note.prev_link = Some(last.0);
        }
    }

    fn revert(&self, chart: &mut Chart) {
        if self.segments.is_empty() {
            return;
        }
        for (id, _) in &self.segments {
            chart.remove_note_slot(*id);
        }
        if let Some(note) = chart.note_mut(self.start) {
            note.next_link = Some(self.end);
        }
        if let Some(note) = chart.note_mut(self.end) {
            note.prev_link = Some(self.start);
        }
    }
}

/// Bake joints between two adjacent hold-chain notes and relink the chain
/// through them.
///
/// `length` is the user length parameter controlling joint density for the
/// step strategies; `delta_position`/`delta_size` are the ring deltas the
/// bake covers, signs included. Degenerate spans produce an edit with no
/// segments, which applies and reverts as a no-op.
pub fn bake(
    chart: &mut Chart,
    method: BakeMethod,
    start_id: NoteId,
    end_id: NoteId,
    length: f64,
    delta_position: i32,
    delta_size: i32,
) -> BakeHoldEdit {
    let empty = BakeHoldEdit {
        start: start_id,
        end: end_id,
        segments: Vec::new(),
    };
    let (Some(start), Some(end)) = (
        chart.note(start_id).copied(),
        chart.note(end_id).copied(),
    ) else {
        return empty;
    };

    let notes = match method {
        BakeMethod::SymmetricStep => {
            let interval = 1.0 / ((1.0 / length) * f64::from(delta_position.abs()));
            let (position_step, size_step) = if delta_position.abs() >= delta_size.abs() {
                (2 * delta_position.signum(), delta_size.signum())
            } else {
                (delta_position.signum(), 2 * delta_size.signum())
            };
            step_segments(chart.geometry(), &start, &end, interval, position_step, size_step)
        }
        BakeMethod::AsymmetricStep => {
            let largest = delta_position.abs().max(delta_size.abs());
            let interval = 1.0 / ((1.0 / length) * f64::from(largest));
            step_segments(
                chart.geometry(),
                &start,
                &end,
                interval,
                delta_position.signum(),
                delta_size.signum(),
            )
        }
        BakeMethod::LerpRound => {
            lerp_segments(chart.geometry(), &start, &end, delta_position >= 0)
        }
    };

    if notes.is_empty() {
        return empty;
    }

    let ids: Vec<NoteId> = notes.into_iter().map(|note| chart.insert_note(note)).collect();
    for window in ids.windows(2) {
        chart.link(window[0], window[1]);
    }
    let last = *ids.last().expect("segment list is non-empty");
    chart.link(start_id, ids[0]);
    chart.link(last, end_id);

    let segments = ids
        .iter()
        .filter_map(|&id| chart.note(id).map(|note| (id, *note)))
        .collect::<Vec<_>>();
    debug!(count = segments.len(), ?method, "baked hold segments");

    BakeHoldEdit {
        start: start_id,
        end: end_id,
        segments,
    }
}

/// Generate joints by advancing position and size a fixed amount per step.
///
/// The loop stops once the fractional measure, resolved to its nearest
/// discrete beat, reaches the end note's beat; comparing discretized beats
/// rather than continuous measures keeps a rounding wobble at the boundary
/// from emitting a duplicate segment there.
fn step_segments(
    geometry: &ChartGeometry,
    start: &Note,
    end: &Note,
    interval: f64,
    position_step: i32,
    size_step: i32,
) -> Vec<Note> {
    if !interval.is_finite() || interval <= 0.0 {
        return Vec::new();
    }
    let start_measure = start.beat.measure_decimal();
    let mut notes = Vec::new();
    let mut position = start.position;
    let mut size = start.size;

    for step in 1.. {
        let measure = start_measure + f64::from(step) * interval;
        let beat = geometry.nearest_beat(measure);
        if beat >= end.beat {
            break;
        }
        position += position_step;
        size = (size + size_step).clamp(1, RING_UNITS);
        notes.push(Note::hold_joint(beat, position, size));
    }
    notes
}

/// Generate joints by interpolating both ring edges independently at fixed
/// 1/64-measure steps.
///
/// Each edge takes the shortest arc: when the motion direction is positive
/// and the start edge value exceeds the end edge value, the start value is
/// shifted down one full ring before interpolating (mirrored for negative
/// motion). Edges round to the nearest integer independently, so the derived
/// size can differ by one from the unrounded arc.
fn lerp_segments(
    geometry: &ChartGeometry,
    start: &Note,
    end: &Note,
    positive_direction: bool,
) -> Vec<Note> {
    let start_measure = start.beat.measure_decimal();
    let span = end.beat.measure_decimal() - start_measure;
    if span <= 0.0 {
        return Vec::new();
    }

    let mut near_start = f64::from(start.position);
    let mut far_start = f64::from(start.position + start.size);
    let near_end = f64::from(end.position);
    let far_end = f64::from(end.position + end.size);
    let ring = f64::from(RING_UNITS);
    if positive_direction {
        if near_start > near_end {
            near_start -= ring;
        }
        if far_start > far_end {
            far_start -= ring;
        }
    } else {
        if near_start < near_end {
            near_start += ring;
        }
        if far_start < far_end {
            far_start += ring;
        }
    }

    let mut notes = Vec::new();
    for step in 1.. {
        let measure = start_measure + f64::from(step) * LERP_INTERVAL;
        let beat = geometry.nearest_beat(measure);
        if beat >= end.beat {
            break;
        }
        let t = (measure - start_measure) / span;
        let near = (near_start + (near_end - near_start) * t).round() as i32;
        let far = (far_start + (far_end - far_start) * t).round() as i32;
        let size = far - near;
        let position = near.rem_euclid(RING_UNITS);
        notes.push(Note::hold_joint(beat, position, size));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat::BeatPosition;
    use crate::model::note::NoteKind;
    use crate::test_utils::builders::chart_with_hold;

    #[test]
    fn symmetric_step_advances_two_and_one() {
        let (mut chart, start, end) = chart_with_hold(0);
        chart.note_mut(end).unwrap().position = 16;

        // length 1, delta_position 8: interval 1/8, seven joints inside the
        // measure. Position leads, so it advances 2 per joint.
        let edit = bake(&mut chart, BakeMethod::SymmetricStep, start, end, 1.0, 8, 4);
        assert_eq!(edit.segment_count(), 7);

        let first = chart.note(chart.note(start).unwrap().next_link.unwrap()).unwrap();
        assert_eq!(first.beat, BeatPosition::new(0, 240));
        assert_eq!(first.position, 2);
        assert_eq!(first.size, 5);
        assert_eq!(first.kind, NoteKind::HoldJoint);
    }

    #[test]
    fn symmetric_step_follows_larger_size_delta() {
        let (mut chart, start, end) = chart_with_hold(0);

        let edit = bake(&mut chart, BakeMethod::SymmetricStep, start, end, 1.0, 2, -8);
        assert!(edit.segment_count() > 0);
        let first = chart.note(chart.note(start).unwrap().next_link.unwrap()).unwrap();
        assert_eq!(first.position, 1);
        // Size axis leads, so it shrinks by two per joint.
        assert_eq!(first.size, 2);
    }

    #[test]
    fn asymmetric_step_advances_both_by_one() {
        let (mut chart, start, end) = chart_with_hold(0);

        let edit = bake(&mut chart, BakeMethod::AsymmetricStep, start, end, 1.0, 4, -4);
        assert_eq!(edit.segment_count(), 3);
        let first = chart.note(chart.note(start).unwrap().next_link.unwrap()).unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(first.size, 3);
    }

    #[test]
    fn zero_deltas_bake_nothing() {
        let (mut chart, start, end) = chart_with_hold(0);

        let edit = bake(&mut chart, BakeMethod::SymmetricStep, start, end, 1.0, 0, 0);
        assert_eq!(edit.segment_count(), 0);
        // The chain is untouched, and the empty edit is a no-op both ways.
        assert_eq!(chart.note(start).unwrap().next_link, Some(end));
        edit.revert(&mut chart);
        edit.apply(&mut chart);
        assert_eq!(chart.note(start).unwrap().next_link, Some(end));
        assert_eq!(chart.note(end).unwrap().prev_link, Some(start));
    }

    #[test]
    fn bake_relinks_chain_and_revert_restores_direct_link() {
        let (mut chart, start, end) = chart_with_hold(0);
        chart.note_mut(end).unwrap().position = 8;

        let edit = bake(&mut chart, BakeMethod::AsymmetricStep, start, end, 1.0, 8, 0);
        assert!(edit.segment_count() > 0);
        assert!(chart.validate_chain(start));

        let chain = chart.hold_chain(start);
        assert_eq!(chain.len(), edit.segment_count() + 2);
        assert_eq!(*chain.first().unwrap(), start);
        assert_eq!(*chain.last().unwrap(), end);

        edit.revert(&mut chart);
        assert_eq!(chart.note(start).unwrap().next_link, Some(end));
        assert_eq!(chart.note(end).unwrap().prev_link, Some(start));
        assert_eq!(chart.notes().len(), 2);

        edit.apply(&mut chart);
        assert!(chart.validate_chain(start));
        assert_eq!(chart.hold_chain(start).len(), edit.segment_count() + 2);
    }

    #[test]
    fn lerp_round_takes_short_arc_across_zero() {
        let (mut chart, start, end) = chart_with_hold(0);
        chart.note_mut(start).unwrap().position = 58;
        chart.note_mut(end).unwrap().position = 2;

        // Moving positively from 58 to 2 should pass through 59 and 0, never
        // back across 30.
        let edit = bake(&mut chart, BakeMethod::LerpRound, start, end, 1.0, 4, 0);
        assert_eq!(edit.segment_count(), 63);
        for (_, note) in &edit.segments {
            let ok = note.position >= 58 || note.position <= 2;
            assert!(ok, "position {} left the short arc", note.position);
        }
    }

    #[test]
    fn lerp_round_negative_direction_mirrors() {
        let (mut chart, start, end) = chart_with_hold(0);
        chart.note_mut(start).unwrap().position = 2;
        chart.note_mut(end).unwrap().position = 58;

        let edit = bake(&mut chart, BakeMethod::LerpRound, start, end, 1.0, -4, 0);
        assert_eq!(edit.segment_count(), 63);
        for (_, note) in &edit.segments {
            let ok = note.position >= 58 || note.position <= 2;
            assert!(ok, "position {} left the short arc", note.position);
        }
    }

    #[test]
    fn missing_endpoint_bakes_nothing() {
        let (mut chart, start, end) = chart_with_hold(0);
        chart.remove_note_slot(end);

        let edit = bake(&mut chart, BakeMethod::LerpRound, start, end, 1.0, 4, 0);
        assert_eq!(edit.segment_count(), 0);
    }
}
