use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timing::ChartGeometry;

use super::gimmick::Gimmick;
use super::note::{Note, NoteId, NoteKind, RING_UNITS};

/// Chart metadata supplied by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartMeta {
    pub title: String,
    pub artist: String,
    pub author: String,
    /// Wall-clock time of measure zero.
    pub offset_ms: f64,
}

/// Flat slotted store of notes with stable indices.
///
/// Removal vacates a slot without shifting ids; an undone removal restores
/// the note into the exact slot it came from, so hold-chain links stay valid
/// across undo/redo splicing.
#[derive(Debug, Clone, Default)]
pub struct NoteArena {
    slots: Vec<Option<Note>>,
    free: Vec<usize>,
}

impl NoteArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: Note) -> NoteId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(note);
                NoteId(index)
            }
            None => {
                self.slots.push(Some(note));
                NoteId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let note = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(note)
    }

    /// Re-insert a note into the slot it was removed from.
    pub fn restore(&mut self, id: NoteId, note: Note) {
        if id.0 >= self.slots.len() {
            self.slots.resize(id.0 + 1, None);
        }
        debug_assert!(self.slots[id.0].is_none(), "restore into occupied slot");
        if let Some(pos) = self.free.iter().position(|&index| index == id.0) {
            self.free.swap_remove(pos);
        }
        self.slots[id.0] = Some(note);
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &Note)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|note| (NoteId(index), note)))
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A chart: note arena, gimmick list, metadata, and the timing geometry
/// derived from the gimmicks.
///
/// Gimmick mutation invalidates and fully rebuilds the geometry; there is no
/// incremental path.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    pub meta: ChartMeta,
    notes: NoteArena,
    gimmicks: Vec<Gimmick>,
    geometry: ChartGeometry,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a chart from loader output. Note ids are assigned in input
    /// order, so pre-built `prev_link`/`next_link` indices stay valid.
    pub fn from_parts(meta: ChartMeta, notes: Vec<Note>, gimmicks: Vec<Gimmick>) -> Self {
        let mut chart = Self {
            meta,
            ..Self::default()
        };
        for note in notes {
            chart.notes.insert(note);
        }
        chart.set_gimmicks(gimmicks);
        chart
    }

    pub fn notes(&self) -> &NoteArena {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(id)
    }

    pub fn insert_note(&mut self, note: Note) -> NoteId {
        self.notes.insert(note)
    }

    pub(crate) fn remove_note_slot(&mut self, id: NoteId) -> Option<Note> {
        self.notes.remove(id)
    }

    pub(crate) fn restore_note(&mut self, id: NoteId, note: Note) {
        self.notes.restore(id, note);
    }

    /// Link two notes as consecutive members of a hold chain.
    pub fn link(&mut self, from: NoteId, to: NoteId) {
        if let Some(note) = self.notes.get_mut(from) {
            note.next_link = Some(to);
        }
        if let Some(note) = self.notes.get_mut(to) {
            note.prev_link = Some(from);
        }
    }

    // --- gimmicks ---

    pub fn gimmicks(&self) -> &[Gimmick] {
        &self.gimmicks
    }

    pub fn insert_gimmick(&mut self, gimmick: Gimmick) {
        let pos = self
            .gimmicks
            .partition_point(|existing| existing.beat <= gimmick.beat);
        self.gimmicks.insert(pos, gimmick);
        self.rebuild_timing();
    }

    pub fn remove_gimmick(&mut self, index: usize) -> Option<Gimmick> {
        if index >= self.gimmicks.len() {
            return None;
        }
        let gimmick = self.gimmicks.remove(index);
        self.rebuild_timing();
        Some(gimmick)
    }

    /// Replace the whole gimmick set, keeping it sorted by beat.
    pub fn set_gimmicks(&mut self, mut gimmicks: Vec<Gimmick>) {
        gimmicks.sort_by(|a, b| a.beat.cmp(&b.beat));
        self.gimmicks = gimmicks;
        self.rebuild_timing();
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    /// Full rebuild of timeline and scaled-position cache.
    pub fn rebuild_timing(&mut self) {
        debug!(
            gimmicks = self.gimmicks.len(),
            "rebuilding chart timing"
        );
        self.geometry.rebuild(&self.gimmicks, self.meta.offset_ms);
    }

    pub fn invalidate_timing(&mut self) {
        self.geometry.invalidate();
    }

    // --- hold chains ---

    /// Walk `prev_link` back to the first note of the chain containing `id`.
    pub fn chain_start(&self, id: NoteId) -> Option<NoteId> {
        let mut current = id;
        let mut hops = 0;
        while let Some(prev) = self.note(current)?.prev_link {
            current = prev;
            hops += 1;
            if hops > self.notes.len() {
                return None; // cycle
            }
        }
        Some(current)
    }

    /// Chain members in order, walking `next_link` from the chain start.
    pub fn hold_chain(&self, id: NoteId) -> Vec<NoteId> {
        let Some(start) = self.chain_start(id) else {
            return Vec::new();
        };
        let mut chain = vec![start];
        let mut current = start;
        while let Some(next) = self.note(current).and_then(|note| note.next_link) {
            if chain.len() > self.notes.len() {
                return Vec::new(); // cycle
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Check the chain invariants from `start`: one HoldStart with no
    /// predecessor, HoldJoint interiors, one HoldEnd with no successor.
    pub fn validate_chain(&self, start: NoteId) -> bool {
        let Some(first) = self.note(start) else {
            return false;
        };
        if first.kind != NoteKind::HoldStart || first.prev_link.is_some() {
            return false;
        }

        let mut current = start;
        let mut hops = 0;
        loop {
            let Some(note) = self.note(current) else {
                return false;
            };
            match note.next_link {
                Some(next) => {
                    let Some(next_note) = self.note(next) else {
                        return false;
                    };
                    if next_note.prev_link != Some(current) {
                        return false;
                    }
                    if note.kind == NoteKind::HoldEnd {
                        return false;
                    }
                    if current != start && note.kind != NoteKind::HoldJoint {
                        return false;
                    }
                    current = next;
                }
                None => return note.kind == NoteKind::HoldEnd,
            }
            hops += 1;
            if hops > self.notes.len() {
                return false; // cycle
            }
        }
    }

    /// The end-of-chart marker, if the loader supplied one.
    pub fn end_of_chart(&self) -> Option<NoteId> {
        self.notes
            .iter()
            .find(|(_, note)| note.kind == NoteKind::EndOfChart)
            .map(|(id, _)| id)
    }

    // --- ring-range repair ---

    /// Notes whose leading edge has drifted outside `[0, RING_UNITS)`.
    pub fn out_of_range_notes(&self) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|(_, note)| !note.is_in_ring_range())
            .map(|(id, _)| id)
            .collect()
    }

    /// Wrap every out-of-range leading edge back into the ring. Idempotent;
    /// returns the number of repaired notes.
    pub fn normalize_positions(&mut self) -> usize {
        let mut repaired = 0;
        for slot in &mut self.notes.slots {
            if let Some(note) = slot {
                if !(0..RING_UNITS).contains(&note.position) {
                    note.position = note.position.rem_euclid(RING_UNITS);
                    repaired += 1;
                }
            }
        }
        if repaired > 0 {
            debug!(repaired, "normalized out-of-range note positions");
        }
        repaired
    }
}

/// Shared chart behind one coarse lock.
///
/// Every mutation runs under the lock for its full duration; concurrent
/// readers (a render pass, a playback-position poll) take the same lock
/// before iterating. Mutations are serialized, never merged or reordered.
#[derive(Debug, Clone, Default)]
pub struct ChartStore {
    inner: Arc<Mutex<Chart>>,
}

impl ChartStore {
    pub fn new(chart: Chart) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chart)),
        }
    }

    /// Run a read-only closure under the chart lock.
    pub fn read<R>(&self, f: impl FnOnce(&Chart) -> R) -> R {
        let guard = self.inner.lock().unwrap();
        f(&guard)
    }

    /// Run a mutating closure under the chart lock, held for the full
    /// duration of the operation.
    pub fn update<R>(&self, f: impl FnOnce(&mut Chart) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }
}
