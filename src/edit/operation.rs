use crate::model::chart::Chart;
use crate::model::note::{Note, NoteId};

/// A reversible chart mutation.
///
/// Constructors named `perform` execute the edit against the chart once and
/// return the record; `apply` re-executes it and `revert` undoes it. The
/// external undo manager only ever calls `apply`/`revert`.
pub trait EditOperation {
    fn apply(&self, chart: &mut Chart);
    fn revert(&self, chart: &mut Chart);
}

/// Insertion of a single note.
#[derive(Debug, Clone)]
pub struct InsertNoteEdit {
    id: NoteId,
    note: Note,
}

impl InsertNoteEdit {
    pub fn perform(chart: &mut Chart, note: Note) -> Self {
        let id = chart.insert_note(note);
        Self { id, note }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }
}

impl EditOperation for InsertNoteEdit {
    fn apply(&self, chart: &mut Chart) {
        chart.restore_note(self.id, self.note);
    }

    fn revert(&self, chart: &mut Chart) {
        chart.remove_note_slot(self.id);
    }
}

/// Snapshot pair for a neighbor touched by a removal.
#[derive(Debug, Clone, Copy)]
struct NeighborFixup {
    id: NoteId,
    before: Note,
    after: Note,
}

/// Removal of a note, with hold-chain relinking.
///
/// An interior joint is spliced out by connecting its neighbors directly; a
/// removed terminal promotes its sole neighbor to take over the terminal's
/// kind. `revert` restores both links and the mutated kind exactly.
#[derive(Debug, Clone)]
pub struct RemoveNoteEdit {
    id: NoteId,
    note: Note,
    fixups: Vec<NeighborFixup>,
}

impl RemoveNoteEdit {
    /// Remove `id` from the chart, returning the reversible record. `None`
    /// if the note does not exist.
    pub fn perform(chart: &mut Chart, id: NoteId) -> Option<Self> {
        let note = *chart.note(id)?;
        let mut fixups = Vec::new();

        match (note.prev_link, note.next_link) {
            (Some(prev), Some(next)) => {
                let before = *chart.note(prev)?;
                let mut after = before;
                after.next_link = Some(next);
                fixups.push(NeighborFixup {
                    id: prev,
                    before,
                    after,
                });

                let before = *chart.note(next)?;
                let mut after = before;
                after.prev_link = Some(prev);
                fixups.push(NeighborFixup {
                    id: next,
                    before,
                    after,
                });
            }
            (Some(prev), None) => {
                let before = *chart.note(prev)?;
                let mut after = before;
                after.next_link = None;
                after.kind = note.kind;
                fixups.push(NeighborFixup {
                    id: prev,
                    before,
                    after,
                });
            }
            (None, Some(next)) => {
                let before = *chart.note(next)?;
                let mut after = before;
                after.prev_link = None;
                after.kind = note.kind;
                fixups.push(NeighborFixup {
                    id: next,
                    before,
                    after,
                });
            }
            (None, None) => {}
        }

        let edit = Self { id, note, fixups };
        edit.apply(chart);
        Some(edit)
    }
}

impl EditOperation for RemoveNoteEdit {
    fn apply(&self, chart: &mut Chart) {
        chart.remove_note_slot(self.id);
        for fixup in &self.fixups {
            if let Some(note) = chart.note_mut(fixup.id) {
                *note = fixup.after;
            }
        }
    }

    fn revert(&self, chart: &mut Chart) {
        chart.restore_note(self.id, self.note);
        for fixup in &self.fixups {
            if let Some(note) = chart.note_mut(fixup.id) {
                *note = fixup.before;
            }
        }
    }
}

/// Several edits applied as one undo step.
#[derive(Default)]
pub struct CompositeEdit {
    edits: Vec<Box<dyn EditOperation>>,
}

impl CompositeEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: Box<dyn EditOperation>) {
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl EditOperation for CompositeEdit {
    fn apply(&self, chart: &mut Chart) {
        for edit in &self.edits {
            edit.apply(chart);
        }
    }

    fn revert(&self, chart: &mut Chart) {
        for edit in self.edits.iter().rev() {
            edit.revert(chart);
        }
    }
}
