// Reversible chart edits and hold baking.

pub mod hold_baker;
pub mod operation;

pub use hold_baker::{BakeHoldEdit, BakeMethod, bake};
pub use operation::{CompositeEdit, EditOperation, InsertNoteEdit, RemoveNoteEdit};
