// Pointer input resolution for the ring.

pub mod cursor;

pub use cursor::{DragCursor, InvalidBounds, RolloverState};
