//! Timetable grid model: addressing, cells and shape-consistent grids.

mod address;
mod cell;
mod timetable;

pub use address::{GridAddress, GridError, GridShape, MAX_SLOT_COUNT};
pub use cell::Cell;
pub use timetable::{Reshaped, TimetableGrid};
