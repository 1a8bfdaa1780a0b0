//! A classroom's flat cell sequence and the operations that keep it
//! consistent with the owning organisation's shape.

use serde::{Deserialize, Serialize};

use super::{Cell, GridAddress, GridError, GridShape};
use crate::domain::TeacherId;

/// Flat, row-major cell sequence for one classroom.
///
/// The grid does not record its own shape. The owning organisation's
/// [`GridShape`] is passed to every shape-sensitive operation so the two can
/// never disagree silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimetableGrid {
    cells: Vec<Cell>,
}

/// Result of migrating a grid to a new shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reshaped {
    /// The rebuilt grid, sized for the new shape.
    pub grid: TimetableGrid,
    /// Non-empty cells that had no place in the new shape.
    pub dropped: usize,
}

impl TimetableGrid {
    /// A grid of `shape.slot_count()` empty cells.
    ///
    /// # Examples
    /// ```
    /// use timetable::domain::grid::{GridShape, TimetableGrid};
    ///
    /// let shape = GridShape::new(5, 6).expect("valid shape");
    /// let grid = TimetableGrid::initialize(shape);
    /// assert_eq!(grid.len(), 30);
    /// assert!(grid.cells().iter().all(|cell| cell.is_empty()));
    /// ```
    #[must_use]
    pub fn initialize(shape: GridShape) -> Self {
        Self {
            cells: vec![Cell::empty(); shape.slot_count()],
        }
    }

    /// Wrap an existing cell sequence without checking its length.
    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Number of stored cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cells are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in flat order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the stored length matches `shape`.
    #[must_use]
    pub fn matches(&self, shape: GridShape) -> bool {
        self.cells.len() == shape.slot_count()
    }

    /// Fail with [`GridError::ShapeMismatch`] unless the length matches.
    pub fn ensure_shape(&self, shape: GridShape) -> Result<(), GridError> {
        if self.matches(shape) {
            Ok(())
        } else {
            Err(GridError::ShapeMismatch {
                expected: shape.slot_count(),
                actual: self.cells.len(),
            })
        }
    }

    /// Read the cell at `address`.
    pub fn get(&self, address: GridAddress, shape: GridShape) -> Result<&Cell, GridError> {
        let index = address.index_in(shape)?;
        self.cells.get(index).ok_or(GridError::ShapeMismatch {
            expected: shape.slot_count(),
            actual: self.cells.len(),
        })
    }

    /// Replace the cell at `address`, returning the previous value.
    ///
    /// Fails with [`GridError::OutOfRange`] for an invalid address and with
    /// [`GridError::ShapeMismatch`] when the grid must be reshaped first.
    pub fn set(
        &mut self,
        address: GridAddress,
        shape: GridShape,
        cell: Cell,
    ) -> Result<Cell, GridError> {
        let index = address.index_in(shape)?;
        self.ensure_shape(shape)?;
        let actual = self.cells.len();
        let slot = self.cells.get_mut(index).ok_or(GridError::ShapeMismatch {
            expected: shape.slot_count(),
            actual,
        })?;
        Ok(std::mem::replace(slot, cell))
    }

    /// Migrate cells from `from` to `to` on a best-effort basis.
    ///
    /// Every `(day, period)` of the old shape that still fits the new shape
    /// keeps its cell; slots added by growth start empty; slots removed by
    /// shrinkage are dropped. Coordinates are never remapped. Cells missing
    /// from a short grid are treated as empty; non-empty cells past the end
    /// of `from` on an over-long grid count as dropped.
    ///
    /// # Examples
    /// ```
    /// use timetable::domain::TeacherId;
    /// use timetable::domain::grid::{Cell, GridAddress, GridShape, TimetableGrid};
    ///
    /// let narrow = GridShape::new(5, 6).expect("valid shape");
    /// let wide = GridShape::new(5, 8).expect("valid shape");
    /// let mut grid = TimetableGrid::initialize(narrow);
    /// let math = Cell::new([TeacherId::new(1)], ["Math"]);
    /// grid.set(GridAddress::new(1, 2), narrow, math.clone()).expect("in range");
    ///
    /// let reshaped = grid.reshape(narrow, wide);
    /// assert_eq!(reshaped.grid.len(), 40);
    /// assert_eq!(reshaped.grid.get(GridAddress::new(1, 2), wide), Ok(&math));
    /// ```
    #[must_use]
    pub fn reshape(&self, from: GridShape, to: GridShape) -> Reshaped {
        let mut cells = vec![Cell::empty(); to.slot_count()];
        let mut dropped = 0;
        for (index, cell) in self.cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            if index >= from.slot_count() {
                dropped += 1;
                continue;
            }
            let address = GridAddress::from_index(index, from);
            match cells.get_mut(address.to_index(to)) {
                Some(slot) if to.contains(address) => *slot = cell.clone(),
                _ => dropped += 1,
            }
        }
        Reshaped {
            grid: Self { cells },
            dropped,
        }
    }

    /// Flat indices holding a cell that references `teacher`.
    pub fn slots_for(&self, teacher: TeacherId) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, cell)| cell.has_teacher(teacher))
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }
}
