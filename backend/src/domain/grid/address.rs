//! Row-major addressing for timetable grids.
//!
//! A grid of `days_count × period_count` slots is stored as one flat
//! sequence. Slot `(day, period)` lives at `day * period_count + period`.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of slots a single grid may hold.
pub const MAX_SLOT_COUNT: usize = 10_000;

/// Failures raised by grid addressing and grid mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The address falls outside the grid shape.
    #[error(
        "slot (day {day}, period {period}) is outside a {days_count} x {period_count} grid"
    )]
    OutOfRange {
        day: usize,
        period: usize,
        days_count: usize,
        period_count: usize,
    },
    /// The stored cell sequence does not have the length the shape requires.
    #[error("grid holds {actual} cells but its shape requires {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// The requested shape has a zero dimension or too many slots.
    #[error("grid shape {days_count} x {period_count} is not allowed")]
    InvalidShape {
        days_count: usize,
        period_count: usize,
    },
}

/// Organisation-wide timetable shape.
///
/// ## Invariants
/// - Both dimensions are at least one.
/// - `days_count * period_count` does not exceed [`MAX_SLOT_COUNT`].
///
/// # Examples
/// ```
/// use timetable::domain::grid::GridShape;
///
/// let shape = GridShape::new(5, 6).expect("valid shape");
/// assert_eq!(shape.slot_count(), 30);
/// assert!(GridShape::new(0, 6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridShapeDto", into = "GridShapeDto")]
pub struct GridShape {
    days_count: usize,
    period_count: usize,
}

impl GridShape {
    /// Validate and construct a shape.
    pub fn new(days_count: usize, period_count: usize) -> Result<Self, GridError> {
        let invalid = GridError::InvalidShape {
            days_count,
            period_count,
        };
        if days_count == 0 || period_count == 0 {
            return Err(invalid);
        }
        match days_count.checked_mul(period_count) {
            Some(slots) if slots <= MAX_SLOT_COUNT => Ok(Self {
                days_count,
                period_count,
            }),
            _ => Err(invalid),
        }
    }

    /// Number of days (rows).
    #[must_use]
    pub const fn days_count(&self) -> usize {
        self.days_count
    }

    /// Number of periods per day (columns).
    #[must_use]
    pub const fn period_count(&self) -> usize {
        self.period_count
    }

    /// Total number of slots, `days_count * period_count`.
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.days_count * self.period_count
    }

    /// Whether `address` lies inside this shape.
    #[must_use]
    pub const fn contains(&self, address: GridAddress) -> bool {
        address.day < self.days_count && address.period < self.period_count
    }

    /// Iterate every address in row-major order.
    pub fn addresses(self) -> impl Iterator<Item = GridAddress> {
        (0..self.slot_count()).map(move |index| GridAddress::from_index(index, self))
    }
}

impl Default for GridShape {
    /// Five days of eight periods.
    fn default() -> Self {
        Self {
            days_count: crate::domain::DEFAULT_DAYS_COUNT,
            period_count: crate::domain::DEFAULT_PERIOD_COUNT,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridShapeDto {
    days_count: usize,
    period_count: usize,
}

impl From<GridShape> for GridShapeDto {
    fn from(value: GridShape) -> Self {
        Self {
            days_count: value.days_count,
            period_count: value.period_count,
        }
    }
}

impl TryFrom<GridShapeDto> for GridShape {
    type Error = GridError;

    fn try_from(value: GridShapeDto) -> Result<Self, Self::Error> {
        Self::new(value.days_count, value.period_count)
    }
}

/// A `(day, period)` coordinate inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridAddress {
    /// Zero-based day (row).
    pub day: usize,
    /// Zero-based period within the day (column).
    pub period: usize,
}

impl GridAddress {
    /// Construct an address without checking it against a shape.
    #[must_use]
    pub const fn new(day: usize, period: usize) -> Self {
        Self { day, period }
    }

    /// Flat row-major index of this address.
    ///
    /// Only meaningful once [`GridAddress::validate`] has accepted the
    /// address for `shape`.
    ///
    /// # Examples
    /// ```
    /// use timetable::domain::grid::{GridAddress, GridShape};
    ///
    /// let shape = GridShape::new(5, 6).expect("valid shape");
    /// assert_eq!(GridAddress::new(1, 2).to_index(shape), 8);
    /// ```
    #[must_use]
    pub const fn to_index(self, shape: GridShape) -> usize {
        self.day * shape.period_count + self.period
    }

    /// Recover the address stored at a flat index.
    #[must_use]
    pub const fn from_index(index: usize, shape: GridShape) -> Self {
        Self {
            day: index / shape.period_count,
            period: index % shape.period_count,
        }
    }

    /// Reject addresses outside `shape`.
    pub fn validate(self, shape: GridShape) -> Result<(), GridError> {
        if shape.contains(self) {
            Ok(())
        } else {
            Err(GridError::OutOfRange {
                day: self.day,
                period: self.period,
                days_count: shape.days_count,
                period_count: shape.period_count,
            })
        }
    }

    /// Validate and convert in one step.
    pub fn index_in(self, shape: GridShape) -> Result<usize, GridError> {
        self.validate(shape)?;
        Ok(self.to_index(shape))
    }
}

impl std::fmt::Display for GridAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} period {}", self.day, self.period)
    }
}
