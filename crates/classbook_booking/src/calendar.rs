// --- File: crates/classbook_booking/src/calendar.rs ---
//! Monday-first month grids for the date picker.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of cells in a grid: six full weeks.
pub const GRID_CELLS: usize = 42;

/// A viewed (year, month) pair. Months are 1-based.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    /// Returns `None` when `month` is outside `1..=12` or when any day of its six-week grid
    /// falls outside chrono's date range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let start = grid_start(first)?;
        start.checked_add_signed(Duration::days(GRID_CELLS as i64 - 1))?;
        Some(Self { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in every constructor.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The following month. Stays put at the last month that still has a full grid.
    pub fn next(self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year.saturating_add(1), 1)
        } else {
            (self.year, self.month + 1)
        };
        Self::new(year, month).unwrap_or(self)
    }

    /// The preceding month. Stays put at the first month that still has a full grid.
    pub fn previous(self) -> Self {
        let (year, month) = if self.month == 1 {
            (self.year.saturating_sub(1), 12)
        } else {
            (self.year, self.month - 1)
        };
        Self::new(year, month).unwrap_or(self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.cells.first().map(|c| c.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.cells.last().map(|c| c.date)
    }

    /// Cells belonging to the viewed month, in order.
    pub fn month_cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().filter(|c| c.in_current_month)
    }
}

/// Days between the Monday that starts the grid and the first of the month.
pub fn leading_days(month: CalendarMonth) -> usize {
    month.first_day().weekday().num_days_from_monday() as usize
}

fn grid_start(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_sub_signed(Duration::days(i64::from(
        first.weekday().num_days_from_monday(),
    )))
}

/// Builds the six-week grid shown for `month`.
///
/// The grid starts on the Monday on or before the first of the month and always holds
/// [`GRID_CELLS`] consecutive dates.
pub fn build_calendar(month: CalendarMonth) -> CalendarGrid {
    let first = month.first_day();
    // Only months from `containing` on extreme dates can miss a full grid.
    let start = grid_start(first).unwrap_or(NaiveDate::MIN);

    let cells = start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            in_current_month: month.contains(date),
        })
        .collect();

    CalendarGrid {
        year: month.year,
        month: month.month,
        cells,
    }
}
