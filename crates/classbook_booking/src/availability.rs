// --- File: crates/classbook_booking/src/availability.rs ---
//! Rules deciding whether a calendar date can be booked.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::branch::Branch;
use crate::calendar::CalendarGrid;

/// Composite verdict for one date. Derived on demand, never stored.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub is_past: bool,
    pub is_branch_closed: bool,
    pub booking_count: u32,
    pub capacity: u32,
    pub is_full: bool,
    pub is_selectable: bool,
}

impl DateAvailability {
    pub fn remaining(&self) -> u32 {
        remaining(self.booking_count, self.capacity)
    }

    pub fn badge(&self) -> SlotBadge {
        SlotBadge::for_count(self.booking_count, self.capacity)
    }
}

pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// Without a branch nothing is closed.
pub fn is_branch_closed(date: NaiveDate, branch: Option<&Branch>) -> bool {
    branch.is_some_and(|b| b.is_closed_on(date))
}

pub fn is_full(booking_count: u32, capacity: u32) -> bool {
    booking_count >= capacity
}

pub fn remaining(booking_count: u32, capacity: u32) -> u32 {
    capacity.saturating_sub(booking_count)
}

/// Evaluates one date. A missing count means nobody booked yet.
pub fn evaluate(
    date: NaiveDate,
    branch: Option<&Branch>,
    today: NaiveDate,
    booking_count: Option<u32>,
    capacity: u32,
) -> DateAvailability {
    let booking_count = booking_count.unwrap_or(0);
    let past = is_past(date, today);
    let closed = is_branch_closed(date, branch);
    let full = is_full(booking_count, capacity);

    DateAvailability {
        date,
        is_past: past,
        is_branch_closed: closed,
        booking_count,
        capacity,
        is_full: full,
        is_selectable: !past && !closed && !full,
    }
}

/// Evaluates every cell of `grid`, looking counts up in `counts`.
pub fn evaluate_grid(
    grid: &CalendarGrid,
    branch: Option<&Branch>,
    today: NaiveDate,
    counts: &HashMap<NaiveDate, u32>,
    capacity: u32,
) -> Vec<DateAvailability> {
    grid.cells
        .iter()
        .map(|cell| evaluate(cell.date, branch, today, counts.get(&cell.date).copied(), capacity))
        .collect()
}

/// Outcome of re-checking a selected date after the branch changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionVerdict {
    Keep,
    /// The selected date is closed at the new branch and must be dropped.
    Clear(NaiveDate),
}

pub fn revalidate_selection(selected: Option<NaiveDate>, branch: Option<&Branch>) -> SelectionVerdict {
    match selected {
        Some(date) if is_branch_closed(date, branch) => {
            debug!("Selected date {} is closed at the new branch", date);
            SelectionVerdict::Clear(date)
        }
        _ => SelectionVerdict::Keep,
    }
}

/// Capacity indicator shown next to the slot button.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "remaining", rename_all = "snake_case")]
pub enum SlotBadge {
    Loading,
    Full,
    SpotsLeft(u32),
}

impl SlotBadge {
    pub fn for_count(booking_count: u32, capacity: u32) -> Self {
        if is_full(booking_count, capacity) {
            SlotBadge::Full
        } else {
            SlotBadge::SpotsLeft(remaining(booking_count, capacity))
        }
    }
}

impl fmt::Display for SlotBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotBadge::Loading => f.write_str("Loading..."),
            SlotBadge::Full => f.write_str("FULL"),
            SlotBadge::SpotsLeft(n) => write!(f, "spots left: {n}"),
        }
    }
}
