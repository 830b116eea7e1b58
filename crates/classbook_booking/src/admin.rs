// --- File: crates/classbook_booking/src/admin.rs ---
//! Staff-side filtering of stored bookings.

use chrono::NaiveDate;
use classbook_common::models::BookingRecord;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Criteria combined with AND. Unset criteria match everything.
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    /// Exact course name.
    pub course: Option<String>,
    /// Exact branch name.
    pub branch: Option<String>,
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
}

impl BookingFilter {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && blank(&self.course)
            && blank(&self.branch)
            && blank(&self.search)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, record: &BookingRecord) -> bool {
        if self.date.is_some_and(|date| record.date != date) {
            return false;
        }
        if let Some(course) = non_blank(&self.course) {
            if record.course != course {
                return false;
            }
        }
        if let Some(branch) = non_blank(&self.branch) {
            if record.branch != branch {
                return false;
            }
        }
        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            if !record.name.to_lowercase().contains(&needle)
                && !record.email.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Matching records, ordered by date and then name.
    pub fn apply(&self, records: &[BookingRecord]) -> Vec<BookingRecord> {
        let mut matching: Vec<BookingRecord> =
            records.iter().filter(|r| self.matches(r)).cloned().collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        matching
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn blank(value: &Option<String>) -> bool {
    non_blank(value).is_none()
}

/// Number of bookings per date, ascending by date.
pub fn bookings_per_date(records: &[BookingRecord]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.date).or_insert(0) += 1;
    }
    counts
}
