// --- File: crates/classbook_common/src/models.rs ---
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload sent to the booking store when a draft is committed.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub branch: String,
    /// ISO-8601 calendar date, serialized as "YYYY-MM-DD".
    pub date: NaiveDate,
    pub email: String,
    pub name: String,
    pub lesson: String,
    pub course: String,
}

/// Identifier assigned by the booking store.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBooking {
    #[serde(alias = "_id")]
    pub id: String,
}

/// A stored booking as returned to staff.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub branch: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub course: String,
}

/// Count response of the booking store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookingCount {
    #[serde(default)]
    pub count: u32,
}

/// Calendar invitation handed to the notifier after a commit.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub booking_id: String,
    pub email: String,
    pub name: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    /// Session start as RFC 3339 in the venue time zone.
    pub start: String,
    /// Session end as RFC 3339 in the venue time zone.
    pub end: String,
    pub time_zone: String,
    pub description: String,
}

/// Whether two emails identify the same student.
pub fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
