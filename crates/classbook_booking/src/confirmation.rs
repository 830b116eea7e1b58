// --- File: crates/classbook_booking/src/confirmation.rs ---
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use classbook_common::models::{CreateBookingRequest, Invitation};
use serde::{Deserialize, Serialize};

use crate::branch::BranchId;
use crate::settings::BookingSettings;

/// Snapshot of a committed booking, shown on the confirmation step.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledConfirmation {
    pub booking_id: String,
    pub branch: BranchId,
    pub date: NaiveDate,
    /// e.g. "Friday, October 23, 2026"
    pub date_label: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:00:00"))]
    pub time: NaiveTime,
    /// e.g. "9:00 AM"
    pub time_label: String,
    /// e.g. "9:00 AM – 3:00 PM, Friday, October 23, 2026"
    pub range_label: String,
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: DateTime<FixedOffset>,
    pub time_zone: String,
    /// e.g. "India Standard Time (14:05)"
    pub time_zone_label: String,
    pub duration_label: String,
    pub location: String,
    pub organization: String,
    pub title: String,
    pub name: String,
    pub email: String,
    pub course: String,
    pub lesson: String,
}

impl ScheduledConfirmation {
    pub fn build(
        settings: &BookingSettings,
        booking_id: String,
        request: &CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Self {
        let starts_at = settings
            .lead_time_policy()
            .session_start_on(request.date)
            .fixed_offset();
        let ends_at = starts_at + settings.session_duration;

        Self {
            booking_id,
            branch: BranchId::from(request.branch.clone()),
            date: request.date,
            date_label: format_date_label(request.date),
            time: settings.session_start,
            time_label: format_time_12h(settings.session_start),
            range_label: format_range(request.date, settings.session_start, settings.session_duration),
            starts_at,
            ends_at,
            time_zone: settings.time_zone.name().to_string(),
            time_zone_label: zone_label(&settings.center.time_zone_label, settings.time_zone, now),
            duration_label: settings.duration_label(),
            location: settings.center.address.clone(),
            organization: settings.center.organization.clone(),
            title: settings.center.title.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            course: request.course.clone(),
            lesson: request.lesson.clone(),
        }
    }

    /// Payload for the calendar invitation.
    pub fn invitation(&self) -> Invitation {
        Invitation {
            booking_id: self.booking_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            title: self.title.clone(),
            organization: self.organization.clone(),
            location: self.location.clone(),
            start: self.starts_at.to_rfc3339(),
            end: self.ends_at.to_rfc3339(),
            time_zone: self.time_zone.clone(),
            description: format!(
                "Branch: {}\nCourse: {}\nLesson: {}",
                self.branch, self.course, self.lesson
            ),
        }
    }
}

/// "9:00 AM"
pub fn format_time_12h(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// "Friday, October 23, 2026"
pub fn format_date_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// "9:00 AM – 3:00 PM, Friday, October 23, 2026"
pub fn format_range(date: NaiveDate, start: NaiveTime, duration: Duration) -> String {
    let (end, _) = start.overflowing_add_signed(duration);
    format!(
        "{} – {}, {}",
        format_time_12h(start),
        format_time_12h(end),
        format_date_label(date)
    )
}

/// Display name plus the current venue wall clock, e.g. "India Standard Time (14:05)".
pub fn zone_label(label: &str, time_zone: Tz, now: DateTime<Utc>) -> String {
    format!("{} ({})", label, now.with_timezone(&time_zone).format("%H:%M"))
}
