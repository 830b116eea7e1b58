// --- File: crates/classbook_booking/src/lead_time.rs ---
//! Minimum notice between "now" and the start of the booked session.
//!
//! The comparison is exact on instants: no rounding to whole hours or minutes is applied.
//! With a 24 hour minimum, a session starting in 23h59m59s is rejected and one starting in
//! exactly 24h00m00s is accepted.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Bookings must be made at least {minimum_hours} hours in advance")]
pub struct LeadTimeViolation {
    pub minimum_hours: i64,
    pub session_start: DateTime<Tz>,
    /// How long until the session starts; negative once it has started.
    pub remaining: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTimePolicy {
    time_zone: Tz,
    session_start: NaiveTime,
    minimum: Duration,
}

impl LeadTimePolicy {
    pub fn new(time_zone: Tz, session_start: NaiveTime, minimum: Duration) -> Self {
        Self {
            time_zone,
            session_start,
            minimum,
        }
    }

    pub fn minimum(&self) -> Duration {
        self.minimum
    }

    /// The instant the session on `date` starts, in venue time.
    pub fn session_start_on(&self, date: NaiveDate) -> DateTime<Tz> {
        resolve_local(self.time_zone, date.and_time(self.session_start))
    }

    pub fn check(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<(), LeadTimeViolation> {
        let session_start = self.session_start_on(date);
        let remaining = session_start.signed_duration_since(now);
        if remaining >= self.minimum {
            Ok(())
        } else {
            Err(LeadTimeViolation {
                minimum_hours: self.minimum.num_hours(),
                session_start,
                remaining,
            })
        }
    }

    /// First date whose session can still be booked at `now`.
    pub fn earliest_bookable_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let mut date = now.with_timezone(&self.time_zone).date_naive();
        while self.check(date, now).is_err() {
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        date
    }
}

/// Resolves a venue-local wall time to an instant.
///
/// Ambiguous times (clocks going back) take the earlier instant; times inside a gap
/// (clocks going forward) move to the first valid instant after it.
fn resolve_local(time_zone: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = local;
    for _ in 0..(4 * 24) {
        if let Some(resolved) = time_zone.from_local_datetime(&candidate).earliest() {
            return resolved;
        }
        candidate += Duration::minutes(15);
    }
    time_zone.from_utc_datetime(&local)
}
