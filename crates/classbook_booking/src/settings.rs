// --- File: crates/classbook_booking/src/settings.rs ---
//! Validated runtime form of the booking-related configuration.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use classbook_config::AppConfig;
use thiserror::Error;

use crate::branch::BranchDirectory;
use crate::lead_time::LeadTimePolicy;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),
    #[error("invalid session start {0:?}, expected HH:MM")]
    InvalidSessionStart(String),
    #[error("max_spots must be greater than zero")]
    ZeroCapacity,
    #[error("session duration must be greater than zero")]
    ZeroDuration,
    #[error("at least one branch must be configured")]
    NoBranches,
    #[error("invalid branch configuration: {0}")]
    InvalidBranch(String),
}

/// Static description of the venue, copied into confirmations.
#[derive(Debug, Clone)]
pub struct CenterInfo {
    pub organization: String,
    pub title: String,
    pub address: String,
    pub time_zone_label: String,
}

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub center: CenterInfo,
    pub time_zone: Tz,
    /// Start of the single daily session in venue time.
    pub session_start: NaiveTime,
    pub session_duration: Duration,
    pub max_spots: u32,
    pub lead_time: Duration,
    pub branches: BranchDirectory,
    /// Accepted courses; empty accepts any non-blank course.
    pub courses: Vec<String>,
}

impl BookingSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, SettingsError> {
        let time_zone: Tz = config
            .center
            .time_zone
            .parse()
            .map_err(|_| SettingsError::UnknownTimeZone(config.center.time_zone.clone()))?;
        let session_start = NaiveTime::parse_from_str(&config.booking.session_start, "%H:%M")
            .map_err(|_| SettingsError::InvalidSessionStart(config.booking.session_start.clone()))?;
        if config.booking.max_spots == 0 {
            return Err(SettingsError::ZeroCapacity);
        }
        if config.booking.session_duration_hours == 0 {
            return Err(SettingsError::ZeroDuration);
        }

        let center = &config.center;
        Ok(Self {
            center: CenterInfo {
                organization: center.organization.clone(),
                title: center.title.clone(),
                address: center.address.clone(),
                time_zone_label: center
                    .time_zone_label
                    .clone()
                    .unwrap_or_else(|| center.time_zone.clone()),
            },
            time_zone,
            session_start,
            session_duration: Duration::hours(i64::from(config.booking.session_duration_hours)),
            max_spots: config.booking.max_spots,
            lead_time: Duration::hours(i64::from(config.booking.lead_time_hours)),
            branches: BranchDirectory::from_config(&config.branches)?,
            courses: config.courses.clone(),
        })
    }

    pub fn lead_time_policy(&self) -> LeadTimePolicy {
        LeadTimePolicy::new(self.time_zone, self.session_start, self.lead_time)
    }

    /// "6 hr" style label for the session length.
    pub fn duration_label(&self) -> String {
        let hours = self.session_duration.num_hours();
        let minutes = self.session_duration.num_minutes() - hours * 60;
        match (hours, minutes) {
            (h, 0) => format!("{h} hr"),
            (0, m) => format!("{m} min"),
            (h, m) => format!("{h} hr {m} min"),
        }
    }

    pub fn accepts_course(&self, course: &str) -> bool {
        let course = course.trim();
        !course.is_empty() && (self.courses.is_empty() || self.courses.iter().any(|c| c == course))
    }
}
