// --- File: crates/classbook_booking/src/test_support.rs ---
//! Shared helpers for the unit tests.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use classbook_config::config_from_toml;
use std::sync::Arc;

use crate::settings::BookingSettings;

pub(crate) const DEFAULT_TOML: &str = include_str!("../../../config/default.toml");

pub(crate) fn settings() -> BookingSettings {
    let config = config_from_toml(DEFAULT_TOML).expect("default config parses");
    BookingSettings::from_config(&config).expect("default config validates")
}

pub(crate) fn shared_settings() -> Arc<BookingSettings> {
    Arc::new(settings())
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid instant")
}

/// Sunday 2026-10-18, 11:30 in Colombo.
pub(crate) fn now() -> DateTime<Utc> {
    utc(2026, 10, 18, 6, 0, 0)
}

pub(crate) fn today() -> NaiveDate {
    date(2026, 10, 18)
}

pub(crate) fn nine() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("valid time")
}
