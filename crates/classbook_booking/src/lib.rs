// --- File: crates/classbook_booking/src/lib.rs ---
pub mod admin;
pub mod availability;
pub mod branch;
pub mod calendar;
pub mod clock;
pub mod confirmation;
pub mod doc;
pub mod flow;
#[cfg(test)]
mod flow_test;
pub mod gateway;
pub mod handlers;
pub mod lead_time;
#[cfg(test)]
mod logic_proptest;
pub mod notifier;
pub mod routes;
pub mod session;
#[cfg(test)]
mod session_test;
pub mod settings;
#[cfg(test)]
mod test_support;

pub use flow::{BookingFlow, FlowRejection, FlowStep, SubmitError};
pub use session::{BookingSession, CommitReport, NotificationStatus};
pub use settings::{BookingSettings, SettingsError};
