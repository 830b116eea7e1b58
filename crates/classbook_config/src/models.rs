// --- File: crates/classbook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level for the crate targets ("trace" .. "error").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are additionally written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// --- Center Config ---
// Static description of the venue, copied into confirmations.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CenterConfig {
    pub organization: String,
    pub title: String,
    pub address: String,
    /// IANA name of the venue's operating time zone, e.g. "Asia/Colombo".
    pub time_zone: String,
    /// Display name shown next to the venue clock. Falls back to `time_zone`.
    #[serde(default)]
    pub time_zone_label: Option<String>,
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// Maximum bookings per calendar date.
    pub max_spots: u32,
    /// Start of the single daily session, "HH:MM" in venue time.
    pub session_start: String,
    pub session_duration_hours: u32,
    /// Minimum hours between now and the session start.
    #[serde(default = "default_lead_time_hours")]
    pub lead_time_hours: u32,
}

fn default_lead_time_hours() -> u32 {
    24
}

// --- Branch Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BranchConfig {
    pub name: String,
    /// Weekdays without sessions, e.g. ["Mon", "Tue"].
    #[serde(default)]
    pub closed_days: Vec<String>,
}

// --- Remote booking store ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

// --- Invitation delivery ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InvitationConfig {
    /// Base URL of the service exposing `/bookings/send-invitation`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub center: CenterConfig,
    pub booking: BookingConfig,
    pub branches: Vec<BranchConfig>,
    /// Accepted course names. Empty means any non-blank course.
    #[serde(default)]
    pub courses: Vec<String>,

    // --- Optional collaborators; in-memory store and log-only invitations when absent ---
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
    #[serde(default)]
    pub invitation: Option<InvitationConfig>,
}
