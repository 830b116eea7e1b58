// --- File: crates/classbook_common/src/lib.rs ---
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared data structures
pub mod services; // Collaborator contracts

use services::GatewayError;

// Re-export error types and utilities for easier access
pub use error::{
    config_error, conflict, external_service_error, not_found, parse_error, validation_error,
    ClassbookError, HttpStatusCode,
};

pub use http::client::{create_client, join_url};

pub use logging::{init, init_from_config, init_with_level, log_error, log_result};

impl From<GatewayError> for ClassbookError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::DuplicateBooking { .. } => conflict(err),
            GatewayError::DateFull(_) => validation_error(err),
            GatewayError::NotFound(_) => not_found(err),
            GatewayError::Unavailable(_) | GatewayError::InvalidResponse(_) => {
                external_service_error("booking store", err)
            }
        }
    }
}
