// --- File: crates/classbook_common/src/http.rs ---
use crate::error::{ClassbookError, HttpStatusCode};

pub mod client;

/// Maps an error into the `(status, message)` pair used by the axum handlers.
pub fn status_and_message(error: &ClassbookError) -> (u16, String) {
    (error.status_code(), error.to_string())
}
