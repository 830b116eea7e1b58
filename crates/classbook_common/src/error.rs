// --- File: crates/classbook_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type shared by all Classbook crates.
///
/// Crate-specific errors convert into this at the HTTP edge, where
/// [`HttpStatusCode`] decides the response status.
#[derive(Error, Debug)]
pub enum ClassbookError {
    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A request was well-formed but rejected by a booking rule
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., the booking already exists)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ClassbookError {
    fn status_code(&self) -> u16 {
        match self {
            ClassbookError::ParseError(_) => 400,
            ClassbookError::ConfigError(_) => 500,
            ClassbookError::ValidationError(_) => 422,
            ClassbookError::ExternalServiceError { .. } => 502,
            ClassbookError::ConflictError(_) => 409,
            ClassbookError::NotFoundError(_) => 404,
        }
    }
}

// Utility functions for error handling
pub fn parse_error<T: fmt::Display>(message: T) -> ClassbookError {
    ClassbookError::ParseError(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> ClassbookError {
    ClassbookError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> ClassbookError {
    ClassbookError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> ClassbookError {
    ClassbookError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> ClassbookError {
    ClassbookError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> ClassbookError {
    ClassbookError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
