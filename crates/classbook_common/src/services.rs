//! Collaborator contracts consumed by the booking engine.
//!
//! The engine never talks to storage or mail delivery directly. It depends on these traits,
//! which keeps the scheduling rules testable with in-memory or mocked implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{BookingRecord, CreateBookingRequest, CreatedBooking, Invitation};

/// Failures reported by a booking store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The same email already holds a booking on that date.
    #[error("{email} is already booked on {date}")]
    DuplicateBooking { email: String, date: NaiveDate },

    /// The store refused the booking because the date reached capacity.
    #[error("{0} is fully booked")]
    DateFull(NaiveDate),

    /// The booking to operate on does not exist.
    #[error("booking {0} not found")]
    NotFound(String),

    /// Network or server failure. Retrying is left to the user.
    #[error("booking store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something we could not interpret.
    #[error("unexpected response from booking store: {0}")]
    InvalidResponse(String),
}

/// The query/command contract into the counting and persistence layer.
#[async_trait]
pub trait SlotCapacityGateway: Send + Sync {
    /// Number of existing bookings on `date`.
    ///
    /// Eventually consistent: callers must re-check before committing.
    async fn count_by_date(&self, date: NaiveDate) -> Result<u32, GatewayError>;

    /// Records a booking exactly once, or not at all.
    ///
    /// # Errors
    ///
    /// * `DuplicateBooking` when (email, date) is already taken
    /// * `DateFull` when the store arbitrates capacity and the date is full
    /// * `Unavailable` on transport failures; no booking may exist afterwards
    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, GatewayError>;
}

/// Staff-side access to stored bookings.
#[async_trait]
pub trait BookingAdminGateway: Send + Sync {
    /// All stored bookings.
    async fn list_bookings(&self) -> Result<Vec<BookingRecord>, GatewayError>;

    /// Removes one booking by id.
    async fn delete_booking(&self, id: &str) -> Result<(), GatewayError>;
}

/// Failures of the post-commit invitation side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invitation delivery failed: {0}")]
    Delivery(String),
    #[error("invitation rejected: {0}")]
    Rejected(String),
}

/// Best-effort delivery of the calendar invitation for a committed booking.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError>;
}
