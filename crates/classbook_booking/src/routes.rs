// --- File: crates/classbook_booking/src/routes.rs ---

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{
    availability_handler, calendar_handler, create_booking_handler, delete_booking_handler,
    list_bookings_handler, BookingState,
};

/// Creates a router containing all booking routes, relative to `/api`.
pub fn routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/calendar", get(calendar_handler))
        .route("/availability/{date}", get(availability_handler))
        .route("/bookings", post(create_booking_handler))
        .route("/admin/bookings", get(list_bookings_handler))
        .route("/admin/bookings/{id}", delete(delete_booking_handler))
        .with_state(state)
}
