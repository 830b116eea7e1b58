// --- File: crates/classbook_booking/src/doc.rs ---

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::admin::BookingFilter;
use crate::availability::{DateAvailability, SlotBadge};
use crate::branch::BranchId;
use crate::confirmation::ScheduledConfirmation;
use crate::handlers::{
    AdminBookingsResponse, AvailabilityQuery, AvailabilityResponse, BookingRequest, CalendarDay,
    CalendarQuery, CalendarResponse,
};
use crate::session::{CommitReport, NotificationStatus};
use classbook_common::models::BookingRecord;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::calendar_handler,
        crate::handlers::availability_handler,
        crate::handlers::create_booking_handler,
        crate::handlers::list_bookings_handler,
        crate::handlers::delete_booking_handler
    ),
    components(
        schemas(
            CalendarQuery,
            CalendarDay,
            CalendarResponse,
            DateAvailability,
            SlotBadge,
            AvailabilityQuery,
            AvailabilityResponse,
            BookingRequest,
            BranchId,
            ScheduledConfirmation,
            NotificationStatus,
            CommitReport,
            BookingFilter,
            BookingRecord,
            AdminBookingsResponse
        )
    ),
    tags(
        (name = "Booking", description = "Date availability and booking API"),
        (name = "Admin", description = "Staff booking listing")
    ),
    servers(
        (url = "/api", description = "Classbook API server")
    )
)]
pub struct BookingApiDoc;
