// --- File: crates/classbook_booking/src/handlers.rs ---
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveTime};
use classbook_common::http::status_and_message;
use classbook_common::models::BookingRecord;
use classbook_common::services::{BookingAdminGateway, InvitationNotifier, SlotCapacityGateway};
use classbook_common::{parse_error, ClassbookError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::admin::{bookings_per_date, BookingFilter};
use crate::availability::{self, DateAvailability};
use crate::calendar::{build_calendar, CalendarMonth};
use crate::clock::Clock;
use crate::flow::FlowRejection;
use crate::session::{self, BookingSession, CommitReport, DetailsInput};
use crate::settings::BookingSettings;

/// Shared state of the booking routes.
#[derive(Clone)]
pub struct BookingState {
    pub settings: Arc<BookingSettings>,
    pub gateway: Arc<dyn SlotCapacityGateway>,
    pub admin: Arc<dyn BookingAdminGateway>,
    pub notifier: Arc<dyn InvitationNotifier>,
    pub clock: Arc<dyn Clock>,
}

impl BookingState {
    fn today(&self) -> NaiveDate {
        self.clock.today_in(self.settings.time_zone)
    }

    fn new_session(&self) -> BookingSession {
        BookingSession::new(
            Arc::clone(&self.settings),
            Arc::clone(&self.gateway),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
        )
    }
}

type HandlerError = (StatusCode, String);

fn to_response(err: impl Into<ClassbookError>) -> HandlerError {
    let (status, message) = status_and_message(&err.into());
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        message,
    )
}

fn parse_date(value: &str) -> Result<NaiveDate, HandlerError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        to_response(parse_error(format!(
            "invalid date {value:?}, expected YYYY-MM-DD ({e})"
        )))
    })
}

fn resolve_branch<'a>(
    settings: &'a BookingSettings,
    name: Option<&str>,
) -> Result<Option<&'a crate::branch::Branch>, HandlerError> {
    match name.filter(|n| !n.trim().is_empty()) {
        None => Ok(None),
        Some(name) => settings
            .branches
            .get(name)
            .map(Some)
            .ok_or_else(|| to_response(FlowRejection::UnknownBranch(name.trim().to_string()))),
    }
}

// --- Calendar ---

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    /// 1-based month.
    pub month: Option<u32>,
    pub branch: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarDay {
    pub in_current_month: bool,
    pub availability: DateAvailability,
    /// Badge text for in-month selectable or full dates.
    pub badge: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub branch: Option<String>,
    pub days: Vec<CalendarDay>,
}

/// Month grid with per-date availability.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Six-week grid starting on Monday", body = CalendarResponse),
        (status = 400, description = "Invalid year or month"),
        (status = 422, description = "Unknown branch")
    ),
    tag = "Booking"
))]
pub async fn calendar_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, HandlerError> {
    let today = state.today();
    let current = CalendarMonth::containing(today);
    let (year, month) = (
        query.year.unwrap_or(current.year()),
        query.month.unwrap_or(current.month()),
    );
    let month = CalendarMonth::new(year, month).ok_or_else(|| {
        to_response(parse_error(format!(
            "no calendar for {year}-{month:02}, month must be 1 to 12 within the supported years"
        )))
    })?;
    let branch = resolve_branch(&state.settings, query.branch.as_deref())?;

    let grid = build_calendar(month);
    let evaluated = session::month_availability(
        state.gateway.as_ref(),
        &grid,
        branch,
        today,
        state.settings.max_spots,
    )
    .await;

    let days = grid
        .cells
        .iter()
        .zip(evaluated)
        .map(|(cell, availability)| CalendarDay {
            in_current_month: cell.in_current_month,
            badge: (cell.in_current_month && !availability.is_past && !availability.is_branch_closed)
                .then(|| availability.badge().to_string()),
            availability,
        })
        .collect();

    Ok(Json(CalendarResponse {
        year: month.year(),
        month: month.month(),
        branch: branch.map(|b| b.id().to_string()),
        days,
    }))
}

// --- Single date ---

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub branch: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub availability: DateAvailability,
    pub remaining: u32,
    pub badge: String,
    /// Selectable and far enough ahead to satisfy the lead time.
    pub bookable: bool,
    /// Why the date cannot be booked, when it cannot.
    pub reason: Option<String>,
    pub time_label: String,
    pub duration_label: String,
    pub time_zone_label: String,
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability/{date}",
    params(
        ("date" = String, Path, description = "Date in YYYY-MM-DD format", example = "2026-10-23", format = "date"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability of the date", body = AvailabilityResponse),
        (status = 400, description = "Invalid date"),
        (status = 422, description = "Unknown branch")
    ),
    tag = "Booking"
))]
pub async fn availability_handler(
    State(state): State<Arc<BookingState>>,
    Path(date): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, HandlerError> {
    let date = parse_date(&date)?;
    let settings = &state.settings;
    let branch = resolve_branch(settings, query.branch.as_deref())?;
    let now = state.clock.now();
    let today = state.today();

    let count = match state.gateway.count_by_date(date).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Failed to fetch booking count for {}: {}", date, e);
            0
        }
    };
    let verdict = availability::evaluate(date, branch, today, Some(count), settings.max_spots);

    let reason = if verdict.is_past {
        Some(FlowRejection::DateInPast(date).to_string())
    } else if let Some(branch) = branch.filter(|_| verdict.is_branch_closed) {
        Some(
            FlowRejection::BranchClosed {
                branch: branch.id().clone(),
                date,
            }
            .to_string(),
        )
    } else if verdict.is_full {
        Some(FlowRejection::DateFull(date).to_string())
    } else {
        settings
            .lead_time_policy()
            .check(date, now)
            .err()
            .map(|violation| violation.to_string())
    };

    Ok(Json(AvailabilityResponse {
        remaining: verdict.remaining(),
        badge: verdict.badge().to_string(),
        bookable: reason.is_none(),
        reason,
        time_label: crate::confirmation::format_time_12h(settings.session_start),
        duration_label: settings.duration_label(),
        time_zone_label: crate::confirmation::zone_label(
            &settings.center.time_zone_label,
            settings.time_zone,
            now,
        ),
        availability: verdict,
    }))
}

// --- Booking ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub branch: String,
    /// YYYY-MM-DD
    pub date: String,
    /// "HH:MM"; defaults to the offered session.
    #[serde(default)]
    pub time: Option<String>,
    pub name: String,
    pub email: String,
    pub lesson: String,
    pub course: String,
}

/// Runs the whole wizard for one request and commits the booking.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/bookings",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking created", body = CommitReport),
        (status = 400, description = "Malformed date or time"),
        (status = 409, description = "Email already booked on that date"),
        (status = 422, description = "Rejected: past, closed, full, lead time or invalid details"),
        (status = 502, description = "Booking store unavailable")
    ),
    tag = "Booking"
))]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingState>>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<CommitReport>), HandlerError> {
    let date = parse_date(&payload.date)?;
    let time = match payload.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(value) => NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|e| {
                to_response(parse_error(format!("invalid time {value:?}, expected HH:MM ({e})")))
            })?,
        None => state.settings.session_start,
    };

    let session = state.new_session();
    session.set_branch(&payload.branch).map_err(to_response)?;
    session.select_date(date).await.map_err(to_response)?;
    session.select_time(time).map_err(to_response)?;
    session.proceed_to_details().map_err(to_response)?;
    session
        .update_details(DetailsInput {
            name: payload.name,
            email: payload.email,
            lesson: payload.lesson,
            course: payload.course,
        })
        .map_err(to_response)?;

    let report = session.submit().await.map_err(to_response)?;
    info!(
        "Created booking {} on {} at {}",
        report.confirmation.booking_id, report.confirmation.date, report.confirmation.branch
    );
    Ok((StatusCode::CREATED, Json(report)))
}

// --- Admin ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminBookingsResponse {
    pub total: usize,
    pub bookings: Vec<BookingRecord>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub per_date: BTreeMap<NaiveDate, u32>,
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/bookings",
    params(BookingFilter),
    responses(
        (status = 200, description = "Bookings matching the filter", body = AdminBookingsResponse),
        (status = 502, description = "Booking store unavailable")
    ),
    tag = "Admin"
))]
pub async fn list_bookings_handler(
    State(state): State<Arc<BookingState>>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<AdminBookingsResponse>, HandlerError> {
    let records = state.admin.list_bookings().await.map_err(to_response)?;
    let bookings = filter.apply(&records);
    Ok(Json(AdminBookingsResponse {
        total: bookings.len(),
        per_date: bookings_per_date(&bookings),
        bookings,
    }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/admin/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 404, description = "Booking not found"),
        (status = 502, description = "Booking store unavailable")
    ),
    tag = "Admin"
))]
pub async fn delete_booking_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    state.admin.delete_booking(&id).await.map_err(to_response)?;
    info!("Deleted booking {}", id);
    Ok(StatusCode::NO_CONTENT)
}
