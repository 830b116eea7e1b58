// --- File: crates/classbook_booking/src/flow.rs ---
//! The three-step booking wizard as an explicit state object.
//!
//! Every transition is a method returning `Result<_, FlowRejection>`. A rejection leaves
//! the flow unchanged unless documented otherwise, and is a normal outcome for the caller to
//! show, never a failure of the engine.
//!
//! The flow never performs I/O. Operations that need the booking store hand out tickets
//! ([`CountRequest`], [`CommitTicket`]) and accept the result later, which is how stale
//! count answers are discarded and how a second submit is refused while one is in flight.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use classbook_common::models::{CreateBookingRequest, CreatedBooking};
use classbook_common::services::GatewayError;
use classbook_common::{conflict, external_service_error, validation_error, ClassbookError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::availability::{self, DateAvailability, SelectionVerdict, SlotBadge};
use crate::branch::{Branch, BranchId};
use crate::calendar::{build_calendar, CalendarGrid, CalendarMonth};
use crate::confirmation::ScheduledConfirmation;
use crate::lead_time::LeadTimeViolation;
use crate::settings::BookingSettings;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    SelectingDate,
    EnteringDetails,
    Confirmed,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowStep::SelectingDate => "selecting a date",
            FlowStep::EnteringDetails => "entering details",
            FlowStep::Confirmed => "confirmed",
        })
    }
}

/// Fields the user fills in across the first two steps.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingDraft {
    pub branch: Option<BranchId>,
    pub date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub time: Option<NaiveTime>,
    pub name: String,
    pub email: String,
    pub lesson: String,
    pub course: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Branch,
    Date,
    Time,
    Name,
    Email,
    Lesson,
    Course,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DraftField::Branch => "Branch",
            DraftField::Date => "Date",
            DraftField::Time => "Time",
            DraftField::Name => "Name",
            DraftField::Email => "Email",
            DraftField::Lesson => "Lesson",
            DraftField::Course => "Course",
        })
    }
}

/// Booking count of the selected date, as last reported by the store.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "count", rename_all = "snake_case")]
pub enum CountState {
    /// No date selected.
    Unknown,
    Loading,
    Known(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowRejection {
    #[error("This action is not available while {0}")]
    WrongStep(FlowStep),
    #[error("{0} is not a known branch")]
    UnknownBranch(String),
    #[error("Past dates are not available")]
    DateInPast(NaiveDate),
    #[error("{branch} branch is closed on {}s", .date.format("%A"))]
    BranchClosed { branch: BranchId, date: NaiveDate },
    #[error("{0} is required")]
    MissingField(DraftField),
    #[error("Only the {} session can be booked", .offered.format("%H:%M"))]
    TimeNotOffered { offered: NaiveTime },
    #[error("This date is fully booked, please choose another date")]
    DateFull(NaiveDate),
    #[error("Still checking how many spots are left")]
    CapacityPending,
    #[error(transparent)]
    LeadTimeNotMet(#[from] LeadTimeViolation),
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),
    #[error("{0:?} is not an offered course")]
    UnknownCourse(String),
    #[error("A booking is already being submitted")]
    SubmitInFlight,
    #[error("This submission is no longer current")]
    StaleTicket,
}

/// Outcome of a commit attempt that did not produce a booking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] FlowRejection),
    #[error("{email} already has a booking on {date}")]
    DuplicateBooking { email: String, date: NaiveDate },
    #[error("The booking could not be saved, please try again ({0})")]
    Gateway(String),
}

impl From<FlowRejection> for ClassbookError {
    fn from(rejection: FlowRejection) -> Self {
        validation_error(rejection)
    }
}

impl From<SubmitError> for ClassbookError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(rejection) => rejection.into(),
            SubmitError::DuplicateBooking { .. } => conflict(err),
            SubmitError::Gateway(message) => external_service_error("booking store", message),
        }
    }
}

/// Result of changing the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchChange {
    Kept,
    /// The selected date is closed at the new branch and was dropped.
    SelectionCleared(NaiveDate),
}

/// A pending booking-count query for the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRequest {
    pub date: NaiveDate,
    generation: u64,
}

/// Proof that a submit was started; required to finish it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    pub request: CreateBookingRequest,
    generation: u64,
}

/// Read-only view of the flow for the presentation layer.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub step: FlowStep,
    pub draft: BookingDraft,
    pub calendar_month: CalendarMonth,
    pub count: CountState,
    pub badge: Option<SlotBadge>,
    pub remaining: Option<u32>,
    pub submitting: bool,
    pub confirmation: Option<ScheduledConfirmation>,
}

#[derive(Debug, Clone)]
pub struct BookingFlow {
    settings: Arc<BookingSettings>,
    step: FlowStep,
    draft: BookingDraft,
    calendar_month: CalendarMonth,
    count: CountState,
    selection_generation: u64,
    submit_generation: u64,
    submitting: bool,
    confirmation: Option<ScheduledConfirmation>,
}

impl BookingFlow {
    /// A fresh flow showing the month of `today`.
    pub fn new(settings: Arc<BookingSettings>, today: NaiveDate) -> Self {
        Self {
            settings,
            step: FlowStep::SelectingDate,
            draft: BookingDraft::default(),
            calendar_month: CalendarMonth::containing(today),
            count: CountState::Unknown,
            selection_generation: 0,
            submit_generation: 0,
            submitting: false,
            confirmation: None,
        }
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn count_state(&self) -> CountState {
        self.count
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn confirmation(&self) -> Option<&ScheduledConfirmation> {
        self.confirmation.as_ref()
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    fn branch(&self) -> Option<&Branch> {
        self.draft
            .branch
            .as_ref()
            .and_then(|id| self.settings.branches.get(id.as_str()))
    }

    fn known_count(&self) -> Option<u32> {
        match self.count {
            CountState::Known(count) => Some(count),
            _ => None,
        }
    }

    fn clear_selection(&mut self) {
        self.draft.date = None;
        self.draft.time = None;
        self.count = CountState::Unknown;
        // Any count still in flight now belongs to a dropped selection.
        self.selection_generation += 1;
    }

    // --- Calendar navigation: independent of the wizard and the draft ---

    pub fn calendar_month(&self) -> CalendarMonth {
        self.calendar_month
    }

    pub fn calendar(&self) -> CalendarGrid {
        build_calendar(self.calendar_month)
    }

    pub fn next_month(&mut self) -> CalendarMonth {
        self.calendar_month = self.calendar_month.next();
        self.calendar_month
    }

    pub fn previous_month(&mut self) -> CalendarMonth {
        self.calendar_month = self.calendar_month.previous();
        self.calendar_month
    }

    // --- Derived views ---

    /// Availability of the selected date using the latest known count.
    pub fn availability(&self, today: NaiveDate) -> Option<DateAvailability> {
        self.draft.date.map(|date| {
            availability::evaluate(
                date,
                self.branch(),
                today,
                self.known_count(),
                self.settings.max_spots,
            )
        })
    }

    pub fn badge(&self) -> Option<SlotBadge> {
        self.draft.date?;
        Some(match self.count {
            CountState::Known(count) => SlotBadge::for_count(count, self.settings.max_spots),
            CountState::Loading | CountState::Unknown => SlotBadge::Loading,
        })
    }

    pub fn remaining(&self) -> Option<u32> {
        self.known_count()
            .map(|count| availability::remaining(count, self.settings.max_spots))
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step: self.step,
            draft: self.draft.clone(),
            calendar_month: self.calendar_month,
            count: self.count,
            badge: self.badge(),
            remaining: self.remaining(),
            submitting: self.submitting,
            confirmation: self.confirmation.clone(),
        }
    }

    // --- Step 1: date, time, branch ---

    /// Switches the branch. A selected date closed at the new branch is cleared, and the
    /// details step falls back to date selection.
    pub fn set_branch(&mut self, name: &str) -> Result<BranchChange, FlowRejection> {
        if self.step == FlowStep::Confirmed {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if self.submitting {
            return Err(FlowRejection::SubmitInFlight);
        }
        let branch = self
            .settings
            .branches
            .get(name)
            .ok_or_else(|| FlowRejection::UnknownBranch(name.to_string()))?;
        let verdict = availability::revalidate_selection(self.draft.date, Some(branch));
        self.draft.branch = Some(branch.id().clone());

        match verdict {
            SelectionVerdict::Keep => Ok(BranchChange::Kept),
            SelectionVerdict::Clear(date) => {
                debug!("Branch {} closes {}, clearing selection", name, date);
                self.clear_selection();
                self.step = FlowStep::SelectingDate;
                Ok(BranchChange::SelectionCleared(date))
            }
        }
    }

    /// Selects a date and asks the caller to fetch its booking count.
    pub fn select_date(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<CountRequest, FlowRejection> {
        if self.step != FlowStep::SelectingDate {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if availability::is_past(date, today) {
            return Err(FlowRejection::DateInPast(date));
        }
        if let Some(branch) = self.branch().filter(|b| b.is_closed_on(date)) {
            return Err(FlowRejection::BranchClosed {
                branch: branch.id().clone(),
                date,
            });
        }

        self.draft.date = Some(date);
        self.draft.time = None;
        self.count = CountState::Loading;
        self.selection_generation += 1;
        debug!("Selected {} (generation {})", date, self.selection_generation);

        Ok(CountRequest {
            date,
            generation: self.selection_generation,
        })
    }

    /// Applies a count answer. Returns `false` when the answer is for an older selection.
    pub fn apply_count(&mut self, request: CountRequest, count: u32) -> bool {
        if !self.is_current(&request) {
            debug!(
                "Discarding stale count {} for {} (generation {})",
                count, request.date, request.generation
            );
            return false;
        }
        self.count = CountState::Known(count);
        if availability::is_full(count, self.settings.max_spots) {
            self.draft.time = None;
        }
        true
    }

    /// A failed count query counts as zero bookings; the submit re-check still guards capacity.
    pub fn apply_count_failure(&mut self, request: CountRequest, error: &GatewayError) -> bool {
        if !self.is_current(&request) {
            return false;
        }
        warn!("Failed to fetch booking count for {}: {}", request.date, error);
        self.count = CountState::Known(0);
        true
    }

    fn is_current(&self, request: &CountRequest) -> bool {
        request.generation == self.selection_generation && self.draft.date == Some(request.date)
    }

    pub fn select_time(&mut self, time: NaiveTime) -> Result<(), FlowRejection> {
        if self.step != FlowStep::SelectingDate {
            return Err(FlowRejection::WrongStep(self.step));
        }
        let date = self.draft.date.ok_or(FlowRejection::MissingField(DraftField::Date))?;
        if time != self.settings.session_start {
            return Err(FlowRejection::TimeNotOffered {
                offered: self.settings.session_start,
            });
        }
        if let Some(count) = self.known_count() {
            if availability::is_full(count, self.settings.max_spots) {
                return Err(FlowRejection::DateFull(date));
            }
        }
        self.draft.time = Some(time);
        Ok(())
    }

    /// Moves to the details form when the selection is complete, the date is selectable
    /// with the freshest count, and the session is far enough ahead of `now`.
    pub fn proceed_to_details(&mut self, now: DateTime<Utc>) -> Result<(), FlowRejection> {
        if self.step != FlowStep::SelectingDate {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if self.draft.branch.is_none() {
            return Err(FlowRejection::MissingField(DraftField::Branch));
        }
        let date = self.draft.date.ok_or(FlowRejection::MissingField(DraftField::Date))?;
        match self.draft.time {
            None => return Err(FlowRejection::MissingField(DraftField::Time)),
            Some(time) if time != self.settings.session_start => {
                return Err(FlowRejection::TimeNotOffered {
                    offered: self.settings.session_start,
                })
            }
            Some(_) => {}
        }
        if self.known_count().is_none() {
            return Err(FlowRejection::CapacityPending);
        }

        let today = now.with_timezone(&self.settings.time_zone).date_naive();
        self.ensure_selectable(date, today)?;
        self.settings.lead_time_policy().check(date, now)?;

        self.step = FlowStep::EnteringDetails;
        debug!("Proceeding to details for {}", date);
        Ok(())
    }

    fn ensure_selectable(&self, date: NaiveDate, today: NaiveDate) -> Result<(), FlowRejection> {
        let verdict = availability::evaluate(
            date,
            self.branch(),
            today,
            self.known_count(),
            self.settings.max_spots,
        );
        if verdict.is_past {
            return Err(FlowRejection::DateInPast(date));
        }
        if verdict.is_branch_closed {
            if let Some(branch) = self.draft.branch.clone() {
                return Err(FlowRejection::BranchClosed { branch, date });
            }
        }
        if verdict.is_full {
            return Err(FlowRejection::DateFull(date));
        }
        Ok(())
    }

    pub fn back_to_calendar(&mut self) -> Result<(), FlowRejection> {
        if self.step != FlowStep::EnteringDetails {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if self.submitting {
            return Err(FlowRejection::SubmitInFlight);
        }
        self.step = FlowStep::SelectingDate;
        Ok(())
    }

    // --- Step 2: details ---

    fn ensure_editable(&self) -> Result<(), FlowRejection> {
        if self.step == FlowStep::Confirmed {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if self.submitting {
            return Err(FlowRejection::SubmitInFlight);
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FlowRejection> {
        self.ensure_editable()?;
        self.draft.name = name.into();
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), FlowRejection> {
        self.ensure_editable()?;
        self.draft.email = email.into();
        Ok(())
    }

    pub fn set_lesson(&mut self, lesson: impl Into<String>) -> Result<(), FlowRejection> {
        self.ensure_editable()?;
        self.draft.lesson = lesson.into();
        Ok(())
    }

    pub fn set_course(&mut self, course: impl Into<String>) -> Result<(), FlowRejection> {
        self.ensure_editable()?;
        self.draft.course = course.into();
        Ok(())
    }

    /// Checks the form fields in display order.
    pub fn validate_details(&self) -> Result<(), FlowRejection> {
        if self.draft.name.trim().is_empty() {
            return Err(FlowRejection::MissingField(DraftField::Name));
        }
        let email = self.draft.email.trim();
        if email.is_empty() {
            return Err(FlowRejection::MissingField(DraftField::Email));
        }
        if !looks_like_email(email) {
            return Err(FlowRejection::InvalidEmail(email.to_string()));
        }
        if self.draft.lesson.trim().is_empty() {
            return Err(FlowRejection::MissingField(DraftField::Lesson));
        }
        let course = self.draft.course.trim();
        if course.is_empty() {
            return Err(FlowRejection::MissingField(DraftField::Course));
        }
        if !self.settings.accepts_course(course) {
            return Err(FlowRejection::UnknownCourse(course.to_string()));
        }
        Ok(())
    }

    // --- Commit ---

    /// Starts the commit. Only one commit may be outstanding at a time.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<CommitTicket, FlowRejection> {
        if self.step != FlowStep::EnteringDetails {
            return Err(FlowRejection::WrongStep(self.step));
        }
        if self.submitting {
            return Err(FlowRejection::SubmitInFlight);
        }
        let branch = self
            .draft
            .branch
            .clone()
            .ok_or(FlowRejection::MissingField(DraftField::Branch))?;
        let date = self.draft.date.ok_or(FlowRejection::MissingField(DraftField::Date))?;
        self.validate_details()?;
        let today = now.with_timezone(&self.settings.time_zone).date_naive();
        self.ensure_selectable(date, today)?;

        self.submitting = true;
        self.submit_generation += 1;
        Ok(CommitTicket {
            request: CreateBookingRequest {
                branch: branch.as_str().to_string(),
                date,
                email: self.draft.email.trim().to_string(),
                name: self.draft.name.trim().to_string(),
                lesson: self.draft.lesson.trim().to_string(),
                course: self.draft.course.trim().to_string(),
            },
            generation: self.submit_generation,
        })
    }

    fn owns(&self, ticket: &CommitTicket) -> bool {
        self.submitting && ticket.generation == self.submit_generation
    }

    /// Re-validates capacity with a count fetched right before the commit.
    pub fn recheck_capacity(&mut self, ticket: &CommitTicket, count: u32) -> Result<(), FlowRejection> {
        if !self.owns(ticket) {
            return Err(FlowRejection::StaleTicket);
        }
        let date = ticket.request.date;
        if self.draft.date == Some(date) {
            self.count = CountState::Known(count);
        }
        if availability::is_full(count, self.settings.max_spots) {
            info!("{} filled up before the commit ({} bookings)", date, count);
            self.submitting = false;
            return Err(FlowRejection::DateFull(date));
        }
        Ok(())
    }

    /// Releases the single-flight guard without committing.
    pub fn abort_submit(&mut self, ticket: &CommitTicket) {
        if self.owns(ticket) {
            self.submitting = false;
        }
    }

    /// Finishes the commit with the store's answer.
    pub fn complete_submit(
        &mut self,
        ticket: CommitTicket,
        result: Result<CreatedBooking, GatewayError>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledConfirmation, SubmitError> {
        if !self.owns(&ticket) {
            return Err(FlowRejection::StaleTicket.into());
        }
        self.submitting = false;

        match result {
            Ok(created) => {
                let confirmation =
                    ScheduledConfirmation::build(&self.settings, created.id, &ticket.request, now);
                info!(
                    "Booking {} committed for {} on {}",
                    confirmation.booking_id, confirmation.email, confirmation.date
                );
                self.draft = BookingDraft::default();
                self.count = CountState::Unknown;
                self.step = FlowStep::Confirmed;
                self.confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(GatewayError::DuplicateBooking { email, date }) => {
                info!("Duplicate booking refused for {} on {}", email, date);
                Err(SubmitError::DuplicateBooking { email, date })
            }
            Err(GatewayError::DateFull(date)) => {
                if self.draft.date == Some(date) {
                    self.count = CountState::Known(self.settings.max_spots);
                }
                Err(FlowRejection::DateFull(date).into())
            }
            Err(other) => {
                warn!("Booking commit failed: {}", other);
                Err(SubmitError::Gateway(other.to_string()))
            }
        }
    }

    /// Starts over with an empty draft.
    pub fn reset(&mut self, today: NaiveDate) {
        let settings = Arc::clone(&self.settings);
        let selection_generation = self.selection_generation + 1;
        let submit_generation = self.submit_generation + 1;
        *self = Self::new(settings, today);
        self.selection_generation = selection_generation;
        self.submit_generation = submit_generation;
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
