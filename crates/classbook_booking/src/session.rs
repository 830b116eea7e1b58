// --- File: crates/classbook_booking/src/session.rs ---
//! Drives one [`BookingFlow`] against the booking store and the invitation notifier.
//!
//! The flow sits behind a `std::sync::Mutex` that is only held for synchronous transitions,
//! never across an `.await`. Store calls run unlocked and their answers are fed back through
//! the flow's tickets, so a slow answer for an old selection cannot overwrite a newer one.

use chrono::{NaiveDate, NaiveTime};
use classbook_common::services::{GatewayError, InvitationNotifier, SlotCapacityGateway};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::availability::{self, DateAvailability};
use crate::branch::Branch;
use crate::calendar::{CalendarGrid, CalendarMonth};
use crate::clock::Clock;
use crate::confirmation::ScheduledConfirmation;
use crate::flow::{BookingFlow, BranchChange, FlowRejection, FlowSnapshot, SubmitError};
use crate::settings::BookingSettings;

/// Whether the invitation for a committed booking went out.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotificationStatus {
    Delivered,
    Failed(String),
}

/// Everything the confirmation step shows after a successful commit.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub confirmation: ScheduledConfirmation,
    pub notification: NotificationStatus,
}

/// Student-entered form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsInput {
    pub name: String,
    pub email: String,
    pub lesson: String,
    pub course: String,
}

pub struct BookingSession {
    flow: Mutex<BookingFlow>,
    settings: Arc<BookingSettings>,
    gateway: Arc<dyn SlotCapacityGateway>,
    notifier: Arc<dyn InvitationNotifier>,
    clock: Arc<dyn Clock>,
}

impl BookingSession {
    pub fn new(
        settings: Arc<BookingSettings>,
        gateway: Arc<dyn SlotCapacityGateway>,
        notifier: Arc<dyn InvitationNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let today = clock.today_in(settings.time_zone);
        Self {
            flow: Mutex::new(BookingFlow::new(Arc::clone(&settings), today)),
            settings,
            gateway,
            notifier,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookingFlow> {
        // A panic inside a transition leaves the flow in a consistent state.
        self.flow.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Today's date at the venue.
    pub fn today(&self) -> NaiveDate {
        self.clock.today_in(self.settings.time_zone)
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.lock().snapshot()
    }

    pub fn set_branch(&self, name: &str) -> Result<BranchChange, FlowRejection> {
        self.lock().set_branch(name)
    }

    /// Selects a date and loads its booking count.
    ///
    /// Returns whether the fetched count was applied; `false` means a newer selection
    /// happened while the count was loading.
    pub async fn select_date(&self, date: NaiveDate) -> Result<bool, FlowRejection> {
        let today = self.today();
        let request = self.lock().select_date(date, today)?;
        let result = self.gateway.count_by_date(date).await;

        let mut flow = self.lock();
        Ok(match result {
            Ok(count) => flow.apply_count(request, count),
            Err(e) => flow.apply_count_failure(request, &e),
        })
    }

    pub fn select_time(&self, time: NaiveTime) -> Result<(), FlowRejection> {
        self.lock().select_time(time)
    }

    pub fn proceed_to_details(&self) -> Result<(), FlowRejection> {
        let now = self.clock.now();
        self.lock().proceed_to_details(now)
    }

    pub fn back_to_calendar(&self) -> Result<(), FlowRejection> {
        self.lock().back_to_calendar()
    }

    pub fn update_details(&self, details: DetailsInput) -> Result<(), FlowRejection> {
        let mut flow = self.lock();
        flow.set_name(details.name)?;
        flow.set_email(details.email)?;
        flow.set_lesson(details.lesson)?;
        flow.set_course(details.course)
    }

    pub fn next_month(&self) -> CalendarMonth {
        self.lock().next_month()
    }

    pub fn previous_month(&self) -> CalendarMonth {
        self.lock().previous_month()
    }

    pub fn calendar(&self) -> CalendarGrid {
        self.lock().calendar()
    }

    /// Availability of every cell in the viewed month for the chosen branch.
    pub async fn month_availability(&self) -> Vec<DateAvailability> {
        let (grid, branch) = {
            let flow = self.lock();
            let branch = flow
                .draft()
                .branch
                .as_ref()
                .and_then(|id| self.settings.branches.get(id.as_str()))
                .cloned();
            (flow.calendar(), branch)
        };
        month_availability(
            self.gateway.as_ref(),
            &grid,
            branch.as_ref(),
            self.today(),
            self.settings.max_spots,
        )
        .await
    }

    /// Commits the draft: re-checks capacity, creates the booking, then sends the invitation.
    ///
    /// While one submit is outstanding every other submit is refused with
    /// [`FlowRejection::SubmitInFlight`].
    pub async fn submit(&self) -> Result<CommitReport, SubmitError> {
        let ticket = self.lock().begin_submit(self.clock.now())?;
        let date = ticket.request.date;

        let recount = self.gateway.count_by_date(date).await;
        match recount {
            Ok(count) => {
                self.lock().recheck_capacity(&ticket, count)?;
            }
            Err(e) => {
                warn!("Capacity re-check for {} failed: {}", date, e);
                self.lock().abort_submit(&ticket);
                return Err(SubmitError::Gateway(e.to_string()));
            }
        }

        let result = self.gateway.create_booking(&ticket.request).await;
        let confirmation = self.lock().complete_submit(ticket, result, self.clock.now())?;
        let notification = self.notify(&confirmation).await;

        Ok(CommitReport {
            confirmation,
            notification,
        })
    }

    async fn notify(&self, confirmation: &ScheduledConfirmation) -> NotificationStatus {
        match self
            .notifier
            .send_invitation(&confirmation.invitation())
            .await
        {
            Ok(()) => {
                info!("Invitation sent for booking {}", confirmation.booking_id);
                NotificationStatus::Delivered
            }
            Err(e) => {
                warn!(
                    "Invitation for booking {} failed, booking is kept: {}",
                    confirmation.booking_id, e
                );
                NotificationStatus::Failed(e.to_string())
            }
        }
    }

    /// Discards the draft and any confirmation, starting again at date selection.
    pub fn reset(&self) {
        let today = self.today();
        self.lock().reset(today);
    }
}

/// Evaluates every cell of `grid`, fetching counts only for in-month dates that are
/// neither past nor closed. A failed count is treated as zero bookings.
pub async fn month_availability(
    gateway: &dyn SlotCapacityGateway,
    grid: &CalendarGrid,
    branch: Option<&Branch>,
    today: NaiveDate,
    capacity: u32,
) -> Vec<DateAvailability> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for cell in grid.month_cells() {
        let date = cell.date;
        if availability::is_past(date, today) || availability::is_branch_closed(date, branch) {
            continue;
        }
        match gateway.count_by_date(date).await {
            Ok(count) => {
                counts.insert(date, count);
            }
            Err(e) => log_count_failure(date, &e),
        }
    }
    debug!("Loaded {} counts for {}-{:02}", counts.len(), grid.year, grid.month);
    availability::evaluate_grid(grid, branch, today, &counts, capacity)
}

fn log_count_failure(date: NaiveDate, error: &GatewayError) {
    warn!("Failed to fetch booking count for {}: {}", date, error);
}
