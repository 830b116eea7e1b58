#[cfg(test)]
mod tests {
    use crate::availability::SlotBadge;
    use crate::calendar::CalendarMonth;
    use crate::flow::{
        BookingFlow, BranchChange, CountState, DraftField, FlowRejection, FlowStep, SubmitError,
    };
    use crate::test_support::{date, nine, now, shared_settings, today, utc};
    use chrono::NaiveTime;
    use classbook_common::models::CreatedBooking;
    use classbook_common::services::GatewayError;
    use classbook_common::{ClassbookError, HttpStatusCode};

    fn flow() -> BookingFlow {
        BookingFlow::new(shared_settings(), today())
    }

    fn fill_details(flow: &mut BookingFlow) {
        flow.set_name(" Nimali Perera ").unwrap();
        flow.set_email("nimali@example.com ").unwrap();
        flow.set_lesson("Sugar flowers").unwrap();
        flow.set_course("Nvq").unwrap();
    }

    /// Colombo, Friday 2026-10-23, ten bookings, details filled in.
    fn at_details() -> BookingFlow {
        let mut flow = flow();
        flow.set_branch("Colombo").unwrap();
        let request = flow.select_date(date(2026, 10, 23), today()).unwrap();
        assert!(flow.apply_count(request, 10));
        flow.select_time(nine()).unwrap();
        flow.proceed_to_details(now()).unwrap();
        fill_details(&mut flow);
        flow
    }

    #[test]
    fn test_happy_path_reaches_confirmation() {
        let mut flow = flow();
        assert_eq!(flow.step(), FlowStep::SelectingDate);
        assert_eq!(flow.set_branch("Colombo").unwrap(), BranchChange::Kept);

        let request = flow.select_date(date(2026, 10, 23), today()).unwrap();
        assert_eq!(flow.badge(), Some(SlotBadge::Loading));
        assert!(flow.apply_count(request, 49));
        assert_eq!(flow.badge(), Some(SlotBadge::SpotsLeft(1)));
        assert_eq!(flow.remaining(), Some(1));

        flow.select_time(nine()).unwrap();
        flow.proceed_to_details(now()).unwrap();
        assert_eq!(flow.step(), FlowStep::EnteringDetails);
        fill_details(&mut flow);

        let ticket = flow.begin_submit(now()).unwrap();
        assert!(flow.is_submitting());
        assert_eq!(ticket.request.name, "Nimali Perera");
        assert_eq!(ticket.request.email, "nimali@example.com");
        assert_eq!(ticket.request.branch, "Colombo");

        flow.recheck_capacity(&ticket, 49).unwrap();
        let confirmation = flow
            .complete_submit(ticket, Ok(CreatedBooking { id: "b-1".to_string() }), now())
            .unwrap();

        assert_eq!(confirmation.booking_id, "b-1");
        assert_eq!(confirmation.date, date(2026, 10, 23));
        assert_eq!(flow.step(), FlowStep::Confirmed);
        assert!(!flow.is_submitting());
        assert_eq!(flow.draft().date, None);
        assert_eq!(flow.confirmation().map(|c| c.booking_id.as_str()), Some("b-1"));
    }

    #[test]
    fn test_full_date_blocks_time_selection() {
        let mut flow = flow();
        flow.set_branch("Colombo").unwrap();
        let request = flow.select_date(date(2026, 10, 23), today()).unwrap();
        assert!(flow.apply_count(request, 50));

        assert_eq!(flow.badge(), Some(SlotBadge::Full));
        assert_eq!(flow.badge().unwrap().to_string(), "FULL");
        assert_eq!(
            flow.select_time(nine()),
            Err(FlowRejection::DateFull(date(2026, 10, 23)))
        );
        assert_eq!(
            flow.proceed_to_details(now()),
            Err(FlowRejection::MissingField(DraftField::Time))
        );
    }

    #[test]
    fn test_past_and_closed_dates_are_rejected() {
        let mut flow = flow();
        assert_eq!(
            flow.select_date(date(2026, 10, 17), today()),
            Err(FlowRejection::DateInPast(date(2026, 10, 17)))
        );

        flow.set_branch("Battaramulla").unwrap();
        let rejection = flow.select_date(date(2026, 10, 19), today()).unwrap_err();
        assert!(matches!(rejection, FlowRejection::BranchClosed { .. }));
        assert_eq!(rejection.to_string(), "Battaramulla branch is closed on Mondays");
        assert_eq!(flow.draft().date, None);
    }

    #[test]
    fn test_unknown_branch_is_rejected() {
        let mut flow = flow();
        assert_eq!(
            flow.set_branch("Galle"),
            Err(FlowRejection::UnknownBranch("Galle".to_string()))
        );
        assert_eq!(flow.draft().branch, None);
    }

    #[test]
    fn test_branch_switch_clears_closed_selection() {
        let mut flow = flow();
        flow.set_branch("Colombo").unwrap();
        let request = flow.select_date(date(2026, 10, 19), today()).unwrap();
        flow.apply_count(request, 0);
        flow.select_time(nine()).unwrap();

        assert_eq!(
            flow.set_branch("Battaramulla").unwrap(),
            BranchChange::SelectionCleared(date(2026, 10, 19))
        );
        assert_eq!(flow.draft().date, None);
        assert_eq!(flow.draft().time, None);
        assert_eq!(flow.count_state(), CountState::Unknown);
        assert_eq!(flow.badge(), None);
    }

    #[test]
    fn test_branch_switch_on_details_step_returns_to_calendar() {
        let mut flow = flow();
        flow.set_branch("Colombo").unwrap();
        // Tuesday, more than 24h after now()
        let request = flow.select_date(date(2026, 10, 20), today()).unwrap();
        flow.apply_count(request, 0);
        flow.select_time(nine()).unwrap();
        flow.proceed_to_details(now()).unwrap();

        assert_eq!(
            flow.set_branch("Battaramulla").unwrap(),
            BranchChange::SelectionCleared(date(2026, 10, 20))
        );
        assert_eq!(flow.step(), FlowStep::SelectingDate);
    }

    #[test]
    fn test_branch_switch_keeps_open_selection() {
        let mut flow = at_details();
        assert_eq!(flow.set_branch("Battaramulla").unwrap(), BranchChange::Kept);
        assert_eq!(flow.step(), FlowStep::EnteringDetails);
        assert_eq!(flow.draft().date, Some(date(2026, 10, 23)));
    }

    #[test]
    fn test_stale_count_is_discarded() {
        let mut flow = flow();
        let first = flow.select_date(date(2026, 10, 23), today()).unwrap();
        let second = flow.select_date(date(2026, 10, 24), today()).unwrap();

        assert!(flow.apply_count(second, 3));
        assert!(!flow.apply_count(first, 50));
        assert_eq!(flow.count_state(), CountState::Known(3));
        assert_eq!(flow.remaining(), Some(47));
    }

    #[test]
    fn test_reselecting_the_same_date_discards_the_older_answer() {
        let mut flow = flow();
        let first = flow.select_date(date(2026, 10, 23), today()).unwrap();
        let second = flow.select_date(date(2026, 10, 23), today()).unwrap();

        assert!(!flow.apply_count(first, 50));
        assert_eq!(flow.count_state(), CountState::Loading);
        assert!(flow.apply_count(second, 5));
    }

    #[test]
    fn test_count_failure_counts_as_zero() {
        let mut flow = flow();
        let request = flow.select_date(date(2026, 10, 23), today()).unwrap();
        assert!(flow.apply_count_failure(request, &GatewayError::Unavailable("timeout".into())));
        assert_eq!(flow.count_state(), CountState::Known(0));
        assert_eq!(flow.badge(), Some(SlotBadge::SpotsLeft(50)));
    }

    #[test]
    fn test_only_the_offered_session_can_be_picked() {
        let mut flow = flow();
        assert_eq!(
            flow.select_time(nine()),
            Err(FlowRejection::MissingField(DraftField::Date))
        );
        flow.select_date(date(2026, 10, 23), today()).unwrap();
        assert_eq!(
            flow.select_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            Err(FlowRejection::TimeNotOffered { offered: nine() })
        );
    }

    #[test]
    fn test_proceed_requires_branch_and_count() {
        let mut flow = flow();
        flow.select_date(date(2026, 10, 23), today()).unwrap();
        flow.select_time(nine()).unwrap();
        assert_eq!(
            flow.proceed_to_details(now()),
            Err(FlowRejection::MissingField(DraftField::Branch))
        );

        flow.set_branch("Kandy").unwrap();
        assert_eq!(
            flow.proceed_to_details(now()),
            Err(FlowRejection::CapacityPending)
        );
    }

    #[test]
    fn test_lead_time_boundary_on_proceed() {
        let session_day = date(2026, 10, 21);
        let prepare = |now| {
            let mut flow = BookingFlow::new(shared_settings(), date(2026, 10, 20));
            flow.set_branch("Colombo").unwrap();
            let request = flow.select_date(session_day, date(2026, 10, 20)).unwrap();
            flow.apply_count(request, 0);
            flow.select_time(nine()).unwrap();
            flow.proceed_to_details(now).map(|_| flow.step())
        };

        // The session starts at 2026-10-21 03:30 UTC
        assert_eq!(
            prepare(utc(2026, 10, 20, 3, 30, 0)),
            Ok(FlowStep::EnteringDetails)
        );
        let rejection = prepare(utc(2026, 10, 20, 3, 30, 1)).unwrap_err();
        assert!(matches!(rejection, FlowRejection::LeadTimeNotMet(_)));
        assert_eq!(
            rejection.to_string(),
            "Bookings must be made at least 24 hours in advance"
        );
    }

    #[test]
    fn test_details_are_validated_in_order() {
        let mut flow = at_details();
        flow.set_name("  ").unwrap();
        assert_eq!(
            flow.begin_submit(now()),
            Err(FlowRejection::MissingField(DraftField::Name))
        );

        flow.set_name("Nimali").unwrap();
        flow.set_email("nimali.example.com").unwrap();
        assert_eq!(
            flow.begin_submit(now()),
            Err(FlowRejection::InvalidEmail("nimali.example.com".to_string()))
        );

        flow.set_email("nimali@example.com").unwrap();
        flow.set_course("Pastry 101").unwrap();
        assert_eq!(
            flow.begin_submit(now()),
            Err(FlowRejection::UnknownCourse("Pastry 101".to_string()))
        );
        assert!(!flow.is_submitting());
    }

    #[test]
    fn test_second_submit_is_refused_while_in_flight() {
        let mut flow = at_details();
        let ticket = flow.begin_submit(now()).unwrap();

        assert_eq!(flow.begin_submit(now()), Err(FlowRejection::SubmitInFlight));
        assert_eq!(flow.set_name("Other"), Err(FlowRejection::SubmitInFlight));
        assert_eq!(flow.back_to_calendar(), Err(FlowRejection::SubmitInFlight));
        assert_eq!(flow.set_branch("Kandy"), Err(FlowRejection::SubmitInFlight));

        flow.recheck_capacity(&ticket, 10).unwrap();
        flow.complete_submit(ticket, Ok(CreatedBooking { id: "b-1".into() }), now())
            .unwrap();
        assert_eq!(
            flow.begin_submit(now()),
            Err(FlowRejection::WrongStep(FlowStep::Confirmed))
        );
    }

    #[test]
    fn test_recheck_catches_a_date_that_filled_up() {
        let mut flow = at_details();
        let ticket = flow.begin_submit(now()).unwrap();

        assert_eq!(
            flow.recheck_capacity(&ticket, 50),
            Err(FlowRejection::DateFull(date(2026, 10, 23)))
        );
        assert!(!flow.is_submitting());
        assert_eq!(flow.badge(), Some(SlotBadge::Full));
        assert_eq!(
            flow.begin_submit(now()),
            Err(FlowRejection::DateFull(date(2026, 10, 23)))
        );
    }

    #[test]
    fn test_duplicate_booking_keeps_the_draft() {
        let mut flow = at_details();
        let ticket = flow.begin_submit(now()).unwrap();
        flow.recheck_capacity(&ticket, 10).unwrap();

        let err = flow
            .complete_submit(
                ticket,
                Err(GatewayError::DuplicateBooking {
                    email: "nimali@example.com".into(),
                    date: date(2026, 10, 23),
                }),
                now(),
            )
            .unwrap_err();

        assert!(matches!(err, SubmitError::DuplicateBooking { .. }));
        assert_eq!(ClassbookError::from(err).status_code(), 409);
        assert_eq!(flow.step(), FlowStep::EnteringDetails);
        assert_eq!(flow.draft().name, " Nimali Perera ");
        assert!(!flow.is_submitting());
    }

    #[test]
    fn test_gateway_failure_allows_retry() {
        let mut flow = at_details();
        let ticket = flow.begin_submit(now()).unwrap();
        let err = flow
            .complete_submit(ticket, Err(GatewayError::Unavailable("reset".into())), now())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Gateway(_)));
        assert_eq!(ClassbookError::from(err).status_code(), 502);

        assert!(flow.begin_submit(now()).is_ok());
    }

    #[test]
    fn test_ticket_is_stale_after_reset() {
        let mut flow = at_details();
        let ticket = flow.begin_submit(now()).unwrap();
        flow.reset(today());

        assert_eq!(flow.step(), FlowStep::SelectingDate);
        assert_eq!(
            flow.recheck_capacity(&ticket, 0),
            Err(FlowRejection::StaleTicket)
        );
        let err = flow
            .complete_submit(ticket, Ok(CreatedBooking { id: "late".into() }), now())
            .unwrap_err();
        assert_eq!(err, SubmitError::Rejected(FlowRejection::StaleTicket));
        assert!(flow.confirmation().is_none());
    }

    #[test]
    fn test_month_navigation_leaves_the_draft_alone() {
        let mut flow = flow();
        flow.select_date(date(2026, 10, 23), today()).unwrap();
        for _ in 0..5 {
            flow.next_month();
        }
        assert_eq!(flow.calendar_month(), CalendarMonth::new(2027, 3).unwrap());
        assert_eq!(flow.draft().date, Some(date(2026, 10, 23)));
        assert_eq!(flow.calendar().month, 3);

        flow.previous_month();
        assert_eq!(flow.calendar_month(), CalendarMonth::new(2027, 2).unwrap());
    }

    #[test]
    fn test_transitions_check_the_step() {
        let mut flow = at_details();
        assert_eq!(
            flow.select_date(date(2026, 10, 24), today()),
            Err(FlowRejection::WrongStep(FlowStep::EnteringDetails))
        );
        flow.back_to_calendar().unwrap();
        assert_eq!(flow.step(), FlowStep::SelectingDate);
        assert_eq!(
            flow.back_to_calendar(),
            Err(FlowRejection::WrongStep(FlowStep::SelectingDate))
        );
        // Going back keeps the selection and the details
        assert_eq!(flow.draft().date, Some(date(2026, 10, 23)));
        assert_eq!(flow.draft().course, "Nvq");
    }

    #[test]
    fn test_rejections_map_to_unprocessable() {
        let err: ClassbookError = FlowRejection::CapacityPending.into();
        assert_eq!(err.status_code(), 422);
    }
}
