#[cfg(test)]
mod tests {
    use crate::clock::FixedClock;
    use crate::flow::{CountState, FlowRejection, FlowStep, SubmitError};
    use crate::gateway::memory::InMemorySlotGateway;
    use crate::session::{month_availability, BookingSession, DetailsInput, NotificationStatus};
    use crate::test_support::{date, nine, now, settings, shared_settings, today};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use classbook_common::models::{CreateBookingRequest, CreatedBooking, Invitation};
    use classbook_common::services::{
        GatewayError, InvitationNotifier, NotifyError, SlotCapacityGateway,
    };
    use mockall::mock;
    use mockall::predicate::eq;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    mock! {
        pub Gateway {}

        #[async_trait]
        impl SlotCapacityGateway for Gateway {
            async fn count_by_date(&self, date: NaiveDate) -> Result<u32, GatewayError>;
            async fn create_booking(
                &self,
                request: &CreateBookingRequest,
            ) -> Result<CreatedBooking, GatewayError>;
        }
    }

    mock! {
        pub Notifier {}

        #[async_trait]
        impl InvitationNotifier for Notifier {
            async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError>;
        }
    }

    /// In-memory store that answers after a per-date delay.
    struct SlowGateway {
        inner: InMemorySlotGateway,
        count_delays: HashMap<NaiveDate, Duration>,
        create_delay: Duration,
    }

    #[async_trait]
    impl SlotCapacityGateway for SlowGateway {
        async fn count_by_date(&self, date: NaiveDate) -> Result<u32, GatewayError> {
            let delay = self.count_delays.get(&date).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            self.inner.count_by_date(date).await
        }

        async fn create_booking(
            &self,
            request: &CreateBookingRequest,
        ) -> Result<CreatedBooking, GatewayError> {
            tokio::time::sleep(self.create_delay).await;
            self.inner.create_booking(request).await
        }
    }

    fn quiet_notifier() -> Arc<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_send_invitation().returning(|_| Ok(()));
        Arc::new(notifier)
    }

    fn session(
        gateway: Arc<dyn SlotCapacityGateway>,
        notifier: Arc<dyn InvitationNotifier>,
    ) -> BookingSession {
        BookingSession::new(
            shared_settings(),
            gateway,
            notifier,
            Arc::new(FixedClock::new(now())),
        )
    }

    fn details() -> DetailsInput {
        DetailsInput {
            name: "Nimali Perera".to_string(),
            email: "nimali@example.com".to_string(),
            lesson: "Sugar flowers".to_string(),
            course: "Nvq".to_string(),
        }
    }

    async fn prepare(session: &BookingSession, day: NaiveDate) {
        session.set_branch("Colombo").unwrap();
        assert!(session.select_date(day).await.unwrap());
        session.select_time(nine()).unwrap();
        session.proceed_to_details().unwrap();
        session.update_details(details()).unwrap();
    }

    #[tokio::test]
    async fn test_submit_commits_and_sends_invitation() {
        let friday = date(2026, 10, 23);
        let mut gateway = MockGateway::new();
        gateway
            .expect_count_by_date()
            .with(eq(friday))
            .times(2)
            .returning(|_| Ok(10));
        gateway
            .expect_create_booking()
            .withf(|request| request.email == "nimali@example.com" && request.course == "Nvq")
            .times(1)
            .returning(|_| Ok(CreatedBooking { id: "b-42".to_string() }));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_invitation()
            .withf(|invitation| {
                invitation.booking_id == "b-42" && invitation.start == "2026-10-23T09:00:00+05:30"
            })
            .times(1)
            .returning(|_| Ok(()));

        let session = session(Arc::new(gateway), Arc::new(notifier));
        prepare(&session, friday).await;
        let report = session.submit().await.unwrap();

        assert_eq!(report.confirmation.booking_id, "b-42");
        assert_eq!(report.notification, NotificationStatus::Delivered);
        assert_eq!(session.snapshot().step, FlowStep::Confirmed);
    }

    #[tokio::test]
    async fn test_invitation_failure_keeps_the_booking() {
        let store = Arc::new(InMemorySlotGateway::new());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_invitation()
            .times(1)
            .returning(|_| Err(NotifyError::Delivery("smtp down".to_string())));

        let session = session(store.clone(), Arc::new(notifier));
        prepare(&session, date(2026, 10, 23)).await;
        let report = session.submit().await.unwrap();

        assert_eq!(
            report.notification,
            NotificationStatus::Failed("invitation delivery failed: smtp down".to_string())
        );
        assert_eq!(store.bookings().len(), 1);
        assert_eq!(session.snapshot().step, FlowStep::Confirmed);
    }

    #[tokio::test]
    async fn test_recheck_refuses_a_date_filled_meanwhile() {
        let friday = date(2026, 10, 23);
        let mut gateway = MockGateway::new();
        let mut calls = 0;
        gateway.expect_count_by_date().times(2).returning(move |_| {
            calls += 1;
            Ok(if calls == 1 { 49 } else { 50 })
        });
        gateway.expect_create_booking().never();

        let session = session(Arc::new(gateway), quiet_notifier());
        prepare(&session, friday).await;
        let err = session.submit().await.unwrap_err();

        assert_eq!(err, SubmitError::Rejected(FlowRejection::DateFull(friday)));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.step, FlowStep::EnteringDetails);
        assert_eq!(snapshot.count, CountState::Known(50));
        assert!(!snapshot.submitting);
    }

    #[tokio::test]
    async fn test_recheck_failure_releases_the_guard() {
        let mut gateway = MockGateway::new();
        let mut calls = 0;
        gateway.expect_count_by_date().returning(move |_| {
            calls += 1;
            if calls == 2 {
                Err(GatewayError::Unavailable("timeout".to_string()))
            } else {
                Ok(0)
            }
        });
        gateway
            .expect_create_booking()
            .times(1)
            .returning(|_| Ok(CreatedBooking { id: "b-1".to_string() }));

        let session = session(Arc::new(gateway), quiet_notifier());
        prepare(&session, date(2026, 10, 23)).await;

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Gateway(_)));
        assert!(!session.snapshot().submitting);

        // Retrying goes through once the store answers again
        assert!(session.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_booking_is_reported() {
        let store = Arc::new(InMemorySlotGateway::new());
        let first = session(store.clone(), quiet_notifier());
        prepare(&first, date(2026, 10, 23)).await;
        first.submit().await.unwrap();

        let second = session(store.clone(), quiet_notifier());
        prepare(&second, date(2026, 10, 23)).await;
        let err = second.submit().await.unwrap_err();

        assert_eq!(
            err,
            SubmitError::DuplicateBooking {
                email: "nimali@example.com".to_string(),
                date: date(2026, 10, 23),
            }
        );
        assert_eq!(store.bookings().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_submit_creates_one_booking() {
        let store = SlowGateway {
            inner: InMemorySlotGateway::new(),
            count_delays: HashMap::from([(date(2026, 10, 23), Duration::from_millis(20))]),
            create_delay: Duration::from_millis(50),
        };
        let store = Arc::new(store);
        let session = session(store.clone(), quiet_notifier());
        prepare(&session, date(2026, 10, 23)).await;

        let (first, second) = tokio::join!(session.submit(), session.submit());

        assert!(first.is_ok());
        assert_eq!(
            second.unwrap_err(),
            SubmitError::Rejected(FlowRejection::SubmitInFlight)
        );
        assert_eq!(store.inner.bookings().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_selected_date_wins() {
        let slow_day = date(2026, 10, 23);
        let fast_day = date(2026, 10, 24);
        let inner = InMemorySlotGateway::new();
        inner.seed(slow_day, 50);
        inner.seed(fast_day, 7);
        let store = SlowGateway {
            inner,
            count_delays: HashMap::from([
                (slow_day, Duration::from_millis(100)),
                (fast_day, Duration::from_millis(10)),
            ]),
            create_delay: Duration::ZERO,
        };
        let session = session(Arc::new(store), quiet_notifier());

        let (slow, fast) = tokio::join!(session.select_date(slow_day), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            session.select_date(fast_day).await
        });

        assert_eq!(slow, Ok(false));
        assert_eq!(fast, Ok(true));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.draft.date, Some(fast_day));
        assert_eq!(snapshot.count, CountState::Known(7));
        assert_eq!(snapshot.remaining, Some(43));
    }

    #[tokio::test]
    async fn test_month_availability_skips_past_and_closed_dates() {
        let mut gateway = MockGateway::new();
        // Only open future dates of October 2026 are queried
        gateway
            .expect_count_by_date()
            .withf(|d| *d >= date(2026, 10, 18))
            .returning(|d| {
                if d == date(2026, 10, 23) {
                    Ok(50)
                } else {
                    Err(GatewayError::Unavailable("flaky".to_string()))
                }
            });

        let settings = settings();
        let branch = settings.branches.get("Battaramulla").unwrap();
        let grid = crate::calendar::build_calendar(crate::calendar::CalendarMonth::containing(
            today(),
        ));

        let days = month_availability(&gateway, &grid, Some(branch), today(), 50).await;
        let find = |d| days.iter().find(|a| a.date == d).copied().unwrap();

        assert!(find(date(2026, 10, 23)).is_full);
        assert!(find(date(2026, 10, 26)).is_branch_closed);
        assert!(find(date(2026, 10, 2)).is_past);
        assert_eq!(find(date(2026, 10, 24)).booking_count, 0);
        assert!(find(date(2026, 10, 24)).is_selectable);
    }

    #[tokio::test]
    async fn test_reset_starts_over() {
        let session = session(Arc::new(InMemorySlotGateway::new()), quiet_notifier());
        prepare(&session, date(2026, 10, 23)).await;
        session.submit().await.unwrap();

        session.reset();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.step, FlowStep::SelectingDate);
        assert!(snapshot.confirmation.is_none());
        assert_eq!(snapshot.draft.branch, None);
    }
}
