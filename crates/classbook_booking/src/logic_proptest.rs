#[cfg(test)]
mod tests {
    use crate::availability::{evaluate, SlotBadge};
    use crate::branch::Branch;
    use crate::calendar::{build_calendar, leading_days, CalendarMonth, GRID_CELLS};
    use crate::lead_time::LeadTimePolicy;
    use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
    use proptest::prelude::*;

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2100, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    proptest! {
        #[test]
        fn test_grid_shape(year in 1900i32..2200, month in 1u32..=12) {
            let month = CalendarMonth::new(year, month).unwrap();
            let grid = build_calendar(month);

            prop_assert_eq!(grid.cells.len(), GRID_CELLS);
            prop_assert_eq!(grid.cells[0].date.weekday(), Weekday::Mon);
            prop_assert_eq!(grid.cells[leading_days(month)].date, month.first_day());
            for pair in grid.cells.windows(2) {
                prop_assert_eq!(pair[0].date + Duration::days(1), pair[1].date);
            }
            let in_month = grid.month_cells().count() as u32;
            let next_first = month.next().first_day();
            prop_assert_eq!(in_month as i64, (next_first - month.first_day()).num_days());
        }

        #[test]
        fn test_next_then_previous_is_identity(year in 1900i32..2200, month in 1u32..=12) {
            let month = CalendarMonth::new(year, month).unwrap();
            prop_assert_eq!(month.next().previous(), month);
            prop_assert_eq!(month.previous().next(), month);
        }

        #[test]
        fn test_past_dates_never_selectable(today in any_date(), back in 1i64..4000, count in 0u32..100) {
            let date = today - Duration::days(back);
            prop_assert!(!evaluate(date, None, today, Some(count), 50).is_selectable);
        }

        #[test]
        fn test_closed_weekdays_never_selectable(today in any_date(), ahead in 0i64..400) {
            let branch = Branch::new("Battaramulla", [Weekday::Mon, Weekday::Tue]);
            let date = today + Duration::days(ahead);
            let verdict = evaluate(date, Some(&branch), today, Some(0), 50);
            let closed = matches!(date.weekday(), Weekday::Mon | Weekday::Tue);
            prop_assert_eq!(verdict.is_selectable, !closed);
        }

        #[test]
        fn test_capacity_rules(count in 0u32..200, capacity in 1u32..100) {
            let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
            let verdict = evaluate(today, None, today, Some(count), capacity);
            prop_assert_eq!(verdict.is_full, count >= capacity);
            prop_assert_eq!(verdict.remaining(), capacity.saturating_sub(count));
            prop_assert_eq!(verdict.badge() == SlotBadge::Full, count >= capacity);
        }

        #[test]
        fn test_lead_time_is_exact(offset_secs in -172_800i64..172_800) {
            let policy = LeadTimePolicy::new(
                chrono_tz::Asia::Colombo,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                Duration::hours(24),
            );
            let session = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
            // 2026-10-21 09:00 in Colombo
            let start = Utc.with_ymd_and_hms(2026, 10, 21, 3, 30, 0).unwrap();
            let now = start - Duration::hours(24) + Duration::seconds(offset_secs);
            prop_assert_eq!(policy.check(session, now).is_ok(), offset_secs <= 0);
        }
    }
}
