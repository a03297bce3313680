//! Static checks on a candidate interval. Pure: no I/O, the clock reading
//! is passed in.
//!
//! [`validate_interval`] applies them in a fixed order and stops at the
//! first violation.

use chrono::{DateTime, Months, Timelike};

use crate::config::SchedulingPolicy;
use crate::limits::{MAX_VALID_TIMESTAMP_MS, MIN_VALID_TIMESTAMP_MS};
use crate::model::*;

use super::ScheduleError;

/// Both instants inside the supported range.
pub fn check_well_formed(start: Ms, end: Ms) -> Result<(), ScheduleError> {
    let in_range = |t: Ms| (MIN_VALID_TIMESTAMP_MS..=MAX_VALID_TIMESTAMP_MS).contains(&t);
    if !in_range(start) || !in_range(end) {
        return Err(ScheduleError::MalformedInput(
            "timestamp outside supported range".into(),
        ));
    }
    Ok(())
}

/// `start < end`; yields the span.
pub fn check_ordering(start: Ms, end: Ms) -> Result<Span, ScheduleError> {
    if start >= end {
        return Err(ScheduleError::InvalidInterval { start, end });
    }
    Ok(Span::new(start, end))
}

pub fn check_not_past(span: &Span, now: Ms) -> Result<(), ScheduleError> {
    if span.start < now || span.end < now {
        return Err(ScheduleError::PastSchedulingAttempt { now });
    }
    Ok(())
}

pub fn check_duration(span: &Span, policy: &SchedulingPolicy) -> Result<(), ScheduleError> {
    if span.duration_ms() != policy.session_duration_ms {
        return Err(ScheduleError::InvalidDuration {
            expected_ms: policy.session_duration_ms,
            actual_ms: span.duration_ms(),
        });
    }
    Ok(())
}

/// Local hour of `start` >= open, local hour of `end` <= close. Hour
/// components only: with close 22, an end at 22:59 still passes.
pub fn check_business_hours(span: &Span, policy: &SchedulingPolicy) -> Result<(), ScheduleError> {
    let hour = |t: Ms| {
        to_local(t, policy.zone)
            .map(|local| local.hour())
            .ok_or_else(|| ScheduleError::MalformedInput("timestamp outside supported range".into()))
    };
    let start_hour = hour(span.start)?;
    let end_hour = hour(span.end)?;
    if start_hour < policy.open_hour || end_hour > policy.close_hour {
        return Err(ScheduleError::OutsideBusinessHours {
            start_hour,
            end_hour,
            open_hour: policy.open_hour,
            close_hour: policy.close_hour,
        });
    }
    Ok(())
}

/// Latest permitted start: `now` plus the horizon in calendar months, in the
/// deployment zone. Falls back to UTC arithmetic when the local result does
/// not exist (DST gap).
pub fn latest_start(now: Ms, policy: &SchedulingPolicy) -> Option<Ms> {
    let months = Months::new(policy.booking_horizon_months?);
    to_local(now, policy.zone)
        .and_then(|local| local.checked_add_months(months))
        .map(|t| t.timestamp_millis())
        .or_else(|| {
            DateTime::from_timestamp_millis(now)
                .and_then(|utc| utc.checked_add_months(months))
                .map(|t| t.timestamp_millis())
        })
}

pub fn check_horizon(span: &Span, now: Ms, policy: &SchedulingPolicy) -> Result<(), ScheduleError> {
    if let Some(latest) = latest_start(now, policy)
        && span.start > latest
    {
        return Err(ScheduleError::BeyondBookingHorizon {
            latest_start: latest,
        });
    }
    Ok(())
}

/// Run every static rule against `[start, end)` using the single clock
/// reading `now`.
pub fn validate_interval(
    start: Ms,
    end: Ms,
    now: Ms,
    policy: &SchedulingPolicy,
) -> Result<Span, ScheduleError> {
    check_well_formed(start, end)?;
    let span = check_ordering(start, end)?;
    check_not_past(&span, now)?;
    check_duration(&span, policy)?;
    check_business_hours(&span, policy)?;
    check_horizon(&span, now, policy)?;
    Ok(span)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    const M: Ms = MINUTE_MS;

    fn kolkata(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Ms {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap();
        chrono_tz::Asia::Kolkata
            .from_local_datetime(&naive)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    fn policy() -> SchedulingPolicy {
        SchedulingPolicy::default()
    }

    /// Far enough before every fixture that nothing is in the past.
    fn early_now() -> Ms {
        kolkata(2025, 10, 1, 0, 0)
    }

    #[test]
    fn valid_interval_passes_and_returns_span() {
        let start = kolkata(2025, 10, 21, 9, 0);
        let span = validate_interval(start, start + 50 * M, early_now(), &policy()).unwrap();
        assert_eq!(span, Span::new(start, start + 50 * M));
    }

    #[test]
    fn out_of_range_timestamps_are_malformed() {
        let err = validate_interval(0, 50 * M, 0, &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::MalformedInput(_)));
        let err = validate_interval(i64::MAX - 1, i64::MAX, early_now(), &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::MalformedInput(_)));
    }

    #[test]
    fn equal_or_inverted_bounds_are_invalid_interval() {
        let t = kolkata(2025, 10, 21, 9, 0);
        for (s, e) in [(t, t), (t + 50 * M, t)] {
            let err = validate_interval(s, e, early_now(), &policy()).unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidInterval { .. }), "{err}");
        }
    }

    #[test]
    fn inverted_bounds_win_over_every_later_rule() {
        // In the past, wrong length, outside hours: still reported as ordering.
        let s = kolkata(2025, 1, 1, 23, 0);
        let err = validate_interval(s, s - 7 * M, kolkata(2025, 6, 1, 0, 0), &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInterval { .. }));
    }

    #[test]
    fn past_start_or_end_rejected() {
        let start = kolkata(2025, 10, 21, 9, 0);
        let now = start + 1;
        let err = validate_interval(start, start + 50 * M, now, &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::PastSchedulingAttempt { .. }));
    }

    #[test]
    fn start_exactly_now_is_accepted() {
        let start = kolkata(2025, 10, 21, 9, 0);
        assert!(validate_interval(start, start + 50 * M, start, &policy()).is_ok());
    }

    #[test]
    fn duration_must_be_exactly_fifty_minutes() {
        let start = kolkata(2025, 10, 21, 9, 0);
        for minutes in [49, 51, 30, 60] {
            let err =
                validate_interval(start, start + minutes * M, early_now(), &policy()).unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidDuration { .. }), "{minutes}: {err}");
        }
        let err = validate_interval(start, start + 50 * M + 1, early_now(), &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDuration { actual_ms, .. } if actual_ms == 50 * M + 1));
    }

    #[test]
    fn start_before_six_rejected() {
        let start = kolkata(2025, 10, 21, 5, 59);
        let err = validate_interval(start, start + 50 * M, early_now(), &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::OutsideBusinessHours { start_hour: 5, .. }));
    }

    #[test]
    fn start_at_six_accepted() {
        let start = kolkata(2025, 10, 21, 6, 0);
        assert!(validate_interval(start, start + 50 * M, early_now(), &policy()).is_ok());
    }

    #[test]
    fn end_hour_boundary_is_hour_granular() {
        // 21:10 → 22:00 passes
        let s = kolkata(2025, 10, 21, 21, 10);
        assert!(validate_interval(s, s + 50 * M, early_now(), &policy()).is_ok());
        // 21:11 → 22:01 also passes: only the hour component is compared
        let s = kolkata(2025, 10, 21, 21, 11);
        assert!(validate_interval(s, s + 50 * M, early_now(), &policy()).is_ok());
        // 21:40 → 22:30 passes for the same reason
        let s = kolkata(2025, 10, 21, 21, 40);
        assert!(validate_interval(s, s + 50 * M, early_now(), &policy()).is_ok());
        // 22:10 → 23:00 fails
        let s = kolkata(2025, 10, 21, 22, 10);
        let err = validate_interval(s, s + 50 * M, early_now(), &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::OutsideBusinessHours { end_hour: 23, .. }));
    }

    #[test]
    fn hours_follow_configured_zone() {
        // 09:00 in Kolkata is 03:30 UTC, before opening in a UTC deployment.
        let start = kolkata(2025, 10, 21, 9, 0);
        let utc_policy = SchedulingPolicy {
            zone: chrono_tz::UTC,
            ..policy()
        };
        let err = validate_interval(start, start + 50 * M, early_now(), &utc_policy).unwrap_err();
        assert!(matches!(err, ScheduleError::OutsideBusinessHours { start_hour: 3, .. }));
    }

    #[test]
    fn horizon_is_three_calendar_months() {
        let now = kolkata(2025, 10, 1, 8, 0);
        assert_eq!(latest_start(now, &policy()), Some(kolkata(2026, 1, 1, 8, 0)));

        let ok = kolkata(2026, 1, 1, 8, 0);
        assert!(validate_interval(ok, ok + 50 * M, now, &policy()).is_ok());

        let late = kolkata(2026, 1, 1, 9, 0);
        let err = validate_interval(late, late + 50 * M, now, &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::BeyondBookingHorizon { .. }));
    }

    #[test]
    fn horizon_can_be_disabled() {
        let now = kolkata(2025, 10, 1, 8, 0);
        let unlimited = SchedulingPolicy {
            booking_horizon_months: None,
            ..policy()
        };
        let far = kolkata(2027, 5, 5, 10, 0);
        assert!(validate_interval(far, far + 50 * M, now, &unlimited).is_ok());
    }

    #[test]
    fn same_input_same_verdict() {
        let start = kolkata(2025, 10, 21, 9, 0);
        let kinds: Vec<&str> = (0..5)
            .map(|_| {
                validate_interval(start, start + 49 * M, early_now(), &policy())
                    .unwrap_err()
                    .kind()
            })
            .collect();
        assert!(kinds.iter().all(|k| *k == "invalid_duration"));
    }
}
