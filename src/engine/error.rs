use ulid::Ulid;

use crate::model::{CenterId, Ms, TemplateId};
use crate::store::StoreError;

/// Why a session was not scheduled. Every variant except `Store` is a
/// deterministic domain rejection. `Store` wraps a store failure; only a WAL
/// failure is transient and worth retrying.
#[derive(Debug)]
pub enum ScheduleError {
    MalformedInput(String),
    InvalidInterval {
        start: Ms,
        end: Ms,
    },
    PastSchedulingAttempt {
        now: Ms,
    },
    InvalidDuration {
        expected_ms: Ms,
        actual_ms: Ms,
    },
    OutsideBusinessHours {
        start_hour: u32,
        end_hour: u32,
        open_hour: u32,
        close_hour: u32,
    },
    BeyondBookingHorizon {
        latest_start: Ms,
    },
    TemplateNotFound {
        template_id: TemplateId,
        center_id: CenterId,
    },
    HolidayConflict {
        center_id: CenterId,
    },
    /// `existing` is known when the guarded insert names the session it collided with.
    SchedulingConflict {
        center_id: CenterId,
        existing: Option<Ulid>,
    },
    Store(StoreError),
}

impl ScheduleError {
    /// Stable label, used as the metrics `reason`.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::MalformedInput(_) => "malformed_input",
            ScheduleError::InvalidInterval { .. } => "invalid_interval",
            ScheduleError::PastSchedulingAttempt { .. } => "past_scheduling_attempt",
            ScheduleError::InvalidDuration { .. } => "invalid_duration",
            ScheduleError::OutsideBusinessHours { .. } => "outside_business_hours",
            ScheduleError::BeyondBookingHorizon { .. } => "beyond_booking_horizon",
            ScheduleError::TemplateNotFound { .. } => "template_not_found",
            ScheduleError::HolidayConflict { .. } => "holiday_conflict",
            ScheduleError::SchedulingConflict { .. } => "scheduling_conflict",
            ScheduleError::Store(StoreError::WalError(_)) => "store_unavailable",
            ScheduleError::Store(_) => "store_rejected",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ScheduleError::Store(StoreError::WalError(_)))
    }
}

impl From<StoreError> for ScheduleError {
    fn from(e: StoreError) -> Self {
        ScheduleError::Store(e)
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            ScheduleError::InvalidInterval { start, end } => {
                write!(f, "start time must be before end time (start {start}, end {end})")
            }
            ScheduleError::PastSchedulingAttempt { now } => {
                write!(f, "class time cannot be in the past (now {now})")
            }
            ScheduleError::InvalidDuration {
                expected_ms,
                actual_ms,
            } => write!(
                f,
                "class duration must be exactly {} minutes, got {}ms",
                expected_ms / 60_000,
                actual_ms
            ),
            ScheduleError::OutsideBusinessHours {
                start_hour,
                end_hour,
                open_hour,
                close_hour,
            } => write!(
                f,
                "class time must be between {open_hour:02}:00 and {close_hour:02}:00 local \
                 (starts hour {start_hour}, ends hour {end_hour})"
            ),
            ScheduleError::BeyondBookingHorizon { latest_start } => {
                write!(f, "class must start no later than {latest_start}")
            }
            ScheduleError::TemplateNotFound {
                template_id,
                center_id,
            } => write!(f, "template {template_id} not found for center {center_id}"),
            ScheduleError::HolidayConflict { center_id } => {
                write!(f, "class session falls on a holiday at center {center_id}")
            }
            ScheduleError::SchedulingConflict { center_id, existing } => match existing {
                Some(id) => write!(
                    f,
                    "class session overlaps existing session {id} at center {center_id}"
                ),
                None => write!(
                    f,
                    "class session overlaps an existing session at center {center_id}"
                ),
            },
            ScheduleError::Store(e @ StoreError::WalError(_)) => write!(f, "store unavailable: {e}"),
            ScheduleError::Store(e) => write!(f, "store rejected the session: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Store(e) => Some(e),
            _ => None,
        }
    }
}
