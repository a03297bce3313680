use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. The only instant type inside the engine.
pub type Ms = i64;

pub type CenterId = i64;
pub type TemplateId = i64;

pub const MINUTE_MS: Ms = 60_000;

pub fn now_ms() -> Ms {
    Utc::now().timestamp_millis()
}

/// Wall-clock view of `t` in `zone`. `None` when `t` is outside chrono's range.
pub fn to_local(t: Ms, zone: Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp_millis(t).map(|utc| utc.with_timezone(&zone))
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widen both ends by `buffer`.
    pub fn padded(&self, buffer: Ms) -> Span {
        Span::new(self.start.saturating_sub(buffer), self.end.saturating_add(buffer))
    }
}

/// A committed class session. Only ever written whole, by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: Ulid,
    pub center_id: CenterId,
    pub template_id: TemplateId,
    pub span: Span,
}

impl ClassSession {
    pub fn start(&self) -> Ms {
        self.span.start
    }

    pub fn end(&self) -> Ms {
        self.span.end
    }
}

/// Class template metadata. Owned by exactly one center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub center_id: CenterId,
    pub name: String,
    pub description: Option<String>,
    pub capacity: u32,
}

/// Blackout range, inclusive on both dates, in the deployment's local calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterHoliday {
    pub id: Ulid,
    pub center_id: CenterId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CenterHoliday {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone)]
pub struct CenterState {
    pub id: CenterId,
    pub name: String,
    /// Committed sessions, sorted by `span.start`.
    pub sessions: Vec<ClassSession>,
    pub holidays: Vec<CenterHoliday>,
    pub template_ids: Vec<TemplateId>,
}

impl CenterState {
    pub fn new(id: CenterId, name: String) -> Self {
        Self {
            id,
            name,
            sessions: Vec::new(),
            holidays: Vec::new(),
            template_ids: Vec::new(),
        }
    }

    /// Insert session maintaining sort order by span.start.
    pub fn insert_session(&mut self, session: ClassSession) {
        let pos = self
            .sessions
            .binary_search_by_key(&session.span.start, |s| s.span.start)
            .unwrap_or_else(|e| e);
        self.sessions.insert(pos, session);
    }

    /// Return only sessions whose span overlaps the query window.
    /// Uses binary search to skip sessions starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &ClassSession> {
        let right_bound = self
            .sessions
            .partition_point(|s| s.span.start < query.end);
        self.sessions[..right_bound]
            .iter()
            .filter(move |s| s.span.end > query.start)
    }

    /// First blackout range covering `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&CenterHoliday> {
        self.holidays.iter().find(|h| h.covers(date))
    }
}

/// The event types, flat with no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    CenterCreated {
        id: CenterId,
        name: String,
    },
    TemplateCreated {
        id: TemplateId,
        center_id: CenterId,
        name: String,
        description: Option<String>,
        capacity: u32,
    },
    HolidayAdded {
        id: Ulid,
        center_id: CenterId,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    SessionScheduled {
        id: Ulid,
        center_id: CenterId,
        template_id: TemplateId,
        span: Span,
    },
}

impl Event {
    pub fn center_id(&self) -> CenterId {
        match self {
            Event::CenterCreated { id, .. } => *id,
            Event::TemplateCreated { center_id, .. }
            | Event::HolidayAdded { center_id, .. }
            | Event::SessionScheduled { center_id, .. } => *center_id,
        }
    }
}
