//! Boundary between loosely-typed callers and the engine.
//!
//! `RawSessionRequest` accepts what an HTTP body tends to carry (ids as
//! numbers or strings, timestamps as text); `SessionRequest::parse` turns it
//! into integers and `Ms` instants or rejects it as `MalformedInput`.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::engine::ScheduleError;
use crate::model::*;

/// Naive local formats accepted after RFC 3339 fails, read in the deployment zone.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Int(i64),
    Text(String),
}

impl LooseId {
    fn coerce(&self) -> Option<i64> {
        match self {
            LooseId::Int(n) => Some(*n),
            LooseId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSessionRequest {
    pub center_id: LooseId,
    pub template_id: LooseId,
    #[serde(alias = "startDateTime")]
    pub start: String,
    #[serde(alias = "endDateTime")]
    pub end: String,
}

/// A schedule request with every field already typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRequest {
    pub center_id: CenterId,
    pub template_id: TemplateId,
    pub start: Ms,
    pub end: Ms,
}

/// RFC 3339 first, then naive local time in `zone`. Ambiguous or skipped
/// local times (DST transitions) are rejected.
pub fn parse_instant(text: &str, zone: Tz) -> Option<Ms> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .and_then(|naive| zone.from_local_datetime(&naive).single())
        .map(|dt| dt.timestamp_millis())
}

fn positive_id(id: &LooseId, field: &str) -> Result<i64, ScheduleError> {
    match id.coerce() {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(ScheduleError::MalformedInput(format!(
            "{field} must be a positive integer"
        ))),
    }
}

impl SessionRequest {
    pub fn parse(raw: &RawSessionRequest, zone: Tz) -> Result<Self, ScheduleError> {
        let center_id = positive_id(&raw.center_id, "center_id")?;
        let template_id = positive_id(&raw.template_id, "template_id")?;
        let (Some(start), Some(end)) = (parse_instant(&raw.start, zone), parse_instant(&raw.end, zone))
        else {
            return Err(ScheduleError::MalformedInput(
                "invalid datetime format, use ISO 8601 (e.g. 2025-09-05T13:40:00Z)".into(),
            ));
        };
        Ok(Self {
            center_id,
            template_id,
            start,
            end,
        })
    }
}
