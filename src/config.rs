use std::path::PathBuf;

use chrono_tz::Tz;

use crate::model::{MINUTE_MS, Ms};

pub const DEFAULT_SESSION_MINUTES: Ms = 50;
pub const DEFAULT_BUFFER_MINUTES: Ms = 10;
pub const DEFAULT_OPEN_HOUR: u32 = 6;
pub const DEFAULT_CLOSE_HOUR: u32 = 22;
pub const DEFAULT_BOOKING_HORIZON_MONTHS: u32 = 3;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Rules every scheduled session is held to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPolicy {
    /// Exact required `end - start`.
    pub session_duration_ms: Ms,
    /// Gap required before and after every existing session at the same center.
    pub buffer_ms: Ms,
    /// Earliest local hour a session may start in.
    pub open_hour: u32,
    /// Latest local hour a session may end in. Compared against the hour
    /// component only, so `22:30` passes with the default of 22.
    pub close_hour: u32,
    /// The single deployment zone used for hours and holiday dates.
    pub zone: Tz,
    /// How far ahead a session may start, in calendar months. `None` = unlimited.
    pub booking_horizon_months: Option<u32>,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            session_duration_ms: DEFAULT_SESSION_MINUTES * MINUTE_MS,
            buffer_ms: DEFAULT_BUFFER_MINUTES * MINUTE_MS,
            open_hour: DEFAULT_OPEN_HOUR,
            close_hour: DEFAULT_CLOSE_HOUR,
            zone: DEFAULT_TIMEZONE,
            booking_horizon_months: Some(DEFAULT_BOOKING_HORIZON_MONTHS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownTimeZone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownTimeZone(name) => write!(f, "unknown time zone: {name}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process-level settings, read from `GYMSCHED_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
    pub policy: SchedulingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            compact_threshold: 1000,
            metrics_port: None,
            policy: SchedulingPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to
    /// their defaults; an unknown time zone is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let data_dir = lookup("GYMSCHED_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let compact_threshold: u64 = lookup("GYMSCHED_COMPACT_THRESHOLD")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.compact_threshold);
        let metrics_port: Option<u16> = lookup("GYMSCHED_METRICS_PORT").and_then(|s| s.parse().ok());

        let zone = match lookup("GYMSCHED_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::UnknownTimeZone(name))?,
            None => DEFAULT_TIMEZONE,
        };
        let booking_horizon_months = match lookup("GYMSCHED_BOOKING_HORIZON_MONTHS")
            .and_then(|s| s.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(months) => Some(months),
            None => Some(DEFAULT_BOOKING_HORIZON_MONTHS),
        };

        Ok(Self {
            data_dir,
            compact_threshold,
            metrics_port,
            policy: SchedulingPolicy {
                zone,
                booking_horizon_months,
                ..SchedulingPolicy::default()
            },
        })
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("gymsched.wal")
    }
}
