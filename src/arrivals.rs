//! Arrival normalization: raw `eta` records to filtered, sorted [`Arrival`]s.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::error::FeedError;
use crate::fetch::RawPayload;
use crate::parser;

/// Display name of a line served by the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Line {
    Brown,
    Purple,
}

impl Line {
    /// Maps a feed route code (`rt`) to its display line.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Brn" => Some(Line::Brown),
            "P" => Some(Line::Purple),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Line::Brown => "Brown",
            Line::Purple => "Purple",
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One predicted arrival at the configured station.
///
/// `minutes_away` and `catchable` are derived in [`Arrival::new`] and cannot
/// drift from the timestamp they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrival {
    route: Line,
    destination: String,
    scheduled_arrival: NaiveDateTime,
    minutes_away: i64,
    catchable: bool,
    approaching: bool,
    delayed: bool,
}

impl Arrival {
    pub fn new(
        route: Line,
        destination: impl Into<String>,
        scheduled_arrival: NaiveDateTime,
        now: NaiveDateTime,
        walk_minutes: u32,
        approaching: bool,
        delayed: bool,
    ) -> Self {
        let minutes_away = minutes_until(now, scheduled_arrival);
        Self {
            route,
            destination: destination.into(),
            scheduled_arrival,
            minutes_away,
            catchable: minutes_away >= i64::from(walk_minutes),
            approaching,
            delayed,
        }
    }

    /// Recomputes `catchable` for a different walk time.
    pub fn with_walk_minutes(mut self, walk_minutes: u32) -> Self {
        self.catchable = self.minutes_away >= i64::from(walk_minutes);
        self
    }

    pub fn route(&self) -> Line {
        self.route
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn scheduled_arrival(&self) -> NaiveDateTime {
        self.scheduled_arrival
    }

    pub fn minutes_away(&self) -> i64 {
        self.minutes_away
    }

    pub fn catchable(&self) -> bool {
        self.catchable
    }

    pub fn approaching(&self) -> bool {
        self.approaching
    }

    pub fn delayed(&self) -> bool {
        self.delayed
    }
}

/// Whole minutes from `now` until `at`, rounding half to even.
///
/// Negative when `at` is already past. The division is done in `f64` on
/// the exact microsecond difference, so `.5` boundaries resolve the same
/// way on every platform.
pub fn minutes_until(now: NaiveDateTime, at: NaiveDateTime) -> i64 {
    let delta = at - now;
    let seconds = match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1e6,
        None => delta.num_seconds() as f64,
    };
    (seconds / 60.0).round_ties_even() as i64
}

/// Parses a local ISO-8601 timestamp with either a `T` or a space separator.
pub fn parse_arrival_time(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    raw.parse()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
}

/// Filters `ctatt.eta` down to the configured routes and direction and
/// returns the surviving arrivals sorted by `minutes_away`.
///
/// Ties keep feed order. The filter is an exact match on both the `rt`
/// and `trDr` strings.
///
/// # Errors
///
/// * [`FeedError::MalformedPayload`] if the `eta` list is absent, or a
///   surviving record has a missing or unparseable `arrT`.
/// * [`FeedError::InvariantViolation`] if a surviving route code has no
///   [`Line`] mapping.
pub fn normalize_arrivals(
    payload: &RawPayload,
    now: NaiveDateTime,
    config: &AdvisorConfig,
) -> Result<Vec<Arrival>, FeedError> {
    let records = parser::eta_records(payload)?;
    let total = records.len();

    let mut arrivals = Vec::new();
    for record in records {
        let (Some(route_code), Some(direction)) =
            (parser::raw_str(record, "rt"), parser::raw_str(record, "trDr"))
        else {
            continue;
        };
        if !config.target_routes.contains(route_code) || direction != config.target_direction {
            continue;
        }

        let route = Line::from_code(route_code).ok_or_else(|| {
            FeedError::InvariantViolation(format!(
                "route code {route_code:?} passed the filter but has no display name"
            ))
        })?;

        let arr_t = parser::raw_str(record, "arrT").ok_or_else(|| {
            FeedError::MalformedPayload(format!("{route_code} prediction is missing `arrT`"))
        })?;
        let scheduled_arrival = parse_arrival_time(arr_t)
            .map_err(|e| FeedError::MalformedPayload(format!("bad `arrT` {arr_t:?}: {e}")))?;

        arrivals.push(Arrival::new(
            route,
            parser::text(record, "destNm"),
            scheduled_arrival,
            now,
            config.walk_minutes,
            parser::flag(record, "isApp"),
            parser::flag(record, "isDly"),
        ));
    }

    arrivals.sort_by_key(Arrival::minutes_away);

    debug!(total, kept = arrivals.len(), "Arrivals normalized");
    Ok(arrivals)
}
