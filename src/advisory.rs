//! Urgency classification and the presentation-ready arrival board.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::arrivals::Arrival;

/// Extra minutes past the walk time that still count as "soon".
pub const SOON_MARGIN_MINUTES: i64 = 3;

/// How soon the commuter has to head out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    LeaveNow,
    Soon,
    Ok,
    None,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::LeaveNow => "leave-now",
            Urgency::Soon => "soon",
            Urgency::Ok => "ok",
            Urgency::None => "none",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    urgency: Urgency,
    message: String,
    next_catchable: Option<Arrival>,
}

impl Advisory {
    /// Classifies the first arrival of `arrivals` reachable within
    /// `walk_minutes`.
    ///
    /// Catchability is judged from `minutes_away` against `walk_minutes`, not
    /// from the flag each arrival carries. `arrivals` must already be sorted
    /// by `minutes_away`, as returned by [`crate::arrivals::normalize_arrivals`].
    pub fn classify(arrivals: &[Arrival], walk_minutes: u32) -> Self {
        let walk = i64::from(walk_minutes);

        let Some(next) = arrivals.iter().find(|a| a.minutes_away() >= walk) else {
            return Self {
                urgency: Urgency::None,
                message: "No trains available".to_string(),
                next_catchable: None,
            };
        };

        let minutes = next.minutes_away();
        let slack = minutes - walk;
        let (urgency, message) = if minutes <= walk {
            (Urgency::LeaveNow, "Leave now!".to_string())
        } else if minutes <= walk + SOON_MARGIN_MINUTES {
            (Urgency::Soon, format!("Leave in ~{slack} min"))
        } else {
            (Urgency::Ok, format!("Leave in ~{slack} min"))
        };

        Self {
            urgency,
            message,
            next_catchable: Some(next.clone().with_walk_minutes(walk_minutes)),
        }
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn next_catchable(&self) -> Option<&Arrival> {
        self.next_catchable.as_ref()
    }
}

/// What the presentation layer renders for one request.
///
/// Any unrecovered pipeline error becomes [`ArrivalBoard::Unavailable`], so a
/// consumer never sees a partially populated board.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArrivalBoard {
    Ready {
        generated_at: NaiveDateTime,
        walk_minutes: u32,
        arrivals: Vec<Arrival>,
        advisory: Advisory,
    },
    Unavailable {
        generated_at: NaiveDateTime,
        reason: String,
    },
}

impl ArrivalBoard {
    /// Builds a board whose arrivals are sorted and marked catchable against
    /// `walk_minutes`, whatever walk time they were constructed with.
    pub fn ready(generated_at: NaiveDateTime, walk_minutes: u32, arrivals: Vec<Arrival>) -> Self {
        let mut arrivals: Vec<Arrival> = arrivals
            .into_iter()
            .map(|a| a.with_walk_minutes(walk_minutes))
            .collect();
        arrivals.sort_by_key(Arrival::minutes_away);

        let advisory = Advisory::classify(&arrivals, walk_minutes);
        ArrivalBoard::Ready {
            generated_at,
            walk_minutes,
            arrivals,
            advisory,
        }
    }

    pub fn unavailable(generated_at: NaiveDateTime, reason: impl fmt::Display) -> Self {
        ArrivalBoard::Unavailable {
            generated_at,
            reason: reason.to_string(),
        }
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        match self {
            ArrivalBoard::Ready { advisory, .. } => Some(advisory),
            ArrivalBoard::Unavailable { .. } => None,
        }
    }

    pub fn arrivals(&self) -> &[Arrival] {
        match self {
            ArrivalBoard::Ready { arrivals, .. } => arrivals,
            ArrivalBoard::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ArrivalBoard::Ready { .. })
    }
}
