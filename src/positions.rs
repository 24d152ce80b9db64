//! Position normalization: `ctatt.route[].train[]` to [`PositionSnapshot`] rows.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::fetch::RawPayload;
use crate::parser;

/// Raw state of one vehicle at fetch time.
///
/// Optional feed fields default to `""`, `0.0` or `0`; a batch is never
/// rejected because one vehicle is incomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSnapshot {
    pub run_number: String,
    /// Taken from the enclosing route entry's `@name`.
    pub route: String,
    pub destination: String,
    pub next_station_id: String,
    pub next_station_name: String,
    pub is_approaching: bool,
    pub is_delayed: bool,
    pub lat: f64,
    pub lon: f64,
    pub heading: i64,
    /// The feed's `arrT`, unparsed.
    pub predicted_arrival: String,
}

impl PositionSnapshot {
    pub fn from_vehicle(route: &str, vehicle: &Value) -> Self {
        Self {
            run_number: parser::text(vehicle, "rn"),
            route: route.to_string(),
            destination: parser::text(vehicle, "destNm"),
            next_station_id: parser::text(vehicle, "nextStaId"),
            next_station_name: parser::text(vehicle, "nextStaNm"),
            is_approaching: parser::flag(vehicle, "isApp"),
            is_delayed: parser::flag(vehicle, "isDly"),
            lat: parser::float(vehicle, "lat").unwrap_or(0.0),
            lon: parser::float(vehicle, "lon").unwrap_or(0.0),
            heading: parser::int(vehicle, "heading").unwrap_or(0),
            predicted_arrival: parser::text(vehicle, "arrT"),
        }
    }
}

/// All snapshots from one fetch, sharing a single `fetched_at` stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionBatch {
    fetched_at: NaiveDateTime,
    snapshots: Vec<PositionSnapshot>,
}

impl PositionBatch {
    pub fn new(fetched_at: NaiveDateTime, snapshots: Vec<PositionSnapshot>) -> Self {
        Self {
            fetched_at,
            snapshots,
        }
    }

    pub fn fetched_at(&self) -> NaiveDateTime {
        self.fetched_at
    }

    pub fn snapshots(&self) -> &[PositionSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Flattens every vehicle of every route entry into one batch, in feed order.
///
/// # Errors
///
/// Returns [`FeedError::MalformedPayload`] only if the `route` list itself
/// is absent. Per-vehicle defects are defaulted.
pub fn normalize_positions(
    payload: &RawPayload,
    fetched_at: NaiveDateTime,
) -> Result<PositionBatch, FeedError> {
    let routes = parser::route_entries(payload)?;

    let mut snapshots = Vec::new();
    let mut missing_coords = 0usize;
    for entry in &routes {
        let route = parser::text(entry, "@name");
        if route.is_empty() {
            warn!("Route entry without `@name`; storing its vehicles with an empty route");
        }
        for vehicle in parser::vehicles(entry) {
            // (0.0, 0.0) is stored as-is but is not a real position on this network.
            if parser::float(vehicle, "lat").is_none() || parser::float(vehicle, "lon").is_none() {
                missing_coords += 1;
            }
            snapshots.push(PositionSnapshot::from_vehicle(&route, vehicle));
        }
    }

    if missing_coords > 0 {
        warn!(missing_coords, "Vehicles without coordinates defaulted to (0.0, 0.0)");
    }

    debug!(routes = routes.len(), vehicles = snapshots.len(), "Positions normalized");
    Ok(PositionBatch::new(fetched_at, snapshots))
}
