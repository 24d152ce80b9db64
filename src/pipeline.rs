//! The two end-to-end pipelines.
//!
//! * [`advise`]: fetch arrivals, normalize, classify.
//! * [`ingest_positions`]: fetch positions, normalize, persist.
//!
//! They share nothing but the fetch contract. Each call makes exactly one
//! request; callers that need a deadline wrap the call themselves.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::advisory::ArrivalBoard;
use crate::arrivals::normalize_arrivals;
use crate::config::{AdvisorConfig, FeedConfig, StoreConfig};
use crate::error::Result;
use crate::fetch::{HttpClient, RawPayload, fetch_json};
use crate::positions::normalize_positions;
use crate::store::SnapshotStore;

/// Fetches the arrivals payload for `feed.station_id`.
///
/// The API key is expected to be added by the client (see
/// [`crate::fetch::auth::UrlParam`]).
pub async fn fetch_arrivals<C: HttpClient>(client: &C, feed: &FeedConfig) -> Result<RawPayload> {
    let params = [("mapid", feed.station_id.as_str()), ("outputType", "JSON")];
    Ok(fetch_json(client, &feed.arrivals_url, &params).await?)
}

/// Fetches vehicle positions for every route in `feed.route_list`.
pub async fn fetch_positions<C: HttpClient>(client: &C, feed: &FeedConfig) -> Result<RawPayload> {
    let routes = feed.route_list.join(",");
    let params = [("rt", routes.as_str()), ("outputType", "JSON")];
    Ok(fetch_json(client, &feed.positions_url, &params).await?)
}

/// Builds the arrival board for one request at wall-clock time `now`.
///
/// # Errors
///
/// Any fetch or payload error aborts with no partial board; see
/// [`ArrivalBoard::unavailable`] for the presentation fallback.
#[tracing::instrument(skip_all, fields(station = %feed.station_id, walk_minutes = advisor.walk_minutes))]
pub async fn advise<C: HttpClient>(
    client: &C,
    feed: &FeedConfig,
    advisor: &AdvisorConfig,
    now: NaiveDateTime,
) -> Result<ArrivalBoard> {
    let payload = fetch_arrivals(client, feed).await?;
    let arrivals = normalize_arrivals(&payload, now, advisor)?;
    let board = ArrivalBoard::ready(now, advisor.walk_minutes, arrivals);

    if let Some(advisory) = board.advisory() {
        info!(
            arrivals = board.arrivals().len(),
            urgency = %advisory.urgency(),
            message = advisory.message(),
            "Advisory computed"
        );
    }
    Ok(board)
}

/// Fetches one positions batch and appends it to the snapshot store.
///
/// `fetched_at` is stamped on every row of the batch. The store connection
/// is opened after a successful fetch and closed whether or not the write
/// succeeds. Returns the number of rows written.
#[tracing::instrument(skip_all, fields(routes = feed.route_list.len(), db = %store.path.display()))]
pub async fn ingest_positions<C: HttpClient>(
    client: &C,
    feed: &FeedConfig,
    store: &StoreConfig,
    fetched_at: NaiveDateTime,
) -> Result<u64> {
    let payload = fetch_positions(client, feed).await?;
    let batch = normalize_positions(&payload, fetched_at)?;

    let mut snapshots = SnapshotStore::open(&store.path).await?;
    let written = match snapshots.ensure_schema().await {
        Ok(()) => snapshots.insert_batch(&batch).await,
        Err(e) => Err(e),
    };
    if let Err(e) = snapshots.close().await {
        warn!(error = %e, "Failed to close snapshot store");
    }

    let written = written?;
    info!(rows = written, "Position batch stored");
    Ok(written)
}
