//! Runtime configuration, loaded from the environment with defaults.
//!
//! Every pipeline call receives these values explicitly.

use anyhow::{Context, Result};
use reqwest::Url;
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ARRIVALS_URL: &str = "http://lapi.transitchicago.com/api/1.0/ttarrivals.aspx";
const DEFAULT_POSITIONS_URL: &str = "http://lapi.transitchicago.com/api/1.0/ttpositions.aspx";

/// Diversey (Brown/Purple).
pub const DEFAULT_STATION_ID: &str = "40530";
pub const DEFAULT_WALK_MINUTES: u32 = 8;

/// Endpoints and request parameters for the train tracker API.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_key: String,
    pub arrivals_url: Url,
    pub positions_url: Url,
    pub station_id: String,
    /// Route codes requested by the positions fetch, in request order.
    pub route_list: Vec<String>,
    pub timeout: Duration,
}

/// Parameters of the arrival filter and urgency classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub walk_minutes: u32,
    pub target_routes: BTreeSet<String>,
    pub target_direction: String,
}

impl Default for AdvisorConfig {
    /// Southbound (toward the Loop) Brown and Purple line trains, 8 min walk.
    fn default() -> Self {
        Self {
            walk_minutes: DEFAULT_WALK_MINUTES,
            target_routes: ["Brn", "P"].into_iter().map(String::from).collect(),
            target_direction: "5".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file, used as a plain filename (never parsed as a URL).
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub advisor: AdvisorConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Fails if `CTA_API_KEY` is unset, or if a URL or number does not parse.
    pub fn load() -> Result<Self> {
        let api_key = env::var("CTA_API_KEY").context("CTA_API_KEY must be set")?;

        let arrivals_url = parse_url("CTA_ARRIVALS_URL", DEFAULT_ARRIVALS_URL)?;
        let positions_url = parse_url("CTA_POSITIONS_URL", DEFAULT_POSITIONS_URL)?;
        let station_id =
            env::var("CTA_STATION_ID").unwrap_or_else(|_| DEFAULT_STATION_ID.to_string());
        let route_list = code_list(
            &env::var("POSITION_ROUTES").unwrap_or_else(|_| "Red,Blue,Brn,G,Org,P,Pink,Y".into()),
        );
        let timeout = Duration::from_secs(parse_number("HTTP_TIMEOUT_SECS", 30)?);

        let defaults = AdvisorConfig::default();
        let walk_minutes = parse_number("WALK_MINUTES", defaults.walk_minutes)?;
        let target_routes = match env::var("TARGET_ROUTES") {
            Ok(raw) => code_list(&raw).into_iter().collect(),
            Err(_) => defaults.target_routes,
        };
        let target_direction = env::var("TARGET_DIRECTION").unwrap_or(defaults.target_direction);

        let db_file = env::var("DB_FILE").unwrap_or_else(|_| "cta_trains.db".to_string());

        Ok(Self {
            feed: FeedConfig {
                api_key,
                arrivals_url,
                positions_url,
                station_id,
                route_list,
                timeout,
            },
            advisor: AdvisorConfig {
                walk_minutes,
                target_routes,
                target_direction,
            },
            store: StoreConfig::from_path(db_file),
        })
    }
}

/// Splits a comma-joined list of route codes, dropping blanks.
pub fn code_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(String::from)
        .collect()
}

fn parse_url(var: &str, default: &str) -> Result<Url> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).with_context(|| format!("{var} is not a valid URL: {raw}"))
}

fn parse_number<T>(var: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{var} must be a non-negative integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
