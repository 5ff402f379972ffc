//! Daily consumption API client
//!
//! Fetches the daily dashboard record for one calendar day, serving it from
//! the cache while fresh and writing fresh responses back with a day-dependent
//! expiry.

use chrono::NaiveDate;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{extract, DailyConsumption, QueryKey, TimeSeries};
use crate::cache::CacheManager;

/// Default endpoint of the daily dashboard API
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/day-consumption-dashboard";

/// Errors that can occur when fetching daily consumption data
///
/// Transport failures, non-success statuses and undecodable bodies all
/// collapse into the same signal; callers show one error state for them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Consumption data unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

/// Everything the dashboard shows for one day
#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    /// The day this data describes
    pub date: NaiveDate,
    /// The record returned by the backend
    pub data: DailyConsumption,
    /// Accumulated consumption chart, if its blob could be parsed
    pub accumulated: Option<TimeSeries>,
    /// Load curve chart, if its blob could be parsed
    pub load_curve: Option<TimeSeries>,
    /// Whether the record was served from the cache
    pub from_cache: bool,
}

impl DayView {
    /// Builds the view, extracting each chart independently
    pub fn new(date: NaiveDate, data: DailyConsumption, from_cache: bool) -> Self {
        let accumulated = extract(&data.accumulated_chart);
        let load_curve = extract(&data.load_curve_chart);
        if accumulated.is_none() {
            warn!(%date, "accumulated consumption chart could not be parsed");
        }
        if load_curve.is_none() {
            warn!(%date, "load curve chart could not be parsed");
        }

        Self {
            date,
            data,
            accumulated,
            load_curve,
            from_cache,
        }
    }
}

/// Client for the daily consumption dashboard API
#[derive(Debug, Clone)]
pub struct DailyConsumptionClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Cache manager for persisting responses
    cache: Option<CacheManager>,
    /// Endpoint URL, queried with `?day=YYYY-MM-DD`
    base_url: String,
}

impl DailyConsumptionClient {
    /// Creates a client for `base_url` without a cache
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            cache: None,
            base_url: base_url.into(),
        }
    }

    /// Attaches a cache manager
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    /// Fetches the dashboard data for `date`
    ///
    /// # Behavior
    /// - Serves a fresh cache entry without touching the network
    /// - Otherwise fetches from the API and caches the response
    /// - A failed cache write is logged and does not fail the fetch
    /// - Expired entries are never served, even if the API is down
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<DayView, ApiError> {
        let key = QueryKey::daily_consumption(date);

        if let Some(ref cache) = self.cache {
            if let Some(entry) = cache.get::<DailyConsumption>(&key) {
                debug!(key = %key, "serving daily consumption from cache");
                return Ok(DayView::new(date, entry.payload, true));
            }
        }

        let data = self.fetch_from_api(date).await?;

        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.put(&key, &data) {
                warn!(key = %key, error = %e, "failed to cache daily consumption");
            }
        }

        Ok(DayView::new(date, data, false))
    }

    /// Fetches the record directly from the API
    async fn fetch_from_api(&self, date: NaiveDate) -> Result<DailyConsumption, ApiError> {
        let day = date.format("%Y-%m-%d").to_string();
        info!(%day, url = %self.base_url, "fetching daily consumption");

        let result = async {
            self.http_client
                .get(&self.base_url)
                .query(&[("day", day.as_str())])
                .send()
                .await?
                .error_for_status()?
                .json::<DailyConsumption>()
                .await
        }
        .await;

        result.map_err(|e| {
            warn!(%day, error = %e, "daily consumption request failed");
            ApiError::from(e)
        })
    }
}
