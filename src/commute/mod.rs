pub mod merge;

use crate::cache::TtlCache;
use crate::transit::types::{Coordinate, PredictionsByStop, Stop};
use crate::transit::{PredictionsProvider, StopsProvider, UpstreamError, WalkTimeProvider};
use crate::utils::{location_key, predictions_key, stops_key, validate_coordinates, walk_key};
use chrono::{DateTime, Utc};
use merge::{merge_options, pair_walk_times, CommuteOption, StopWalk};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const STOPS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const WALK_TIMES_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
pub const PREDICTIONS_CACHE_TTL: Duration = Duration::from_secs(15);

/// How long each kind of upstream result stays cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub stops: Duration,
    pub walk_times: Duration,
    pub predictions: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            stops: STOPS_CACHE_TTL,
            walk_times: WALK_TIMES_CACHE_TTL,
            predictions: PREDICTIONS_CACHE_TTL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Stops,
    WalkTimes,
    Predictions,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Stops => "stops",
            Stage::WalkTimes => "walk times",
            Stage::Predictions => "predictions",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CommuteError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to get {stage}: {source}")]
    Fetch {
        stage: Stage,
        #[source]
        source: UpstreamError,
    },
    #[error("inconsistent {stage} data: {detail}")]
    ContractViolation { stage: Stage, detail: String },
}

impl CommuteError {
    fn upstream(stage: Stage, err: UpstreamError) -> Self {
        match err {
            UpstreamError::ContractViolation(detail) => {
                CommuteError::ContractViolation { stage, detail }
            }
            source => CommuteError::Fetch { stage, source },
        }
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, CommuteError::InvalidRequest(_))
    }
}

/// Walk times remember the stop ids they were computed for, so a stale
/// entry can't be paired with a different stop list.
#[derive(Debug, Clone)]
pub struct WalkTimesEntry {
    pub stop_ids: Vec<String>,
    pub durations: Vec<Duration>,
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Stops(Arc<Vec<Stop>>),
    WalkTimes(Arc<WalkTimesEntry>),
    Predictions(Arc<PredictionsByStop>),
}

pub type CommuteCache = TtlCache<CachedValue>;

/// Resolves stops, walk times and predictions around a point and turns them
/// into a "leave by" list. The only state shared across requests is the cache.
pub struct CommuteService {
    stops: Arc<dyn StopsProvider>,
    predictions: Arc<dyn PredictionsProvider>,
    walk_times: Arc<dyn WalkTimeProvider>,
    cache: Arc<CommuteCache>,
    ttls: CacheTtls,
}

impl CommuteService {
    pub fn new(
        stops: Arc<dyn StopsProvider>,
        predictions: Arc<dyn PredictionsProvider>,
        walk_times: Arc<dyn WalkTimeProvider>,
        cache: Arc<CommuteCache>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            stops,
            predictions,
            walk_times,
            cache,
            ttls,
        }
    }

    pub async fn compute_commute_options(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<CommuteOption>, CommuteError> {
        self.compute_commute_options_at(lat, lon, Utc::now()).await
    }

    pub async fn compute_commute_options_at(
        &self,
        lat: f64,
        lon: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommuteOption>, CommuteError> {
        validate_coordinates(lat, lon).map_err(CommuteError::InvalidRequest)?;

        let origin = Coordinate::new(lat, lon);
        let loc_key = location_key(lat, lon);

        let stops = self.resolve_stops(origin, &loc_key).await?;
        if stops.is_empty() {
            tracing::info!("No stops near {}", loc_key);
            return Ok(Vec::new());
        }

        let stop_ids: Vec<String> = stops.iter().map(|s| s.id.clone()).collect();
        let (walks, predictions) = tokio::try_join!(
            self.resolve_walk_times(origin, &loc_key, &stops, &stop_ids),
            self.resolve_predictions(&stop_ids),
        )?;

        let options = merge_options(&walks, &predictions, now);
        tracing::info!("Returning {} options for {}", options.len(), loc_key);
        Ok(options)
    }

    async fn resolve_stops(
        &self,
        origin: Coordinate,
        loc_key: &str,
    ) -> Result<Arc<Vec<Stop>>, CommuteError> {
        let key = stops_key(loc_key);
        if let Some(CachedValue::Stops(stops)) = self.cache.get(&key).await {
            tracing::debug!("Cache HIT: {} stops for {}", stops.len(), loc_key);
            return Ok(stops);
        }

        let stops = self
            .stops
            .nearby(origin.lat, origin.lon)
            .await
            .map_err(|e| {
                tracing::error!("Error getting stops: {}", e);
                CommuteError::upstream(Stage::Stops, e)
            })?;
        let stops = Arc::new(stops);
        self.cache
            .set(key, CachedValue::Stops(stops.clone()), self.ttls.stops)
            .await;
        tracing::debug!("Cache MISS: {} stops from API for {}", stops.len(), loc_key);
        Ok(stops)
    }

    async fn resolve_walk_times(
        &self,
        origin: Coordinate,
        loc_key: &str,
        stops: &[Stop],
        stop_ids: &[String],
    ) -> Result<Vec<StopWalk>, CommuteError> {
        let key = walk_key(loc_key);
        if let Some(CachedValue::WalkTimes(entry)) = self.cache.get(&key).await {
            if entry.stop_ids == stop_ids {
                tracing::debug!("Cache HIT: walk times for {}", loc_key);
                return pair_walk_times(stops, &entry.durations).map_err(|detail| {
                    CommuteError::ContractViolation {
                        stage: Stage::WalkTimes,
                        detail,
                    }
                });
            }
            tracing::debug!(
                "Cached walk times for {} belong to another stop list",
                loc_key
            );
        }

        let destinations: Vec<Coordinate> = stops.iter().map(Stop::coordinate).collect();
        let durations = self
            .walk_times
            .walk_times_from(origin, &destinations)
            .await
            .map_err(|e| {
                tracing::error!("Error getting walk times: {}", e);
                CommuteError::upstream(Stage::WalkTimes, e)
            })?;

        // Pair before caching so a misaligned response is never stored.
        let walks = pair_walk_times(stops, &durations).map_err(|detail| {
            tracing::error!("Walk times do not line up with stops: {}", detail);
            CommuteError::ContractViolation {
                stage: Stage::WalkTimes,
                detail,
            }
        })?;

        let entry = WalkTimesEntry {
            stop_ids: stop_ids.to_vec(),
            durations,
        };
        self.cache
            .set(
                key,
                CachedValue::WalkTimes(Arc::new(entry)),
                self.ttls.walk_times,
            )
            .await;
        tracing::debug!("Cache MISS: walk times from API for {}", loc_key);
        Ok(walks)
    }

    async fn resolve_predictions(
        &self,
        stop_ids: &[String],
    ) -> Result<Arc<PredictionsByStop>, CommuteError> {
        let key = predictions_key(stop_ids);
        if let Some(CachedValue::Predictions(predictions)) = self.cache.get(&key).await {
            tracing::debug!("Cache HIT: predictions for {} stops", stop_ids.len());
            return Ok(predictions);
        }

        let predictions = self
            .predictions
            .for_stops(stop_ids)
            .await
            .map_err(|e| {
                tracing::error!("Error getting predictions: {}", e);
                CommuteError::upstream(Stage::Predictions, e)
            })?;
        let predictions = Arc::new(predictions);
        self.cache
            .set(
                key,
                CachedValue::Predictions(predictions.clone()),
                self.ttls.predictions,
            )
            .await;
        tracing::debug!(
            "Cache MISS: predictions from API ({} stops, {} cache entries)",
            predictions.len(),
            self.cache.entry_count()
        );
        Ok(predictions)
    }
}
