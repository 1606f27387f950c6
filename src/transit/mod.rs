pub mod mbta;
#[cfg(test)]
pub mod mock;
pub mod ors;
pub mod types;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use types::*;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("unexpected response shape: {0}")]
    ContractViolation(String),
}

/// Geo search for boarding locations around a point.
#[async_trait]
pub trait StopsProvider: Send + Sync {
    async fn nearby(&self, lat: f64, lon: f64) -> Result<Vec<Stop>, UpstreamError>;
}

/// Real-time departures for a set of stops.
#[async_trait]
pub trait PredictionsProvider: Send + Sync {
    async fn for_stops(&self, stop_ids: &[String]) -> Result<PredictionsByStop, UpstreamError>;
}

/// Pedestrian travel time from one origin to many destinations.
///
/// The result is positionally aligned with `destinations`.
#[async_trait]
pub trait WalkTimeProvider: Send + Sync {
    async fn walk_times_from(
        &self,
        origin: Coordinate,
        destinations: &[Coordinate],
    ) -> Result<Vec<Duration>, UpstreamError>;
}
