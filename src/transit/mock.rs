//! In-process stand-ins for the upstream providers, with call counters.

use super::ors::durations_from_matrix;
use super::types::*;
use super::{PredictionsProvider, StopsProvider, UpstreamError, WalkTimeProvider};
use crate::config::Config;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Points both upstreams at a closed local port.
pub fn test_config() -> Config {
    Config {
        mbta_base_url: "http://127.0.0.1:9".to_string(),
        ors_base_url: "http://127.0.0.1:9".to_string(),
        upstream_timeout_secs: 1,
        ..Config::default()
    }
}

pub fn stop(id: &str, lat: f64, lon: f64) -> Stop {
    Stop {
        id: id.to_string(),
        name: format!("Stop {}", id),
        latitude: lat,
        longitude: lon,
    }
}

/// A departure reported in Boston's summer offset.
pub fn prediction(stop_id: &str, route_id: &str, departure: DateTime<Utc>) -> Prediction {
    let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
    Prediction {
        stop_id: stop_id.to_string(),
        departure_time: departure.with_timezone(&eastern),
        status: String::new(),
        route_id: route_id.to_string(),
        route_color: "DA291C".to_string(),
        route_type: RouteType::Subway,
        direction_id: Some(0),
        headsign: "Alewife".to_string(),
    }
}

#[derive(Default)]
pub struct MockTransit {
    pub stops: Vec<Stop>,
    pub predictions: PredictionsByStop,
    /// Raw first row of the distance matrix; `None` echoes one minute per destination.
    pub walk_row: Option<Vec<Option<f64>>>,
    pub fail_stops: bool,
    pub fail_predictions: bool,
    pub fail_walk_times: bool,
    pub stops_calls: AtomicUsize,
    pub predictions_calls: AtomicUsize,
    pub walk_calls: AtomicUsize,
    pub requested_stop_ids: Mutex<Vec<Vec<String>>>,
}

impl MockTransit {
    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.stops_calls.load(Ordering::SeqCst),
            self.walk_calls.load(Ordering::SeqCst),
            self.predictions_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl StopsProvider for MockTransit {
    async fn nearby(&self, _lat: f64, _lon: f64) -> Result<Vec<Stop>, UpstreamError> {
        self.stops_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stops {
            return Err(UpstreamError::ApiError("HTTP 503 Service Unavailable".to_string()));
        }
        Ok(self.stops.clone())
    }
}

#[async_trait]
impl PredictionsProvider for MockTransit {
    async fn for_stops(&self, stop_ids: &[String]) -> Result<PredictionsByStop, UpstreamError> {
        self.predictions_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_stop_ids.lock().unwrap().push(stop_ids.to_vec());
        if self.fail_predictions {
            return Err(UpstreamError::ApiError("HTTP 500 Internal Server Error".to_string()));
        }
        Ok(self.predictions.clone())
    }
}

#[async_trait]
impl WalkTimeProvider for MockTransit {
    async fn walk_times_from(
        &self,
        _origin: Coordinate,
        destinations: &[Coordinate],
    ) -> Result<Vec<Duration>, UpstreamError> {
        self.walk_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_walk_times {
            return Err(UpstreamError::ApiError("HTTP 429 Too Many Requests".to_string()));
        }
        let row = self
            .walk_row
            .clone()
            .unwrap_or_else(|| vec![Some(60.0); destinations.len()]);
        durations_from_matrix(
            MatrixResponse {
                durations: Some(vec![row]),
            },
            destinations.len(),
        )
    }
}
