use super::types::*;
use super::{UpstreamError, WalkTimeProvider};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const MATRIX_PATH: &str = "/v2/matrix/foot-walking";

pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OrsClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent("CommuteServer/1.0")
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.ors_base_url.trim_end_matches('/').to_string(),
            api_key: config.ors_api_key.clone(),
        })
    }
}

#[async_trait]
impl WalkTimeProvider for OrsClient {
    async fn walk_times_from(
        &self,
        origin: Coordinate,
        destinations: &[Coordinate],
    ) -> Result<Vec<Duration>, UpstreamError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.base_url, MATRIX_PATH);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .json(&matrix_request(origin, destinations))
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let body = response.bytes().await?;
                let matrix: MatrixResponse = serde_json::from_slice(&body)?;
                durations_from_matrix(matrix, destinations.len())
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(UpstreamError::ApiError(format!(
                    "ORS matrix returned HTTP {}: {}",
                    status, error_text
                )))
            }
        }
    }
}

/// One source (index 0) against every destination. openrouteservice wants
/// `[lon, lat]` pairs.
pub fn matrix_request(origin: Coordinate, destinations: &[Coordinate]) -> MatrixRequest {
    let locations = std::iter::once(origin)
        .chain(destinations.iter().copied())
        .map(|c| [c.lon, c.lat])
        .collect();

    MatrixRequest {
        locations,
        sources: vec![0],
        destinations: (1..=destinations.len()).collect(),
        metrics: vec!["duration".to_string()],
    }
}

/// Extracts the single duration row. A row that is missing, the wrong
/// length, or holds an unroutable (`null`) cell would misalign walk times
/// with stops, so it is rejected outright.
pub fn durations_from_matrix(
    matrix: MatrixResponse,
    expected: usize,
) -> Result<Vec<Duration>, UpstreamError> {
    let row = matrix
        .durations
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| UpstreamError::ContractViolation("matrix has no duration row".to_string()))?;

    if row.len() != expected {
        return Err(UpstreamError::ContractViolation(format!(
            "expected {} durations, got {}",
            expected,
            row.len()
        )));
    }

    row.into_iter()
        .enumerate()
        .map(|(i, cell)| {
            let seconds = cell.ok_or_else(|| {
                UpstreamError::ContractViolation(format!("destination {} is unroutable", i))
            })?;
            Duration::try_from_secs_f64(seconds).map_err(|_| {
                UpstreamError::ContractViolation(format!(
                    "invalid duration {} for destination {}",
                    seconds, i
                ))
            })
        })
        .collect()
}
