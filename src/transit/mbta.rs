use super::types::*;
use super::{PredictionsProvider, StopsProvider, UpstreamError};
use crate::config::Config;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const SEARCH_RADIUS_DEG: &str = "0.02";
const STOPS_PAGE_LIMIT: &str = "40";
const PREDICTIONS_PAGE_LIMIT: &str = "100";
/// Light rail, subway, commuter rail, bus, ferry.
const ALLOWED_ROUTE_TYPES: &str = "0,1,2,3,4";

pub struct MbtaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MbtaClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent("CommuteServer/1.0")
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.mbta_base_url.trim_end_matches('/').to_string(),
            api_key: config.mbta_api_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(params);
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }

        let response = request.send().await?;
        match response.status() {
            reqwest::StatusCode::OK => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(UpstreamError::ApiError(format!(
                    "MBTA {} returned HTTP {}: {}",
                    path, status, error_text
                )))
            }
        }
    }
}

#[async_trait]
impl StopsProvider for MbtaClient {
    async fn nearby(&self, lat: f64, lon: f64) -> Result<Vec<Stop>, UpstreamError> {
        let response: StopsResponse = self
            .get_json(
                "/stops",
                &[
                    ("filter[latitude]", &lat.to_string()),
                    ("filter[longitude]", &lon.to_string()),
                    ("filter[radius]", SEARCH_RADIUS_DEG),
                    ("sort", "distance"),
                    ("page[limit]", STOPS_PAGE_LIMIT),
                    ("filter[route_type]", ALLOWED_ROUTE_TYPES),
                ],
            )
            .await?;

        Ok(stops_from_response(response))
    }
}

#[async_trait]
impl PredictionsProvider for MbtaClient {
    async fn for_stops(&self, stop_ids: &[String]) -> Result<PredictionsByStop, UpstreamError> {
        if stop_ids.is_empty() {
            return Ok(PredictionsByStop::new());
        }

        let response: PredictionsResponse = self
            .get_json(
                "/predictions",
                &[
                    ("filter[stop]", &stop_ids.join(",")),
                    ("sort", "departure_time"),
                    ("page[limit]", PREDICTIONS_PAGE_LIMIT),
                    ("include", "route,trip"),
                ],
            )
            .await?;

        Ok(predictions_from_response(response))
    }
}

/// Keeps upstream proximity order. Stops without coordinates cannot be
/// walked to and are skipped.
pub fn stops_from_response(response: StopsResponse) -> Vec<Stop> {
    response
        .data
        .into_iter()
        .filter_map(|resource| {
            let attributes = resource.attributes;
            match (attributes.latitude, attributes.longitude) {
                (Some(latitude), Some(longitude)) => Some(Stop {
                    id: resource.id,
                    name: attributes.name.unwrap_or_default(),
                    latitude,
                    longitude,
                }),
                _ => {
                    tracing::debug!("Dropping stop {} without coordinates", resource.id);
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMetadata {
    pub color: String,
    pub route_type: RouteType,
    pub direction_names: Vec<Option<String>>,
}

impl RouteMetadata {
    pub fn direction_name(&self, direction_id: Option<u8>) -> Option<&str> {
        let index = usize::from(direction_id?);
        self.direction_names.get(index)?.as_deref()
    }
}

/// Trip headsign wins when present and non-empty, then the route's name for
/// the prediction's direction, then nothing.
pub fn resolve_headsign(
    trip_headsign: Option<&str>,
    route: Option<&RouteMetadata>,
    direction_id: Option<u8>,
) -> String {
    if let Some(headsign) = trip_headsign.filter(|h| !h.is_empty()) {
        return headsign.to_string();
    }
    route
        .and_then(|r| r.direction_name(direction_id))
        .unwrap_or_default()
        .to_string()
}

pub fn predictions_from_response(response: PredictionsResponse) -> PredictionsByStop {
    let mut routes: HashMap<String, RouteMetadata> = HashMap::new();
    let mut trip_headsigns: HashMap<String, String> = HashMap::new();

    for included in response.included {
        match included {
            IncludedResource::Route { id, attributes } => {
                routes.insert(
                    id,
                    RouteMetadata {
                        color: attributes.color.unwrap_or_default(),
                        route_type: attributes.route_type.map(RouteType::from).unwrap_or_default(),
                        direction_names: attributes.direction_names,
                    },
                );
            }
            IncludedResource::Trip { id, attributes } => {
                if let Some(headsign) = attributes.headsign {
                    trip_headsigns.insert(id, headsign);
                }
            }
            IncludedResource::Other => {}
        }
    }

    let mut predictions = PredictionsByStop::new();
    for resource in response.data {
        let Some(raw_departure) = resource.attributes.departure_time.as_deref() else {
            continue;
        };
        let departure_time = match DateTime::parse_from_rfc3339(raw_departure) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::debug!(
                    "Dropping prediction with bad departure_time {:?}: {}",
                    raw_departure,
                    e
                );
                continue;
            }
        };
        let Some(stop_id) = resource.relationships.stop.id() else {
            continue;
        };

        let route_id = resource.relationships.route.id().unwrap_or_default();
        let route = routes.get(route_id);
        let direction_id = resource
            .attributes
            .direction_id
            .and_then(|d| u8::try_from(d).ok());
        let trip_headsign = resource
            .relationships
            .trip
            .id()
            .and_then(|trip_id| trip_headsigns.get(trip_id))
            .map(String::as_str);

        predictions
            .entry(stop_id.to_string())
            .or_default()
            .push(Prediction {
                stop_id: stop_id.to_string(),
                departure_time,
                status: resource.attributes.status.unwrap_or_default(),
                route_id: route_id.to_string(),
                route_color: route.map(|r| r.color.clone()).unwrap_or_default(),
                route_type: route.map(|r| r.route_type).unwrap_or_default(),
                direction_id,
                headsign: resolve_headsign(trip_headsign, route, direction_id),
            });
    }

    for list in predictions.values_mut() {
        list.sort_by_key(|p| p.departure_time);
    }

    predictions
}
