use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// GTFS route type. Serialized as the bare integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RouteType {
    #[default]
    LightRail,
    Subway,
    Rail,
    Bus,
    Ferry,
    Other(i64),
}

impl From<i64> for RouteType {
    fn from(code: i64) -> Self {
        match code {
            0 => RouteType::LightRail,
            1 => RouteType::Subway,
            2 => RouteType::Rail,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            other => RouteType::Other(other),
        }
    }
}

impl From<RouteType> for i64 {
    fn from(route_type: RouteType) -> Self {
        match route_type {
            RouteType::LightRail => 0,
            RouteType::Subway => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub stop_id: String,
    pub departure_time: DateTime<FixedOffset>,
    pub status: String,
    pub route_id: String,
    pub route_color: String,
    pub route_type: RouteType,
    pub direction_id: Option<u8>,
    pub headsign: String,
}

/// Predictions grouped by stop id, each list ascending by departure time.
pub type PredictionsByStop = HashMap<String, Vec<Prediction>>;

// MBTA v3 (JSON:API) wire types

#[derive(Debug, Clone, Deserialize)]
pub struct StopsResponse {
    #[serde(default)]
    pub data: Vec<StopResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopResource {
    pub id: String,
    #[serde(default)]
    pub attributes: StopAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopAttributes {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsResponse {
    #[serde(default)]
    pub data: Vec<PredictionResource>,
    #[serde(default)]
    pub included: Vec<IncludedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResource {
    #[serde(default)]
    pub attributes: PredictionAttributes,
    #[serde(default)]
    pub relationships: PredictionRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionAttributes {
    pub departure_time: Option<String>,
    pub status: Option<String>,
    pub direction_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionRelationships {
    #[serde(default)]
    pub route: Relationship,
    #[serde(default)]
    pub stop: Relationship,
    #[serde(default)]
    pub trip: Relationship,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    pub data: Option<ResourceRef>,
}

impl Relationship {
    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|r| r.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

/// Side-loaded records from the `included` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncludedResource {
    Route {
        id: String,
        #[serde(default)]
        attributes: RouteAttributes,
    },
    Trip {
        id: String,
        #[serde(default)]
        attributes: TripAttributes,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteAttributes {
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub route_type: Option<i64>,
    #[serde(default)]
    pub direction_names: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripAttributes {
    pub headsign: Option<String>,
}

// openrouteservice matrix wire types

#[derive(Debug, Clone, Serialize)]
pub struct MatrixRequest {
    pub locations: Vec<[f64; 2]>,
    pub sources: Vec<usize>,
    pub destinations: Vec<usize>,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixResponse {
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}
