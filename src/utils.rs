/// Validate latitude and longitude coordinates
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Invalid latitude: {}. Must be between -90 and 90", lat));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("Invalid longitude: {}. Must be between -180 and 180", lon));
    }
    Ok(())
}

/// Scope key for location-bound data. Four decimals (~11 m) so nearby
/// requests share cached stops and walk times.
pub fn location_key(lat: f64, lon: f64) -> String {
    format!("loc:{:.4},{:.4}", lat, lon)
}

pub fn stops_key(location_key: &str) -> String {
    format!("stops:{}", location_key)
}

pub fn walk_key(location_key: &str) -> String {
    format!("walk:{}", location_key)
}

/// Scope key for predictions; independent of stop order.
pub fn predictions_key(stop_ids: &[String]) -> String {
    let mut sorted: Vec<&str> = stop_ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("preds:{}", sorted.join(","))
}
