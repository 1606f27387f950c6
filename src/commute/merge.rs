use crate::transit::types::{PredictionsByStop, RouteType, Stop};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How far in the past a "time to leave" may be and still be worth showing.
pub const LEAVE_GRACE_SECS: i64 = 5 * 60;

/// One departure the user could still catch from one nearby stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteOption {
    pub stop_name: String,
    pub line: String,
    pub headsign: String,
    pub route_color: String,
    pub route_type: RouteType,
    pub departure_time: DateTime<FixedOffset>,
    pub walk_time_sec: f64,
    pub time_to_leave: DateTime<FixedOffset>,
    pub status: String,
}

/// A stop together with the walk from the request origin to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StopWalk {
    pub stop: Stop,
    pub walk: Duration,
}

/// Zips stops with the durations fetched for them. The two lists must be the
/// same length; a mismatch is reported instead of guessing.
pub fn pair_walk_times(stops: &[Stop], durations: &[Duration]) -> Result<Vec<StopWalk>, String> {
    if stops.len() != durations.len() {
        return Err(format!(
            "{} walk times for {} stops",
            durations.len(),
            stops.len()
        ));
    }

    Ok(stops
        .iter()
        .zip(durations)
        .map(|(stop, walk)| StopWalk {
            stop: stop.clone(),
            walk: *walk,
        })
        .collect())
}

/// Short display code for a route id.
pub fn line_code(route_id: &str) -> String {
    if route_id.starts_with("Red") {
        "RL".to_string()
    } else if route_id.starts_with("Green") {
        match route_id.split_once('-') {
            Some((_, branch)) => branch.split('-').next().unwrap_or(branch).to_string(),
            None => "GL".to_string(),
        }
    } else if route_id.starts_with("Blue") {
        "BL".to_string()
    } else if route_id.starts_with("Orange") {
        "OL".to_string()
    } else if route_id.starts_with("Silver") {
        "SL".to_string()
    } else {
        route_id.to_string()
    }
}

/// Builds options stop by stop in the order given, each stop's departures in
/// the order the provider sorted them. Departures already gone are skipped,
/// as are ones whose time to leave passed more than the grace window ago.
pub fn merge_options(
    walks: &[StopWalk],
    predictions: &PredictionsByStop,
    now: DateTime<Utc>,
) -> Vec<CommuteOption> {
    let earliest_leave = now - chrono::Duration::seconds(LEAVE_GRACE_SECS);
    let mut options = Vec::new();

    for StopWalk { stop, walk } in walks {
        let Some(preds) = predictions.get(&stop.id).filter(|p| !p.is_empty()) else {
            tracing::debug!("No predictions for stop {}", stop.id);
            continue;
        };

        let walk_delta = chrono::Duration::milliseconds(walk.as_millis() as i64);

        for prediction in preds {
            if prediction.departure_time < now {
                continue;
            }

            let time_to_leave = prediction.departure_time - walk_delta;
            if time_to_leave < earliest_leave {
                tracing::debug!(
                    "Skipping {} {}: time to leave {} is too late (walk {}s)",
                    stop.name,
                    prediction.route_id,
                    time_to_leave,
                    walk.as_secs()
                );
                continue;
            }

            options.push(CommuteOption {
                stop_name: stop.name.clone(),
                line: line_code(&prediction.route_id),
                headsign: prediction.headsign.clone(),
                route_color: prediction.route_color.clone(),
                route_type: prediction.route_type,
                departure_time: prediction.departure_time,
                walk_time_sec: walk.as_secs_f64(),
                time_to_leave,
                status: prediction.status.clone(),
            });
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::mock::{prediction, stop};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> chrono::Duration {
        chrono::Duration::minutes(m)
    }

    #[test]
    fn test_line_codes() {
        assert_eq!(line_code("Green-B"), "B");
        assert_eq!(line_code("Green-E"), "E");
        assert_eq!(line_code("Green"), "GL");
        assert_eq!(line_code("Red"), "RL");
        assert_eq!(line_code("Blue"), "BL");
        assert_eq!(line_code("Orange"), "OL");
        assert_eq!(line_code("Silver"), "SL");
        assert_eq!(line_code("CR-Fitchburg"), "CR-Fitchburg");
        assert_eq!(line_code("39"), "39");
    }

    #[test]
    fn test_pairing_rejects_length_mismatch() {
        let stops = vec![stop("a", 42.0, -71.0), stop("b", 42.1, -71.1)];

        assert!(pair_walk_times(&stops, &[Duration::from_secs(60)]).is_err());

        let paired =
            pair_walk_times(&stops, &[Duration::from_secs(60), Duration::from_secs(90)]).unwrap();
        assert_eq!(paired[1].stop.id, "b");
        assert_eq!(paired[1].walk, Duration::from_secs(90));
    }

    #[test]
    fn test_grace_window() {
        let walks = vec![StopWalk {
            stop: stop("place-pktrm", 42.356, -71.062),
            walk: Duration::from_secs(3 * 60),
        }];
        let mut predictions = PredictionsByStop::new();
        predictions.insert(
            "place-pktrm".to_string(),
            vec![
                // leave at T-1min: inside the grace window
                prediction("place-pktrm", "Red", now() + minutes(2)),
                // already departed
                prediction("place-pktrm", "Red", now() - minutes(3)),
            ],
        );
        let options = merge_options(&walks, &predictions, now());

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].time_to_leave, now() - minutes(1));
        assert_eq!(options[0].line, "RL");
        assert_eq!(options[0].walk_time_sec, 180.0);
    }

    #[test]
    fn test_leave_six_minutes_ago_is_dropped_even_if_not_departed() {
        let walks = vec![StopWalk {
            stop: stop("s", 42.0, -71.0),
            walk: Duration::from_secs(10 * 60),
        }];
        let mut predictions = PredictionsByStop::new();
        predictions.insert(
            "s".to_string(),
            vec![
                prediction("s", "Orange", now() + minutes(4)),
                prediction("s", "Orange", now() + minutes(5)),
            ],
        );

        let options = merge_options(&walks, &predictions, now());

        // +4min departure means leaving at T-6min; +5min means exactly T-5min.
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].departure_time, now() + minutes(5));
    }

    #[test]
    fn test_stop_then_departure_order_without_global_sort() {
        let walks = vec![
            StopWalk {
                stop: stop("far", 42.0, -71.0),
                walk: Duration::from_secs(60),
            },
            StopWalk {
                stop: stop("near", 42.0, -71.0),
                walk: Duration::from_secs(60),
            },
        ];
        let mut predictions = PredictionsByStop::new();
        predictions.insert(
            "far".to_string(),
            vec![
                prediction("far", "Blue", now() + minutes(10)),
                prediction("far", "Blue", now() + minutes(20)),
            ],
        );
        predictions.insert(
            "near".to_string(),
            vec![prediction("near", "39", now() + minutes(5))],
        );

        let options = merge_options(&walks, &predictions, now());
        let order: Vec<_> = options
            .iter()
            .map(|o| (o.stop_name.as_str(), o.departure_time.with_timezone(&Utc)))
            .collect();

        assert_eq!(
            order,
            vec![
                ("Stop far", now() + minutes(10)),
                ("Stop far", now() + minutes(20)),
                ("Stop near", now() + minutes(5)),
            ]
        );
    }

    #[test]
    fn test_stop_without_predictions_contributes_nothing() {
        let walks = vec![StopWalk {
            stop: stop("quiet", 42.0, -71.0),
            walk: Duration::from_secs(60),
        }];
        let options = merge_options(&walks, &PredictionsByStop::new(), now());
        assert!(options.is_empty());
    }
}
