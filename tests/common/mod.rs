#![allow(dead_code)]

use demand_server::FEATURE_NAMES;
use serde_json::{json, Value};
use std::io::Write;

/// Two-tree forest over hour_of_day, rush_hour and start_lat.
///
/// tree 0: hour <= 7.5 -> 2.0, else rush_hour <= 0.5 -> 4.0, else 9.0
/// tree 1: start_lat <= 40.5 -> 1.0, else 3.0
pub fn forest_json() -> Value {
    json!({
        "n_features": 10,
        "feature_names": FEATURE_NAMES,
        "trees": [
            {
                "children_left":  [1, -1, 3, -1, -1],
                "children_right": [2, -1, 4, -1, -1],
                "feature":        [1, -2, 5, -2, -2],
                "threshold":      [7.5, -2.0, 0.5, -2.0, -2.0],
                "value":          [5.0, 2.0, 6.5, 4.0, 9.0]
            },
            {
                "children_left":  [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature":        [8, -2, -2],
                "threshold":      [40.5, -2.0, -2.0],
                "value":          [2.0, 1.0, 3.0]
            }
        ]
    })
}

pub fn write_artifact(doc: &Value, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("forest")
        .suffix(suffix)
        .tempfile()
        .expect("create temp artifact");
    file.write_all(doc.to_string().as_bytes())
        .expect("write temp artifact");
    file
}

pub const EXAMPLE_QUERY: &str = "start_station_id=12&hour_of_day=8&day_of_week=1&weekend=0&month=6&rush_hour=1&avg_rolling_7days=5.2&avg_rolling_30days=4.8&start_lat=40.71&start_lng=-74.0";

pub fn example_body() -> Value {
    json!({
        "start_station_id": 12,
        "hour_of_day": 8,
        "day_of_week": 1,
        "weekend": 0,
        "month": 6,
        "rush_hour": 1,
        "avg_rolling_7days": 5.2,
        "avg_rolling_30days": 4.8,
        "start_lat": 40.71,
        "start_lng": -74.0
    })
}
