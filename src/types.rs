use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------- Feature vector ----------

/// Number of inputs the demand model consumes.
pub const FEATURE_COUNT: usize = 10;

/// Authoritative input order; the model was trained on columns in exactly this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "start_station_id",
    "hour_of_day",
    "day_of_week",
    "weekend",
    "month",
    "rush_hour",
    "avg_rolling_7days",
    "avg_rolling_30days",
    "start_lat",
    "start_lng",
];

/// One prediction request, built either from a query string or a JSON body.
///
/// Every field is stored as `f64`. Integer-valued fields (hour, weekday, flags)
/// are accepted as JSON integers, floats or numeric strings; no range checks
/// are applied.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureVector {
    #[serde(deserialize_with = "lenient_f64")]
    pub start_station_id: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub hour_of_day: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub day_of_week: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub weekend: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub month: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub rush_hour: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub avg_rolling_7days: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub avg_rolling_30days: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub start_lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub start_lng: f64,
}

impl FeatureVector {
    /// Model input in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.start_station_id,
            self.hour_of_day,
            self.day_of_week,
            self.weekend,
            self.month,
            self.rush_hour,
            self.avg_rolling_7days,
            self.avg_rolling_30days,
            self.start_lat,
            self.start_lng,
        ]
    }
}

// ---------- Lenient numeric coercion ----------

struct LenientF64;

impl<'de> de::Visitor<'de> for LenientF64 {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a finite number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        if v.is_finite() {
            Ok(v)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(LenientF64)
}

// ---------- Response bodies ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_demand: Vec<f64>,
}

/// Lifecycle label reported by the health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    pub status: ModelStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
