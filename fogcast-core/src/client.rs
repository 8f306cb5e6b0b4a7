use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::model::{ForecastRecord, LiveRecord};
use crate::response::ApiResponse;
use crate::transport::Transport;

/// Client for the upstream Fogcast API.
///
/// Every operation wraps its outcome in an [`ApiResponse`]. Transport
/// failures are converted into error envelopes at this boundary and never
/// propagate further up; per-item shape problems are logged and skipped
/// without failing the containing call.
#[derive(Debug, Clone)]
pub struct FogcastClient {
    transport: Arc<dyn Transport>,
}

impl FogcastClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Available forecast models. A bare array body is authoritative; an
    /// object with a `data` array is the fallback.
    pub async fn list_models(&self) -> ApiResponse<Vec<Value>> {
        info!("Fetching available forecast models");

        match self.transport.get("/models", &[]).await {
            Ok(body) => {
                let models = match body {
                    Value::Array(models) => models,
                    Value::Object(map) => match map.get("data") {
                        Some(Value::Array(models)) => models.clone(),
                        _ => Vec::new(),
                    },
                    _ => Vec::new(),
                };
                let message = format!("Retrieved {} available models", models.len());
                ApiResponse::ok(models, message)
            }
            Err(e) => {
                error!("Error fetching available models: {e}");
                ApiResponse::err(e.to_string(), "Failed to fetch available models")
            }
        }
    }

    /// Forecasts for one model at a specific datetime.
    pub async fn get_forecasts(
        &self,
        datetime_str: &str,
        model_id: &str,
    ) -> ApiResponse<Vec<ForecastRecord>> {
        info!("Fetching forecasts for model {model_id} at {datetime_str}");

        let query = [("datetime", datetime_str), ("model_id", model_id)];
        match self.transport.get("/forecasts", &query).await {
            Ok(body) => {
                let forecasts = forecast_records(body, model_id);
                let message = format!("Retrieved {} forecast entries", forecasts.len());
                ApiResponse::ok(forecasts, message)
            }
            Err(e) => {
                error!("Error fetching forecasts: {e}");
                ApiResponse::err(e.to_string(), "Failed to fetch forecasts")
            }
        }
    }

    /// Most recent forecast run for one model.
    pub async fn get_current_forecast(&self, model_id: &str) -> ApiResponse<Vec<ForecastRecord>> {
        info!("Fetching current forecast for model {model_id}");

        let query = [("model_id", model_id)];
        match self.transport.get("/current-forecast", &query).await {
            Ok(body) => {
                let forecasts = forecast_records(body, model_id);
                let message = format!("Retrieved current forecast for model {model_id}");
                ApiResponse::ok(forecasts, message)
            }
            Err(e) => {
                error!("Error fetching current forecast: {e}");
                ApiResponse::err(e.to_string(), "Failed to fetch current forecast")
            }
        }
    }

    /// Live weather and water-level observations.
    pub async fn get_live_data(&self) -> ApiResponse<Vec<LiveRecord>> {
        info!("Fetching live weather data");

        match self.transport.get("/actual/live-data", &[]).await {
            Ok(body) => {
                let live_data = live_records(body);
                ApiResponse::ok(live_data, "Retrieved current live weather data")
            }
            Err(e) => {
                error!("Error fetching live data: {e}");
                ApiResponse::err(e.to_string(), "Failed to fetch live weather data")
            }
        }
    }
}

/// Shape of an upstream response body.
///
/// The upstream inconsistently returns bare arrays, objects wrapping an
/// array under `data`, or single objects. The shape is resolved once, here,
/// into a canonical ordered item sequence before any typed record is built.
enum BodyShape {
    Sequence(Vec<Value>),
    ObjectWithData(Vec<Value>),
    Single(Value),
    Empty,
}

impl BodyShape {
    fn of(body: Value) -> Self {
        match body {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => {
                if let Some(data) = map.get("data") {
                    match data {
                        Value::Array(items) => Self::ObjectWithData(items.clone()),
                        other => Self::ObjectWithData(vec![other.clone()]),
                    }
                } else if map.is_empty() {
                    Self::Empty
                } else {
                    Self::Single(Value::Object(map))
                }
            }
            other => Self::Single(other),
        }
    }

    /// Canonical item sequence, upstream order preserved.
    fn into_items(self) -> Vec<Value> {
        match self {
            Self::Sequence(items) | Self::ObjectWithData(items) => items,
            Self::Single(item) => vec![item],
            Self::Empty => Vec::new(),
        }
    }
}

fn forecast_records(body: Value, model_id: &str) -> Vec<ForecastRecord> {
    BodyShape::of(body)
        .into_items()
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(map) => Some(ForecastRecord::from_item(map, model_id)),
            None => {
                warn!("Skipping forecast item that is not an object: {item}");
                None
            }
        })
        .collect()
}

fn live_records(body: Value) -> Vec<LiveRecord> {
    BodyShape::of(body)
        .into_items()
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(map) => Some(LiveRecord::from_item(map)),
            None => {
                warn!("Skipping live data item that is not an object: {item}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_body_yields_records_in_order() {
        let body = json!([
            {"timestamp": "2024-01-01T00:00:00Z", "temperature": 1.0},
            {"timestamp": "2024-01-01T01:00:00Z", "temperature": 2.0},
        ]);

        let records = forecast_records(body, "icon-d2");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields.temperature, Some(1.0));
        assert_eq!(records[1].fields.temperature, Some(2.0));
        assert!(records.iter().all(|r| r.model_id == "icon-d2"));
    }

    #[test]
    fn data_wrapped_body_yields_records() {
        let body = json!({"data": [{"temperature": 3.5}]});

        let records = forecast_records(body, "icon-eu");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.temperature, Some(3.5));
    }

    #[test]
    fn bare_object_body_yields_a_single_record() {
        let body = json!({"temperature": 12.3, "fog_forecast": 0.4, "datetime": "2024-01-01T00:00:00Z"});

        let records = forecast_records(body, "icon-d2");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fog_probability, Some(0.4));
        assert_eq!(records[0].fields.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn empty_bodies_yield_no_records() {
        assert!(forecast_records(json!([]), "m").is_empty());
        assert!(forecast_records(json!({}), "m").is_empty());
        assert!(live_records(json!([])).is_empty());
        assert!(live_records(json!({})).is_empty());
    }

    #[test]
    fn non_object_items_are_skipped_without_aborting() {
        let body = json!([{"temperature": 1.0}, "garbage", 42, {"temperature": 2.0}]);

        let records = forecast_records(body, "icon-d2");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields.temperature, Some(1.0));
        assert_eq!(records[1].fields.temperature, Some(2.0));
    }

    #[test]
    fn non_array_data_field_is_treated_as_one_item() {
        let body = json!({"data": {"temperature": 7.0}});

        let records = forecast_records(body, "icon-d2");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.temperature, Some(7.0));
    }

    #[test]
    fn raw_text_fallback_body_yields_no_records() {
        // The transport wraps a non-JSON body as {"data": "<raw text>"};
        // the lone string item is skipped, not an error.
        let body = json!({"data": "service unavailable"});

        assert!(live_records(body).is_empty());
    }

    #[test]
    fn live_records_read_live_context_fields() {
        let body = json!([{
            "source": "DWD",
            "station_id": "KN-01",
            "timestamp": "2024-01-01T00:00:00Z",
            "water_level": 302.5,
            "temperature": 4.2,
        }]);

        let records = live_records(body);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "DWD");
        assert_eq!(records[0].station_id.as_deref(), Some("KN-01"));
        assert_eq!(records[0].water_level, Some(302.5));
        assert_eq!(records[0].fields.temperature, Some(4.2));
    }
}
