use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::FogcastClient;

/// Tools for forecast data and model comparison.
#[derive(Debug, Clone)]
pub struct ForecastTools {
    client: Arc<FogcastClient>,
}

impl ForecastTools {
    pub fn new(client: Arc<FogcastClient>) -> Self {
        Self { client }
    }

    /// The list of forecast models the upstream knows about, with a count.
    pub async fn get_available_models(&self) -> Value {
        info!("Getting available forecast models");

        let response = self.client.list_models().await;
        let Some(models) = response.data else {
            return json!({
                "success": false,
                "error": response.error,
                "message": response.message,
            });
        };

        let count = models.len();
        json!({
            "success": true,
            "data": { "models": models, "count": count },
            "message": format!("Retrieved {count} available models"),
        })
    }

    /// Forecast entries for one model. With a datetime the upstream is asked
    /// for that specific run, without one for the current forecast.
    pub async fn get_forecast(&self, model_id: &str, datetime_str: Option<&str>) -> Value {
        info!(
            "Getting forecast for model {model_id} at {}",
            datetime_str.unwrap_or("current time")
        );

        let response = match datetime_str {
            Some(datetime) => self.client.get_forecasts(datetime, model_id).await,
            None => self.client.get_current_forecast(model_id).await,
        };

        let Some(forecasts) = response.data else {
            return json!({
                "success": false,
                "error": response.error,
                "message": response.message,
            });
        };

        let count = forecasts.len();
        json!({
            "success": true,
            "data": {
                "model_id": model_id,
                "forecast_datetime": datetime_str,
                "forecasts": forecasts,
                "count": count,
            },
            "message": format!("Retrieved {count} forecast entries for model {model_id}"),
        })
    }

    pub async fn get_current_forecast(&self, model_id: &str) -> Value {
        self.get_forecast(model_id, None).await
    }

    /// Flat summary of the first forecast entry.
    ///
    /// An upstream failure is propagated verbatim; a successful call with no
    /// entries is a distinct failure with its own message.
    pub async fn get_forecast_summary(&self, model_id: &str, datetime_str: Option<&str>) -> Value {
        info!("Getting forecast summary for model {model_id}");

        let forecast = self.get_forecast(model_id, datetime_str).await;
        if forecast["success"] != true {
            return forecast;
        }

        let Some(first) = forecast["data"]["forecasts"].as_array().and_then(|f| f.first()) else {
            return json!({
                "success": false,
                "error": "No forecast data available",
                "message": format!("No forecast data found for model {model_id}"),
            });
        };

        json!({
            "success": true,
            "data": {
                "model_id": model_id,
                "forecast_datetime": datetime_str.unwrap_or("current"),
                "temperature": first["temperature"].clone(),
                "humidity": first["humidity"].clone(),
                "pressure": first["pressure"].clone(),
                "wind_speed": first["wind_speed"].clone(),
                "wind_direction": first["wind_direction"].clone(),
                "visibility": first["visibility"].clone(),
                "precipitation": first["precipitation"].clone(),
                "fog_probability": first["fog_probability"].clone(),
                "timestamp": first["timestamp"].clone(),
            },
            "message": format!("Forecast summary retrieved for model {model_id}"),
        })
    }

    /// Independent per-model forecasts for comparison.
    ///
    /// One model failing does not abort the others; each entry reports its
    /// own success or error, and the top-level call succeeds as long as the
    /// orchestration itself does.
    pub async fn compare_models(&self, model_ids: &[String], datetime_str: Option<&str>) -> Value {
        info!("Comparing models: {model_ids:?}");

        let mut comparison = Map::new();
        for model_id in model_ids {
            let forecast = self.get_forecast(model_id, datetime_str).await;
            let entry = if forecast["success"] == true {
                let first = forecast["data"]["forecasts"]
                    .as_array()
                    .and_then(|f| f.first())
                    .cloned()
                    .unwrap_or(Value::Null);
                json!({ "success": true, "data": first })
            } else {
                json!({ "success": false, "error": forecast["error"].clone() })
            };
            comparison.insert(model_id.clone(), entry);
        }

        let count = model_ids.len();
        json!({
            "success": true,
            "data": {
                "comparison_datetime": datetime_str.unwrap_or("current"),
                "models": comparison,
                "model_count": count,
            },
            "message": format!("Compared forecasts from {count} models"),
        })
    }
}
