use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use crate::client::FogcastClient;
use crate::tools::LOCATION;

/// Tools for current weather data.
#[derive(Debug, Clone)]
pub struct WeatherTools {
    client: Arc<FogcastClient>,
}

impl WeatherTools {
    pub fn new(client: Arc<FogcastClient>) -> Self {
        Self { client }
    }

    /// Current conditions: the live records plus a location label and the
    /// first record's timestamp as `last_updated` (null when there is none).
    pub async fn get_current_weather(&self) -> Value {
        info!("Getting current weather data");

        let response = self.client.get_live_data().await;
        let Some(records) = response.data else {
            return json!({
                "success": false,
                "error": response.error,
                "message": response.message,
            });
        };

        let count = records.len();
        let last_updated = records.first().and_then(|r| r.fields.timestamp.clone());

        json!({
            "success": true,
            "data": {
                "location": LOCATION,
                "current_conditions": records,
                "last_updated": last_updated,
            },
            "message": format!("Retrieved current weather data with {count} data points"),
        })
    }

    /// Flat summary of the most recent conditions.
    ///
    /// An upstream failure is propagated verbatim; an empty live feed is a
    /// distinct failure with its own message.
    pub async fn get_weather_summary(&self) -> Value {
        info!("Getting weather summary");

        let weather = self.get_current_weather().await;
        if weather["success"] != true {
            return weather;
        }

        let conditions = &weather["data"]["current_conditions"];
        let Some(latest) = conditions.as_array().and_then(|c| c.first()) else {
            return json!({
                "success": false,
                "error": "No weather data available",
                "message": "No current weather data found",
            });
        };

        json!({
            "success": true,
            "data": {
                "location": LOCATION,
                "temperature": latest["temperature"].clone(),
                "humidity": latest["humidity"].clone(),
                "pressure": latest["pressure"].clone(),
                "wind_speed": latest["wind_speed"].clone(),
                "wind_direction": latest["wind_direction"].clone(),
                "visibility": latest["visibility"].clone(),
                "precipitation": latest["precipitation"].clone(),
                "water_level": latest["water_level"].clone(),
                "source": latest["source"].clone(),
                "last_updated": latest["timestamp"].clone(),
            },
            "message": "Weather summary retrieved successfully",
        })
    }
}
