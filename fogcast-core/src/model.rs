use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field set shared by forecast and live records.
///
/// Every field is optional: upstream items routinely omit measurements, and a
/// missing value is `null` in the output rather than an error. The
/// `timestamp` is kept as the ISO-8601 string the upstream sent, falling back
/// to the `datetime` key when `timestamp` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherFields {
    pub timestamp: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub visibility: Option<f64>,
    pub precipitation: Option<f64>,
}

impl WeatherFields {
    pub(crate) fn from_item(item: &Map<String, Value>) -> Self {
        Self {
            timestamp: string_field(item, "timestamp").or_else(|| string_field(item, "datetime")),
            temperature: number_field(item, "temperature"),
            humidity: number_field(item, "humidity"),
            pressure: number_field(item, "pressure"),
            wind_speed: number_field(item, "wind_speed"),
            wind_direction: number_field(item, "wind_direction"),
            visibility: number_field(item, "visibility"),
            precipitation: number_field(item, "precipitation"),
        }
    }
}

/// One forecast entry for exactly one model and one nominal time.
///
/// `fog_probability` falls back to the `fog_forecast` key some upstream
/// responses use instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub model_id: String,
    #[serde(flatten)]
    pub fields: WeatherFields,
    pub fog_probability: Option<f64>,
    pub forecast_horizon: Option<i64>,
}

impl ForecastRecord {
    pub(crate) fn from_item(item: &Map<String, Value>, model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            fields: WeatherFields::from_item(item),
            fog_probability: number_field(item, "fog_probability")
                .or_else(|| number_field(item, "fog_forecast")),
            forecast_horizon: item.get("forecast_horizon").and_then(Value::as_i64),
        }
    }
}

/// One live observation from a measuring station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveRecord {
    pub source: String,
    pub station_id: Option<String>,
    #[serde(flatten)]
    pub fields: WeatherFields,
    pub water_level: Option<f64>,
}

impl LiveRecord {
    pub(crate) fn from_item(item: &Map<String, Value>) -> Self {
        Self {
            source: string_field(item, "source").unwrap_or_else(|| "unknown".to_string()),
            station_id: string_field(item, "station_id"),
            fields: WeatherFields::from_item(item),
            water_level: number_field(item, "water_level"),
        }
    }
}

fn number_field(item: &Map<String, Value>, key: &str) -> Option<f64> {
    item.get(key).and_then(Value::as_f64)
}

/// Numeric identifiers are stringified rather than dropped.
fn string_field(item: &Map<String, Value>, key: &str) -> Option<String> {
    match item.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Map<String, Value> {
        value.as_object().expect("test item must be an object").clone()
    }

    #[test]
    fn forecast_record_reads_alias_fields() {
        let item = item(json!({
            "temperature": 12.3,
            "fog_forecast": 0.4,
            "datetime": "2024-01-01T00:00:00Z",
        }));

        let record = ForecastRecord::from_item(&item, "icon-d2");

        assert_eq!(record.model_id, "icon-d2");
        assert_eq!(record.fields.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record.fields.temperature, Some(12.3));
        assert_eq!(record.fog_probability, Some(0.4));
        assert_eq!(record.forecast_horizon, None);
    }

    #[test]
    fn canonical_fields_win_over_aliases() {
        let item = item(json!({
            "timestamp": "2024-01-01T06:00:00Z",
            "datetime": "2024-01-01T00:00:00Z",
            "fog_probability": 0.9,
            "fog_forecast": 0.1,
        }));

        let record = ForecastRecord::from_item(&item, "icon-d2");

        assert_eq!(record.fields.timestamp.as_deref(), Some("2024-01-01T06:00:00Z"));
        assert_eq!(record.fog_probability, Some(0.9));
    }

    #[test]
    fn missing_fields_stay_none() {
        let record = ForecastRecord::from_item(&Map::new(), "icon-d2");

        assert_eq!(record.model_id, "icon-d2");
        assert!(record.fields.timestamp.is_none());
        assert!(record.fields.temperature.is_none());
        assert!(record.fog_probability.is_none());
    }

    #[test]
    fn live_record_defaults_source_and_stringifies_station_id() {
        let record = LiveRecord::from_item(&item(json!({
            "station_id": 1371,
            "water_level": 302.5,
        })));

        assert_eq!(record.source, "unknown");
        assert_eq!(record.station_id.as_deref(), Some("1371"));
        assert_eq!(record.water_level, Some(302.5));
    }

    #[test]
    fn records_serialize_flat() {
        let record = ForecastRecord::from_item(
            &item(json!({"temperature": 5.0, "timestamp": "2024-01-01T00:00:00Z"})),
            "icon-d2",
        );

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["model_id"], "icon-d2");
        assert_eq!(json["temperature"], 5.0);
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(json["humidity"], Value::Null);
    }
}
