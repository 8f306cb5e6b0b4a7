//! Fogcast MCP server.
//!
//! Exposes the Konstanz weather tools over the Model Context Protocol:
//! JSON-RPC 2.0, one message per line, stdin/stdout. Tool and resource
//! calls are validated here before any upstream request is made, and every
//! outcome is serialized as a uniform `{success, data|error, message}`
//! payload; no internal failure ever reaches the transport unwrapped.

use std::sync::Arc;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use fogcast_core::{Config, FogcastClient, ForecastTools, WeatherTools};

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server version announced during the handshake.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message: message.to_string() }),
        }
    }
}

/// Static resource metadata.
#[derive(Debug, Serialize)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// Static tool metadata with its parameter schema.
#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The fixed resource catalogue.
pub fn resources() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor {
            uri: "fogcast://models",
            name: "Available Models",
            description: "List of all available forecast models",
            mime_type: "application/json",
        },
        ResourceDescriptor {
            uri: "fogcast://current-weather",
            name: "Current Weather",
            description: "Current weather data for Konstanz",
            mime_type: "application/json",
        },
        ResourceDescriptor {
            uri: "fogcast://weather-summary",
            name: "Weather Summary",
            description: "Summary of current weather conditions",
            mime_type: "application/json",
        },
    ]
}

/// The fixed tool catalogue.
pub fn tools() -> Vec<ToolDescriptor> {
    let no_params = json!({
        "type": "object",
        "properties": {},
        "required": []
    });

    let model_id = json!({
        "type": "string",
        "description": "ID of the forecast model"
    });
    let datetime = json!({
        "type": "string",
        "description": "Forecast datetime in format YYYY-MM-DDTHH:MM:SSZ (optional)"
    });

    vec![
        ToolDescriptor {
            name: "get_current_weather",
            description: "Get current weather data for Konstanz",
            input_schema: no_params.clone(),
        },
        ToolDescriptor {
            name: "get_weather_summary",
            description: "Get a summary of current weather conditions",
            input_schema: no_params.clone(),
        },
        ToolDescriptor {
            name: "get_available_models",
            description: "Get list of available forecast models",
            input_schema: no_params,
        },
        ToolDescriptor {
            name: "get_forecast",
            description: "Get weather forecast for a specific model and datetime",
            input_schema: json!({
                "type": "object",
                "properties": { "model_id": model_id, "datetime": datetime },
                "required": ["model_id"]
            }),
        },
        ToolDescriptor {
            name: "get_current_forecast",
            description: "Get current forecast for a specific model",
            input_schema: json!({
                "type": "object",
                "properties": { "model_id": model_id },
                "required": ["model_id"]
            }),
        },
        ToolDescriptor {
            name: "get_forecast_summary",
            description: "Get a summary of forecast conditions",
            input_schema: json!({
                "type": "object",
                "properties": { "model_id": model_id, "datetime": datetime },
                "required": ["model_id"]
            }),
        },
        ToolDescriptor {
            name: "compare_models",
            description: "Compare forecasts from multiple models",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "model_ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of model IDs to compare"
                    },
                    "datetime": datetime
                },
                "required": ["model_ids"]
            }),
        },
    ]
}

/// Fogcast MCP server: routes protocol calls to the tool layer.
pub struct FogcastServer {
    server_name: String,
    weather: WeatherTools,
    forecast: ForecastTools,
}

impl FogcastServer {
    pub fn new(config: &Config, client: Arc<FogcastClient>) -> Self {
        Self {
            server_name: config.server_name.clone(),
            weather: WeatherTools::new(client.clone()),
            forecast: ForecastTools::new(client),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "resources": {},
                "tools": {}
            },
            "serverInfo": {
                "name": self.server_name,
                "version": SERVER_VERSION
            },
            "instructions": "Fogcast MCP server - weather and fog forecasts for Konstanz.\n\n\
                Use get_current_weather / get_weather_summary for live conditions, \
                get_forecast / get_forecast_summary for model forecasts, \
                compare_models to compare several models, and \
                get_available_models to discover model ids."
        })
    }

    /// Validate and dispatch one tool call. Validation failures and unknown
    /// names produce error payloads without any upstream request.
    pub async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> Value {
        debug!("Calling tool: {name}");

        match name {
            "get_current_weather" => self.weather.get_current_weather().await,
            "get_weather_summary" => self.weather.get_weather_summary().await,
            "get_available_models" => self.forecast.get_available_models().await,
            "get_forecast" => match forecast_args(name, arguments) {
                Ok((model_id, datetime)) => {
                    self.forecast.get_forecast(&model_id, datetime.as_deref()).await
                }
                Err(invalid) => invalid,
            },
            "get_current_forecast" => match require_model_id(name, arguments) {
                Ok(model_id) => self.forecast.get_current_forecast(&model_id).await,
                Err(invalid) => invalid,
            },
            "get_forecast_summary" => match forecast_args(name, arguments) {
                Ok((model_id, datetime)) => {
                    self.forecast.get_forecast_summary(&model_id, datetime.as_deref()).await
                }
                Err(invalid) => invalid,
            },
            "compare_models" => {
                let model_ids = match require_model_ids(name, arguments) {
                    Ok(model_ids) => model_ids,
                    Err(invalid) => return invalid,
                };
                match optional_datetime(name, arguments) {
                    Ok(datetime) => {
                        self.forecast.compare_models(&model_ids, datetime.as_deref()).await
                    }
                    Err(invalid) => invalid,
                }
            }
            _ => {
                warn!("Unknown tool requested: {name}");
                invalid_call(
                    format!("Unknown tool: {name}"),
                    format!("Tool {name} is not registered"),
                )
            }
        }
    }

    /// Resolve a resource URI to the tool that backs it.
    pub async fn read_resource(&self, uri: &str) -> Value {
        match uri {
            "fogcast://models" => self.forecast.get_available_models().await,
            "fogcast://current-weather" => self.weather.get_current_weather().await,
            "fogcast://weather-summary" => self.weather.get_weather_summary().await,
            _ => {
                warn!("Unknown resource requested: {uri}");
                invalid_call(
                    format!("Resource not found: {uri}"),
                    format!("No resource registered for {uri}"),
                )
            }
        }
    }

    /// Handle a single JSON-RPC request. Notifications return `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(request.id, self.initialize_result())),
            "initialized" | "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            "tools/list" => {
                Some(JsonRpcResponse::success(request.id, json!({ "tools": tools() })))
            }
            "resources/list" => {
                Some(JsonRpcResponse::success(request.id, json!({ "resources": resources() })))
            }
            "tools/call" => {
                let Some(name) = request.params.get("name").and_then(Value::as_str) else {
                    return Some(JsonRpcResponse::error(
                        request.id,
                        INVALID_PARAMS,
                        "Missing tool name",
                    ));
                };
                let empty = Map::new();
                let arguments =
                    request.params.get("arguments").and_then(Value::as_object).unwrap_or(&empty);

                let result = self.call_tool(name, arguments).await;
                Some(JsonRpcResponse::success(request.id, text_content(&result)))
            }
            "resources/read" => {
                let Some(uri) = request.params.get("uri").and_then(Value::as_str) else {
                    return Some(JsonRpcResponse::error(
                        request.id,
                        INVALID_PARAMS,
                        "Missing resource uri",
                    ));
                };

                let result = self.read_resource(uri).await;
                Some(JsonRpcResponse::success(request.id, resource_contents(uri, &result)))
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                Some(JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {}", request.method),
                ))
            }
        }
    }

    /// Serve MCP over stdin/stdout, one JSON-RPC message per line.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        info!("MCP server ready, listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    error!("Failed to parse request: {e}");
                    let response = JsonRpcResponse::error(None, PARSE_ERROR, "Parse error");
                    write_response(&mut stdout, &response).await?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request).await {
                write_response(&mut stdout, &response).await?;
            }
        }

        Ok(())
    }
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    response: &JsonRpcResponse,
) -> anyhow::Result<()> {
    let payload = serde_json::to_string(response)?;
    stdout.write_all(payload.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Error payload for a call rejected before reaching the tool layer.
fn invalid_call(error: impl Into<String>, message: impl Into<String>) -> Value {
    json!({
        "success": false,
        "error": error.into(),
        "message": message.into(),
    })
}

fn require_model_id(tool: &str, arguments: &Map<String, Value>) -> Result<String, Value> {
    match arguments.get("model_id").and_then(Value::as_str) {
        Some(model_id) if !model_id.is_empty() => Ok(model_id.to_string()),
        _ => Err(invalid_call(
            "model_id parameter is required",
            format!("Invalid arguments for tool {tool}"),
        )),
    }
}

fn optional_datetime(tool: &str, arguments: &Map<String, Value>) -> Result<Option<String>, Value> {
    let Some(value) = arguments.get("datetime") else {
        return Ok(None);
    };

    let Some(datetime) = value.as_str() else {
        return Err(invalid_call(
            "datetime parameter must be a string",
            format!("Invalid arguments for tool {tool}"),
        ));
    };

    if DateTime::parse_from_rfc3339(datetime).is_err() {
        return Err(invalid_call(
            format!("datetime parameter is not a valid ISO-8601 timestamp: {datetime}"),
            format!("Invalid arguments for tool {tool}"),
        ));
    }

    Ok(Some(datetime.to_string()))
}

fn forecast_args(
    tool: &str,
    arguments: &Map<String, Value>,
) -> Result<(String, Option<String>), Value> {
    let model_id = require_model_id(tool, arguments)?;
    let datetime = optional_datetime(tool, arguments)?;
    Ok((model_id, datetime))
}

fn require_model_ids(tool: &str, arguments: &Map<String, Value>) -> Result<Vec<String>, Value> {
    let ids = arguments.get("model_ids").and_then(Value::as_array).map(|ids| {
        ids.iter().map(|v| v.as_str().map(String::from)).collect::<Option<Vec<_>>>()
    });

    match ids {
        Some(Some(ids)) if !ids.is_empty() => Ok(ids),
        _ => Err(invalid_call(
            "model_ids parameter is required and must be a non-empty list of strings",
            format!("Invalid arguments for tool {tool}"),
        )),
    }
}

/// Wrap a tool result as MCP text content.
fn text_content(result: &Value) -> Value {
    let text = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    json!({ "content": [{ "type": "text", "text": text }] })
}

/// Wrap a resource payload as MCP resource contents.
fn resource_contents(uri: &str, result: &Value) -> Value {
    let text = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    json!({ "contents": [{ "uri": uri, "mimeType": "application/json", "text": text }] })
}
