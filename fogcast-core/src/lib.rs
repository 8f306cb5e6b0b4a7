//! Core library for the Fogcast MCP server.
//!
//! This crate defines:
//! - Configuration handling
//! - The HTTP transport against the upstream Fogcast API
//! - Normalization of upstream responses into typed weather records
//! - The tool layer composing upstream calls into user-facing results
//!
//! It is used by `fogcast-mcp`, but can also be reused by other binaries or
//! services.

pub mod client;
pub mod config;
pub mod model;
pub mod response;
pub mod tools;
pub mod transport;

pub use client::FogcastClient;
pub use config::Config;
pub use model::{ForecastRecord, LiveRecord, WeatherFields};
pub use response::ApiResponse;
pub use tools::{ForecastTools, WeatherTools};
pub use transport::{HttpClient, RequestError, Transport};
