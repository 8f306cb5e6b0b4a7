//! Tool layer: the user-facing operations exposed over MCP.
//!
//! Every operation composes upstream adapter calls and returns a JSON value
//! in the same envelope shape the adapter uses (`success`, `data` or
//! `error`, `message`), ready to be serialized onto the protocol surface.

pub mod forecast;
pub mod weather;

pub use forecast::ForecastTools;
pub use weather::WeatherTools;

/// Fixed location label: this server serves exactly one city.
pub const LOCATION: &str = "Konstanz, Germany";
