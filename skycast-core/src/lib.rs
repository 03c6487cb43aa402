//! Core library for the `skycast` weather client.
//!
//! This crate defines:
//! - The shared domain model (forecast payloads, units, fetch lifecycle)
//! - Client contracts for geocoding and forecasts, plus Open-Meteo implementations
//! - The weather session controller that orchestrates geocode-then-forecast
//!   fetches into an observable state
//! - Pure lookup helpers for presentation layers
//! - Configuration handling
//!
//! It is used by `skycast-cli`, but can also be reused by other frontends.

pub mod client;
pub mod config;
pub mod lookup;
pub mod model;
pub mod session;

pub use client::{ForecastClient, GeocodingClient};
pub use client::open_meteo::{OpenMeteoForecast, OpenMeteoGeocoder};
pub use config::Config;
pub use lookup::{WeatherCategory, hour_index_for_date};
pub use model::{
    CurrentReading, DailySeries, FetchState, ForecastData, GeoCandidate, HourlySeries,
    TemperatureUnit,
};
pub use session::{
    BLANK_QUERY_MESSAGE, FETCH_FAILED_MESSAGE, NOT_FOUND_MESSAGE, SessionState, WeatherSession,
};
