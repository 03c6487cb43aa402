use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::{ForecastData, GeoCandidate, TemperatureUnit};

use super::{ForecastClient, GeocodingClient};

const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";
const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

const HOURLY_PARAMS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation_probability,weather_code";
const DAILY_PARAMS: &str =
    "temperature_2m_max,temperature_2m_min,sunrise,sunset,weather_code,wind_speed_10m_max";

/// Open-Meteo geocoding client (`/v1/search`). No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new() -> Self {
        Self::with_base_url(GEOCODING_BASE_URL)
    }

    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for OpenMeteoGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    // Open-Meteo omits the field entirely when nothing matched.
    results: Option<Vec<GeoCandidate>>,
}

#[async_trait]
impl GeocodingClient for OpenMeteoGeocoder {
    async fn resolve(&self, name: &str) -> Result<Vec<GeoCandidate>> {
        let url = format!("{}/v1/search", self.base_url);

        tracing::debug!(name, "resolving location via Open-Meteo geocoding");

        let res = self
            .http
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await
            .context("Failed to send request to Open-Meteo geocoding")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: GeoSearchResponse =
            serde_json::from_str(&body).context("Failed to parse Open-Meteo geocoding JSON")?;

        Ok(parsed.results.unwrap_or_default())
    }
}

/// Open-Meteo forecast client (`/v1/forecast`).
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    http: Client,
    base_url: String,
}

impl OpenMeteoForecast {
    pub fn new() -> Self {
        Self::with_base_url(FORECAST_BASE_URL)
    }

    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for OpenMeteoForecast {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastClient for OpenMeteoForecast {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        unit: TemperatureUnit,
    ) -> Result<ForecastData> {
        let url = format!("{}/v1/forecast", self.base_url);

        tracing::debug!(latitude, longitude, %unit, "fetching forecast from Open-Meteo");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("current_weather", "true"),
                ("hourly", HOURLY_PARAMS),
                ("daily", DAILY_PARAMS),
                ("timezone", "auto"),
                ("temperature_unit", unit.as_str()),
                ("wind_speed_unit", "ms"),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo forecast")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: ForecastData =
            serde_json::from_str(&body).context("Failed to parse Open-Meteo forecast JSON")?;

        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        // Back off to a char boundary so multi-byte bodies don't panic.
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        // One leading ASCII byte shifts every "é" (2 bytes) to an odd
        // offset, so byte 200 lands mid-character.
        let long = format!("a{}", "é".repeat(150));
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), 202);
    }

    #[test]
    fn geo_search_response_without_results_is_empty() {
        let parsed: GeoSearchResponse =
            serde_json::from_str(r#"{"generationtime_ms": 0.5}"#).expect("valid");
        assert!(parsed.results.unwrap_or_default().is_empty());
    }
}
