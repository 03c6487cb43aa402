use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Lifecycle of one fetch attempt, as observed by presentation code.
///
/// The set is closed on purpose: consumers must match all three variants so
/// a new state cannot silently fall through a default arm.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Success(T),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Query-parameter value understood by the Open-Meteo forecast API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }

    pub fn toggle(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// One geocoding result: a resolvable place name plus coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Full forecast payload for one location, as returned by Open-Meteo.
///
/// Created fresh per successful fetch and never mutated afterwards; the
/// session controller replaces it wholesale on the next fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    #[serde(rename = "current_weather")]
    pub current: CurrentReading,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    pub temperature: f64,
    #[serde(rename = "windspeed")]
    pub wind_speed: f64,
    #[serde(rename = "weathercode")]
    pub weather_code: i32,
    #[serde(rename = "time")]
    pub timestamp: String,
}

/// Hour-indexed series. All vectors share one ordering and length; index
/// `i` across them refers to the same hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(rename = "time")]
    pub timestamps: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Vec<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: Vec<f64>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    pub weather_code: Vec<i32>,
}

/// Day-indexed series; day 0 is today. Same shared-length rule as
/// [`HourlySeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    #[serde(rename = "time")]
    pub dates: Vec<String>,
    #[serde(rename = "temperature_2m_max")]
    pub max_temp: Vec<f64>,
    #[serde(rename = "temperature_2m_min")]
    pub min_temp: Vec<f64>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub weather_code: Vec<i32>,
    #[serde(rename = "wind_speed_10m_max")]
    pub max_wind_speed: Vec<f64>,
}

// Positional accessors are deliberately lenient: presentation code indexes
// with day/hour offsets it derived itself, and an off-by-one there should
// render a blank value, not crash the frontend. Out-of-range numeric reads
// yield 0.0, text reads yield "", weather codes yield -1 (an unknown code).

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamp_at(&self, index: usize) -> String {
        self.timestamps.get(index).cloned().unwrap_or_default()
    }

    pub fn temperature_at(&self, index: usize) -> f64 {
        self.temperature.get(index).copied().unwrap_or(0.0)
    }

    pub fn humidity_at(&self, index: usize) -> f64 {
        self.humidity.get(index).copied().unwrap_or(0.0)
    }

    pub fn wind_speed_at(&self, index: usize) -> f64 {
        self.wind_speed.get(index).copied().unwrap_or(0.0)
    }

    pub fn precipitation_probability_at(&self, index: usize) -> f64 {
        self.precipitation_probability
            .get(index)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn weather_code_at(&self, index: usize) -> i32 {
        self.weather_code.get(index).copied().unwrap_or(-1)
    }
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date_at(&self, index: usize) -> String {
        self.dates.get(index).cloned().unwrap_or_default()
    }

    pub fn max_temp_at(&self, index: usize) -> f64 {
        self.max_temp.get(index).copied().unwrap_or(0.0)
    }

    pub fn min_temp_at(&self, index: usize) -> f64 {
        self.min_temp.get(index).copied().unwrap_or(0.0)
    }

    pub fn sunrise_at(&self, index: usize) -> String {
        self.sunrise.get(index).cloned().unwrap_or_default()
    }

    pub fn sunset_at(&self, index: usize) -> String {
        self.sunset.get(index).cloned().unwrap_or_default()
    }

    pub fn weather_code_at(&self, index: usize) -> i32 {
        self.weather_code.get(index).copied().unwrap_or(-1)
    }

    pub fn max_wind_speed_at(&self, index: usize) -> f64 {
        self.max_wind_speed.get(index).copied().unwrap_or(0.0)
    }
}
