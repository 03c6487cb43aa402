use crate::model::{ForecastData, GeoCandidate, TemperatureUnit};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod open_meteo;

/// Resolves a free-text place name to zero or more candidates.
///
/// Implementations own transport and endpoint details; the session
/// controller only cares about the candidate list or a failure.
#[async_trait]
pub trait GeocodingClient: Send + Sync + Debug {
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<GeoCandidate>>;
}

/// Fetches a full forecast for a coordinate pair in the requested unit.
///
/// The parameter set (hourly temperature/humidity/wind/precipitation
/// probability/weather code, daily max/min/sunrise/sunset/code/max wind)
/// is fixed configuration of the implementation, not caller-supplied.
#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        unit: TemperatureUnit,
    ) -> anyhow::Result<ForecastData>;
}
