//! Pure lookup helpers used by presentation layers against a Success
//! payload. None of these touch session state.

use crate::model::HourlySeries;

/// Coarse condition bucket derived from a WMO weather code. The frontend
/// maps each bucket to an icon or label of its choosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCategory {
    Clear,
    PartlyCloudy,
    Fog,
    Rain,
    Snow,
    Storm,
    Unknown,
}

impl WeatherCategory {
    /// Total over all of i32; any code outside the known WMO ranges is
    /// `Unknown` (including the -1 produced by out-of-range series reads).
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => WeatherCategory::Clear,
            1 | 2 | 3 => WeatherCategory::PartlyCloudy,
            45 | 48 => WeatherCategory::Fog,
            51 | 53 | 55 | 61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => WeatherCategory::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => WeatherCategory::Snow,
            95 | 96 | 99 => WeatherCategory::Storm,
            _ => WeatherCategory::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCategory::Clear => "Clear",
            WeatherCategory::PartlyCloudy => "Partly cloudy",
            WeatherCategory::Fog => "Fog",
            WeatherCategory::Rain => "Rain",
            WeatherCategory::Snow => "Snow",
            WeatherCategory::Storm => "Storm",
            WeatherCategory::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of `"{date}T{hour:02}:00"` in the hourly timestamps, if present.
///
/// Open-Meteo hourly timestamps are minute-resolution ISO strings like
/// `2025-05-28T15:00`, so an exact string match is sufficient. Callers
/// substitute a display fallback when this returns `None`.
pub fn hour_index_for_date(hourly: &HourlySeries, date: &str, hour: u32) -> Option<usize> {
    let key = format!("{date}T{hour:02}:00");
    hourly.timestamps.iter().position(|ts| *ts == key)
}
