//! Terminal rendering for session state and forecast payloads.

use chrono::{NaiveDate, NaiveDateTime};

use skycast_core::{
    FetchState, ForecastData, SessionState, TemperatureUnit, WeatherCategory, hour_index_for_date,
};

/// Hour sampled for humidity and rain probability in the day detail view.
const DETAIL_HOUR: u32 = 15;

pub fn print_state(state: &SessionState, day: Option<usize>) {
    match &state.envelope {
        None => {
            if state.error_message.is_empty() {
                println!("Nothing to show yet.");
            } else {
                println!("{}", state.error_message);
            }
        }
        Some(FetchState::Loading) => println!("Loading..."),
        Some(FetchState::Error(message)) => println!("{message}"),
        Some(FetchState::Success(data)) => {
            print_forecast(&state.query, data, state.unit);
            if let Some(day) = day {
                println!();
                print_day_detail(data, day, state.unit);
            }
        }
    }
}

fn print_forecast(place: &str, data: &ForecastData, unit: TemperatureUnit) {
    let sym = unit.symbol();
    let category = WeatherCategory::from_code(data.current.weather_code);

    println!("{place}: {category}");
    println!(
        "  {:.1}{sym}  wind {:.1} m/s  as of {}",
        data.current.temperature,
        data.current.wind_speed,
        format_time(&data.current.timestamp),
    );
    println!();

    for i in 0..data.daily.len() {
        println!(
            "  {:<7} {:<14} {:>6.1}{sym} / {:>6.1}{sym}",
            format_date(&data.daily.date_at(i)),
            WeatherCategory::from_code(data.daily.weather_code_at(i)).label(),
            data.daily.max_temp_at(i),
            data.daily.min_temp_at(i),
        );
    }
}

fn print_day_detail(data: &ForecastData, day: usize, unit: TemperatureUnit) {
    let sym = unit.symbol();
    let date = data.daily.date_at(day);

    // Mid-afternoon hourly sample; absent timestamps fall back to 0.0.
    let hour_index = hour_index_for_date(&data.hourly, &date, DETAIL_HOUR);
    let humidity = hour_index.map_or(0.0, |i| data.hourly.humidity_at(i));
    let rain = hour_index.map_or(0.0, |i| data.hourly.precipitation_probability_at(i));

    println!("{}", format_headline(&date));
    println!(
        "  max {:.1}{sym}  min {:.1}{sym}",
        data.daily.max_temp_at(day),
        data.daily.min_temp_at(day),
    );
    println!(
        "  sunrise {}  sunset {}",
        format_time(&data.daily.sunrise_at(day)),
        format_time(&data.daily.sunset_at(day)),
    );
    println!(
        "  wind {:.1} m/s  humidity {humidity:.0}%  rain {rain:.0}%",
        data.daily.max_wind_speed_at(day),
    );
}

/// "2025-05-28" -> "May 28". Unparseable input is returned as-is.
fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%b %-d").to_string(),
        Err(err) => {
            tracing::debug!(date, %err, "unparseable date");
            date.to_string()
        }
    }
}

/// "2025-10-20T14:00" -> "14:00". Unparseable input is returned as-is.
fn format_time(timestamp: &str) -> String {
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M") {
        Ok(parsed) => parsed.format("%H:%M").to_string(),
        Err(err) => {
            tracing::debug!(timestamp, %err, "unparseable timestamp");
            timestamp.to_string()
        }
    }
}

/// "2025-05-05" -> "Monday | 2025-05-05". Unparseable input is returned as-is.
fn format_headline(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => format!("{} | {date}", parsed.format("%A")),
        Err(err) => {
            tracing::debug!(date, %err, "unparseable date");
            date.to_string()
        }
    }
}
